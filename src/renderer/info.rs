//! Live resource counters exposed by the object manager.

/// Counters of live device-side resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryInfo {
    /// Number of geometries currently held by the geometry cache.
    pub geometries: usize,
}

/// Renderer statistics shared between the managers and the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderInfo {
    /// Memory counters.
    pub memory: MemoryInfo,
}
