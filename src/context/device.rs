//! The narrow device interface the buffer manager talks to.

use std::fmt;

/// Opaque handle of a device buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferHandle(pub u64);

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// Type of gpu buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferType {
    /// A vertex buffer (bindable as vertex data).
    Array,
    /// An index buffer (bindable as index data).
    ElementArray,
}

impl BufferType {
    /// Converts to wgpu buffer usages.
    #[inline]
    pub fn to_wgpu(self) -> wgpu::BufferUsages {
        match self {
            BufferType::Array => wgpu::BufferUsages::VERTEX,
            BufferType::ElementArray => wgpu::BufferUsages::INDEX,
        }
    }
}

/// Allocation type of gpu buffers.
///
/// This is the usage hint passed along with a full upload. Backends are free to
/// treat it as advisory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AllocationType {
    /// Data uploaded once, used many times (immutable meshes).
    StaticDraw,
    /// Data modified frequently.
    DynamicDraw,
    /// Data for immediate use (lines, points, text).
    StreamDraw,
}

/// Where a shader uniform lives on the device.
///
/// Uniform values are written into a device buffer at a byte offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    /// The uniform buffer holding the value.
    pub buffer: BufferHandle,
    /// Byte offset of the value inside `buffer`.
    pub byte_offset: u64,
}

/// The device resource API consumed by the geometry cache and the object manager.
///
/// Calls follow a bind-then-upload protocol: `buffer_data` and
/// `buffer_sub_data` target whichever buffer was last bound for the given
/// [`BufferType`].
pub trait GpuDevice {
    /// Allocates a new, empty device buffer.
    fn create_buffer(&mut self) -> BufferHandle;

    /// Makes `handle` the current buffer for `kind`.
    fn bind_buffer(&mut self, kind: BufferType, handle: BufferHandle);

    /// Replaces the whole content of the buffer bound to `kind`.
    fn buffer_data(&mut self, kind: BufferType, data: &[u8], usage: AllocationType);

    /// Overwrites `data.len()` bytes of the buffer bound to `kind`, starting at `byte_offset`.
    fn buffer_sub_data(&mut self, kind: BufferType, byte_offset: u64, data: &[u8]);

    /// Releases a device buffer.
    fn delete_buffer(&mut self, handle: BufferHandle);

    /// Writes an array of floats to a uniform.
    fn uniform_1fv(&mut self, location: &UniformLocation, values: &[f32]);
}

impl<D: GpuDevice + ?Sized> GpuDevice for Box<D> {
    fn create_buffer(&mut self) -> BufferHandle {
        (**self).create_buffer()
    }

    fn bind_buffer(&mut self, kind: BufferType, handle: BufferHandle) {
        (**self).bind_buffer(kind, handle)
    }

    fn buffer_data(&mut self, kind: BufferType, data: &[u8], usage: AllocationType) {
        (**self).buffer_data(kind, data, usage)
    }

    fn buffer_sub_data(&mut self, kind: BufferType, byte_offset: u64, data: &[u8]) {
        (**self).buffer_sub_data(kind, byte_offset, data)
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        (**self).delete_buffer(handle)
    }

    fn uniform_1fv(&mut self, location: &UniformLocation, values: &[f32]) {
        (**self).uniform_1fv(location, values)
    }
}
