//! Object manager configuration.

/// Number of morph influence slots of the uniform array.
pub const MAX_MORPH_TARGETS: usize = 8;

/// Tunables of the [`ObjectManager`](crate::renderer::ObjectManager).
///
/// ```
/// use geobuf::renderer::ObjectSettings;
///
/// let settings = ObjectSettings {
///     max_morph_targets: 4,
///     ..Default::default()
/// };
/// assert_eq!(settings.morph_slots(), 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ObjectSettings {
    /// Uniform receiving the packed morph weights.
    pub morph_influences_uniform: String,
    /// Prefix of the per-slot morph attribute names; slot `i` is bound as `{prefix}{i}`.
    pub morph_attribute_prefix: String,
    /// Maximum number of influences bound per object. Clamped to [`MAX_MORPH_TARGETS`].
    pub max_morph_targets: usize,
    /// Number of undrained diagnostics kept by the manager; older ones are dropped.
    pub max_diagnostics: usize,
}

impl ObjectSettings {
    /// Number of morph slots actually used.
    #[inline]
    pub fn morph_slots(&self) -> usize {
        self.max_morph_targets.min(MAX_MORPH_TARGETS)
    }

    /// Attribute name bound for morph slot `slot`.
    pub fn morph_attribute_name(&self, slot: usize) -> String {
        format!("{}{}", self.morph_attribute_prefix, slot)
    }
}

impl Default for ObjectSettings {
    fn default() -> Self {
        ObjectSettings {
            morph_influences_uniform: "morphTargetInfluences".to_string(),
            morph_attribute_prefix: "morphTarget".to_string(),
            max_morph_targets: MAX_MORPH_TARGETS,
            max_diagnostics: 256,
        }
    }
}
