//! Non-fatal problems reported while updating objects.

use crate::ids::ObjectId;
use crate::resource::ResourceKey;
use thiserror::Error;

/// A recoverable problem met while refreshing an object.
///
/// Diagnostics never interrupt a frame. They are logged when raised and kept
/// until drained with
/// [`ObjectManager::take_diagnostics`](crate::renderer::ObjectManager::take_diagnostics).
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// A buffer is marked dirty but its update range holds nothing to upload.
    #[error(
        "{key:?} is marked as needing an update but its update range count is 0; \
         write through the set methods or update the range manually"
    )]
    EmptyUpdateRange {
        /// The buffer whose upload was skipped.
        key: ResourceKey,
    },

    /// The object has morph influences but its material has no built program.
    #[error("{object} has morph influences but its material program is not built")]
    MissingProgram {
        /// The object being refreshed.
        object: ObjectId,
    },

    /// The program does not expose the morph influence uniform.
    #[error("the program of {object} has no `{uniform}` uniform")]
    MissingMorphUniform {
        /// The object being refreshed.
        object: ObjectId,
        /// Uniform name that was looked up.
        uniform: String,
    },

    /// A selected morph target has no morph attribute on the geometry.
    #[error("{object} selects morph target {target} but its geometry has no such morph attribute")]
    MissingMorphAttribute {
        /// The object being refreshed.
        object: ObjectId,
        /// Index of the morph target.
        target: usize,
    },

    /// An object drawn from a geometry has none.
    #[error("{object} is in the render list but has no geometry")]
    MissingGeometry {
        /// The object being refreshed.
        object: ObjectId,
    },

    /// The render list holds an object that is not registered, or was removed.
    #[error("{object} is in the render list but is not registered")]
    NotRegistered {
        /// The skipped object.
        object: ObjectId,
    },
}

impl Diagnostic {
    /// Whether this reports a caller mistake rather than a not-yet-ready resource.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Diagnostic::EmptyUpdateRange { .. }
                | Diagnostic::MissingGeometry { .. }
                | Diagnostic::NotRegistered { .. }
        )
    }
}
