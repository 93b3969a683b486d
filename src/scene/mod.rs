//! Everything related to the scene graph.

pub use self::material::{Material, ShaderProgram, UniformTable};
pub use self::scene_node::{ObjectKind, SceneNode, SceneNodeData};

mod material;
mod scene_node;
