//! Entries of the render lists held by the object registry.

use crate::ids::ObjectId;
use crate::scene::{Material, SceneNode};
use std::cell::RefCell;
use std::rc::Rc;

/// A registered mesh, line or point cloud.
#[derive(Clone)]
pub struct RenderEntry {
    /// Id of `object`.
    pub id: ObjectId,
    /// The registered object.
    pub object: SceneNode,
    /// Sort depth, written by the render pass.
    pub z: f32,
}

impl RenderEntry {
    /// An entry at depth 0.
    pub fn new(object: SceneNode) -> RenderEntry {
        RenderEntry {
            id: object.id(),
            object,
            z: 0.0,
        }
    }
}

/// A registered immediate-rendering object.
///
/// These have no registry id: the render pass resolves them itself and fills
/// the batch slots.
#[derive(Clone)]
pub struct ImmediateEntry {
    /// Always `None`.
    pub id: Option<ObjectId>,
    /// The registered object.
    pub object: SceneNode,
    /// Material used for the opaque pass, set by the render pass.
    pub opaque: Option<Rc<RefCell<Material>>>,
    /// Material used for the transparent pass, set by the render pass.
    pub transparent: Option<Rc<RefCell<Material>>>,
    /// Sort depth, written by the render pass.
    pub z: f32,
}

impl ImmediateEntry {
    /// An entry with empty batch slots, at depth 0.
    pub fn new(object: SceneNode) -> ImmediateEntry {
        ImmediateEntry {
            id: None,
            object,
            opaque: None,
            transparent: None,
            z: 0.0,
        }
    }
}
