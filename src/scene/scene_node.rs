//! Scene graph nodes carrying geometry, material and transforms.

use crate::geometry::Geometry;
use crate::ids::ObjectId;
use crate::scene::Material;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

/// What an object is, as far as buffer management is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKind {
    /// A node only grouping other nodes; never registered.
    Group,
    /// A triangle mesh.
    Mesh,
    /// A polyline.
    Line,
    /// A cloud of points.
    PointCloud,
    /// An object issuing its own draw calls; registered without a stable id.
    Immediate,
}

impl ObjectKind {
    /// Whether objects of this kind are drawn from a cached geometry.
    #[inline]
    pub fn uses_geometry(self) -> bool {
        matches!(self, ObjectKind::Mesh | ObjectKind::Line | ObjectKind::PointCloud)
    }
}

/// The data contained by a `SceneNode`.
pub struct SceneNodeData {
    id: ObjectId,
    kind: ObjectKind,
    geometry: Option<Geometry>,
    material: Option<Rc<RefCell<Material>>>,
    morph_target_influences: Option<Vec<f32>>,
    children: Vec<SceneNode>,
    parent: Option<Weak<RefCell<SceneNodeData>>>,
}

impl SceneNodeData {
    /// The process-unique id of this object.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The kind of this object.
    #[inline]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The geometry drawn by this object.
    #[inline]
    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// The material of this object.
    #[inline]
    pub fn material(&self) -> Option<&Rc<RefCell<Material>>> {
        self.material.as_ref()
    }

    /// Per-target morph weights, indexed like the geometry's morph attributes.
    #[inline]
    pub fn morph_target_influences(&self) -> Option<&[f32]> {
        self.morph_target_influences.as_deref()
    }

    /// Mutable access to the morph weights.
    #[inline]
    pub fn morph_target_influences_mut(&mut self) -> Option<&mut Vec<f32>> {
        self.morph_target_influences.as_mut()
    }

    /// The children of this node.
    #[inline]
    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    /// Whether this node has no parent.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.as_ref().and_then(|p| p.upgrade()).is_none()
    }

    /// `false` only if the material exists and is explicitly not visible.
    pub fn is_material_visible(&self) -> bool {
        self.material
            .as_ref()
            .map(|m| m.borrow().visible)
            .unwrap_or(true)
    }

    fn remove(&mut self, o: &SceneNode) {
        if let Some(i) = self
            .children
            .iter()
            .rposition(|e| Rc::ptr_eq(&o.data, &e.data))
        {
            let _ = self.children.remove(i);
        }
    }
}

/// A node of the scene graph.
///
/// This may represent a group of other nodes, and/or an object that can be rendered.
#[derive(Clone)]
pub struct SceneNode {
    data: Rc<RefCell<SceneNodeData>>,
}

impl SceneNode {
    /// Creates a new unrooted scene node.
    pub fn new(
        kind: ObjectKind,
        geometry: Option<Geometry>,
        material: Option<Rc<RefCell<Material>>>,
    ) -> SceneNode {
        SceneNode {
            data: Rc::new(RefCell::new(SceneNodeData {
                id: ObjectId::next(),
                kind,
                geometry,
                material,
                morph_target_influences: None,
                children: Vec::new(),
                parent: None,
            })),
        }
    }

    /// Creates an empty group node.
    pub fn group() -> SceneNode {
        SceneNode::new(ObjectKind::Group, None, None)
    }

    /// Creates a mesh node.
    pub fn mesh(geometry: Geometry, material: Rc<RefCell<Material>>) -> SceneNode {
        SceneNode::new(ObjectKind::Mesh, Some(geometry), Some(material))
    }

    /// Creates a line node.
    pub fn line(geometry: Geometry, material: Rc<RefCell<Material>>) -> SceneNode {
        SceneNode::new(ObjectKind::Line, Some(geometry), Some(material))
    }

    /// Creates a point cloud node.
    pub fn point_cloud(geometry: Geometry, material: Rc<RefCell<Material>>) -> SceneNode {
        SceneNode::new(ObjectKind::PointCloud, Some(geometry), Some(material))
    }

    /// Creates an immediate-rendering node.
    pub fn immediate(material: Rc<RefCell<Material>>) -> SceneNode {
        SceneNode::new(ObjectKind::Immediate, None, Some(material))
    }

    /// The process-unique id of this object.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.data.borrow().id
    }

    /// The kind of this object.
    #[inline]
    pub fn kind(&self) -> ObjectKind {
        self.data.borrow().kind
    }

    /// A clone of this object's geometry handle.
    pub fn geometry(&self) -> Option<Geometry> {
        self.data.borrow().geometry.clone()
    }

    /// A clone of this object's material handle.
    pub fn material(&self) -> Option<Rc<RefCell<Material>>> {
        self.data.borrow().material.clone()
    }

    /// Sets the per-target morph weights.
    pub fn set_morph_target_influences(&self, influences: Option<Vec<f32>>) -> &Self {
        self.data.borrow_mut().morph_target_influences = influences;
        self
    }

    /// Sets the geometry drawn by this object.
    pub fn set_geometry(&self, geometry: Option<Geometry>) -> &Self {
        self.data.borrow_mut().geometry = geometry;
        self
    }

    /// Sets the material of this object.
    pub fn set_material(&self, material: Option<Rc<RefCell<Material>>>) -> &Self {
        self.data.borrow_mut().material = material;
        self
    }

    /// The data of this scene node.
    #[inline]
    pub fn data(&self) -> Ref<'_, SceneNodeData> {
        self.data.borrow()
    }

    /// The data of this scene node.
    #[inline]
    pub fn data_mut(&mut self) -> RefMut<'_, SceneNodeData> {
        self.data.borrow_mut()
    }

    /// Adds a node as a child of this one, detaching it from its previous parent.
    pub fn add_child(&mut self, mut node: SceneNode) {
        node.detach();
        node.data.borrow_mut().parent = Some(Rc::downgrade(&self.data));
        self.data.borrow_mut().children.push(node);
    }

    /// Creates a group node and adds it as a child of this one.
    pub fn add_group(&mut self) -> SceneNode {
        let node = SceneNode::group();
        self.add_child(node.clone());
        node
    }

    /// Removes this node from its parent.
    ///
    /// The subtree rooted here is kept intact; call
    /// [`ObjectManager::on_removed`](crate::renderer::ObjectManager::on_removed)
    /// to release what the manager tracks for it.
    pub fn detach(&mut self) {
        let parent = self.data.borrow_mut().parent.take();

        if let Some(parent) = parent.and_then(|p| p.upgrade()) {
            parent.borrow_mut().remove(self);
        }
    }

    /// Calls `f` on this node and every descendant, parents before children.
    pub fn traverse<F: FnMut(&SceneNode)>(&self, f: &mut F) {
        f(self);

        let children = self.data.borrow().children.clone();
        for child in children.iter() {
            child.traverse(f);
        }
    }

    /// Whether both handles refer to the same node.
    #[inline]
    pub fn ptr_eq(&self, other: &SceneNode) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traverse_visits_the_whole_subtree_in_pre_order() {
        let mut root = SceneNode::group();
        let mut a = root.add_group();
        let b = a.add_group();
        let c = root.add_group();

        let mut visited = Vec::new();
        root.traverse(&mut |n| visited.push(n.id()));

        assert_eq!(visited, vec![root.id(), a.id(), b.id(), c.id()]);
    }

    #[test]
    fn detach_removes_from_the_parent_only() {
        let mut root = SceneNode::group();
        let mut a = root.add_group();
        let b = a.add_group();

        a.detach();

        assert!(root.data().children().is_empty());
        assert!(a.data().is_root());
        assert_eq!(a.data().children().len(), 1);
        assert!(a.data().children()[0].ptr_eq(&b));
    }

    #[test]
    fn reparenting_detaches_first() {
        let mut first = SceneNode::group();
        let mut second = SceneNode::group();
        let child = first.add_group();

        second.add_child(child.clone());

        assert!(first.data().children().is_empty());
        assert_eq!(second.data().children().len(), 1);
        assert!(!child.data().is_root());
    }

    #[test]
    fn missing_material_counts_as_visible() {
        let node = SceneNode::group();
        assert!(node.data().is_material_visible());

        let hidden = Material {
            visible: false,
            program: None,
        };
        let _ = node.set_material(Some(hidden.shared()));
        assert!(!node.data().is_material_visible());
    }
}
