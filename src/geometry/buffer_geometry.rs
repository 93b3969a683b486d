//! Geometry in GPU-ready form.

use crate::geometry::RenderMesh;
use crate::resource::{Attribute, BufferAttribute, TypedArray};
use crate::scene::ObjectKind;

/// Name of the vertex position attribute.
pub const POSITION: &str = "position";
/// Name of the vertex normal attribute.
pub const NORMAL: &str = "normal";
/// Name of the texture coordinates attribute.
pub const UV: &str = "uv";

/// A set of named attributes, an optional index and per-target morph attributes.
///
/// Attributes keep their insertion order, which is also the order in which
/// their device buffers are created.
#[derive(Clone, Debug, Default)]
pub struct BufferGeometry {
    attributes: Vec<(String, Attribute)>,
    index: Option<Attribute>,
    morph_attributes: Vec<Attribute>,
}

impl BufferGeometry {
    /// Creates a geometry without attributes.
    pub fn new() -> BufferGeometry {
        BufferGeometry::default()
    }

    /// Adds an attribute, replacing any previous attribute of the same name.
    pub fn set_attribute(&mut self, name: &str, attribute: impl Into<Attribute>) {
        let attribute = attribute.into();

        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = attribute,
            None => self.attributes.push((name.to_string(), attribute)),
        }
    }

    /// The attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    /// Removes and returns the attribute with the given name.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let i = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(i).1)
    }

    /// All the named attributes, in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Number of named attributes.
    #[inline]
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// The index attribute, uploaded as an element buffer.
    #[inline]
    pub fn index(&self) -> Option<&Attribute> {
        self.index.as_ref()
    }

    /// Sets the index attribute.
    pub fn set_index(&mut self, index: Option<Attribute>) {
        self.index = index;
    }

    /// The morph attribute of every target, indexed like the influences.
    #[inline]
    pub fn morph_attributes(&self) -> &[Attribute] {
        &self.morph_attributes
    }

    /// Sets the morph attributes, one per morph target.
    pub fn set_morph_attributes(&mut self, morph_attributes: Vec<Attribute>) {
        self.morph_attributes = morph_attributes;
    }

    /// Extracts renderable data from a mesh description.
    ///
    /// Meshes get positions, normals, uvs and an index. Lines and point clouds
    /// only use positions and normals, in vertex order.
    pub fn from_render_mesh(mesh: &RenderMesh, kind: ObjectKind) -> BufferGeometry {
        let mut res = BufferGeometry::new();
        res.update_from_render_mesh(mesh, kind);
        res
    }

    /// Re-extracts data from a mesh description.
    ///
    /// Attributes whose content changed are replaced in place and marked for
    /// re-upload, so their device buffers are kept. Returns `true` if anything
    /// changed.
    pub fn update_from_render_mesh(&mut self, mesh: &RenderMesh, kind: ObjectKind) -> bool {
        let mut mesh = mesh.clone();
        mesh.unify_index_buffer();

        let positions: Vec<f32> = mesh.coords.iter().flat_map(|c| c.to_array()).collect();
        let normals: Option<Vec<f32>> = mesh
            .normals
            .as_ref()
            .map(|ns| ns.iter().flat_map(|n| n.to_array()).collect());

        let mut changed = self.refresh_attribute(POSITION, TypedArray::F32(positions), 3);

        if let Some(normals) = normals {
            changed |= self.refresh_attribute(NORMAL, TypedArray::F32(normals), 3);
        }

        if kind == ObjectKind::Mesh {
            if let Some(uvs) = mesh.uvs.as_ref() {
                let uvs = uvs.iter().flat_map(|u| u.to_array()).collect();
                changed |= self.refresh_attribute(UV, TypedArray::F32(uvs), 2);
            }

            let indices = TypedArray::U32(mesh.flat_indices());
            changed |= Self::refresh(&mut self.index, indices, 1);
        }

        changed
    }

    fn refresh_attribute(&mut self, name: &str, array: TypedArray, item_size: usize) -> bool {
        let mut slot = self.attribute(name).cloned();
        let changed = Self::refresh(&mut slot, array, item_size);

        if let Some(attribute) = slot {
            self.set_attribute(name, attribute);
        }

        changed
    }

    fn refresh(slot: &mut Option<Attribute>, array: TypedArray, item_size: usize) -> bool {
        match slot {
            Some(Attribute::Plain(attribute)) => {
                let mut attribute = attribute.borrow_mut();
                if *attribute.array() == array {
                    return false;
                }

                if let Err(e) = attribute.replace_array(array) {
                    log::error!("Unable to refresh attribute {}: {}", attribute.id(), e);
                    return false;
                }

                true
            }
            _ => match BufferAttribute::new(array, item_size) {
                Ok(attribute) => {
                    *slot = Some(Attribute::plain(attribute));
                    true
                }
                Err(e) => {
                    log::error!("Unable to extract a {}-component attribute: {}", item_size, e);
                    false
                }
            },
        }
    }
}
