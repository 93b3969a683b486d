//! Cache of the buffer form of every geometry in use.

use crate::context::GpuDevice;
use crate::geometry::{BufferGeometry, GeometrySource};
use crate::ids::GeometryId;
use crate::renderer::{Properties, RenderInfo};
use crate::resource::Attribute;
use crate::scene::SceneNodeData;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Maps geometry ids to their [`BufferGeometry`].
///
/// Buffer geometries are cached as-is; mesh descriptions are converted on
/// first use. Each cached entry counts as one geometry in
/// [`MemoryInfo::geometries`](crate::renderer::MemoryInfo::geometries).
pub struct GeometryCache {
    geometries: HashMap<GeometryId, Rc<RefCell<BufferGeometry>>>,
    info: Rc<RefCell<RenderInfo>>,
}

impl GeometryCache {
    /// Creates an empty cache updating `info`.
    pub fn new(info: Rc<RefCell<RenderInfo>>) -> GeometryCache {
        GeometryCache {
            geometries: HashMap::new(),
            info,
        }
    }

    /// The buffer form of an object's geometry.
    ///
    /// Idempotent per geometry id. Returns `None` if the object has no geometry.
    pub fn get(&mut self, object: &SceneNodeData) -> Option<Rc<RefCell<BufferGeometry>>> {
        let geometry = object.geometry()?;
        let id = geometry.id();

        if let Some(cached) = self.geometries.get(&id) {
            return Some(cached.clone());
        }

        let buffer_geometry = match *geometry.source() {
            GeometrySource::Buffer(ref g) => g.clone(),
            GeometrySource::Mesh(ref mesh) => Rc::new(RefCell::new(
                BufferGeometry::from_render_mesh(mesh, object.kind()),
            )),
        };

        log::debug!("Caching {} for {}", id, object.id());

        let _ = self.geometries.insert(id, buffer_geometry.clone());
        self.info.borrow_mut().memory.geometries += 1;

        Some(buffer_geometry)
    }

    /// The cached buffer form of a geometry, without converting anything.
    #[inline]
    pub fn cached(&self, id: GeometryId) -> Option<&Rc<RefCell<BufferGeometry>>> {
        self.geometries.get(&id)
    }

    /// Whether the geometry is cached.
    #[inline]
    pub fn contains(&self, id: GeometryId) -> bool {
        self.geometries.contains_key(&id)
    }

    /// Number of cached geometries.
    #[inline]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// Is the cache empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Releases the device buffers of a geometry and forgets it.
    ///
    /// Every attribute, the index and the morph attributes are visited; each
    /// device buffer is deleted once even when several attributes share it.
    /// Disposing a geometry that is not cached does nothing and returns `false`.
    pub fn dispose<D: GpuDevice + ?Sized>(
        &mut self,
        id: GeometryId,
        device: &mut D,
        properties: &mut Properties,
    ) -> bool {
        let Some(geometry) = self.geometries.remove(&id) else {
            return false;
        };

        let geometry = geometry.borrow();
        let attributes = geometry
            .attributes()
            .map(|(_, a)| a)
            .chain(geometry.index())
            .chain(geometry.morph_attributes().iter());

        let mut released = 0;
        for attribute in attributes {
            if release(attribute, device, properties) {
                released += 1;
            }
        }

        let mut info = self.info.borrow_mut();
        info.memory.geometries = info.memory.geometries.saturating_sub(1);

        log::debug!("Disposed {} ({} device buffers released)", id, released);

        true
    }
}

fn release<D: GpuDevice + ?Sized>(
    attribute: &Attribute,
    device: &mut D,
    properties: &mut Properties,
) -> bool {
    match properties.remove_buffer(attribute.resource_key()) {
        Some(record) => {
            device.delete_buffer(record.handle);
            true
        }
        None => false,
    }
}
