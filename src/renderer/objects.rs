//! Registration of scene objects and per-frame refresh of their device buffers.

use crate::context::{BufferHandle, BufferType, GpuDevice};
use crate::geometry::{BufferGeometry, Geometry, GeometrySource};
use crate::ids::ObjectId;
use crate::renderer::morph;
use crate::renderer::{
    BufferRecord, Diagnostic, GeometryCache, ImmediateEntry, MAX_MORPH_TARGETS, ObjectRecord,
    ObjectSettings, Properties, RecordFlags, RenderEntry, RenderInfo,
};
use crate::resource::Attribute;
use crate::scene::{Material, ObjectKind, SceneNode};
use glamx::{Mat3, Mat4};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Keeps the device-side buffers of registered objects in sync with their geometry.
///
/// Objects are registered with [`init`](Self::init), refreshed once per frame
/// through [`update`](Self::update) and forgotten through
/// [`on_removed`](Self::on_removed). Device buffers are created lazily on the
/// first refresh and only re-uploaded when their source is marked dirty.
pub struct ObjectManager<D: GpuDevice> {
    device: D,
    properties: Properties,
    geometries: GeometryCache,
    objects: HashMap<ObjectId, RenderEntry>,
    objects_immediate: Vec<ImmediateEntry>,
    morph_influences: [f32; MAX_MORPH_TARGETS],
    settings: ObjectSettings,
    info: Rc<RefCell<RenderInfo>>,
    diagnostics: VecDeque<Diagnostic>,
    dropped_diagnostics: usize,
}

impl<D: GpuDevice> ObjectManager<D> {
    /// Creates a manager with default settings.
    pub fn new(device: D, info: Rc<RefCell<RenderInfo>>) -> ObjectManager<D> {
        Self::with_settings(device, info, ObjectSettings::default())
    }

    /// Creates a manager with custom settings.
    pub fn with_settings(
        device: D,
        info: Rc<RefCell<RenderInfo>>,
        settings: ObjectSettings,
    ) -> ObjectManager<D> {
        ObjectManager {
            device,
            properties: Properties::new(),
            geometries: GeometryCache::new(info.clone()),
            objects: HashMap::new(),
            objects_immediate: Vec::new(),
            morph_influences: [0.0; MAX_MORPH_TARGETS],
            settings,
            info,
            diagnostics: VecDeque::new(),
            dropped_diagnostics: 0,
        }
    }

    /// Registers an object.
    ///
    /// The first call allocates its record and derived matrices, then files
    /// the object in the registry (meshes, lines, point clouds) or in the
    /// immediate list. Further calls do nothing, even after [`clear`](Self::clear).
    pub fn init(&mut self, object: &SceneNode) {
        let id = object.id();
        let record = self.properties.object_entry(id);

        if !record.flags.contains(RecordFlags::INITIALIZED) {
            record.flags.insert(RecordFlags::INITIALIZED);
            record.model_view_matrix = Mat4::IDENTITY;
            record.normal_matrix = Mat3::IDENTITY;
        }

        if record.flags.contains(RecordFlags::ACTIVE) {
            return;
        }

        record.flags.insert(RecordFlags::ACTIVE);

        match object.kind() {
            kind if kind.uses_geometry() => {
                let _ = self.objects.insert(id, RenderEntry::new(object.clone()));
            }
            ObjectKind::Immediate => self
                .objects_immediate
                .push(ImmediateEntry::new(object.clone())),
            _ => {}
        }

        log::trace!("Registered {} ({:?})", id, object.kind());
    }

    /// Unregisters an object that left the scene, along with all its descendants.
    ///
    /// Registry entries, immediate entries and records are deleted. Geometry
    /// buffers stay alive; release them with [`dispose_geometry`](Self::dispose_geometry).
    pub fn on_removed(&mut self, object: &SceneNode) {
        object.traverse(&mut |node| self.remove_object(node));
    }

    fn remove_object(&mut self, object: &SceneNode) {
        let id = object.id();

        match object.kind() {
            kind if kind.uses_geometry() => {
                let _ = self.objects.remove(&id);
            }
            ObjectKind::Immediate => self
                .objects_immediate
                .retain(|entry| !entry.object.ptr_eq(object)),
            _ => {}
        }

        if self.properties.remove_object(id).is_some() {
            log::trace!("Unregistered {}", id);
        }
    }

    /// Refreshes the device state of every visible object of `render_list`.
    pub fn update(&mut self, render_list: &[RenderEntry]) {
        for entry in render_list {
            if entry.object.data().is_material_visible() {
                self.update_object(&entry.object);
            }
        }
    }

    fn update_object(&mut self, object: &SceneNode) {
        let data = object.data();
        let id = data.id();

        let registered = self
            .properties
            .object(id)
            .is_some_and(|r| r.flags.contains(RecordFlags::ACTIVE));

        if !registered {
            self.report(Diagnostic::NotRegistered { object: id });
            return;
        }

        let Some(geometry) = self.geometries.get(&data) else {
            self.report(Diagnostic::MissingGeometry { object: id });
            return;
        };

        if let Some(handle) = data.geometry().filter(|g| g.is_dynamic()) {
            if let GeometrySource::Mesh(ref mesh) = *handle.source() {
                if geometry
                    .borrow_mut()
                    .update_from_render_mesh(mesh, data.kind())
                {
                    log::trace!("{} changed since the last frame", handle.id());
                }
            }
        }

        if let Some(influences) = data.morph_target_influences() {
            self.update_morph_targets(id, influences, &geometry, data.material());
        }

        self.upload_geometry(&geometry.borrow());
    }

    fn update_morph_targets(
        &mut self,
        object: ObjectId,
        influences: &[f32],
        geometry: &Rc<RefCell<BufferGeometry>>,
        material: Option<&Rc<RefCell<Material>>>,
    ) {
        let selected = morph::select_influences(influences, self.settings.morph_slots());
        self.morph_influences = morph::pack_influences(&selected);

        let mut missing = Vec::new();
        {
            let mut geometry = geometry.borrow_mut();

            for (slot, &(_, target)) in selected.iter().enumerate() {
                match geometry.morph_attributes().get(target).cloned() {
                    Some(attribute) => {
                        let name = self.settings.morph_attribute_name(slot);
                        geometry.set_attribute(&name, attribute);
                    }
                    None => missing.push(target),
                }
            }
        }

        for target in missing {
            self.report(Diagnostic::MissingMorphAttribute { object, target });
        }

        let Some(program) = material.and_then(|m| m.borrow().program.clone()) else {
            self.report(Diagnostic::MissingProgram { object });
            return;
        };

        let uniform = &self.settings.morph_influences_uniform;
        match program.uniform_location(uniform) {
            Some(location) => self.device.uniform_1fv(&location, &self.morph_influences),
            None => {
                let uniform = uniform.clone();
                self.report(Diagnostic::MissingMorphUniform { object, uniform });
            }
        }
    }

    fn upload_geometry(&mut self, geometry: &BufferGeometry) {
        for (_, attribute) in geometry.attributes() {
            self.upload_attribute(attribute, BufferType::Array);
        }

        if let Some(index) = geometry.index() {
            self.upload_attribute(index, BufferType::ElementArray);
        }
    }

    fn upload_attribute(&mut self, attribute: &Attribute, kind: BufferType) {
        let key = attribute.resource_key();
        let source = attribute.buffer_source();
        let mut source = source.borrow_mut();

        let Some(mut record) = self.properties.buffer(key).copied() else {
            let handle = self.device.create_buffer();
            let usage = source.allocation_type();
            let data = source.array().as_bytes();
            let byte_len = data.len();

            self.device.bind_buffer(kind, handle);
            self.device.buffer_data(kind, data, usage);

            self.properties.insert_buffer(
                key,
                BufferRecord {
                    handle,
                    kind,
                    usage,
                    byte_len,
                },
            );
            source.set_needs_update(false);

            log::debug!("Created {} for {:?} ({} bytes)", handle, key, byte_len);
            return;
        };

        if !source.needs_update() {
            return;
        }

        let range = source.update_range();
        let mut diagnostic = None;

        self.device.bind_buffer(kind, record.handle);

        if range.is_whole() {
            let data = source.array().as_bytes();

            if data.len() == record.byte_len {
                self.device.buffer_sub_data(kind, 0, data);
            } else {
                // The size changed: the buffer must be reallocated.
                record.usage = source.allocation_type();
                record.byte_len = data.len();
                self.device.buffer_data(kind, data, record.usage);

                if let Some(r) = self.properties.buffer_mut(key) {
                    *r = record;
                }
            }
        } else if range.is_empty() {
            diagnostic = Some(Diagnostic::EmptyUpdateRange { key });
        } else {
            let array = source.array();
            let byte_offset = range
                .offset
                .saturating_mul(array.bytes_per_element())
                .min(array.as_bytes().len()) as u64;
            let data = array.byte_range(range.offset, range.count as usize);

            self.device.buffer_sub_data(kind, byte_offset, data);
            source.update_range_mut().count = 0;
        }

        source.set_needs_update(false);
        drop(source);

        if let Some(diagnostic) = diagnostic {
            self.report(diagnostic);
        }
    }

    /// The device buffer holding an attribute, if it has been uploaded.
    ///
    /// Interleaved attributes resolve to the buffer of their interleaved data.
    pub fn get_attribute_buffer(&self, attribute: &Attribute) -> Option<BufferHandle> {
        self.properties
            .buffer(attribute.resource_key())
            .map(|r| r.handle)
    }

    /// Empties the registry and the immediate list.
    ///
    /// Object records are kept: objects registered before stay marked as
    /// such and are not filed again by [`init`](Self::init).
    pub fn clear(&mut self) {
        self.objects.clear();
        self.objects_immediate.clear();
    }

    /// Releases the device buffers of a geometry and drops it from the cache.
    ///
    /// Returns `false` if the geometry was not cached.
    pub fn dispose_geometry(&mut self, geometry: &Geometry) -> bool {
        self.geometries
            .dispose(geometry.id(), &mut self.device, &mut self.properties)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_usage_error() {
            log::error!("{}", diagnostic);
        } else {
            log::warn!("{}", diagnostic);
        }

        let capacity = self.settings.max_diagnostics;
        if capacity == 0 {
            self.dropped_diagnostics += 1;
            return;
        }

        while self.diagnostics.len() >= capacity {
            let _ = self.diagnostics.pop_front();
            self.dropped_diagnostics += 1;
        }

        self.diagnostics.push_back(diagnostic);
    }

    /// The registered meshes, lines and point clouds.
    #[inline]
    pub fn objects(&self) -> &HashMap<ObjectId, RenderEntry> {
        &self.objects
    }

    /// The registered meshes, lines and point clouds.
    #[inline]
    pub fn objects_mut(&mut self) -> &mut HashMap<ObjectId, RenderEntry> {
        &mut self.objects
    }

    /// The registered immediate objects.
    #[inline]
    pub fn immediate_objects(&self) -> &[ImmediateEntry] {
        &self.objects_immediate
    }

    /// The registered immediate objects.
    #[inline]
    pub fn immediate_objects_mut(&mut self) -> &mut Vec<ImmediateEntry> {
        &mut self.objects_immediate
    }

    /// The record of an object, if registered.
    #[inline]
    pub fn object_record(&self, id: ObjectId) -> Option<&ObjectRecord> {
        self.properties.object(id)
    }

    /// The record of an object, if registered.
    #[inline]
    pub fn object_record_mut(&mut self, id: ObjectId) -> Option<&mut ObjectRecord> {
        self.properties.object_mut(id)
    }

    /// The resource side-table.
    #[inline]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// The geometry cache.
    #[inline]
    pub fn geometries(&self) -> &GeometryCache {
        &self.geometries
    }

    /// The shared renderer statistics.
    #[inline]
    pub fn info(&self) -> &Rc<RefCell<RenderInfo>> {
        &self.info
    }

    /// Weights written by the last morph refresh.
    #[inline]
    pub fn morph_influences(&self) -> &[f32; MAX_MORPH_TARGETS] {
        &self.morph_influences
    }

    /// The device.
    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The device.
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// The settings.
    #[inline]
    pub fn settings(&self) -> &ObjectSettings {
        &self.settings
    }

    /// Diagnostics raised since the last drain, oldest first.
    ///
    /// At most [`ObjectSettings::max_diagnostics`] are kept; older ones are
    /// dropped first.
    #[inline]
    pub fn diagnostics(&self) -> &VecDeque<Diagnostic> {
        &self.diagnostics
    }

    /// Number of diagnostics dropped because the queue was full.
    #[inline]
    pub fn dropped_diagnostics(&self) -> usize {
        self.dropped_diagnostics
    }

    /// Drains the diagnostics raised so far and resets the dropped count.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.dropped_diagnostics = 0;
        self.diagnostics.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DeviceCall, HeadlessDevice};
    use crate::geometry::POSITION;
    use crate::resource::BufferAttribute;

    fn manager() -> ObjectManager<HeadlessDevice> {
        ObjectManager::new(HeadlessDevice::new(), Rc::new(RefCell::new(RenderInfo::default())))
    }

    fn triangle() -> (SceneNode, Attribute) {
        let position: Attribute =
            BufferAttribute::new(vec![0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], 3)
                .unwrap()
                .into();
        let mut geometry = BufferGeometry::new();
        geometry.set_attribute(POSITION, position.clone());

        let node = SceneNode::mesh(Geometry::from_buffer_geometry(geometry), Material::new().shared());
        (node, position)
    }

    #[test]
    fn init_files_meshes_and_immediates_separately() {
        let mut manager = manager();
        let (mesh, _) = triangle();
        let immediate = SceneNode::immediate(Material::new().shared());
        let group = SceneNode::group();

        manager.init(&mesh);
        manager.init(&immediate);
        manager.init(&group);

        assert_eq!(manager.objects().len(), 1);
        assert!(manager.objects().contains_key(&mesh.id()));
        assert_eq!(manager.immediate_objects().len(), 1);
        assert!(manager.immediate_objects()[0].id.is_none());

        let record = manager.object_record(group.id()).unwrap();
        assert!(record.flags.contains(RecordFlags::INITIALIZED | RecordFlags::ACTIVE));
    }

    #[test]
    fn first_update_creates_then_later_updates_are_silent() {
        let mut manager = manager();
        let (mesh, position) = triangle();
        manager.init(&mesh);

        let list: Vec<RenderEntry> = manager.objects().values().cloned().collect();
        manager.update(&list);

        let handle = manager.get_attribute_buffer(&position).unwrap();
        assert_eq!(manager.device().upload_count(), 1);
        assert_eq!(manager.device().contents(handle).unwrap().len(), 36);

        manager.device_mut().clear_calls();
        manager.update(&list);
        assert!(manager.device().calls().is_empty());
    }

    #[test]
    fn growing_array_reallocates() {
        let mut manager = manager();
        let (mesh, position) = triangle();
        manager.init(&mesh);
        let list: Vec<RenderEntry> = manager.objects().values().cloned().collect();
        manager.update(&list);
        manager.device_mut().clear_calls();

        if let Attribute::Plain(attribute) = &position {
            attribute
                .borrow_mut()
                .replace_array(vec![0.0f32; 12])
                .unwrap();
        }
        manager.update(&list);

        let handle = manager.get_attribute_buffer(&position).unwrap();
        assert!(matches!(
            manager.device().calls().last(),
            Some(DeviceCall::BufferData { data, .. }) if data.len() == 48
        ));
        assert_eq!(manager.properties().buffer(position.resource_key()).unwrap().byte_len, 48);
        assert_eq!(manager.device().contents(handle).unwrap().len(), 48);
    }

    #[test]
    fn unregistered_objects_are_skipped() {
        let mut manager = manager();
        let (mesh, position) = triangle();

        manager.update(&[RenderEntry::new(mesh.clone())]);

        assert!(manager.get_attribute_buffer(&position).is_none());
        assert_eq!(
            manager.take_diagnostics(),
            vec![Diagnostic::NotRegistered { object: mesh.id() }]
        );
        assert!(manager.diagnostics().is_empty());
    }
}
