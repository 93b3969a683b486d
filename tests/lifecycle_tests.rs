//! Object and Geometry Lifecycle Tests
//!
//! Tests for:
//! - Registration (idempotent init, registry vs immediate list)
//! - Removal cascading through the scene graph
//! - Visibility filtering
//! - Geometry caching and disposal accounting
//! - Dynamic mesh descriptions
//! - Morph target selection and binding

use std::cell::RefCell;
use std::rc::Rc;

use geobuf::context::{BufferHandle, DeviceCall, HeadlessDevice, UniformLocation};
use geobuf::geometry::{BufferGeometry, Geometry, RenderMesh, NORMAL, POSITION, UV};
use geobuf::glamx::{Vec2, Vec3};
use geobuf::renderer::{
    Diagnostic, ObjectManager, ObjectSettings, RecordFlags, RenderEntry, RenderInfo,
};
use geobuf::resource::{
    Attribute, BufferAttribute, InterleavedBuffer, InterleavedBufferAttribute,
};
use geobuf::scene::{Material, SceneNode, UniformTable};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn manager() -> (ObjectManager<HeadlessDevice>, Rc<RefCell<RenderInfo>>) {
    init_logger();
    let info = Rc::new(RefCell::new(RenderInfo::default()));
    (ObjectManager::new(HeadlessDevice::new(), info.clone()), info)
}

fn render_list(manager: &ObjectManager<HeadlessDevice>) -> Vec<RenderEntry> {
    manager.objects().values().cloned().collect()
}

fn f32_attribute(array: Vec<f32>, item_size: usize) -> Attribute {
    Attribute::plain(BufferAttribute::new(array, item_size).unwrap())
}

fn triangle_geometry() -> BufferGeometry {
    let mut geometry = BufferGeometry::new();
    geometry.set_attribute(POSITION, f32_attribute(vec![0.0; 9], 3));
    geometry.set_attribute(NORMAL, f32_attribute(vec![0.0, 0.0, 1.0].repeat(3), 3));
    geometry
}

fn triangle() -> SceneNode {
    SceneNode::mesh(
        Geometry::from_buffer_geometry(triangle_geometry()),
        Material::new().shared(),
    )
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn init_twice_registers_once() {
    let (mut manager, _) = manager();
    let mesh = triangle();
    let immediate = SceneNode::immediate(Material::new().shared());

    manager.init(&mesh);
    manager.init(&mesh);
    manager.init(&immediate);
    manager.init(&immediate);

    assert_eq!(manager.objects().len(), 1);
    assert_eq!(manager.immediate_objects().len(), 1);
}

#[test]
fn lines_and_points_are_registered_like_meshes() {
    let (mut manager, _) = manager();
    let line = SceneNode::line(
        Geometry::from_buffer_geometry(triangle_geometry()),
        Material::new().shared(),
    );
    let points = SceneNode::point_cloud(
        Geometry::from_buffer_geometry(triangle_geometry()),
        Material::new().shared(),
    );

    manager.init(&line);
    manager.init(&points);

    assert!(manager.objects().contains_key(&line.id()));
    assert!(manager.objects().contains_key(&points.id()));
    assert!(manager.immediate_objects().is_empty());
}

#[test]
fn clear_keeps_records() {
    let (mut manager, _) = manager();
    let mesh = triangle();

    manager.init(&mesh);
    manager.clear();

    assert!(manager.objects().is_empty());
    let record = manager.object_record(mesh.id()).unwrap();
    assert!(record.flags.contains(RecordFlags::ACTIVE));

    // Already marked active: not filed again.
    manager.init(&mesh);
    assert!(manager.objects().is_empty());
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn removing_a_subtree_unregisters_every_descendant() {
    let (mut manager, _) = manager();
    let mut root = SceneNode::group();
    let mut inner = root.add_group();
    let a = triangle();
    let b = triangle();
    let c = SceneNode::immediate(Material::new().shared());
    root.add_child(a.clone());
    inner.add_child(b.clone());
    inner.add_child(c.clone());

    let mut all = Vec::new();
    root.traverse(&mut |node| all.push(node.clone()));
    for node in &all {
        manager.init(node);
    }
    assert_eq!(manager.objects().len(), 2);
    assert_eq!(manager.immediate_objects().len(), 1);

    root.detach();
    manager.on_removed(&root);

    assert!(manager.objects().is_empty());
    assert!(manager.immediate_objects().is_empty());
    for node in &all {
        assert!(manager.object_record(node.id()).is_none());
    }
    assert_eq!(manager.properties().num_objects(), 0);
}

#[test]
fn removing_a_child_keeps_its_siblings() {
    let (mut manager, _) = manager();
    let mut root = SceneNode::group();
    let mut a = triangle();
    let b = triangle();
    root.add_child(a.clone());
    root.add_child(b.clone());

    manager.init(&root);
    manager.init(&a);
    manager.init(&b);

    a.detach();
    manager.on_removed(&a);

    assert!(!manager.objects().contains_key(&a.id()));
    assert!(manager.objects().contains_key(&b.id()));
    assert!(manager.object_record(root.id()).is_some());
}

#[test]
fn removed_objects_are_not_refreshed() {
    let (mut manager, _) = manager();
    let mesh = triangle();

    manager.init(&mesh);
    let stale = render_list(&manager);
    manager.on_removed(&mesh);
    manager.update(&stale);

    assert_eq!(manager.device().live_buffers(), 0);
    assert_eq!(
        manager.take_diagnostics(),
        vec![Diagnostic::NotRegistered { object: mesh.id() }]
    );
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn invisible_objects_are_skipped() {
    let (mut manager, info) = manager();
    let material = Material::new().shared();
    material.borrow_mut().visible = false;
    let mesh = SceneNode::mesh(
        Geometry::from_buffer_geometry(triangle_geometry()),
        material.clone(),
    );

    manager.init(&mesh);
    let list = render_list(&manager);
    manager.update(&list);

    assert!(manager.device().calls().is_empty());
    assert_eq!(info.borrow().memory.geometries, 0);

    material.borrow_mut().visible = true;
    manager.update(&list);
    assert_eq!(manager.device().live_buffers(), 2);
}

#[test]
fn objects_without_material_are_visible() {
    let (mut manager, _) = manager();
    let geometry = Geometry::from_buffer_geometry(triangle_geometry());
    let mesh = SceneNode::new(geobuf::scene::ObjectKind::Mesh, Some(geometry), None);

    manager.init(&mesh);
    manager.update(&render_list(&manager));

    assert_eq!(manager.device().live_buffers(), 2);
}

// ============================================================================
// Geometry cache and disposal
// ============================================================================

#[test]
fn shared_geometry_is_cached_once() {
    let (mut manager, info) = manager();
    let geometry = Geometry::from_buffer_geometry(triangle_geometry());
    let a = SceneNode::mesh(geometry.clone(), Material::new().shared());
    let b = SceneNode::mesh(geometry.clone(), Material::new().shared());

    manager.init(&a);
    manager.init(&b);
    manager.update(&render_list(&manager));

    assert_eq!(info.borrow().memory.geometries, 1);
    assert_eq!(manager.geometries().len(), 1);
    assert_eq!(manager.device().live_buffers(), 2);
}

#[test]
fn disposal_releases_each_buffer_exactly_once() {
    let (mut manager, info) = manager();
    let geometry = Geometry::from_buffer_geometry(triangle_geometry());
    let mesh = SceneNode::mesh(geometry.clone(), Material::new().shared());

    manager.init(&mesh);
    manager.update(&render_list(&manager));
    assert_eq!(info.borrow().memory.geometries, 1);
    manager.device_mut().clear_calls();

    assert!(manager.dispose_geometry(&geometry));
    let deleted: Vec<BufferHandle> = manager
        .device()
        .calls()
        .iter()
        .filter_map(|c| match c {
            DeviceCall::DeleteBuffer(h) => Some(*h),
            _ => None,
        })
        .collect();
    assert_eq!(deleted.len(), 2);
    assert_ne!(deleted[0], deleted[1]);
    assert_eq!(manager.device().live_buffers(), 0);
    assert_eq!(info.borrow().memory.geometries, 0);
    assert_eq!(manager.properties().num_buffers(), 0);

    // A second disposal is a no-op.
    manager.device_mut().clear_calls();
    assert!(!manager.dispose_geometry(&geometry));
    assert!(manager.device().calls().is_empty());
    assert_eq!(info.borrow().memory.geometries, 0);
}

#[test]
fn disposing_interleaved_views_deletes_the_shared_buffer_once() {
    let (mut manager, info) = manager();
    let data = Rc::new(RefCell::new(
        InterleavedBuffer::new(vec![0.0f32; 18], 6, false).unwrap(),
    ));
    let position: Attribute = InterleavedBufferAttribute::new(data.clone(), 3, 0).into();
    let normal: Attribute = InterleavedBufferAttribute::new(data.clone(), 3, 3).into();
    let index = Attribute::plain(BufferAttribute::new(vec![0u32, 1, 2], 1).unwrap());

    let mut buffer_geometry = BufferGeometry::new();
    buffer_geometry.set_attribute(POSITION, position.clone());
    buffer_geometry.set_attribute(NORMAL, normal);
    buffer_geometry.set_index(Some(index.clone()));
    let geometry = Geometry::from_buffer_geometry(buffer_geometry);
    let mesh = SceneNode::mesh(geometry.clone(), Material::new().shared());

    manager.init(&mesh);
    manager.update(&render_list(&manager));
    let shared = manager.get_attribute_buffer(&position).unwrap();
    let index_buffer = manager.get_attribute_buffer(&index).unwrap();
    assert_eq!(manager.device().live_buffers(), 2);
    manager.device_mut().clear_calls();

    assert!(manager.dispose_geometry(&geometry));

    let deletes = |handle: BufferHandle| {
        manager
            .device()
            .calls()
            .iter()
            .filter(|c| **c == DeviceCall::DeleteBuffer(handle))
            .count()
    };
    assert_eq!(deletes(shared), 1);
    assert_eq!(deletes(index_buffer), 1);
    assert_eq!(manager.device().calls().len(), 2);
    assert_eq!(manager.device().live_buffers(), 0);
    assert_eq!(manager.properties().num_buffers(), 0);
    assert_eq!(info.borrow().memory.geometries, 0);
}

#[test]
fn disposed_geometry_is_rebuilt_on_next_use() {
    let (mut manager, info) = manager();
    let geometry = Geometry::from_buffer_geometry(triangle_geometry());
    let mesh = SceneNode::mesh(geometry.clone(), Material::new().shared());

    manager.init(&mesh);
    let list = render_list(&manager);
    manager.update(&list);
    assert!(manager.dispose_geometry(&geometry));

    manager.update(&list);
    assert_eq!(info.borrow().memory.geometries, 1);
    assert_eq!(manager.device().live_buffers(), 2);
}

#[test]
fn disposing_an_unused_geometry_does_nothing() {
    let (mut manager, info) = manager();
    let geometry = Geometry::from_buffer_geometry(triangle_geometry());

    assert!(!manager.dispose_geometry(&geometry));
    assert!(manager.device().calls().is_empty());
    assert_eq!(info.borrow().memory.geometries, 0);
}

#[test]
fn missing_geometry_is_reported() {
    let (mut manager, _) = manager();
    let mesh = triangle();
    mesh.set_geometry(None);

    manager.init(&mesh);
    manager.update(&render_list(&manager));

    assert_eq!(
        manager.take_diagnostics(),
        vec![Diagnostic::MissingGeometry { object: mesh.id() }]
    );
}

// ============================================================================
// Mesh descriptions
// ============================================================================

fn quad_mesh() -> RenderMesh {
    RenderMesh::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        Some(vec![Vec3::Z; 6]),
        Some(vec![Vec2::ZERO; 6]),
        None,
    )
}

#[test]
fn mesh_descriptions_are_converted_once() {
    let (mut manager, info) = manager();
    let geometry = Geometry::from_render_mesh(quad_mesh());
    let mesh = SceneNode::mesh(geometry.clone(), Material::new().shared());

    manager.init(&mesh);
    let list = render_list(&manager);
    manager.update(&list);
    manager.update(&list);

    let cached = manager.geometries().cached(geometry.id()).unwrap().clone();
    let cached = cached.borrow();
    assert!(cached.attribute(POSITION).is_some());
    assert!(cached.attribute(NORMAL).is_some());
    assert!(cached.attribute(UV).is_some());
    assert!(cached.index().is_some());

    assert_eq!(info.borrow().memory.geometries, 1);
    // position, normal, uv and index.
    assert_eq!(manager.device().upload_count(), 4);
}

#[test]
fn lines_do_not_get_uvs_or_index() {
    let (mut manager, _) = manager();
    let geometry = Geometry::from_render_mesh(quad_mesh());
    let line = SceneNode::line(geometry.clone(), Material::new().shared());

    manager.init(&line);
    manager.update(&render_list(&manager));

    let cached = manager.geometries().cached(geometry.id()).unwrap().clone();
    let cached = cached.borrow();
    assert!(cached.attribute(UV).is_none());
    assert!(cached.index().is_none());
    assert_eq!(manager.device().live_buffers(), 2);
}

#[test]
fn dynamic_meshes_reupload_what_changed() {
    let (mut manager, _) = manager();
    let geometry = Geometry::from_render_mesh(quad_mesh());
    geometry.set_dynamic(true);
    let mesh = SceneNode::mesh(geometry.clone(), Material::new().shared());

    manager.init(&mesh);
    let list = render_list(&manager);
    manager.update(&list);
    manager.device_mut().clear_calls();

    // Unchanged: nothing to do.
    manager.update(&list);
    assert_eq!(manager.device().upload_count(), 0);

    let _ = geometry.modify_render_mesh(|m| m.coords[5] = Vec3::new(0.0, 2.0, 0.0));
    manager.update(&list);

    let cached = manager.geometries().cached(geometry.id()).unwrap().clone();
    let position = cached.borrow().attribute(POSITION).cloned().unwrap();
    let handle = manager.get_attribute_buffer(&position).unwrap();

    let uploads: Vec<&DeviceCall> = manager
        .device()
        .calls()
        .iter()
        .filter(|c| c.is_upload())
        .collect();
    assert_eq!(uploads.len(), 1);
    assert!(matches!(
        uploads[0],
        DeviceCall::BufferSubData { handle: h, byte_offset: 0, .. } if *h == handle
    ));
    assert_eq!(
        &manager.device().contents(handle).unwrap()[64..68],
        &2.0f32.to_ne_bytes()
    );
}

#[test]
fn static_meshes_ignore_description_changes() {
    let (mut manager, _) = manager();
    let geometry = Geometry::from_render_mesh(quad_mesh());
    let mesh = SceneNode::mesh(geometry.clone(), Material::new().shared());

    manager.init(&mesh);
    let list = render_list(&manager);
    manager.update(&list);
    manager.device_mut().clear_calls();

    let _ = geometry.modify_render_mesh(|m| m.coords[5] = Vec3::new(0.0, 2.0, 0.0));
    manager.update(&list);

    assert_eq!(manager.device().upload_count(), 0);
}

// ============================================================================
// Morph targets
// ============================================================================

const INFLUENCES: [f32; 10] = [0.1, 0.9, 0.3, 0.05, 0.9, 0.2, 0.4, 0.6, 0.8, 0.15];

fn morph_location() -> UniformLocation {
    UniformLocation {
        buffer: BufferHandle(1000),
        byte_offset: 64,
    }
}

fn morphing(material: Material) -> (SceneNode, Rc<RefCell<BufferGeometry>>) {
    let mut geometry = triangle_geometry();
    geometry.set_morph_attributes(
        (0..INFLUENCES.len())
            .map(|i| f32_attribute(vec![i as f32; 9], 3))
            .collect(),
    );

    let shared = Rc::new(RefCell::new(geometry));
    let node = SceneNode::mesh(
        Geometry::from_shared_buffer_geometry(shared.clone()),
        material.shared(),
    );
    node.set_morph_target_influences(Some(INFLUENCES.to_vec()));
    (node, shared)
}

#[test]
fn strongest_morph_targets_are_bound() {
    let (mut manager, _) = manager();
    let program = UniformTable::new().with_uniform("morphTargetInfluences", morph_location());
    let (node, geometry) = morphing(Material::with_program(Rc::new(program)));

    manager.init(&node);
    manager.update(&render_list(&manager));

    let expected = [0.9, 0.9, 0.8, 0.6, 0.4, 0.3, 0.2, 0.15];
    assert_eq!(manager.morph_influences(), &expected);
    assert_eq!(manager.device().uniform(&morph_location()), Some(&expected[..]));

    let geometry = geometry.borrow();
    let targets = [1, 4, 8, 7, 6, 2, 5, 9];
    for (slot, target) in targets.iter().enumerate() {
        let bound = geometry.attribute(&format!("morphTarget{slot}")).unwrap();
        assert_eq!(
            bound.resource_key(),
            geometry.morph_attributes()[*target].resource_key()
        );
        assert!(manager.get_attribute_buffer(bound).is_some());
    }

    // The two weakest targets never reach the device.
    assert!(manager
        .get_attribute_buffer(&geometry.morph_attributes()[0])
        .is_none());
    assert!(manager
        .get_attribute_buffer(&geometry.morph_attributes()[3])
        .is_none());
    assert!(manager.take_diagnostics().is_empty());
}

#[test]
fn morph_attributes_are_released_with_the_geometry() {
    let (mut manager, _) = manager();
    let program = UniformTable::new().with_uniform("morphTargetInfluences", morph_location());
    let (node, _) = morphing(Material::with_program(Rc::new(program)));

    manager.init(&node);
    manager.update(&render_list(&manager));
    // position, normal and eight morph slots.
    assert_eq!(manager.device().live_buffers(), 10);

    let geometry = node.geometry().unwrap();
    assert!(manager.dispose_geometry(&geometry));
    assert_eq!(manager.device().live_buffers(), 0);
}

#[test]
fn missing_program_is_reported() {
    let (mut manager, _) = manager();
    let (node, _) = morphing(Material::new());

    manager.init(&node);
    manager.update(&render_list(&manager));

    assert_eq!(
        manager.take_diagnostics(),
        vec![Diagnostic::MissingProgram { object: node.id() }]
    );
    // Buffers are still refreshed.
    assert_eq!(manager.device().live_buffers(), 10);
}

#[test]
fn undrained_diagnostics_are_bounded() {
    init_logger();
    let info = Rc::new(RefCell::new(RenderInfo::default()));
    let settings = ObjectSettings {
        max_diagnostics: 4,
        ..Default::default()
    };
    let mut manager = ObjectManager::with_settings(HeadlessDevice::new(), info, settings);

    // No program and no morph attributes: two diagnostics per frame.
    let mesh = triangle();
    mesh.set_morph_target_influences(Some(vec![0.5]));
    manager.init(&mesh);
    let list = render_list(&manager);

    for _ in 0..1000 {
        manager.update(&list);
    }

    assert_eq!(manager.diagnostics().len(), 4);
    assert_eq!(manager.dropped_diagnostics(), 1996);
    assert_eq!(
        manager.diagnostics().back(),
        Some(&Diagnostic::MissingProgram { object: mesh.id() })
    );

    assert_eq!(manager.take_diagnostics().len(), 4);
    assert_eq!(manager.dropped_diagnostics(), 0);
    assert!(manager.diagnostics().is_empty());
}

#[test]
fn missing_uniform_is_reported() {
    let (mut manager, _) = manager();
    let (node, _) = morphing(Material::with_program(Rc::new(UniformTable::new())));

    manager.init(&node);
    manager.update(&render_list(&manager));

    assert_eq!(
        manager.take_diagnostics(),
        vec![Diagnostic::MissingMorphUniform {
            object: node.id(),
            uniform: "morphTargetInfluences".to_string(),
        }]
    );
    assert!(!manager
        .device()
        .calls()
        .iter()
        .any(|c| matches!(c, DeviceCall::Uniform1fv(..))));
}
