/*!
# Geobuf

Geometry caching and GPU buffer lifecycle for retained-mode 3D scenes.

A scene is made of [`SceneNode`](scene::SceneNode)s drawing a
[`Geometry`](geometry::Geometry). Before a frame is drawn, every geometry must
have its attributes living in device buffers, and only the data that changed
since the last frame should be transferred. This crate does exactly that and
nothing more:

* the [`GeometryCache`](renderer::GeometryCache) converts each geometry to its
  buffer form once and releases its device buffers on disposal.
* the [`ObjectManager`](renderer::ObjectManager) registers scene objects,
  creates device buffers lazily, re-uploads dirty attributes (whole or by
  sub-range), binds the strongest morph targets and forgets objects removed
  from the scene.
* device access goes through the [`GpuDevice`](context::GpuDevice) trait, with
  a [`wgpu`](https://docs.rs/wgpu/) backend and an in-memory backend that
  records every call.

Refreshing a triangle is as simple as:

```
use geobuf::prelude::*;

let position = BufferAttribute::new(vec![0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], 3)?;
let position = Attribute::from(position);

let mut geometry = BufferGeometry::new();
geometry.set_attribute(POSITION, position.clone());

let triangle = SceneNode::mesh(
    Geometry::from_buffer_geometry(geometry),
    Material::new().shared(),
);

let info = Rc::new(RefCell::new(RenderInfo::default()));
let mut objects = ObjectManager::new(HeadlessDevice::new(), info.clone());
objects.init(&triangle);

let render_list: Vec<RenderEntry> = objects.objects().values().cloned().collect();
objects.update(&render_list);

assert!(objects.get_attribute_buffer(&position).is_some());
assert_eq!(info.borrow().memory.geometries, 1);
# Ok::<(), geobuf::error::BufferError>(())
```

Data changes are signaled by marking an attribute as needing an update. When
only a part of it changed, narrowing its
[`UpdateRange`](resource::UpdateRange) restricts the next transfer to that
part.
*/
#![allow(missing_copy_implementations)]
#![allow(clippy::module_inception)]
#![allow(clippy::type_complexity)]

#[cfg(feature = "serde")]
extern crate serde;

pub use glamx;

pub mod context;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod renderer;
pub mod resource;
pub mod scene;

pub mod prelude {
    pub use crate::context::*;
    pub use crate::error::BufferError;
    pub use crate::geometry::*;
    pub use crate::ids::*;
    pub use crate::renderer::*;
    pub use crate::resource::*;
    pub use crate::scene::*;
    pub use glamx::{Mat3, Mat4, Vec2, Vec3};
    pub use std::cell::RefCell;
    pub use std::rc::Rc;
}
