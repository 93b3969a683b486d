//! Geometry descriptions and their GPU-ready form.

pub use self::buffer_geometry::{BufferGeometry, NORMAL, POSITION, UV};
pub use self::geometry::{Geometry, GeometryData, GeometrySource};
pub use self::render_mesh::{IndexBuffer, RenderMesh};

mod buffer_geometry;
mod geometry;
mod render_mesh;
