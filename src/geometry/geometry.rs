//! User-facing geometry handle.

use crate::geometry::{BufferGeometry, RenderMesh};
use crate::ids::GeometryId;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// Where a geometry's data comes from.
#[derive(Clone, Debug)]
pub enum GeometrySource {
    /// Data already in GPU-ready form; cached as-is.
    Buffer(Rc<RefCell<BufferGeometry>>),
    /// A mesh description converted once into a [`BufferGeometry`] by the cache.
    Mesh(RenderMesh),
}

/// The data behind a [`Geometry`] handle.
#[derive(Debug)]
pub struct GeometryData {
    id: GeometryId,
    source: GeometrySource,
    dynamic: bool,
}

/// A shared geometry.
///
/// Cloning the handle does not copy the geometry: all clones share the same
/// [`GeometryId`] and therefore the same cache entry and device buffers.
#[derive(Clone, Debug)]
pub struct Geometry {
    data: Rc<RefCell<GeometryData>>,
}

impl Geometry {
    fn with_source(source: GeometrySource) -> Geometry {
        Geometry {
            data: Rc::new(RefCell::new(GeometryData {
                id: GeometryId::next(),
                source,
                dynamic: false,
            })),
        }
    }

    /// A geometry already in buffer form.
    pub fn from_buffer_geometry(geometry: BufferGeometry) -> Geometry {
        Self::with_source(GeometrySource::Buffer(Rc::new(RefCell::new(geometry))))
    }

    /// A geometry sharing an existing buffer geometry.
    pub fn from_shared_buffer_geometry(geometry: Rc<RefCell<BufferGeometry>>) -> Geometry {
        Self::with_source(GeometrySource::Buffer(geometry))
    }

    /// A geometry described by a mesh, converted on first use.
    pub fn from_render_mesh(mesh: RenderMesh) -> Geometry {
        Self::with_source(GeometrySource::Mesh(mesh))
    }

    /// The cache key of this geometry.
    #[inline]
    pub fn id(&self) -> GeometryId {
        self.data.borrow().id
    }

    /// Whether the data is already in buffer form.
    pub fn is_buffer_geometry(&self) -> bool {
        matches!(self.data.borrow().source, GeometrySource::Buffer(_))
    }

    /// Whether buffer data is re-derived from the source mesh on every refresh.
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.data.borrow().dynamic
    }

    /// Enables or disables re-derivation on every refresh.
    pub fn set_dynamic(&self, dynamic: bool) -> &Self {
        self.data.borrow_mut().dynamic = dynamic;
        self
    }

    /// The data source.
    pub fn source(&self) -> Ref<'_, GeometrySource> {
        Ref::map(self.data.borrow(), |d| &d.source)
    }

    /// Replaces the source mesh description.
    ///
    /// Only meaningful for dynamic geometries: the new mesh is picked up at
    /// the next refresh. Returns `false` (and changes nothing) for buffer geometries.
    pub fn set_render_mesh(&self, mesh: RenderMesh) -> bool {
        let mut data = self.data.borrow_mut();
        match data.source {
            GeometrySource::Mesh(ref mut current) => {
                *current = mesh;
                true
            }
            GeometrySource::Buffer(_) => false,
        }
    }

    /// Applies `f` to the source mesh description, if there is one.
    pub fn modify_render_mesh<T, F: FnOnce(&mut RenderMesh) -> T>(&self, f: F) -> Option<T> {
        let mut data = self.data.borrow_mut();
        match data.source {
            GeometrySource::Mesh(ref mut mesh) => Some(f(mesh)),
            GeometrySource::Buffer(_) => None,
        }
    }

    /// Whether both handles refer to the same geometry.
    #[inline]
    pub fn ptr_eq(&self, other: &Geometry) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl From<BufferGeometry> for Geometry {
    fn from(geometry: BufferGeometry) -> Self {
        Geometry::from_buffer_geometry(geometry)
    }
}

impl From<RenderMesh> for Geometry {
    fn from(mesh: RenderMesh) -> Self {
        Geometry::from_render_mesh(mesh)
    }
}
