use glamx::{Vec2, Vec3};
use std::collections::HashMap;

/// Different representations of the index buffer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexBuffer {
    /// The vertex, normal, and uvs share the same indices.
    Unified(Vec<[u32; 3]>),
    /// The vertex, normal, and uvs have different indices.
    /// Each element is [[vertex_idx, normal_idx, uv_idx]; 3] for the 3 corners.
    Split(Vec<[[u32; 3]; 3]>),
}

/// Geometric description of a mesh, not yet in GPU-ready form.
///
/// Split index buffers must be unified before the data can be uploaded; see
/// [`RenderMesh::unify_index_buffer`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderMesh {
    /// Coordinates of the mesh vertices.
    pub coords: Vec<Vec3>,
    /// Coordinates of the mesh normals.
    pub normals: Option<Vec<Vec3>>,
    /// Textures coordinates of the mesh.
    pub uvs: Option<Vec<Vec2>>,
    /// Index buffer of the mesh.
    pub indices: IndexBuffer,
}

impl RenderMesh {
    /// Creates a new mesh description.
    ///
    /// If no `indices` is provided, trivial, sequential indices are generated.
    pub fn new(
        coords: Vec<Vec3>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<Vec2>>,
        indices: Option<IndexBuffer>,
    ) -> RenderMesh {
        let indices = indices.unwrap_or_else(|| {
            IndexBuffer::Unified(
                (0..coords.len() as u32 / 3)
                    .map(|i| [i * 3, i * 3 + 1, i * 3 + 2])
                    .collect(),
            )
        });

        RenderMesh {
            coords,
            normals,
            uvs,
            indices,
        }
    }

    /// The number of triangles on this mesh.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        match self.indices {
            IndexBuffer::Unified(ref idx) => idx.len(),
            IndexBuffer::Split(ref idx) => idx.len(),
        }
    }

    /// Returns only the vertex ids from the index buffer.
    pub fn flat_indices(&self) -> Vec<u32> {
        match self.indices {
            IndexBuffer::Unified(ref idx) => idx.iter().flatten().copied().collect(),
            IndexBuffer::Split(ref idx) => idx
                .iter()
                .flat_map(|t| [t[0][0], t[1][0], t[2][0]])
                .collect(),
        }
    }

    /// Force the mesh to use the same index for vertices, normals and uvs.
    ///
    /// Corners sharing the same (vertex, normal, uv) triple are merged, others
    /// are duplicated. Does nothing if the index buffer is already unified.
    pub fn unify_index_buffer(&mut self) {
        let IndexBuffer::Split(ref triangles) = self.indices else {
            return;
        };

        let mut corner_ids: HashMap<[u32; 3], u32> = HashMap::new();
        let mut coords = Vec::new();
        let mut normals = self.normals.as_ref().map(|_| Vec::new());
        let mut uvs = self.uvs.as_ref().map(|_| Vec::new());
        let mut unified = Vec::with_capacity(triangles.len());

        for triangle in triangles {
            let mut face = [0u32; 3];

            for (corner, point) in face.iter_mut().zip(triangle.iter()) {
                *corner = *corner_ids.entry(*point).or_insert_with(|| {
                    coords.push(self.coords[point[0] as usize]);
                    if let (Some(dst), Some(src)) = (normals.as_mut(), self.normals.as_ref()) {
                        dst.push(src[point[1] as usize]);
                    }
                    if let (Some(dst), Some(src)) = (uvs.as_mut(), self.uvs.as_ref()) {
                        dst.push(src[point[2] as usize]);
                    }
                    coords.len() as u32 - 1
                });
            }

            unified.push(face);
        }

        self.coords = coords;
        self.normals = normals;
        self.uvs = uvs;
        self.indices = IndexBuffer::Unified(unified);
    }

    /// Recomputes the mesh normals as the mean of the adjacent face normals.
    pub fn recompute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.coords.len()];
        let mut divisor = vec![0.0f32; self.coords.len()];
        let flat = self.flat_indices();

        for f in flat.chunks_exact(3) {
            let (a, b, c) = (f[0] as usize, f[1] as usize, f[2] as usize);
            let normal = (self.coords[b] - self.coords[a])
                .cross(self.coords[c] - self.coords[a])
                .normalize_or_zero();

            for i in [a, b, c] {
                normals[i] += normal;
                divisor[i] += 1.0;
            }
        }

        for (n, d) in normals.iter_mut().zip(divisor) {
            if d > 0.0 {
                *n /= d;
            }
        }

        self.normals = Some(normals);
    }
}
