//! Polygon mesh shared by every stage
//!
//! `Mesh` is the working representation: indexed positions plus polygon
//! faces that start as triangles and may grow into n-gons after planar
//! dissolve. `MeshData` is the flattened, engine-agnostic output for renderers.

mod export;
mod topology;

pub use export::write_obj;
pub use topology::{edge_key, EdgeStats};

pub(crate) use topology::edge_face_map;

use glam::{Affine3A, Vec3};

use crate::error::{Result, RockError};

/// Indexed polygon mesh
///
/// Faces are vertex index loops with counter-clockwise winding seen from
/// outside. A valid mesh has at least one face, every index in range and no
/// vertex repeated within a face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Polygon faces as vertex index loops
    pub faces: Vec<Vec<u32>>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Self {
        Self { positions, faces }
    }

    /// Build a mesh from triangles
    pub fn from_triangles(positions: Vec<Vec3>, triangles: &[[u32; 3]]) -> Self {
        Self {
            positions,
            faces: triangles.iter().map(|t| t.to_vec()).collect(),
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of faces (polygons, not triangles)
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if mesh has no faces
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Check if every face is a triangle
    pub fn is_triangulated(&self) -> bool {
        self.faces.iter().all(|f| f.len() == 3)
    }

    /// Area-weighted normal of a polygon (Newell's method)
    ///
    /// The length equals twice the polygon's area for planar polygons.
    pub fn face_area_vector(&self, face: &[u32]) -> Vec3 {
        let mut n = Vec3::ZERO;
        for (i, &a) in face.iter().enumerate() {
            let p = self.positions[a as usize];
            let q = self.positions[face[(i + 1) % face.len()] as usize];
            n += Vec3::new(
                (p.y - q.y) * (p.z + q.z),
                (p.z - q.z) * (p.x + q.x),
                (p.x - q.x) * (p.y + q.y),
            );
        }
        n
    }

    /// Unit normal of a polygon, zero for degenerate faces
    pub fn face_normal(&self, face: &[u32]) -> Vec3 {
        self.face_area_vector(face).normalize_or_zero()
    }

    /// Per-vertex normals, area-weighted over adjacent faces
    ///
    /// Vertices not referenced by any face fall back to their direction from
    /// the origin.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for face in &self.faces {
            let n = self.face_area_vector(face);
            for &v in face {
                normals[v as usize] += n;
            }
        }
        normals
            .iter()
            .zip(&self.positions)
            .map(|(n, p)| n.try_normalize().unwrap_or_else(|| p.normalize_or_zero()))
            .collect()
    }

    /// Triangles of every face, fanned from the face's first vertex
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let mut triangles = Vec::with_capacity(self.faces.len() * 2);
        for face in &self.faces {
            for i in 1..face.len().saturating_sub(1) {
                triangles.push([face[0], face[i], face[i + 1]]);
            }
        }
        triangles
    }

    /// Copy of this mesh with every face fanned into triangles
    pub fn triangulated(&self) -> Mesh {
        Mesh::from_triangles(self.positions.clone(), &self.triangles())
    }

    /// Drop vertices no face references, keeping the order of the rest
    pub fn compact(&mut self) {
        let mut remap = vec![u32::MAX; self.positions.len()];
        for face in &self.faces {
            for &v in face {
                remap[v as usize] = 0;
            }
        }

        let mut positions = Vec::with_capacity(self.positions.len());
        for (old, slot) in remap.iter_mut().enumerate() {
            if *slot == 0 {
                *slot = positions.len() as u32;
                positions.push(self.positions[old]);
            }
        }

        for face in &mut self.faces {
            for v in face.iter_mut() {
                *v = remap[*v as usize];
            }
        }
        self.positions = positions;
    }

    /// Axis-aligned bounds as `(min, max)`, `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }

    /// Apply an affine transform to every vertex
    pub fn transform(&mut self, transform: Affine3A) {
        for p in &mut self.positions {
            *p = transform.transform_point3(*p);
        }
    }

    /// Check the structural invariants of the mesh
    ///
    /// # Errors
    ///
    /// - `DegenerateMesh` if there are no vertices or faces, a face has fewer
    ///   than 3 vertices, repeats a vertex or references a missing vertex
    /// - `NumericInstability` if any coordinate is not finite
    pub fn validate(&self) -> Result<()> {
        if self.positions.is_empty() || self.faces.is_empty() {
            return Err(RockError::DegenerateMesh(format!(
                "mesh has {} vertices and {} faces",
                self.positions.len(),
                self.faces.len()
            )));
        }

        if let Some(i) = self.positions.iter().position(|p| !p.is_finite()) {
            return Err(RockError::NumericInstability(format!(
                "vertex {} has non-finite position {:?}",
                i, self.positions[i]
            )));
        }

        let count = self.positions.len() as u32;
        for (i, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(RockError::DegenerateMesh(format!(
                    "face {} has only {} vertices",
                    i,
                    face.len()
                )));
            }
            if let Some(&v) = face.iter().find(|&&v| v >= count) {
                return Err(RockError::DegenerateMesh(format!(
                    "face {} references vertex {} of {}",
                    i, v, count
                )));
            }
            for (j, v) in face.iter().enumerate() {
                if face[j + 1..].contains(v) {
                    return Err(RockError::DegenerateMesh(format!(
                        "face {} repeats vertex {}",
                        i, v
                    )));
                }
            }
        }

        Ok(())
    }

    /// Flatten into render buffers with one normal per face
    ///
    /// Every polygon gets its own vertices so the low-poly facets stay hard
    /// edged, and is triangulated as a fan.
    pub fn to_mesh_data(&self) -> MeshData {
        let mut data = MeshData::default();

        for face in &self.faces {
            if face.len() < 3 {
                continue;
            }

            let base_idx = data.positions.len() as u32;
            let n = self.face_normal(face);

            for &v in face {
                let p = self.positions[v as usize];
                data.positions.push(p.to_array());
                data.normals.push(n.to_array());
            }

            for i in 1..face.len() as u32 - 1 {
                data.indices.push(base_idx);
                data.indices.push(base_idx + i);
                data.indices.push(base_idx + i + 1);
            }
        }

        data
    }
}

/// Engine-agnostic mesh data output
///
/// Contains raw vertex data suitable for any rendering engine:
/// - Bevy: Convert to `Mesh` with attributes
/// - Godot: Convert to `ArrayMesh`
/// - wgpu: Use directly as vertex buffers
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// Vertex positions (3D coordinates)
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (the owning face's normal)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
