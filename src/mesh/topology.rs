//! Edge adjacency queries

use std::collections::{HashMap, HashSet};

use super::Mesh;

/// Undirected edge key with the smaller index first
#[inline]
pub fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Map from undirected edge to the faces using it, in face order
pub(crate) fn edge_face_map(faces: &[Vec<u32>]) -> HashMap<(u32, u32), Vec<usize>> {
    let mut map: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
    for (face_idx, face) in faces.iter().enumerate() {
        for (i, &a) in face.iter().enumerate() {
            let b = face[(i + 1) % face.len()];
            map.entry(edge_key(a, b)).or_default().push(face_idx);
        }
    }
    map
}

/// How the edges of a mesh are shared between faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeStats {
    /// Number of distinct edges
    pub edges: usize,
    /// Edges used by exactly one face
    pub boundary: usize,
    /// Edges used by three or more faces
    pub non_manifold: usize,
}

impl EdgeStats {
    /// Every edge has exactly two faces
    pub fn is_closed_manifold(&self) -> bool {
        self.boundary == 0 && self.non_manifold == 0
    }
}

impl Mesh {
    /// Count boundary and non-manifold edges
    pub fn edge_stats(&self) -> EdgeStats {
        let map = edge_face_map(&self.faces);
        let mut stats = EdgeStats {
            edges: map.len(),
            ..Default::default()
        };
        for faces in map.values() {
            match faces.len() {
                1 => stats.boundary += 1,
                2 => {}
                _ => stats.non_manifold += 1,
            }
        }
        stats
    }

    /// Check whether two faces use the same set of vertices
    pub fn has_duplicate_faces(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.faces.len());
        self.faces.iter().any(|face| {
            let mut key = face.clone();
            key.sort_unstable();
            !seen.insert(key)
        })
    }

    /// Euler characteristic V - E + F (2 for a closed genus-0 surface)
    pub fn euler_characteristic(&self) -> i64 {
        let edges = edge_face_map(&self.faces).len();
        self.vertex_count() as i64 - edges as i64 + self.face_count() as i64
    }
}
