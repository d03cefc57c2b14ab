//! Geodesic Icosphere Construction
//!
//! Builds a sphere by recursively splitting each triangle of a regular
//! icosahedron into four and pushing the new edge midpoints back onto the
//! sphere surface.
//!
//! # Growth
//!
//! Level 0 is the icosahedron itself (12 vertices, 20 faces). Every level
//! multiplies the face count by 4, so level `s` has `20 × 4^s` faces and
//! `10 × 4^s + 2` vertices.

use std::collections::HashMap;

use glam::Vec3;

use crate::config::{MAX_SUBDIVISIONS, MIN_SUBDIVISIONS};
use crate::error::{Result, RockError};
use crate::mesh::{edge_key, Mesh};

/// Golden ratio φ = (1 + √5) / 2
const PHI: f32 = 1.618_034;

const ICOSAHEDRON_FACES: [[u32; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Regular icosahedron inscribed in a sphere of `radius`
pub fn icosahedron(radius: f32) -> Mesh {
    let positions = [
        Vec3::new(-1.0, PHI, 0.0),
        Vec3::new(1.0, PHI, 0.0),
        Vec3::new(-1.0, -PHI, 0.0),
        Vec3::new(1.0, -PHI, 0.0),
        Vec3::new(0.0, -1.0, PHI),
        Vec3::new(0.0, 1.0, PHI),
        Vec3::new(0.0, -1.0, -PHI),
        Vec3::new(0.0, 1.0, -PHI),
        Vec3::new(PHI, 0.0, -1.0),
        Vec3::new(PHI, 0.0, 1.0),
        Vec3::new(-PHI, 0.0, -1.0),
        Vec3::new(-PHI, 0.0, 1.0),
    ]
    .iter()
    .map(|p| p.normalize() * radius)
    .collect();

    Mesh::from_triangles(positions, &ICOSAHEDRON_FACES)
}

/// Builder for geodesic spheres
///
/// # Example
///
/// ```rust
/// use low_poly_rock::IcosphereBuilder;
///
/// let sphere = IcosphereBuilder::build(2, 1.0).unwrap();
/// assert_eq!(sphere.face_count(), 320);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IcosphereBuilder;

impl IcosphereBuilder {
    /// Build an icosphere with `subdivisions` levels of splitting
    ///
    /// The output is deterministic: the same inputs always give the same
    /// vertex order and faces.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `subdivisions` is outside [1, 6] or
    /// `radius` is not positive
    pub fn build(subdivisions: u32, radius: f32) -> Result<Mesh> {
        if !(MIN_SUBDIVISIONS..=MAX_SUBDIVISIONS).contains(&subdivisions) {
            return Err(RockError::InvalidConfig(format!(
                "subdivisions must be in [{}, {}] (got {})",
                MIN_SUBDIVISIONS, MAX_SUBDIVISIONS, subdivisions
            )));
        }
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(RockError::InvalidConfig(format!(
                "radius must be positive (got {})",
                radius
            )));
        }

        let mut positions = icosahedron(radius).positions;
        let mut triangles: Vec<[u32; 3]> = ICOSAHEDRON_FACES.to_vec();

        for _ in 0..subdivisions {
            triangles = subdivide(&mut positions, &triangles, radius);
        }

        Ok(Mesh::from_triangles(positions, &triangles))
    }
}

/// Split every triangle into four, sharing midpoints across edges
fn subdivide(positions: &mut Vec<Vec3>, triangles: &[[u32; 3]], radius: f32) -> Vec<[u32; 3]> {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::with_capacity(triangles.len() * 3 / 2);
    let mut next = Vec::with_capacity(triangles.len() * 4);

    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
        *midpoints.entry(edge_key(a, b)).or_insert_with(|| {
            let mid = (positions[a as usize] + positions[b as usize]).normalize() * radius;
            positions.push(mid);
            (positions.len() - 1) as u32
        })
    };

    for &[a, b, c] in triangles {
        let ab = midpoint(a, b, positions);
        let bc = midpoint(b, c, positions);
        let ca = midpoint(c, a, positions);

        next.push([a, ab, ca]);
        next.push([b, bc, ab]);
        next.push([c, ca, bc]);
        next.push([ab, bc, ca]);
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icosahedron() {
        let mesh = icosahedron(1.0);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.face_count(), 20);
        assert!(mesh.edge_stats().is_closed_manifold());
    }

    #[test]
    fn test_icosahedron_faces_point_outward() {
        let mesh = icosahedron(1.0);
        for face in &mesh.faces {
            let center: Vec3 = face.iter().map(|&v| mesh.positions[v as usize]).sum();
            assert!(mesh.face_normal(face).dot(center) > 0.0);
        }
    }

    #[test]
    fn test_face_count_growth() {
        for level in MIN_SUBDIVISIONS..=MAX_SUBDIVISIONS {
            let mesh = IcosphereBuilder::build(level, 1.0).unwrap();
            assert_eq!(mesh.face_count(), 20 * 4usize.pow(level));
            assert_eq!(mesh.vertex_count(), 10 * 4usize.pow(level) + 2);
        }
    }

    #[test]
    fn test_closed_manifold() {
        for level in 1..=4 {
            let mesh = IcosphereBuilder::build(level, 2.5).unwrap();
            assert!(mesh.edge_stats().is_closed_manifold());
            assert_eq!(mesh.euler_characteristic(), 2);
            assert!(!mesh.has_duplicate_faces());
            assert!(mesh.validate().is_ok());
        }
    }

    #[test]
    fn test_points_on_sphere() {
        let radius = 3.5;
        let mesh = IcosphereBuilder::build(3, radius).unwrap();
        for p in &mesh.positions {
            assert!(
                (p.length() - radius).abs() < 1e-4,
                "Point distance {} should be {}",
                p.length(),
                radius
            );
        }
    }

    #[test]
    fn test_winding_stays_outward() {
        let mesh = IcosphereBuilder::build(2, 1.0).unwrap();
        for face in &mesh.faces {
            let center: Vec3 = face.iter().map(|&v| mesh.positions[v as usize]).sum();
            assert!(mesh.face_normal(face).dot(center) > 0.0);
        }
    }

    #[test]
    fn test_determinism() {
        let a = IcosphereBuilder::build(3, 1.0).unwrap();
        let b = IcosphereBuilder::build(3, 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_input() {
        assert!(IcosphereBuilder::build(0, 1.0).is_err());
        assert!(IcosphereBuilder::build(7, 1.0).is_err());
        assert!(IcosphereBuilder::build(2, 0.0).is_err());
        assert!(IcosphereBuilder::build(2, -1.0).is_err());
    }
}
