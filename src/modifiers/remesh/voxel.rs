//! Signed distance sampling of a closed mesh on a regular grid
//!
//! Inside/outside comes from the generalized winding number, which stays
//! correct for slightly open or self-intersecting input. The magnitude is
//! the distance to the nearest triangle, queried through parry3d.

use std::f64::consts::PI;

use glam::{DVec3, Vec3};
use parry3d::math::Point;
use parry3d::query::PointQuery;
use parry3d::shape::Triangle;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::RemeshPass;
use crate::error::{Result, RockError};
use crate::mesh::Mesh;

/// Empty cells kept around the surface on every side
const PADDING: usize = 2;

/// One triangle of the source surface
struct SurfaceTriangle {
    shape: Triangle,
    corners: [DVec3; 3],
    min: Vec3,
    max: Vec3,
    normal: Vec3,
}

/// Distance, winding and normal queries against a triangle soup
pub(crate) struct SurfaceQuery {
    triangles: Vec<SurfaceTriangle>,
}

impl SurfaceQuery {
    pub(crate) fn new(mesh: &Mesh) -> Self {
        let triangles = mesh
            .triangles()
            .into_iter()
            .map(|t| {
                let [a, b, c] = t.map(|v| mesh.positions[v as usize]);
                SurfaceTriangle {
                    shape: Triangle::new(
                        Point::new(a.x, a.y, a.z),
                        Point::new(b.x, b.y, b.z),
                        Point::new(c.x, c.y, c.z),
                    ),
                    corners: [a.as_dvec3(), b.as_dvec3(), c.as_dvec3()],
                    min: a.min(b).min(c),
                    max: a.max(b).max(c),
                    normal: (b - a).cross(c - a).normalize_or_zero(),
                }
            })
            .collect();
        Self { triangles }
    }

    /// Distance to and index of the nearest triangle
    fn closest(&self, p: Vec3) -> Option<(f32, usize)> {
        let point = Point::new(p.x, p.y, p.z);
        let mut best: Option<(f32, usize)> = None;
        for (i, tri) in self.triangles.iter().enumerate() {
            // Box distance is a lower bound of the triangle distance
            let lower = (tri.min - p).max(p - tri.max).max(Vec3::ZERO).length();
            if best.is_some_and(|(d, _)| lower >= d) {
                continue;
            }
            let d = tri.shape.distance_to_local_point(&point, true);
            if best.map_or(true, |(b, _)| d < b) {
                best = Some((d, i));
            }
        }
        best
    }

    /// Generalized winding number of the surface around `p`
    ///
    /// Close to ±1 inside a closed surface and 0 outside.
    fn winding_number(&self, p: Vec3) -> f64 {
        let p = p.as_dvec3();
        let total: f64 = self
            .triangles
            .iter()
            .map(|tri| {
                let [a, b, c] = tri.corners.map(|v| v - p);
                let (la, lb, lc) = (a.length(), b.length(), c.length());
                let numerator = a.dot(b.cross(c));
                let denominator = la * lb * lc + a.dot(b) * lc + a.dot(c) * lb + b.dot(c) * la;
                2.0 * numerator.atan2(denominator)
            })
            .sum();
        total / (4.0 * PI)
    }

    /// Signed distance to the surface, negative inside
    pub(crate) fn signed_distance(&self, p: Vec3) -> f32 {
        let distance = self.closest(p).map_or(f32::INFINITY, |(d, _)| d);
        if self.winding_number(p).abs() > 0.5 {
            -distance
        } else {
            distance
        }
    }

    /// Normal of the triangle nearest to `p`
    pub(crate) fn normal_near(&self, p: Vec3) -> Vec3 {
        self.closest(p)
            .map_or(Vec3::ZERO, |(_, i)| self.triangles[i].normal)
    }
}

/// Signed distance samples on the lattice points of a regular grid
pub(crate) struct VoxelGrid {
    origin: Vec3,
    cell: f32,
    dims: [usize; 3],
    values: Vec<f32>,
}

impl VoxelGrid {
    /// Sample the surface of `mesh` for one remesh pass
    ///
    /// The largest side of the mesh bounds spans `scale × 2^depth` cells, and
    /// every side is padded so the grid border lies outside the surface.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateMesh` if the mesh has no extent
    pub(crate) fn sample(mesh: &Mesh, surface: &SurfaceQuery, pass: &RemeshPass) -> Result<Self> {
        let Some((lo, hi)) = mesh.bounds() else {
            return Err(RockError::DegenerateMesh("cannot remesh a mesh without vertices".into()));
        };
        let extent = hi - lo;
        let max_dim = extent.max_element();
        if !(max_dim > 0.0) || !max_dim.is_finite() {
            return Err(RockError::DegenerateMesh(format!(
                "cannot remesh a mesh with extent {:?}",
                extent
            )));
        }

        let cell = max_dim / (pass.scale * pass.resolution() as f32);
        let cells = (extent / cell).ceil().as_uvec3().to_array().map(|n| n as usize + 2 * PADDING);
        let span = Vec3::new(cells[0] as f32, cells[1] as f32, cells[2] as f32) * cell;
        let origin = (lo + hi) * 0.5 - span * 0.5;
        let dims = cells.map(|n| n + 1);

        let mut grid = Self {
            origin,
            cell,
            dims,
            values: Vec::new(),
        };

        let total = dims[0] * dims[1] * dims[2];
        let sample = |idx: usize| {
            let [i, j, k] = grid.coords(idx);
            surface.signed_distance(grid.point(i, j, k))
        };
        #[cfg(feature = "parallel")]
        let values: Vec<f32> = (0..total).into_par_iter().map(sample).collect();
        #[cfg(not(feature = "parallel"))]
        let values: Vec<f32> = (0..total).map(sample).collect();

        grid.values = values;
        Ok(grid)
    }

    #[inline]
    pub(crate) fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    pub(crate) fn cell_size(&self) -> f32 {
        self.cell
    }

    #[inline]
    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.dims[0] + k * self.dims[0] * self.dims[1]
    }

    #[inline]
    fn coords(&self, idx: usize) -> [usize; 3] {
        let plane = self.dims[0] * self.dims[1];
        [idx % self.dims[0], (idx % plane) / self.dims[0], idx / plane]
    }

    /// Sample at a lattice point
    #[inline]
    pub(crate) fn value(&self, i: usize, j: usize, k: usize) -> f32 {
        self.values[self.index(i, j, k)]
    }

    /// Whether a lattice point lies inside the surface
    #[inline]
    pub(crate) fn is_inside(&self, i: usize, j: usize, k: usize) -> bool {
        self.value(i, j, k) < 0.0
    }

    /// World position of a lattice point
    #[inline]
    pub(crate) fn point(&self, i: usize, j: usize, k: usize) -> Vec3 {
        self.origin + Vec3::new(i as f32, j as f32, k as f32) * self.cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemeshMode;
    use crate::generation::IcosphereBuilder;
    use crate::mesh::tests::triangulated_cube;

    #[test]
    fn test_winding_number() {
        let cube = triangulated_cube();
        let surface = SurfaceQuery::new(&cube);
        assert!((surface.winding_number(Vec3::ZERO) - 1.0).abs() < 1e-6);
        assert!((surface.winding_number(Vec3::new(0.5, -0.3, 0.9)) - 1.0).abs() < 1e-6);
        assert!(surface.winding_number(Vec3::new(3.0, 0.0, 0.0)).abs() < 1e-6);
    }

    #[test]
    fn test_signed_distance() {
        let cube = triangulated_cube();
        let surface = SurfaceQuery::new(&cube);
        assert!((surface.signed_distance(Vec3::ZERO) + 1.0).abs() < 1e-5);
        assert!((surface.signed_distance(Vec3::new(3.0, 0.0, 0.0)) - 2.0).abs() < 1e-5);
        assert!((surface.signed_distance(Vec3::new(0.0, 0.5, 0.0)) + 0.5).abs() < 1e-5);
        assert_eq!(surface.normal_near(Vec3::new(0.0, 0.0, 1.2)), Vec3::Z);
    }

    #[test]
    fn test_grid_covers_surface() {
        let sphere = IcosphereBuilder::build(2, 1.0).unwrap();
        let surface = SurfaceQuery::new(&sphere);
        let pass = RemeshPass::new(RemeshMode::Blocks, 3, 0.99);
        let grid = VoxelGrid::sample(&sphere, &surface, &pass).unwrap();

        let [nx, ny, nz] = grid.dims();
        assert_eq!(nx, ny);
        assert_eq!(ny, nz);
        // Border lattice points are all outside
        for j in 0..ny {
            for k in 0..nz {
                assert!(!grid.is_inside(0, j, k));
                assert!(!grid.is_inside(nx - 1, j, k));
            }
        }
        // The centre is inside
        let c = nx / 2;
        assert!(grid.is_inside(c, c, c));
        assert!(grid.cell_size() > 2.0 / 8.0);
    }

    #[test]
    fn test_coords_round_trip() {
        let sphere = IcosphereBuilder::build(1, 1.0).unwrap();
        let surface = SurfaceQuery::new(&sphere);
        let pass = RemeshPass::new(RemeshMode::Smooth, 2, 0.5);
        let grid = VoxelGrid::sample(&sphere, &surface, &pass).unwrap();
        let [nx, ny, nz] = grid.dims();
        for idx in [0, 1, nx, nx * ny, nx * ny * nz - 1] {
            let [i, j, k] = grid.coords(idx);
            assert_eq!(grid.index(i, j, k), idx);
        }
    }

    #[test]
    fn test_flat_mesh_rejected() {
        let mesh = Mesh::new(vec![Vec3::ZERO; 3], vec![vec![0, 1, 2]]);
        let surface = SurfaceQuery::new(&mesh);
        let pass = RemeshPass::new(RemeshMode::Blocks, 3, 0.99);
        assert!(matches!(
            VoxelGrid::sample(&mesh, &surface, &pass),
            Err(RockError::DegenerateMesh(_))
        ));
    }
}
