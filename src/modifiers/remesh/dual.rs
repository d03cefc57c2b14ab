//! Dual surface extraction
//!
//! One vertex per grid cell that the surface passes through, and one quad
//! per lattice edge with a sign change, joining the four cells around that
//! edge. Only the vertex placement differs between the two styles:
//!
//! - `Centroid` (surface nets): the mean of the cell's edge crossings
//! - `Qef` (dual contouring): the point closest to the tangent planes at the
//!   crossings, which lands on edges and corners of the source surface

use std::collections::HashMap;

use glam::{DMat3, DVec3, Vec3};

use super::voxel::{SurfaceQuery, VoxelGrid};
use crate::mesh::Mesh;

/// Cell corner offsets, corner `i` = (x = bit 0, y = bit 1, z = bit 2)
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// The 12 cell edges as corner pairs
const CUBE_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [0, 2],
    [0, 4],
    [1, 3],
    [1, 5],
    [2, 3],
    [2, 6],
    [3, 7],
    [4, 5],
    [4, 6],
    [5, 7],
    [6, 7],
];

/// Pull of the QEF solution towards the mass point, relative to one plane
const QEF_REGULARIZATION: f64 = 0.05;

/// Where a cell's vertex goes
#[derive(Clone, Copy)]
pub(crate) enum Placement<'a> {
    Centroid,
    Qef(&'a SurfaceQuery),
}

/// Build the dual surface of the grid
pub(crate) fn extract(grid: &VoxelGrid, placement: Placement<'_>) -> Mesh {
    let [nx, ny, nz] = grid.dims();
    let (cx, cy, cz) = (nx - 1, ny - 1, nz - 1);
    let cell_id = |i: usize, j: usize, k: usize| i + j * cx + k * cx * cy;
    let h = grid.cell_size();

    let mut mesh = Mesh::default();
    let mut cell_vertex: HashMap<usize, u32> = HashMap::new();

    for k in 0..cz {
        for j in 0..cy {
            for i in 0..cx {
                let samples = CORNERS.map(|[di, dj, dk]| grid.value(i + di, j + dj, k + dk));
                let inside = samples.iter().filter(|&&s| s < 0.0).count();
                if inside == 0 || inside == 8 {
                    continue;
                }

                let crossings: Vec<Vec3> = CUBE_EDGES
                    .iter()
                    .filter(|&&[a, b]| (samples[a] < 0.0) != (samples[b] < 0.0))
                    .map(|&[a, b]| {
                        let t = samples[a] / (samples[a] - samples[b]);
                        let pa = corner_vec(CORNERS[a]);
                        let pb = corner_vec(CORNERS[b]);
                        pa + (pb - pa) * t
                    })
                    .collect();

                let base = grid.point(i, j, k);
                let local = match placement {
                    Placement::Centroid => centroid(&crossings),
                    Placement::Qef(surface) => {
                        let normals: Vec<Vec3> = crossings
                            .iter()
                            .map(|&c| surface.normal_near(base + c * h))
                            .collect();
                        qef_point(&crossings, &normals)
                    }
                };

                mesh.positions.push(base + local * h);
                cell_vertex.insert(cell_id(i, j, k), (mesh.positions.len() - 1) as u32);
            }
        }
    }

    let vertex = |[i, j, k]: [usize; 3]| cell_vertex.get(&cell_id(i, j, k)).copied();
    let push_quad = |cells: [[usize; 3]; 4], flip: bool, mesh: &mut Mesh| {
        let Some(mut quad) = cells.iter().map(|&c| vertex(c)).collect::<Option<Vec<u32>>>() else {
            return;
        };
        if flip {
            quad.reverse();
        }
        mesh.faces.push(quad);
    };

    for k in 1..cz {
        for j in 1..cy {
            for i in 1..cx {
                let inside = grid.is_inside(i, j, k);
                // Edges run from (i, j, k) towards +x, +y and +z; a quad
                // faces +axis when the lower end is the inside one
                if inside != grid.is_inside(i + 1, j, k) {
                    push_quad(
                        [[i, j - 1, k - 1], [i, j, k - 1], [i, j, k], [i, j - 1, k]],
                        !inside,
                        &mut mesh,
                    );
                }
                if inside != grid.is_inside(i, j + 1, k) {
                    push_quad(
                        [[i - 1, j, k - 1], [i - 1, j, k], [i, j, k], [i, j, k - 1]],
                        !inside,
                        &mut mesh,
                    );
                }
                if inside != grid.is_inside(i, j, k + 1) {
                    push_quad(
                        [[i - 1, j - 1, k], [i, j - 1, k], [i, j, k], [i - 1, j, k]],
                        !inside,
                        &mut mesh,
                    );
                }
            }
        }
    }

    mesh
}

#[inline]
fn corner_vec([x, y, z]: [usize; 3]) -> Vec3 {
    Vec3::new(x as f32, y as f32, z as f32)
}

fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::splat(0.5);
    }
    points.iter().sum::<Vec3>() / points.len() as f32
}

/// Minimiser of the squared distances to the planes through `points` with
/// `normals`, in cell-local coordinates and clamped to the cell
fn qef_point(points: &[Vec3], normals: &[Vec3]) -> Vec3 {
    let mass = centroid(points).as_dvec3();

    let mut a = DMat3::from_diagonal(DVec3::splat(QEF_REGULARIZATION));
    let mut b = DVec3::ZERO;
    for (p, n) in points.iter().zip(normals) {
        if *n == Vec3::ZERO {
            continue;
        }
        let n = n.as_dvec3();
        a += DMat3::from_cols(n * n.x, n * n.y, n * n.z);
        b += n * n.dot(p.as_dvec3() - mass);
    }

    let offset = if a.determinant().abs() > f64::EPSILON {
        a.inverse() * b
    } else {
        DVec3::ZERO
    };
    let x = mass + offset;
    if !x.is_finite() {
        return mass.as_vec3();
    }
    x.clamp(DVec3::ZERO, DVec3::ONE).as_vec3()
}
