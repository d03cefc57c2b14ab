//! Blocky surface extraction
//!
//! Every inside lattice point becomes a cube of one cell's size, and every
//! cube face not covered by a neighbouring cube becomes a quad.

use std::collections::HashMap;

use glam::IVec3;

use super::voxel::VoxelGrid;
use crate::mesh::Mesh;

/// Outward directions of the six cube faces with the two axes spanning each
/// face, ordered so `u × v` points along the normal
const FACES: [(IVec3, IVec3, IVec3); 6] = [
    (IVec3::X, IVec3::Y, IVec3::Z),
    (IVec3::NEG_X, IVec3::Z, IVec3::Y),
    (IVec3::Y, IVec3::Z, IVec3::X),
    (IVec3::NEG_Y, IVec3::X, IVec3::Z),
    (IVec3::Z, IVec3::X, IVec3::Y),
    (IVec3::NEG_Z, IVec3::Y, IVec3::X),
];

/// Build the voxel surface of the grid
pub(crate) fn extract(grid: &VoxelGrid) -> Mesh {
    let [nx, ny, nz] = grid.dims();
    let dims = IVec3::new(nx as i32, ny as i32, nz as i32);
    let solid = |p: IVec3| {
        p.cmpge(IVec3::ZERO).all()
            && p.cmplt(dims).all()
            && grid.is_inside(p.x as usize, p.y as usize, p.z as usize)
    };

    let half = grid.cell_size() * 0.5;
    let origin = grid.point(0, 0, 0);

    let mut mesh = Mesh::default();
    // Corners keyed by doubled lattice coordinates
    let mut corners: HashMap<IVec3, u32> = HashMap::new();
    let mut corner = |key: IVec3, mesh: &mut Mesh| -> u32 {
        *corners.entry(key).or_insert_with(|| {
            mesh.positions.push(origin + key.as_vec3() * half);
            (mesh.positions.len() - 1) as u32
        })
    };

    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                if !grid.is_inside(i, j, k) {
                    continue;
                }
                let p = IVec3::new(i as i32, j as i32, k as i32);
                for (normal, u, v) in FACES {
                    if solid(p + normal) {
                        continue;
                    }
                    let center = p * 2 + normal;
                    let face = [
                        center - u - v,
                        center + u - v,
                        center + u + v,
                        center - u + v,
                    ]
                    .map(|key| corner(key, &mut mesh));
                    mesh.faces.push(face.to_vec());
                }
            }
        }
    }

    mesh
}
