//! Voxel remeshing
//!
//! The surface is sampled as a signed distance field on a regular grid and
//! rebuilt from scratch in one of three styles. The input topology is
//! discarded entirely.
//!
//! Backends plug in through [`Remesher`]; [`VoxelRemesher`] is the built-in
//! one.

mod blocks;
mod dual;
mod voxel;

use tracing::debug;

use crate::config::{RemeshMode, RemeshPass};
use crate::error::{Result, RockError};
use crate::mesh::Mesh;
use crate::modifiers::decimate::collapse;

use dual::Placement;
use voxel::{SurfaceQuery, VoxelGrid};

/// A surface reconstruction backend
///
/// Implementations must be deterministic: the same mesh and pass always
/// produce the same output.
pub trait Remesher {
    /// Rebuild `mesh` at the resolution and in the style of `pass`
    fn remesh(&self, mesh: &Mesh, pass: &RemeshPass) -> Result<Mesh>;
}

/// Signed distance grid remesher
///
/// - `Blocks`: one axis-aligned quad per exposed voxel face
/// - `Smooth`: surface nets
/// - `Sharp`: dual contouring, vertices placed on the planes of the nearest
///   source triangles so edges and corners survive
#[derive(Debug, Clone, Copy, Default)]
pub struct VoxelRemesher;

impl Remesher for VoxelRemesher {
    #[tracing::instrument(skip(self, mesh), name = "remesh::voxel")]
    fn remesh(&self, mesh: &Mesh, pass: &RemeshPass) -> Result<Mesh> {
        pass.validate()?;
        mesh.validate()?;

        let surface = SurfaceQuery::new(mesh);
        let grid = VoxelGrid::sample(mesh, &surface, pass)?;

        let mut out = match pass.mode {
            RemeshMode::Blocks => blocks::extract(&grid),
            RemeshMode::Smooth => dual::extract(&grid, Placement::Centroid),
            RemeshMode::Sharp => dual::extract(&grid, Placement::Qef(&surface)),
        };
        out.compact();

        if out.is_empty() {
            return Err(RockError::DegenerateMesh(format!(
                "{:?} remesh at depth {} produced no faces",
                pass.mode, pass.octree_depth
            )));
        }

        debug!(
            dims = ?grid.dims(),
            vertices = out.vertex_count(),
            faces = out.face_count(),
            "remeshed"
        );
        Ok(out)
    }
}

/// Two refinement passes, the second on the output of the first, then an
/// optional edge collapse
///
/// `decimate_ratio` of `None` or `1.0` skips the collapse.
///
/// # Errors
///
/// Returns the first error of either pass or the collapse
pub fn remesh(
    mesh: &Mesh,
    first: &RemeshPass,
    second: &RemeshPass,
    decimate_ratio: Option<f32>,
    remesher: &impl Remesher,
) -> Result<Mesh> {
    let coarse = remesher.remesh(mesh, first)?;
    let fine = remesher.remesh(&coarse, second)?;
    match decimate_ratio {
        Some(ratio) if ratio < 1.0 => collapse(&fine, ratio),
        _ => Ok(fine),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::IcosphereBuilder;

    /// Records the depth of every pass it is asked to run
    struct Recording(std::cell::RefCell<Vec<u32>>);

    impl Remesher for Recording {
        fn remesh(&self, mesh: &Mesh, pass: &RemeshPass) -> Result<Mesh> {
            self.0.borrow_mut().push(pass.octree_depth);
            let mut out = mesh.clone();
            out.positions.iter_mut().for_each(|p| *p *= 2.0);
            Ok(out)
        }
    }

    #[test]
    fn test_passes_chain() {
        let sphere = IcosphereBuilder::build(1, 1.0).unwrap();
        let recorder = Recording(Default::default());
        let first = RemeshPass::new(RemeshMode::Blocks, 3, 0.5);
        let second = RemeshPass::new(RemeshMode::Sharp, 2, 0.5);

        let out = remesh(&sphere, &first, &second, None, &recorder).unwrap();

        assert_eq!(*recorder.0.borrow(), vec![3, 2]);
        // The second pass saw the first pass's output
        assert!((out.positions[0].length() - 4.0).abs() < 1e-5);
        assert_eq!(out.face_count(), sphere.face_count());
    }

    #[test]
    fn test_post_collapse() {
        let sphere = IcosphereBuilder::build(2, 1.0).unwrap();
        let pass = RemeshPass::new(RemeshMode::Smooth, 3, 0.99);

        let full = remesh(&sphere, &pass, &pass, Some(1.0), &VoxelRemesher).unwrap();
        let reduced = remesh(&sphere, &pass, &pass, Some(0.3), &VoxelRemesher).unwrap();

        assert!(reduced.face_count() < full.face_count());
        assert!(reduced.validate().is_ok());
    }

    #[test]
    fn test_every_mode() {
        let sphere = IcosphereBuilder::build(2, 1.0).unwrap();
        for mode in [RemeshMode::Blocks, RemeshMode::Smooth, RemeshMode::Sharp] {
            let pass = RemeshPass::new(mode, 3, 0.99);
            let out = VoxelRemesher.remesh(&sphere, &pass).unwrap();
            assert!(out.validate().is_ok(), "{:?}", mode);
            assert_eq!(out.edge_stats().boundary, 0, "{:?}", mode);
            assert!(out.faces.iter().all(|f| f.len() == 4));
        }
    }

    #[test]
    fn test_resolution_controls_density() {
        let sphere = IcosphereBuilder::build(3, 1.0).unwrap();
        let coarse = VoxelRemesher
            .remesh(&sphere, &RemeshPass::new(RemeshMode::Smooth, 3, 0.99))
            .unwrap();
        let fine = VoxelRemesher
            .remesh(&sphere, &RemeshPass::new(RemeshMode::Smooth, 4, 0.99))
            .unwrap();
        assert!(fine.face_count() > coarse.face_count());
    }

    #[test]
    fn test_invalid_pass() {
        let sphere = IcosphereBuilder::build(1, 1.0).unwrap();
        let pass = RemeshPass::new(RemeshMode::Smooth, 0, 0.99);
        assert!(matches!(
            VoxelRemesher.remesh(&sphere, &pass),
            Err(RockError::InvalidConfig(_))
        ));
    }
}
