//! Noise-driven vertex displacement
//!
//! Every vertex is pushed along one direction by
//! `(field(sample_point) - mid_level) * strength`. Only positions change; the
//! face list is left untouched.

use glam::{Affine3A, Vec3};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::config::{CoordSpace, DisplaceConfig, DisplaceDirection, NoiseConfig};
use crate::error::{Result, RockError};
use crate::mesh::Mesh;
use crate::noise::{CellularNoise, ScalarField};

/// Transform from vertex positions to field sample points
///
/// `object_transform` is the rock's own transform; the reference frame of
/// `CoordSpace::Object` is expressed in the same world space.
pub fn sample_transform(config: &DisplaceConfig, object_transform: Affine3A) -> Affine3A {
    match (config.coord_space, config.reference_frame) {
        (CoordSpace::Local, _) | (CoordSpace::Object, None) => Affine3A::IDENTITY,
        (CoordSpace::Global, _) => object_transform,
        (CoordSpace::Object, Some(frame)) => frame.inverse() * object_transform,
    }
}

/// Displace the vertices of `mesh` in place
///
/// Vertex normals are computed from the mesh as it is on entry, so every
/// vertex moves along the normal of the undisplaced surface.
///
/// # Errors
///
/// - `InvalidConfig` if `config` fails validation
/// - `NumericInstability` if a displaced vertex is not finite
#[tracing::instrument(skip_all, name = "modifiers::displace")]
pub fn displace(
    mesh: &mut Mesh,
    config: &DisplaceConfig,
    field: &impl ScalarField,
    object_transform: Affine3A,
) -> Result<()> {
    config.validate()?;

    let to_sample = sample_transform(config, object_transform);
    let samples: Vec<Vec3> = mesh
        .positions
        .iter()
        .map(|&p| to_sample.transform_point3(p))
        .collect();

    #[cfg(feature = "parallel")]
    let values: Vec<f32> = samples.par_iter().map(|&p| field.sample(p)).collect();
    #[cfg(not(feature = "parallel"))]
    let values: Vec<f32> = samples.iter().map(|&p| field.sample(p)).collect();

    let normals = match config.direction {
        DisplaceDirection::Normal => Some(mesh.vertex_normals()),
        _ => None,
    };

    for (i, (position, value)) in mesh.positions.iter_mut().zip(values).enumerate() {
        let direction = match config.direction {
            DisplaceDirection::X => Vec3::X,
            DisplaceDirection::Y => Vec3::Y,
            DisplaceDirection::Z => Vec3::Z,
            DisplaceDirection::Normal => normals.as_ref().map_or(Vec3::ZERO, |n| n[i]),
        };

        let moved = *position + direction * ((value - config.mid_level) * config.strength);
        if !moved.is_finite() {
            return Err(RockError::NumericInstability(format!(
                "vertex {} displaced to {:?} (field value {})",
                i, moved, value
            )));
        }
        *position = moved;
    }

    debug!(vertices = mesh.positions.len(), "displaced vertices");
    Ok(())
}

/// Displace `mesh` with cellular noise built from `noise`
///
/// # Errors
///
/// Same as [`displace`], plus `InvalidConfig` for a bad noise configuration
pub fn apply(
    mut mesh: Mesh,
    config: &DisplaceConfig,
    noise: &NoiseConfig,
    object_transform: Affine3A,
) -> Result<Mesh> {
    let field = CellularNoise::new(noise)?;
    displace(&mut mesh, config, &field, object_transform)?;
    Ok(mesh)
}
