//! Scalar noise fields
//!
//! Provides the field trait the displacement stage samples and the cellular
//! noise that implements it.

mod cellular;
mod ramp;

pub use cellular::{evaluate, CellularNoise};
pub use ramp::Ramp;

use glam::Vec3;

/// Trait for sampling a scalar field at arbitrary 3D positions
///
/// Implementations must be pure: the same position always gives the same
/// value. `Sync` lets the displacement stage sample vertices in parallel.
pub trait ScalarField: Sync {
    /// Sample the field at a position
    fn sample(&self, position: Vec3) -> f32;
}
