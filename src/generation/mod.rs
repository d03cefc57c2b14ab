//! Base mesh generation
//!
//! Produces the closed sphere every rock starts from.

mod icosphere;

pub use icosphere::{icosahedron, IcosphereBuilder};
