//! Parametric low-poly rock generation
//!
//! A standalone library that turns a handful of parameters into a faceted
//! rock mesh, suitable for use with any game engine (Bevy, Godot, etc.)
//!
//! The pipeline builds an icosphere, displaces it with cellular noise, cuts
//! it down with quadric edge collapse, merges the nearly flat faces left
//! behind, and can optionally rebuild the surface through a voxel grid.
//!
//! # Quick Start
//!
//! ```rust
//! use low_poly_rock::*;
//!
//! // Configure a rock
//! let config = RockConfigBuilder::new()
//!     .subdivisions(4).unwrap()
//!     .radius(1.5).unwrap()
//!     .scale(Vec3::new(1.0, 0.7, 1.2)).unwrap()
//!     .seed(42)
//!     .build().unwrap();
//!
//! // Generate it
//! let mesh = generate(&config).unwrap();
//!
//! // Flatten for rendering
//! let data = mesh.to_mesh_data();
//! println!("Generated {} triangles", data.triangle_count());
//! ```
//!
//! The noise field is usable on its own:
//!
//! ```rust
//! use low_poly_rock::*;
//!
//! let noise = CellularNoise::new(&NoiseConfig::default()).unwrap();
//! let value = noise.sample(Vec3::new(0.3, 1.2, -0.7));
//! assert!((0.0..=1.0).contains(&value));
//! ```
//!
//! # Features
//!
//! - `parallel` (default): Samples the noise and the remesh grid with rayon
//! - `serde`: Enables serialization support for configuration

// Modules
pub mod error;
pub mod config;
pub mod generation;
pub mod noise;
pub mod modifiers;
pub mod mesh;
pub mod generator;

// Re-export core types for convenience
pub use error::{RockError, Result};
pub use config::{
    CoordSpace, DecimateConfig, DisplaceConfig, DisplaceDirection, DistanceMetric, NoiseConfig,
    OutputOptions, RampStop, RemeshConfig, RemeshMode, RemeshPass, RockConfig, RockConfigBuilder,
};
pub use generation::IcosphereBuilder;
pub use noise::{CellularNoise, Ramp, ScalarField};
pub use modifiers::{collapse, displace, dissolve_planar, remesh, Remesher, VoxelRemesher};
pub use mesh::{write_obj, EdgeStats, Mesh, MeshData};
pub use generator::{generate, Rock, RockGenerator, Stage, StageSnapshot};

// Re-export glam types used in the public API
pub use glam::{Affine3A, Vec3};
