//! Mesh modifiers applied by the generator, in pipeline order

pub mod decimate;
pub mod displace;
pub mod remesh;

pub use decimate::{collapse, dissolve_planar, target_face_count};
pub use displace::displace;
pub use remesh::{remesh, Remesher, VoxelRemesher};
