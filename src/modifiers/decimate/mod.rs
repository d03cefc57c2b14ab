//! Polygon reduction
//!
//! Two passes, always in this order:
//! 1. [`collapse`]: quadric edge collapse down to a fraction of the faces
//! 2. [`dissolve_planar`]: merge the nearly flat faces left behind into n-gons
//!
//! Dissolving first would leave collapse very little to choose from, since
//! it only works on triangles.

mod collapse;
mod planar;
mod quadric;

pub use collapse::{collapse, target_face_count, MIN_FACES};
pub use planar::dissolve_planar;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecimateConfig;
    use crate::generation::IcosphereBuilder;

    #[test]
    fn test_decimate_sphere() {
        let sphere = IcosphereBuilder::build(4, 1.0).unwrap();
        let config = DecimateConfig::default();

        let collapsed = collapse(&sphere, config.collapse_ratio).unwrap();
        let result = dissolve_planar(&collapsed, config.planar_angle_limit(), true).unwrap();

        assert!(result.face_count() <= collapsed.face_count());
        assert!(collapsed.face_count() <= target_face_count(5120, config.collapse_ratio));
        assert!(result.validate().is_ok());
        assert_eq!(result.edge_stats().non_manifold, 0);
    }

    #[test]
    fn test_order_matters() {
        let sphere = IcosphereBuilder::build(3, 1.0).unwrap();
        let limit = 15f32.to_radians();

        let forward = dissolve_planar(&collapse(&sphere, 0.2).unwrap(), limit, true).unwrap();
        let reversed = collapse(&dissolve_planar(&sphere, limit, true).unwrap(), 0.2).unwrap();

        assert_ne!(forward, reversed);
    }
}
