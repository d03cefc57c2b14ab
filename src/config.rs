//! Rock Configuration and Builder
//!
//! Every field here changes the generated mesh. Display-only state of a host
//! editor (collapsed panels and the like) has no place in these types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::{Affine3A, Vec3};

use crate::error::{Result, RockError};

/// Lowest accepted icosphere subdivision level
pub const MIN_SUBDIVISIONS: u32 = 1;
/// Highest accepted icosphere subdivision level (81,920 base faces)
pub const MAX_SUBDIVISIONS: u32 = 6;
/// Highest accepted remesh octree depth (256 voxels across)
pub const MAX_OCTREE_DEPTH: u32 = 8;
/// Upper bound of a remesh pass scale
pub const MAX_REMESH_SCALE: f32 = 0.99;

/// Check that `value` lies in `[min, max]`, rejecting NaN
pub(crate) fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(RockError::InvalidConfig(format!(
            "{} must be in [{}, {}] (got {})",
            name, min, max, value
        )))
    }
}

/// Check that `value` lies in `(0, max]`, rejecting NaN
pub(crate) fn check_positive(name: &str, value: f32, max: f32) -> Result<()> {
    if value > 0.0 && value <= max {
        Ok(())
    } else {
        Err(RockError::InvalidConfig(format!(
            "{} must be in (0, {}] (got {})",
            name, max, value
        )))
    }
}

// ============================================================================
// NOISE
// ============================================================================

/// Distance metric used to measure how far a point is from a feature point
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistanceMetric {
    /// Straight-line distance
    Euclidean,
    /// Straight-line distance without the square root
    EuclideanSquared,
    /// Sum of absolute axis differences
    #[default]
    Manhattan,
    /// Largest absolute axis difference
    Chebyshev,
}

impl DistanceMetric {
    /// Distance between two points under this metric
    #[inline]
    pub fn distance(self, a: Vec3, b: Vec3) -> f32 {
        let d = a - b;
        match self {
            DistanceMetric::Euclidean => d.length(),
            DistanceMetric::EuclideanSquared => d.length_squared(),
            DistanceMetric::Manhattan => d.abs().element_sum(),
            DistanceMetric::Chebyshev => d.abs().max_element(),
        }
    }
}

/// One control point of a value ramp
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampStop {
    /// Input position in [0, 1]
    pub position: f32,
    /// Output value in [0, 1]
    pub value: f32,
}

impl RampStop {
    pub const fn new(position: f32, value: f32) -> Self {
        Self { position, value }
    }

    /// Stop whose value is the gray level of an RGB colour
    pub fn from_rgb(position: f32, rgb: [f32; 3]) -> Self {
        Self {
            position,
            value: (rgb[0] + rgb[1] + rgb[2]) / 3.0,
        }
    }
}

/// Configuration for the cellular noise that drives displacement
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseConfig {
    /// Distance metric between sample and feature points
    pub metric: DistanceMetric,
    /// Size of one lattice cell in sample space
    pub scale: f32,
    /// Multiplier applied to the weighted distance sum
    pub intensity: f32,
    /// Offset applied after contrast
    pub brightness: f32,
    /// Slope of the remap around 0.5
    pub contrast: f32,
    /// Weights of the 1st to 4th nearest feature distances
    pub weights: [f32; 4],
    /// Ordered control points mapping the scalar to the final value
    pub ramp: Vec<RampStop>,
    /// Seed for the feature point lattice
    pub seed: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::default(),
            scale: 1.0,
            intensity: 1.0,
            brightness: 0.8,
            contrast: 1.0,
            weights: [1.0, 0.3, 1.0, 1.0],
            ramp: vec![
                RampStop::from_rgb(0.0, [0.0, 0.0, 0.0]),
                RampStop::from_rgb(0.5, [0.21, 0.21, 0.2]),
                RampStop::from_rgb(1.0, [1.0, 1.0, 1.0]),
            ],
            seed: 0,
        }
    }
}

impl NoiseConfig {
    /// Validate every field against its domain
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for out-of-range values or a malformed ramp
    pub fn validate(&self) -> Result<()> {
        check_positive("noise scale", self.scale, 2.0)?;
        check_range("noise intensity", self.intensity, 0.01, 10.0)?;
        check_range("noise brightness", self.brightness, 0.0, 2.0)?;
        check_range("noise contrast", self.contrast, 0.0, 5.0)?;
        for (i, &w) in self.weights.iter().enumerate() {
            check_range(&format!("noise weight {}", i + 1), w, -2.0, 2.0)?;
        }
        validate_ramp(&self.ramp)
    }
}

/// A ramp needs at least two stops with strictly increasing positions in [0, 1]
fn validate_ramp(ramp: &[RampStop]) -> Result<()> {
    if ramp.len() < 2 {
        return Err(RockError::InvalidConfig(format!(
            "ramp needs at least 2 stops (got {})",
            ramp.len()
        )));
    }
    for stop in ramp {
        check_range("ramp position", stop.position, 0.0, 1.0)?;
        check_range("ramp value", stop.value, 0.0, 1.0)?;
    }
    if let Some(pair) = ramp.windows(2).find(|pair| pair[1].position <= pair[0].position) {
        return Err(RockError::InvalidConfig(format!(
            "ramp positions must be strictly increasing ({} then {})",
            pair[0].position, pair[1].position
        )));
    }
    Ok(())
}

// ============================================================================
// DISPLACEMENT
// ============================================================================

/// Direction along which vertices are pushed
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplaceDirection {
    X,
    Y,
    Z,
    /// Each vertex's own surface normal
    #[default]
    Normal,
}

/// Space in which the noise is sampled
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoordSpace {
    /// Raw vertex positions
    Local,
    /// Positions after the rock's object transform
    Global,
    /// Positions relative to a reference frame (Local when none is set)
    #[default]
    Object,
}

/// Configuration for the displacement stage
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaceConfig {
    /// Noise value that gives no displacement
    pub mid_level: f32,
    /// Displacement per unit of noise above the mid level
    pub strength: f32,
    pub direction: DisplaceDirection,
    pub coord_space: CoordSpace,
    /// World transform of the reference frame used by `CoordSpace::Object`
    pub reference_frame: Option<Affine3A>,
}

impl Default for DisplaceConfig {
    fn default() -> Self {
        Self {
            mid_level: 0.5,
            strength: 1.0,
            direction: DisplaceDirection::default(),
            coord_space: CoordSpace::default(),
            reference_frame: None,
        }
    }
}

impl DisplaceConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("displace mid level", self.mid_level, 0.0, 1.0)?;
        check_range("displace strength", self.strength, -100.0, 100.0)?;
        if let Some(frame) = self.reference_frame {
            if !frame.is_finite() || frame.matrix3.determinant().abs() <= f32::EPSILON {
                return Err(RockError::InvalidConfig(
                    "displace reference frame must be finite and invertible".into(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// DECIMATION
// ============================================================================

/// Configuration for collapse and planar decimation
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimateConfig {
    /// Fraction of faces kept by edge collapse, in (0, 1]
    pub collapse_ratio: f32,
    /// Fraction of `max_angle` used as the planar dissolve limit, in [0, 1]
    pub planar_ratio: f32,
    /// Planar dissolve angle in degrees, in [0, 180]
    pub max_angle: f32,
    /// Multiplier on noise contrast; lower values give rounder rocks
    pub sharpness: f32,
}

impl Default for DecimateConfig {
    fn default() -> Self {
        Self {
            collapse_ratio: 0.06,
            planar_ratio: 0.25,
            max_angle: 90.0,
            sharpness: 0.8,
        }
    }
}

impl DecimateConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("collapse ratio", self.collapse_ratio, 1.0)?;
        check_range("planar ratio", self.planar_ratio, 0.0, 1.0)?;
        check_range("planar max angle", self.max_angle, 0.0, 180.0)?;
        check_range("sharpness", self.sharpness, 0.0, 3.0)
    }

    /// Dihedral angle (radians) below which faces are merged
    #[inline]
    pub fn planar_angle_limit(&self) -> f32 {
        (self.planar_ratio * self.max_angle.to_radians()).min(std::f32::consts::PI)
    }
}

// ============================================================================
// REMESH
// ============================================================================

/// Surface reconstruction style of a remesh pass
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemeshMode {
    /// Axis-aligned voxel faces
    Blocks,
    /// Vertices at the centroid of their cell's surface crossings
    Smooth,
    /// Vertices at the feature-preserving minimiser of the crossing planes
    Sharp,
}

/// One voxel remesh pass
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemeshPass {
    pub mode: RemeshMode,
    /// The grid has `2^octree_depth` voxels across
    pub octree_depth: u32,
    /// Ratio of the largest mesh dimension to the grid size, in (0, 0.99]
    pub scale: f32,
}

impl RemeshPass {
    pub fn new(mode: RemeshMode, octree_depth: u32, scale: f32) -> Self {
        Self {
            mode,
            octree_depth,
            scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_OCTREE_DEPTH).contains(&self.octree_depth) {
            return Err(RockError::InvalidConfig(format!(
                "octree depth must be in [1, {}] (got {})",
                MAX_OCTREE_DEPTH, self.octree_depth
            )));
        }
        check_positive("remesh scale", self.scale, MAX_REMESH_SCALE)
    }

    /// Number of voxels along the grid's largest side
    #[inline]
    pub fn resolution(&self) -> u32 {
        1 << self.octree_depth
    }
}

/// Optional two-pass voxel remesh
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemeshConfig {
    pub enabled: bool,
    pub first: RemeshPass,
    pub second: RemeshPass,
    /// Collapse ratio applied after both passes; 1.0 skips it
    pub decimate_ratio: f32,
}

impl Default for RemeshConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            first: RemeshPass::new(RemeshMode::Blocks, 5, MAX_REMESH_SCALE),
            second: RemeshPass::new(RemeshMode::Sharp, 3, MAX_REMESH_SCALE),
            decimate_ratio: 1.0,
        }
    }
}

impl RemeshConfig {
    pub fn validate(&self) -> Result<()> {
        self.first.validate()?;
        self.second.validate()?;
        check_positive("remesh decimate ratio", self.decimate_ratio, 1.0)
    }
}

// ============================================================================
// ROCK
// ============================================================================

/// What to do with the finished mesh
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    /// Bake the non-uniform scale into the vertices
    pub apply_scale: bool,
    /// Keep a copy of the mesh after every stage
    pub keep_intermediate: bool,
    /// Hint for the host to draw the wireframe
    pub show_wireframe: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            apply_scale: true,
            keep_intermediate: false,
            show_wireframe: true,
        }
    }
}

/// Complete configuration for one rock
///
/// The same configuration always produces the identical mesh.
///
/// # Example
///
/// ```rust
/// use low_poly_rock::*;
///
/// let config = RockConfigBuilder::new()
///     .subdivisions(3)
///     .unwrap()
///     .radius(2.0)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.radius, 2.0);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RockConfig {
    /// Icosphere subdivision level, in [1, 6]
    pub subdivisions: u32,
    /// Base sphere radius
    pub radius: f32,
    /// Non-uniform object scale
    pub scale: Vec3,
    pub noise: NoiseConfig,
    pub displace: DisplaceConfig,
    pub decimate: DecimateConfig,
    pub remesh: RemeshConfig,
    pub output: OutputOptions,
}

impl Default for RockConfig {
    fn default() -> Self {
        Self {
            subdivisions: 4,
            radius: 1.0,
            scale: Vec3::ONE,
            noise: NoiseConfig::default(),
            displace: DisplaceConfig::default(),
            decimate: DecimateConfig::default(),
            remesh: RemeshConfig::default(),
            output: OutputOptions::default(),
        }
    }
}

impl RockConfig {
    /// Validate every parameter before any mesh is allocated
    ///
    /// # Errors
    ///
    /// Returns the first `InvalidConfig` found
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SUBDIVISIONS..=MAX_SUBDIVISIONS).contains(&self.subdivisions) {
            return Err(RockError::InvalidConfig(format!(
                "subdivisions must be in [{}, {}] (got {})",
                MIN_SUBDIVISIONS, MAX_SUBDIVISIONS, self.subdivisions
            )));
        }
        check_positive("radius", self.radius, f32::MAX)?;
        for (axis, value) in ["x", "y", "z"].iter().zip(self.scale.to_array()) {
            check_positive(&format!("{} scale", axis), value, f32::MAX)?;
        }
        self.noise.validate()?;
        self.displace.validate()?;
        self.decimate.validate()?;
        self.remesh.validate()
    }

    /// Noise settings as sampled: scale follows the radius, contrast the sharpness
    pub fn effective_noise(&self) -> NoiseConfig {
        NoiseConfig {
            scale: self.radius * self.noise.scale,
            contrast: self.decimate.sharpness * self.noise.contrast,
            ..self.noise.clone()
        }
    }

    /// Displacement settings as applied: strength follows the radius
    pub fn effective_displace(&self) -> DisplaceConfig {
        DisplaceConfig {
            strength: self.radius * self.displace.strength,
            ..self.displace
        }
    }

    /// Object transform of the rock (its non-uniform scale)
    #[inline]
    pub fn object_transform(&self) -> Affine3A {
        Affine3A::from_scale(self.scale)
    }
}

/// Builder for creating RockConfig with validation
///
/// Scalar setters check their range immediately; `build` validates the whole
/// configuration, including sub-configurations set wholesale.
///
/// # Example
///
/// ```rust
/// use low_poly_rock::*;
///
/// let config = RockConfigBuilder::new()
///     .scale(Vec3::new(1.0, 0.6, 1.4))
///     .unwrap()
///     .collapse_ratio(0.1)
///     .unwrap()
///     .remesh(RemeshConfig { enabled: true, ..Default::default() })
///     .build()
///     .unwrap();
///
/// assert!(config.remesh.enabled);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RockConfigBuilder {
    config: RockConfig,
}

impl RockConfigBuilder {
    /// Create a new builder with the default rock
    ///
    /// Defaults:
    /// - subdivisions: 4
    /// - radius: 1.0, scale (1, 1, 1)
    /// - collapse ratio 0.06, planar ratio 0.25 of 90 degrees
    /// - Manhattan cellular noise pushed along vertex normals
    /// - remesh disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the icosphere subdivision level
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `level` is outside [1, 6]
    pub fn subdivisions(mut self, level: u32) -> Result<Self> {
        if !(MIN_SUBDIVISIONS..=MAX_SUBDIVISIONS).contains(&level) {
            return Err(RockError::InvalidConfig(format!(
                "subdivisions must be in [{}, {}] (got {})",
                MIN_SUBDIVISIONS, MAX_SUBDIVISIONS, level
            )));
        }
        self.config.subdivisions = level;
        Ok(self)
    }

    /// Set the base sphere radius
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if radius <= 0.0
    pub fn radius(mut self, radius: f32) -> Result<Self> {
        check_positive("radius", radius, f32::MAX)?;
        self.config.radius = radius;
        Ok(self)
    }

    /// Set the non-uniform object scale
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any component <= 0.0
    pub fn scale(mut self, scale: Vec3) -> Result<Self> {
        for (axis, value) in ["x", "y", "z"].iter().zip(scale.to_array()) {
            check_positive(&format!("{} scale", axis), value, f32::MAX)?;
        }
        self.config.scale = scale;
        Ok(self)
    }

    /// Set the fraction of faces kept by edge collapse
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if ratio is outside (0, 1]
    pub fn collapse_ratio(mut self, ratio: f32) -> Result<Self> {
        check_positive("collapse ratio", ratio, 1.0)?;
        self.config.decimate.collapse_ratio = ratio;
        Ok(self)
    }

    /// Set the planar dissolve ratio and its maximum angle in degrees
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if ratio is outside [0, 1] or angle outside [0, 180]
    pub fn planar(mut self, ratio: f32, max_angle: f32) -> Result<Self> {
        check_range("planar ratio", ratio, 0.0, 1.0)?;
        check_range("planar max angle", max_angle, 0.0, 180.0)?;
        self.config.decimate.planar_ratio = ratio;
        self.config.decimate.max_angle = max_angle;
        Ok(self)
    }

    /// Set how sharp the rock will be
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if sharpness is outside [0, 3]
    pub fn sharpness(mut self, sharpness: f32) -> Result<Self> {
        check_range("sharpness", sharpness, 0.0, 3.0)?;
        self.config.decimate.sharpness = sharpness;
        Ok(self)
    }

    /// Set the noise seed
    pub fn seed(mut self, seed: u32) -> Self {
        self.config.noise.seed = seed;
        self
    }

    pub fn noise(mut self, noise: NoiseConfig) -> Self {
        self.config.noise = noise;
        self
    }

    pub fn displace(mut self, displace: DisplaceConfig) -> Self {
        self.config.displace = displace;
        self
    }

    pub fn decimate(mut self, decimate: DecimateConfig) -> Self {
        self.config.decimate = decimate;
        self
    }

    pub fn remesh(mut self, remesh: RemeshConfig) -> Self {
        self.config.remesh = remesh;
        self
    }

    pub fn output(mut self, output: OutputOptions) -> Self {
        self.config.output = output;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<RockConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = RockConfigBuilder::new().build().unwrap();
        assert_eq!(config.subdivisions, 4);
        assert_eq!(config.radius, 1.0);
        assert_eq!(config.scale, Vec3::ONE);
        assert_eq!(config.decimate.collapse_ratio, 0.06);
        assert_eq!(config.noise.metric, DistanceMetric::Manhattan);
        assert_eq!(config.displace.direction, DisplaceDirection::Normal);
        assert!(!config.remesh.enabled);
        assert!(config.output.apply_scale);
    }

    #[test]
    fn test_builder_custom() {
        let config = RockConfigBuilder::new()
            .subdivisions(2)
            .unwrap()
            .radius(3.0)
            .unwrap()
            .planar(0.5, 60.0)
            .unwrap()
            .seed(7)
            .build()
            .unwrap();

        assert_eq!(config.subdivisions, 2);
        assert_eq!(config.radius, 3.0);
        assert_eq!(config.noise.seed, 7);
        assert!((config.decimate.planar_angle_limit() - 30f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_planar_limit_within_half_turn() {
        let decimate = DecimateConfig {
            planar_ratio: 1.0,
            max_angle: 180.0,
            ..DecimateConfig::default()
        };
        assert!(decimate.planar_angle_limit() <= std::f32::consts::PI);
    }

    #[test]
    fn test_builder_invalid_subdivisions() {
        assert!(RockConfigBuilder::new().subdivisions(0).is_err());
        assert!(RockConfigBuilder::new().subdivisions(7).is_err());
    }

    #[test]
    fn test_builder_invalid_radius() {
        let result = RockConfigBuilder::new().radius(0.0);
        assert!(matches!(result, Err(RockError::InvalidConfig(_))));

        let result = RockConfigBuilder::new().radius(-5.0);
        assert!(result.is_err());

        let result = RockConfigBuilder::new().radius(f32::NAN);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_invalid_ratios() {
        assert!(RockConfigBuilder::new().collapse_ratio(0.0).is_err());
        assert!(RockConfigBuilder::new().collapse_ratio(1.5).is_err());
        assert!(RockConfigBuilder::new().planar(-0.1, 90.0).is_err());
        assert!(RockConfigBuilder::new().planar(0.5, 181.0).is_err());
    }

    #[test]
    fn test_validate_catches_wholesale_subconfigs() {
        let noise = NoiseConfig {
            ramp: vec![RampStop::new(0.0, 0.0)],
            ..Default::default()
        };
        let result = RockConfigBuilder::new().noise(noise).build();
        assert!(matches!(result, Err(RockError::InvalidConfig(_))));

        let remesh = RemeshConfig {
            first: RemeshPass::new(RemeshMode::Smooth, 0, 0.9),
            ..Default::default()
        };
        assert!(RockConfigBuilder::new().remesh(remesh).build().is_err());
    }

    #[test]
    fn test_ramp_must_increase() {
        let ramp = vec![
            RampStop::new(0.0, 0.0),
            RampStop::new(0.6, 0.5),
            RampStop::new(0.6, 1.0),
        ];
        assert!(validate_ramp(&ramp).is_err());

        let ramp = vec![RampStop::new(0.0, 0.0), RampStop::new(1.0, 1.0)];
        assert!(validate_ramp(&ramp).is_ok());
    }

    #[test]
    fn test_default_ramp_is_gray_levels() {
        let ramp = NoiseConfig::default().ramp;
        assert_eq!(ramp.len(), 3);
        assert!((ramp[1].value - 0.62 / 3.0).abs() < 1e-6);
        assert_eq!(ramp[2].value, 1.0);
    }

    #[test]
    fn test_effective_parameters() {
        let config = RockConfigBuilder::new()
            .radius(2.0)
            .unwrap()
            .sharpness(0.5)
            .unwrap()
            .build()
            .unwrap();

        let noise = config.effective_noise();
        assert_eq!(noise.scale, 2.0);
        assert_eq!(noise.contrast, 0.5);
        assert_eq!(config.effective_displace().strength, 2.0);
    }

    #[test]
    fn test_distance_metrics() {
        let a = Vec3::ZERO;
        let b = Vec3::new(1.0, -2.0, 2.0);
        assert_eq!(DistanceMetric::Euclidean.distance(a, b), 3.0);
        assert_eq!(DistanceMetric::EuclideanSquared.distance(a, b), 9.0);
        assert_eq!(DistanceMetric::Manhattan.distance(a, b), 5.0);
        assert_eq!(DistanceMetric::Chebyshev.distance(a, b), 2.0);
    }

    #[test]
    fn test_remesh_resolution() {
        let pass = RemeshPass::new(RemeshMode::Blocks, 5, 0.99);
        assert_eq!(pass.resolution(), 32);
        assert!(RemeshPass::new(RemeshMode::Blocks, 9, 0.99).validate().is_err());
        assert!(RemeshPass::new(RemeshMode::Blocks, 3, 0.0).validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = RockConfigBuilder::new().seed(12345).build().unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let restored: RockConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, restored);
    }
}
