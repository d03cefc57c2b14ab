//! 3D cellular (Voronoi) noise
//!
//! Space is cut into a unit lattice (after dividing by the noise scale) and
//! every cell owns one feature point at a pseudo-random offset inside it. The
//! field value at a point is a weighted sum of the distances to its four
//! nearest feature points, shaped by intensity, contrast and brightness and
//! finally mapped through a ramp.
//!
//! Feature offsets come from a seeded permutation table, the same lookup
//! scheme as classic Perlin noise, so the lattice is infinite, reproducible
//! and needs no storage beyond two 256-entry tables.

use glam::{IVec3, Vec3};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::ramp::Ramp;
use super::ScalarField;
use crate::config::{DistanceMetric, NoiseConfig};
use crate::error::Result;

/// Largest lattice shell searched around the containing cell
///
/// With every metric the fourth nearest feature point is found by shell 6,
/// since all 27 points of the 3×3×3 block lie within distance 6.
const MAX_SHELL: i32 = 6;

/// Period of the feature point lattice, in cells
const LATTICE_PERIOD: f32 = 256.0;

/// Seeded cellular noise field
///
/// # Example
///
/// ```rust
/// use low_poly_rock::*;
///
/// let noise = CellularNoise::new(&NoiseConfig::default()).unwrap();
/// let value = noise.sample(Vec3::new(0.3, -0.2, 0.9));
/// assert!((0.0..=1.0).contains(&value));
/// ```
#[derive(Debug, Clone)]
pub struct CellularNoise {
    metric: DistanceMetric,
    inv_scale: f32,
    intensity: f32,
    brightness: f32,
    contrast: f32,
    weights: [f32; 4],
    ramp: Ramp,
    perm: [u8; 256],
    offsets: [Vec3; 256],
}

impl CellularNoise {
    /// Build the field for a configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation
    pub fn new(config: &NoiseConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed as u64);

        let mut perm = [0u8; 256];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = i as u8;
        }
        perm.shuffle(&mut rng);

        let mut offsets = [Vec3::ZERO; 256];
        for offset in offsets.iter_mut() {
            *offset = Vec3::new(rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>());
        }

        Ok(Self {
            metric: config.metric,
            inv_scale: 1.0 / config.scale,
            intensity: config.intensity,
            brightness: config.brightness,
            contrast: config.contrast,
            weights: config.weights,
            ramp: Ramp::new(config.ramp.clone()),
            perm,
            offsets,
        })
    }

    /// Permutation table lookup for a lattice cell
    #[inline]
    fn hash(&self, cell: IVec3) -> usize {
        let a = self.perm[(cell.x & 255) as usize] as usize;
        let b = self.perm[(a + (cell.y & 255) as usize) & 255] as usize;
        self.perm[(b + (cell.z & 255) as usize) & 255] as usize
    }

    /// Feature point of a lattice cell, in lattice space
    #[inline]
    pub fn feature_point(&self, cell: IVec3) -> Vec3 {
        cell.as_vec3() + self.offsets[self.hash(cell)]
    }

    /// Distances to the four nearest feature points, ascending
    ///
    /// `point` is in lattice space (already divided by the noise scale). The
    /// 3×3×3 block around the containing cell is always searched; further
    /// shells are added until no unsearched cell could hold a closer point,
    /// so the result is exact and continuous across cell boundaries.
    pub fn nearest_distances(&self, point: Vec3) -> [f32; 4] {
        let base = point.floor();
        let frac = point - base;
        // The hash only reads the low 8 bits of each coordinate, so the
        // lattice repeats every 256 cells and the cell index stays small
        let cell = base.rem_euclid(Vec3::splat(LATTICE_PERIOD)).as_ivec3();
        // Closest approach of the point to any face of its cell
        let margin = frac.min(Vec3::ONE - frac).min_element();

        let mut nearest = [f32::INFINITY; 4];
        let visit = |offset: IVec3, nearest: &mut [f32; 4]| {
            let feature = offset.as_vec3() + self.offsets[self.hash(cell + offset)];
            insert_sorted(nearest, self.metric.distance(frac, feature));
        };

        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    visit(IVec3::new(dx, dy, dz), &mut nearest);
                }
            }
        }

        let mut shell = 1;
        while shell < MAX_SHELL && nearest[3] > self.shell_bound(shell as f32 + margin) {
            shell += 1;
            for dz in -shell..=shell {
                for dy in -shell..=shell {
                    for dx in -shell..=shell {
                        if dx.abs().max(dy.abs()).max(dz.abs()) == shell {
                            visit(IVec3::new(dx, dy, dz), &mut nearest);
                        }
                    }
                }
            }
        }

        nearest
    }

    /// Smallest distance a point of the next unsearched shell can have
    ///
    /// Every metric is at least the largest per-axis gap.
    #[inline]
    fn shell_bound(&self, gap: f32) -> f32 {
        match self.metric {
            DistanceMetric::EuclideanSquared => gap * gap,
            _ => gap,
        }
    }

    /// Weighted distance sum scaled by intensity, before contrast and ramp
    pub fn raw(&self, position: Vec3) -> f32 {
        let d = self.nearest_distances(position * self.inv_scale);
        let sum: f32 = self.weights.iter().zip(d).map(|(w, d)| w * d).sum();
        self.intensity * sum.abs()
    }

    /// Evaluate the field at a position, giving a value in [0, 1]
    pub fn evaluate(&self, position: Vec3) -> f32 {
        let v = self.raw(position);
        let v = ((v - 0.5) * self.contrast + self.brightness - 0.5).clamp(0.0, 1.0);
        self.ramp.sample(v)
    }
}

impl ScalarField for CellularNoise {
    #[inline]
    fn sample(&self, position: Vec3) -> f32 {
        self.evaluate(position)
    }
}

/// Keep the four smallest values seen so far, ascending
#[inline]
fn insert_sorted(nearest: &mut [f32; 4], d: f32) {
    if d >= nearest[3] {
        return;
    }
    let mut i = 3;
    while i > 0 && nearest[i - 1] > d {
        nearest[i] = nearest[i - 1];
        i -= 1;
    }
    nearest[i] = d;
}

/// Evaluate cellular noise once for a configuration
///
/// Builds the field on every call; create a [`CellularNoise`] to sample many
/// points.
pub fn evaluate(position: Vec3, config: &NoiseConfig) -> Result<f32> {
    Ok(CellularNoise::new(config)?.evaluate(position))
}
