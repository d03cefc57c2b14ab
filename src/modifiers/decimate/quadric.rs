//! Quadric error metric

use std::ops::{Add, AddAssign};

use glam::{DMat3, DVec3};

/// Determinant below which the 3×3 part is treated as singular
const SINGULAR_EPSILON: f64 = 1e-10;

/// Symmetric 4×4 matrix measuring squared distance to a set of planes
///
/// Stored as the upper triangle:
/// ```text
/// [0 1 2 3]
/// [  4 5 6]
/// [    7 8]
/// [      9]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quadric {
    data: [f64; 10],
}

impl Quadric {
    /// Quadric of the plane `n·x + d = 0`, `n` of unit length
    pub fn from_plane(n: DVec3, d: f64) -> Self {
        let (a, b, c) = (n.x, n.y, n.z);
        Quadric {
            data: [
                a * a,
                a * b,
                a * c,
                a * d,
                b * b,
                b * c,
                b * d,
                c * c,
                c * d,
                d * d,
            ],
        }
    }

    /// Quadric of the plane through `point` with unit normal `n`
    pub fn from_point_normal(point: DVec3, n: DVec3) -> Self {
        Self::from_plane(n, -n.dot(point))
    }

    /// Scale every coefficient by `weight`
    pub fn scaled(mut self, weight: f64) -> Self {
        for x in &mut self.data {
            *x *= weight;
        }
        self
    }

    /// Sum of squared plane distances at `p`
    #[inline]
    pub fn evaluate(&self, p: DVec3) -> f64 {
        let d = &self.data;
        let (x, y, z) = (p.x, p.y, p.z);
        x * x * d[0]
            + 2.0 * x * y * d[1]
            + 2.0 * x * z * d[2]
            + 2.0 * x * d[3]
            + y * y * d[4]
            + 2.0 * y * z * d[5]
            + 2.0 * y * d[6]
            + z * z * d[7]
            + 2.0 * z * d[8]
            + d[9]
    }

    /// Point minimising the error for a collapse of edge `v1`–`v2`
    ///
    /// Solves the 3×3 system when it is well conditioned and the solution
    /// stays within one edge length of the midpoint. Otherwise the best of the
    /// midpoint and both endpoints is used.
    pub fn optimal_point(&self, v1: DVec3, v2: DVec3) -> DVec3 {
        let d = &self.data;
        let a = DMat3::from_cols(
            DVec3::new(d[0], d[1], d[2]),
            DVec3::new(d[1], d[4], d[5]),
            DVec3::new(d[2], d[5], d[7]),
        );
        let b = DVec3::new(-d[3], -d[6], -d[8]);

        let mid = (v1 + v2) * 0.5;
        if a.determinant().abs() > SINGULAR_EPSILON {
            let x = a.inverse() * b;
            if x.is_finite() && x.distance(mid) <= v1.distance(v2) {
                return x;
            }
        }

        let mut best = mid;
        let mut best_err = self.evaluate(mid);
        for c in [v1, v2] {
            let err = self.evaluate(c);
            if err < best_err {
                best_err = err;
                best = c;
            }
        }
        best
    }
}

impl Add for Quadric {
    type Output = Quadric;

    #[inline]
    fn add(mut self, other: Quadric) -> Quadric {
        self += other;
        self
    }
}

impl AddAssign for Quadric {
    #[inline]
    fn add_assign(&mut self, other: Quadric) {
        for (a, b) in self.data.iter_mut().zip(other.data) {
            *a += b;
        }
    }
}
