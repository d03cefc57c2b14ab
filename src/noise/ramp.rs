//! B-spline value ramp

use crate::config::RampStop;

/// Smooth mapping from [0, 1] to [0, 1] through ordered control points
///
/// Between two stops the output is a uniform cubic B-spline over the four
/// surrounding stops, with the end stops repeated. The curve approximates
/// the stops rather than passing through them, and is C2 continuous across
/// stops. Inputs outside the first and last stop evaluate the curve at the
/// nearest end.
#[derive(Debug, Clone, PartialEq)]
pub struct Ramp {
    stops: Vec<RampStop>,
}

impl Ramp {
    /// Create a ramp from stops that have already been validated
    pub fn new(stops: Vec<RampStop>) -> Self {
        Self { stops }
    }

    pub fn stops(&self) -> &[RampStop] {
        &self.stops
    }

    /// Map `x` through the ramp
    pub fn sample(&self, x: f32) -> f32 {
        let stops = &self.stops;
        match stops.len() {
            0 => return x.clamp(0.0, 1.0),
            1 => return stops[0].value,
            _ => {}
        }

        let last = stops.len() - 1;
        let x = x.clamp(stops[0].position, stops[last].position);

        // Segment [lower, lower + 1] containing x
        let lower = stops[1..]
            .iter()
            .position(|s| x <= s.position)
            .unwrap_or(last - 1);
        let upper = lower + 1;

        let span = stops[upper].position - stops[lower].position;
        let s = ((x - stops[lower].position) / span).clamp(0.0, 1.0);

        let p0 = stops[lower.saturating_sub(1)].value;
        let p1 = stops[lower].value;
        let p2 = stops[upper].value;
        let p3 = stops[(upper + 1).min(last)].value;

        let [w0, w1, w2, w3] = bspline_weights(s);
        (w0 * p0 + w1 * p1 + w2 * p2 + w3 * p3).clamp(0.0, 1.0)
    }
}

/// Uniform cubic B-spline basis at `t` in [0, 1]
#[inline]
fn bspline_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    let u = 1.0 - t;
    [
        u * u * u / 6.0,
        (3.0 * t3 - 6.0 * t2 + 4.0) / 6.0,
        (-3.0 * t3 + 3.0 * t2 + 3.0 * t + 1.0) / 6.0,
        t3 / 6.0,
    ]
}
