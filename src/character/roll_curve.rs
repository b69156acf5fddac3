//! Speed-over-time curve for the dodge roll.

use serde::{Deserialize, Serialize};

/// One key of a [`SpeedCurve`]. Tangents are slopes (value per unit time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl CurveKey {
    pub const fn flat(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }
}

/// Cubic Hermite curve over normalized roll time [0, 1].
///
/// Outside the first/last key the curve holds the end values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeedCurve {
    keys: Vec<CurveKey>,
}

impl Default for SpeedCurve {
    /// Ease in, peak at mid-roll, ease out.
    fn default() -> Self {
        Self {
            keys: vec![
                CurveKey::flat(0.0, 0.0),
                CurveKey::flat(0.5, 1.0),
                CurveKey::flat(1.0, 0.0),
            ],
        }
    }
}

impl SpeedCurve {
    pub fn new(keys: Vec<CurveKey>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Keys must exist and be in strictly increasing time order.
    pub fn is_well_formed(&self) -> bool {
        !self.keys.is_empty()
            && self
                .keys
                .windows(2)
                .all(|pair| pair[0].time < pair[1].time)
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                return hermite(a, b, t);
            }
        }
        last.value
    }

    /// Trapezoid-rule area under the curve over [0, 1].
    pub fn integrate_unit(&self, samples: usize) -> f32 {
        let samples = samples.max(1);
        let h = 1.0 / samples as f32;
        let mut area = 0.0;
        for i in 0..samples {
            let t0 = i as f32 * h;
            area += 0.5 * (self.evaluate(t0) + self.evaluate(t0 + h)) * h;
        }
        area
    }
}

fn hermite(a: CurveKey, b: CurveKey, t: f32) -> f32 {
    let span = b.time - a.time;
    let s = (t - a.time) / span;
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    h00 * a.value + h10 * span * a.out_tangent + h01 * b.value + h11 * span * b.in_tangent
}
