use serde::{Deserialize, Serialize};

use crate::core::primitives::sign;

/// Interpolation family of one continuous scale segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PieceType {
    #[default]
    Linear,
    Log,
    /// Endpoints are UTC timestamps in milliseconds.
    UtcTime,
}

/// Interpolator/deinterpolator pair compiled for one segment.
///
/// `lower`/`upper` are already converted into the interpolation space
/// (`ln|v|` for [`PieceType::Log`]), `sign` restores the original sign on
/// the way back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SegmentInterpolator {
    kind: PieceType,
    lower: f64,
    upper: f64,
    sign: f64,
}

impl SegmentInterpolator {
    pub(crate) fn new(kind: PieceType, a: f64, b: f64) -> Self {
        match kind {
            PieceType::Log => {
                let sign_a = sign(a);
                Self {
                    kind,
                    lower: a.abs().ln(),
                    upper: b.abs().ln(),
                    sign: if sign_a != 0.0 { sign_a } else { sign(b) },
                }
            }
            PieceType::Linear | PieceType::UtcTime => Self {
                kind,
                lower: a,
                upper: b,
                sign: 1.0,
            },
        }
    }

    fn convert(self, value: f64) -> f64 {
        match self.kind {
            PieceType::Log => value.abs().ln(),
            PieceType::Linear | PieceType::UtcTime => value,
        }
    }

    /// Value to ratio inside the segment. A degenerate segment maps to 0.
    pub(crate) fn interpolate(self, value: f64) -> f64 {
        let span = self.upper - self.lower;
        if span == 0.0 {
            return 0.0;
        }
        (self.convert(value) - self.lower) / span
    }

    /// Ratio inside the segment back to a value. A degenerate segment yields
    /// its lower bound.
    pub(crate) fn deinterpolate(self, ratio: f64) -> f64 {
        let span = self.upper - self.lower;
        let converted = if span == 0.0 {
            self.lower
        } else {
            self.lower + ratio * span
        };
        match self.kind {
            PieceType::Log => self.sign * converted.exp(),
            PieceType::Linear | PieceType::UtcTime => converted,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn log_segment_restores_negative_sign() {
        let segment = SegmentInterpolator::new(PieceType::Log, -1000.0, -10.0);
        let ratio = segment.interpolate(-100.0);
        assert_relative_eq!(ratio, 0.5, epsilon = 1e-12);
        assert_relative_eq!(segment.deinterpolate(ratio), -100.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_segment_is_constant() {
        let segment = SegmentInterpolator::new(PieceType::Linear, 5.0, 5.0);
        assert_eq!(segment.interpolate(42.0), 0.0);
        assert_eq!(segment.deinterpolate(0.7), 5.0);
    }
}
