use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{ChartError, ChartResult};

pub fn decimal_to_f64(value: Decimal, field_name: &str) -> ChartResult<f64> {
    value.to_f64().ok_or_else(|| {
        ChartError::InvalidData(format!("{field_name} cannot be represented as f64"))
    })
}

/// Timestamps travel through scales and tables as UTC milliseconds.
#[must_use]
pub fn datetime_to_millis(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64
}

#[must_use]
pub fn millis_to_datetime(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis.round() as i64)
}

/// Rounds to `digits` decimal places, absorbing float noise such as
/// `0.1 + 0.2`.
#[must_use]
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10_f64.powi(digits);
    (value * factor).round() / factor
}

#[must_use]
pub fn roughly_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

/// Largest multiple of `interval` (offset by `base`) not above `value`.
#[must_use]
pub fn align_left(value: f64, interval: f64, base: f64) -> f64 {
    let steps = round_to((value - base) / interval, 7).floor();
    round_to(base + steps * interval, 7)
}

/// Smallest multiple of `interval` (offset by `base`) not below `value`.
#[must_use]
pub fn align_right(value: f64, interval: f64, base: f64) -> f64 {
    let steps = round_to((value - base) / interval, 7).ceil();
    round_to(base + steps * interval, 7)
}

/// Returns `-1`, `0` or `1`; NaN yields 0.
#[must_use]
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_snaps_to_interval_grid() {
        assert_eq!(align_left(13.0, 5.0, 0.0), 10.0);
        assert_eq!(align_right(13.0, 5.0, 0.0), 15.0);
        assert_eq!(align_right(15.0, 5.0, 0.0), 15.0);
        assert_eq!(align_left(0.7, 0.2, 0.1), 0.7);
    }

    #[test]
    fn millis_round_trip() {
        let time = millis_to_datetime(1_700_000_000_000.0).expect("valid timestamp");
        assert_eq!(datetime_to_millis(time), 1_700_000_000_000.0);
        assert!(millis_to_datetime(f64::NAN).is_none());
    }
}
