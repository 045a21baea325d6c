use serde::{Deserialize, Serialize};

use crate::render::PointState;

/// Open/high/low/close quadruple, either in data units or in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Ohlc {
    #[must_use]
    pub const fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|value| value.is_finite())
    }

    #[must_use]
    pub fn map(self, transform: impl Fn(f64) -> f64) -> Self {
        Self {
            open: transform(self.open),
            high: transform(self.high),
            low: transform(self.low),
            close: transform(self.close),
        }
    }
}

/// Pixel metadata a drawer reads for one data point.
///
/// `x` is the category-axis coordinate and `value`/`zero` are value-axis
/// coordinates; vertical series swap them when emitting paths. The
/// `prev_*`/`next_*` pairs are only set for stacked points next to a gap
/// and are NaN otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMeta {
    pub index: usize,
    pub state: PointState,
    pub x: f64,
    pub value: f64,
    pub zero: f64,
    pub zero_missing: bool,
    pub missing: bool,
    pub prev_value: f64,
    pub prev_zero: f64,
    pub next_value: f64,
    pub next_zero: f64,
    pub ohlc: Option<Ohlc>,
    pub rising: bool,
}

impl PointMeta {
    #[must_use]
    pub fn new(index: usize, x: f64, value: f64, zero: f64) -> Self {
        Self {
            index,
            state: PointState::Normal,
            x,
            value,
            zero,
            zero_missing: false,
            missing: false,
            prev_value: f64::NAN,
            prev_zero: f64::NAN,
            next_value: f64::NAN,
            next_zero: f64::NAN,
            ohlc: None,
            rising: false,
        }
    }

    #[must_use]
    pub fn missing(index: usize, x: f64) -> Self {
        Self {
            missing: true,
            ..Self::new(index, x, f64::NAN, f64::NAN)
        }
    }

    /// Point whose pixel quadruple drives the geometry; `value` is the close.
    #[must_use]
    pub fn with_ohlc(index: usize, x: f64, pixels: Ohlc, rising: bool) -> Self {
        Self {
            ohlc: Some(pixels),
            rising,
            ..Self::new(index, x, pixels.close, f64::NAN)
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: PointState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn has_prev_stack(&self) -> bool {
        !self.prev_value.is_nan() && !self.prev_zero.is_nan()
    }

    #[must_use]
    pub fn has_next_stack(&self) -> bool {
        !self.next_value.is_nan() && !self.next_zero.is_nan()
    }
}
