//! Value-to-ratio mappings and their tick generators.

pub mod continuous;
pub mod interpolation;
pub mod linear;
pub mod linear_ticks;
pub mod ordinal;
pub mod ordinal_ticks;

use std::cell::RefCell;
use std::rc::Rc;

pub use continuous::ContinuousScale;
pub use interpolation::PieceType;
pub use linear::{LinearScale, ScaleExtent};
pub use linear_ticks::{LinearTicks, TicksMode, nice_interval};
pub use ordinal::{CategoryKey, OrdinalScale};
pub use ordinal_ticks::OrdinalTicks;

use crate::core::{Invalidatable, StatefulCore};

/// One tick resolved against its scale.
#[derive(Debug, Clone, PartialEq)]
pub struct TickMark {
    pub value: f64,
    pub ratio: f64,
    pub label: String,
}

/// Scales that can feed an axis with ticks.
pub trait TickSource {
    fn major_ticks(&self) -> Vec<TickMark>;

    fn minor_ticks(&self) -> Vec<TickMark> {
        Vec::new()
    }
}

impl TickSource for LinearScale {
    fn major_ticks(&self) -> Vec<TickMark> {
        self.ticks_values()
            .into_iter()
            .map(|value| TickMark {
                value,
                ratio: self.transform(value),
                label: format_tick_value(value),
            })
            .collect()
    }

    fn minor_ticks(&self) -> Vec<TickMark> {
        self.minor_ticks_values()
            .into_iter()
            .map(|value| TickMark {
                value,
                ratio: self.transform(value),
                label: String::new(),
            })
            .collect()
    }
}

impl TickSource for OrdinalScale {
    fn major_ticks(&self) -> Vec<TickMark> {
        self.ticks_values()
            .into_iter()
            .map(|index| TickMark {
                value: index,
                ratio: self.index_ratio(index),
                label: self.label_for_index(index).unwrap_or_default(),
            })
            .collect()
    }

    fn minor_ticks(&self) -> Vec<TickMark> {
        self.minor_ticks_values()
            .into_iter()
            .map(|index| TickMark {
                value: index,
                ratio: self.index_ratio(index),
                label: String::new(),
            })
            .collect()
    }
}

/// Continuous scales carry no tick generator; the domain breakpoints stand in.
impl TickSource for ContinuousScale {
    fn major_ticks(&self) -> Vec<TickMark> {
        self.domain()
            .iter()
            .map(|value| TickMark {
                value: *value,
                ratio: self.transform(*value),
                label: format_tick_value(*value),
            })
            .collect()
    }
}

fn format_tick_value(value: f64) -> String {
    let rounded = crate::core::primitives::round_to(value, 7);
    if rounded == 0.0 {
        return "0".to_owned();
    }
    format!("{rounded}")
}

/// Shared handle to any scale kind, as held by series, axes and markers.
#[derive(Debug, Clone)]
pub enum ScaleRef {
    Continuous(Rc<RefCell<ContinuousScale>>),
    Linear(Rc<RefCell<LinearScale>>),
    Ordinal(Rc<RefCell<OrdinalScale>>),
}

impl ScaleRef {
    #[must_use]
    pub fn continuous(scale: ContinuousScale) -> Self {
        Self::Continuous(Rc::new(RefCell::new(scale)))
    }

    #[must_use]
    pub fn linear(scale: LinearScale) -> Self {
        Self::Linear(Rc::new(RefCell::new(scale)))
    }

    #[must_use]
    pub fn ordinal(scale: OrdinalScale) -> Self {
        Self::Ordinal(Rc::new(RefCell::new(scale)))
    }

    /// Handle to the scale's state core; clones share the same state.
    #[must_use]
    pub fn core(&self) -> StatefulCore {
        match self {
            Self::Continuous(scale) => scale.borrow().core().clone(),
            Self::Linear(scale) => scale.borrow().core().clone(),
            Self::Ordinal(scale) => scale.borrow().core().clone(),
        }
    }

    #[must_use]
    pub fn is_ordinal(&self) -> bool {
        matches!(self, Self::Ordinal(_))
    }

    /// Ratio of a numeric value. Ordinal scales resolve it as a category key.
    #[must_use]
    pub fn transform(&self, value: f64) -> f64 {
        match self {
            Self::Continuous(scale) => scale.borrow().transform(value),
            Self::Linear(scale) => scale.borrow().transform(value),
            Self::Ordinal(scale) => scale.borrow().transform(&CategoryKey::from(value)),
        }
    }

    /// Ratio of a category key. Numeric scales only accept number keys.
    #[must_use]
    pub fn transform_key(&self, key: &CategoryKey, sub_range_ratio: f64) -> f64 {
        match (self, key) {
            (Self::Ordinal(scale), key) => scale.borrow().band_transform(key, sub_range_ratio),
            (_, CategoryKey::Number(value)) => self.transform(value.0),
            (_, CategoryKey::Text(_)) => f64::NAN,
        }
    }

    #[must_use]
    pub fn inverse_transform(&self, ratio: f64) -> f64 {
        match self {
            Self::Continuous(scale) => scale.borrow().inverse_transform(ratio),
            Self::Linear(scale) => scale.borrow().inverse_transform(ratio),
            Self::Ordinal(scale) => {
                let scale = scale.borrow();
                scale
                    .band_inverse_transform(ratio)
                    .and_then(|key| scale.index_of(&key))
                    .map_or(f64::NAN, |index| index as f64)
            }
        }
    }

    /// Band width as a ratio; numeric scales have none.
    #[must_use]
    pub fn point_width_ratio(&self) -> f64 {
        match self {
            Self::Ordinal(scale) => scale.borrow().point_width_ratio(),
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn major_ticks(&self) -> Vec<TickMark> {
        match self {
            Self::Continuous(scale) => scale.borrow().major_ticks(),
            Self::Linear(scale) => scale.borrow().major_ticks(),
            Self::Ordinal(scale) => scale.borrow().major_ticks(),
        }
    }

    #[must_use]
    pub fn minor_ticks(&self) -> Vec<TickMark> {
        match self {
            Self::Continuous(scale) => TickSource::minor_ticks(&*scale.borrow()),
            Self::Linear(scale) => TickSource::minor_ticks(&*scale.borrow()),
            Self::Ordinal(scale) => TickSource::minor_ticks(&*scale.borrow()),
        }
    }

    /// Whether both handles point at the same scale.
    #[must_use]
    pub fn same_scale(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Continuous(a), Self::Continuous(b)) => Rc::ptr_eq(a, b),
            (Self::Linear(a), Self::Linear(b)) => Rc::ptr_eq(a, b),
            (Self::Ordinal(a), Self::Ordinal(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl TickSource for ScaleRef {
    fn major_ticks(&self) -> Vec<TickMark> {
        Self::major_ticks(self)
    }

    fn minor_ticks(&self) -> Vec<TickMark> {
        Self::minor_ticks(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_labels_are_trimmed() {
        assert_eq!(format_tick_value(2.5), "2.5");
        assert_eq!(format_tick_value(10.0), "10");
        assert_eq!(format_tick_value(-0.0), "0");
        assert_eq!(format_tick_value(0.1 + 0.2), "0.3");
    }

    #[test]
    fn ordinal_handle_uses_bands_for_keys() {
        let mut ordinal = OrdinalScale::new();
        ordinal.set_values(["a", "b"]);
        let handle = ScaleRef::ordinal(ordinal);
        assert_eq!(handle.transform_key(&"b".into(), 0.5), 0.75);
        assert_eq!(handle.point_width_ratio(), 0.5);
        assert_eq!(handle.inverse_transform(0.2), 0.0);
    }

    #[test]
    fn handle_minor_ticks_are_tick_marks() {
        let mut linear = LinearScale::new();
        linear.extend_data_range([0.0, 10.0]);
        let expected = linear.minor_ticks_values();
        let handle = ScaleRef::linear(linear);
        let minor: Vec<f64> = handle.minor_ticks().iter().map(|tick| tick.value).collect();
        assert_eq!(minor, expected);
        assert!(!minor.is_empty());
    }
}
