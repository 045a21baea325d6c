use std::cell::RefCell;

use tracing::{debug, warn};

use crate::core::primitives::roughly_equal;
use crate::core::{
    ConsistencyState, Invalidatable, Signal, SignalMask, StateMask, StatefulCore, WarningCode,
};
use crate::core::reporting::{SharedReporter, default_reporter};
use crate::scales::linear_ticks::{LinearTicks, TicksMode};

const DEFAULT_MAX_TICKS_COUNT: usize = 1000;

/// Resolved extent and tick sets of a [`LinearScale`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleExtent {
    pub minimum: f64,
    pub maximum: f64,
    pub ticks: Vec<f64>,
    pub minor_ticks: Vec<f64>,
}

/// Numeric scale whose extent is derived from the data it is fed.
///
/// Bounds are auto-calculated unless set explicitly. Soft bounds, range
/// based gaps and the stick-to-zero flag shape the auto extent, then the
/// major ticks snap auto bounds to the tick interval.
pub struct LinearScale {
    core: StatefulCore,
    reporter: SharedReporter,
    data_min: f64,
    data_max: f64,
    old_data_min: f64,
    old_data_max: f64,
    minimum: Option<f64>,
    maximum: Option<f64>,
    soft_minimum: Option<f64>,
    soft_maximum: Option<f64>,
    minimum_gap: f64,
    maximum_gap: f64,
    stick_to_zero: bool,
    inverted: bool,
    logarithmic: bool,
    max_ticks_count: usize,
    ticks: LinearTicks,
    minor_ticks: LinearTicks,
    extent: RefCell<Option<ScaleExtent>>,
}

impl LinearScale {
    #[must_use]
    pub fn new() -> Self {
        Self::with_reporter(default_reporter())
    }

    #[must_use]
    pub fn with_reporter(reporter: SharedReporter) -> Self {
        let core = StatefulCore::new(
            "linear_scale",
            StateMask::from_state(ConsistencyState::ScaleRecalculation),
            Signal::NeedsReapplication | Signal::NeedsRecalculation,
        );
        let ticks = LinearTicks::new();
        let mut minor_ticks = LinearTicks::new();
        minor_ticks.set_count(5);
        for child in [&ticks, &minor_ticks] {
            let scale = core.downgrade();
            child.listen_signals(Signal::NeedsReapplication, move |_| {
                if let Some(scale) = scale.upgrade() {
                    scale.invalidate(
                        ConsistencyState::ScaleRecalculation,
                        Signal::NeedsReapplication,
                    );
                }
            });
        }

        Self {
            core,
            reporter,
            data_min: f64::INFINITY,
            data_max: f64::NEG_INFINITY,
            old_data_min: f64::INFINITY,
            old_data_max: f64::NEG_INFINITY,
            minimum: None,
            maximum: None,
            soft_minimum: None,
            soft_maximum: None,
            minimum_gap: 0.0,
            maximum_gap: 0.0,
            stick_to_zero: false,
            inverted: false,
            logarithmic: false,
            max_ticks_count: DEFAULT_MAX_TICKS_COUNT,
            ticks,
            minor_ticks,
            extent: RefCell::new(None),
        }
    }

    fn changed(&self, signal: Signal) {
        self.core
            .invalidate(ConsistencyState::ScaleRecalculation, signal);
    }

    #[must_use]
    pub fn ticks(&self) -> &LinearTicks {
        &self.ticks
    }

    /// Tick changes re-enter the scale through its listener.
    pub fn ticks_mut(&mut self) -> &mut LinearTicks {
        &mut self.ticks
    }

    #[must_use]
    pub fn minor_ticks(&self) -> &LinearTicks {
        &self.minor_ticks
    }

    pub fn minor_ticks_mut(&mut self) -> &mut LinearTicks {
        &mut self.minor_ticks
    }

    /// `None` returns the bound to auto mode.
    pub fn set_minimum(&mut self, value: Option<f64>) -> &mut Self {
        let value = value.filter(|value| value.is_finite());
        if value != self.minimum || (value.is_none() && self.soft_minimum.is_some()) {
            self.minimum = value;
            self.soft_minimum = None;
            self.changed(match value {
                Some(_) => Signal::NeedsReapplication,
                None => Signal::NeedsRecalculation,
            });
        }
        self
    }

    pub fn set_maximum(&mut self, value: Option<f64>) -> &mut Self {
        let value = value.filter(|value| value.is_finite());
        if value != self.maximum || (value.is_none() && self.soft_maximum.is_some()) {
            self.maximum = value;
            self.soft_maximum = None;
            self.changed(match value {
                Some(_) => Signal::NeedsReapplication,
                None => Signal::NeedsRecalculation,
            });
        }
        self
    }

    /// Lower bound the auto minimum never exceeds. Switches the minimum to auto.
    pub fn set_soft_minimum(&mut self, value: Option<f64>) -> &mut Self {
        let value = value.filter(|value| value.is_finite());
        if value != self.soft_minimum {
            self.soft_minimum = value;
            self.minimum = None;
            self.changed(Signal::NeedsRecalculation);
        }
        self
    }

    pub fn set_soft_maximum(&mut self, value: Option<f64>) -> &mut Self {
        let value = value.filter(|value| value.is_finite());
        if value != self.soft_maximum {
            self.soft_maximum = value;
            self.maximum = None;
            self.changed(Signal::NeedsRecalculation);
        }
        self
    }

    #[must_use]
    pub fn soft_minimum(&self) -> Option<f64> {
        self.soft_minimum
    }

    #[must_use]
    pub fn soft_maximum(&self) -> Option<f64> {
        self.soft_maximum
    }

    /// Range based gap added below the data minimum (ratio of the range).
    pub fn set_minimum_gap(&mut self, gap: f64) -> &mut Self {
        let gap = if gap.is_finite() { gap } else { 0.0 };
        if self.minimum_gap != gap {
            self.minimum_gap = gap;
            if self.minimum.is_none() {
                self.changed(Signal::NeedsReapplication);
            }
        }
        self
    }

    pub fn set_maximum_gap(&mut self, gap: f64) -> &mut Self {
        let gap = if gap.is_finite() { gap } else { 0.0 };
        if self.maximum_gap != gap {
            self.maximum_gap = gap;
            if self.maximum.is_none() {
                self.changed(Signal::NeedsReapplication);
            }
        }
        self
    }

    #[must_use]
    pub fn minimum_gap(&self) -> f64 {
        self.minimum_gap
    }

    #[must_use]
    pub fn maximum_gap(&self) -> f64 {
        self.maximum_gap
    }

    pub fn set_stick_to_zero(&mut self, enabled: bool) -> &mut Self {
        if self.stick_to_zero != enabled {
            self.stick_to_zero = enabled;
            self.changed(Signal::NeedsRecalculation);
        }
        self
    }

    pub fn set_inverted(&mut self, inverted: bool) -> &mut Self {
        if self.inverted != inverted {
            self.inverted = inverted;
            self.core.dispatch_signal(Signal::NeedsReapplication);
        }
        self
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Switches transform and both tick generators to base-10 log mode.
    pub fn set_logarithmic(&mut self, logarithmic: bool) -> &mut Self {
        if self.logarithmic != logarithmic {
            self.logarithmic = logarithmic;
            let mode = if logarithmic {
                TicksMode::Logarithmic
            } else {
                TicksMode::Linear
            };
            self.ticks.set_mode(mode);
            self.minor_ticks.set_mode(mode);
            self.changed(Signal::NeedsReapplication);
        }
        self
    }

    #[must_use]
    pub fn is_logarithmic(&self) -> bool {
        self.logarithmic
    }

    pub fn set_max_ticks_count(&mut self, count: usize) -> &mut Self {
        let count = count.max(1);
        if self.max_ticks_count != count {
            self.max_ticks_count = count;
            self.changed(Signal::NeedsReapplication);
        }
        self
    }

    #[must_use]
    pub fn max_ticks_count(&self) -> usize {
        self.max_ticks_count
    }

    #[must_use]
    pub fn needs_auto_calc(&self) -> bool {
        self.minimum.is_none() || self.maximum.is_none()
    }

    /// Starts a new data range accumulation.
    pub fn reset_data_range(&mut self) -> &mut Self {
        self.old_data_min = self.data_min;
        self.old_data_max = self.data_max;
        self.data_min = f64::INFINITY;
        self.data_max = f64::NEG_INFINITY;
        self.core
            .invalidate(ConsistencyState::ScaleRecalculation, SignalMask::none());
        self
    }

    /// Widens the data range with `values`; NaN values are skipped.
    pub fn extend_data_range(&mut self, values: impl IntoIterator<Item = f64>) -> &mut Self {
        let mut widened = false;
        for value in values {
            if value < self.data_min {
                self.data_min = value;
                widened = true;
            }
            if value > self.data_max {
                self.data_max = value;
                widened = true;
            }
        }
        if widened {
            self.core
                .invalidate(ConsistencyState::ScaleRecalculation, SignalMask::none());
        }
        self
    }

    #[must_use]
    pub fn data_range(&self) -> (f64, f64) {
        (self.data_min, self.data_max)
    }

    /// Compares the data range with the one before the last reset.
    pub fn check_scale_changed(&self, silently: bool) -> bool {
        let changed = self.old_data_min != self.data_min || self.old_data_max != self.data_max;
        if changed {
            let signals = if silently {
                SignalMask::none()
            } else {
                SignalMask::from_signal(Signal::NeedsReapplication)
            };
            self.core
                .invalidate(ConsistencyState::ScaleRecalculation, signals);
        }
        changed
    }

    fn with_extent<R>(&self, read: impl FnOnce(&ScaleExtent) -> R) -> R {
        self.calculate();
        match self.extent.borrow().as_ref() {
            Some(extent) => read(extent),
            None => read(&self.compute_extent()),
        }
    }

    /// Resolved extent; recalculated when the scale is dirty.
    #[must_use]
    pub fn extent(&self) -> ScaleExtent {
        self.with_extent(ScaleExtent::clone)
    }

    #[must_use]
    pub fn minimum(&self) -> f64 {
        self.with_extent(|extent| extent.minimum)
    }

    #[must_use]
    pub fn maximum(&self) -> f64 {
        self.with_extent(|extent| extent.maximum)
    }

    #[must_use]
    pub fn ticks_values(&self) -> Vec<f64> {
        self.with_extent(|extent| extent.ticks.clone())
    }

    #[must_use]
    pub fn minor_ticks_values(&self) -> Vec<f64> {
        self.with_extent(|extent| extent.minor_ticks.clone())
    }

    fn calculate(&self) {
        let dirty = self
            .core
            .has_invalidation_state(ConsistencyState::ScaleRecalculation);
        if !dirty && self.extent.borrow().is_some() {
            return;
        }
        let extent = self.compute_extent();
        debug!(
            minimum = extent.minimum,
            maximum = extent.maximum,
            ticks = extent.ticks.len(),
            "linear scale calculated"
        );
        *self.extent.borrow_mut() = Some(extent);
        self.core
            .mark_consistent(ConsistencyState::ScaleRecalculation);
    }

    fn compute_extent(&self) -> ScaleExtent {
        let (data_min, data_max) = normalized_data_range(self.data_min, self.data_max);
        let min_auto = self.minimum.is_none();
        let max_auto = self.maximum.is_none();

        let max_seed = match self.maximum {
            Some(value) => value,
            None => self
                .soft_maximum
                .map_or(data_max, |soft| data_max.max(soft)),
        };
        let min_seed = match self.minimum {
            Some(value) => value,
            None => self
                .soft_minimum
                .map_or(data_min, |soft| data_min.min(soft)),
        };
        let range = max_seed - min_seed;

        let mut minimum = min_seed;
        let mut maximum = max_seed;
        if range.abs() < 1e-4 && !min_auto && !max_auto {
            maximum += 1e-4;
        }

        if min_auto {
            minimum = data_min - range * self.minimum_gap;
            if let Some(soft) = self.soft_minimum {
                minimum = if range > 0.0 { minimum.min(soft) } else { minimum.max(soft) };
            }
            if self.stick_to_zero
                && minimum < 0.0
                && data_min >= 0.0
                && Some(minimum) != self.soft_minimum
            {
                minimum = 0.0;
            }
        }
        if max_auto {
            maximum = data_max + range * self.maximum_gap;
            if let Some(soft) = self.soft_maximum {
                maximum = if range > 0.0 { maximum.max(soft) } else { maximum.min(soft) };
            }
            if self.stick_to_zero
                && maximum > 0.0
                && data_max <= 0.0
                && Some(maximum) != self.soft_maximum
            {
                maximum = 0.0;
            }
        }

        let can_modify_min = min_auto && Some(minimum) != self.soft_minimum;
        let can_modify_max = max_auto && Some(maximum) != self.soft_maximum;
        let mut major = self.ticks.setup_major(
            minimum,
            maximum,
            can_modify_min,
            can_modify_max,
            self.max_ticks_count,
        );
        if major.is_truncated() {
            let requested = major.requested.to_string();
            let allowed = self.max_ticks_count.to_string();
            self.reporter
                .warning(WarningCode::TooManyTicks, &[requested.as_str(), allowed.as_str()]);
            warn!(requested = major.requested, allowed = self.max_ticks_count, "tick interval too dense");
            let mut fallback = LinearTicks::new();
            fallback.set_mode(self.ticks.mode()).set_base(self.ticks.base());
            fallback.set_count(self.ticks.count());
            major = fallback.setup_major(
                minimum,
                maximum,
                can_modify_min,
                can_modify_max,
                self.max_ticks_count,
            );
        }
        if min_auto {
            minimum = major.minimum;
        }
        if max_auto {
            maximum = major.maximum;
        }
        let minor_ticks =
            self.minor_ticks
                .setup_minor(&major.ticks, minimum, maximum, self.max_ticks_count);

        ScaleExtent {
            minimum,
            maximum,
            ticks: major.ticks,
            minor_ticks,
        }
    }

    /// Value to ratio; `inverted` flips the result.
    #[must_use]
    pub fn transform(&self, value: f64) -> f64 {
        let (minimum, maximum) = self.with_extent(|extent| (extent.minimum, extent.maximum));
        let ratio = if self.logarithmic {
            let low = minimum.max(1e-7).log10();
            let high = maximum.max(1e-7).log10();
            (value.max(1e-7).log10() - low) / (high - low)
        } else {
            (value - minimum) / (maximum - minimum)
        };
        if self.inverted { 1.0 - ratio } else { ratio }
    }

    #[must_use]
    pub fn inverse_transform(&self, ratio: f64) -> f64 {
        let (minimum, maximum) = self.with_extent(|extent| (extent.minimum, extent.maximum));
        let ratio = if self.inverted { 1.0 - ratio } else { ratio };
        if self.logarithmic {
            let low = minimum.max(1e-7).log10();
            let high = maximum.max(1e-7).log10();
            10_f64.powf(low + ratio * (high - low))
        } else {
            minimum + ratio * (maximum - minimum)
        }
    }
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::new()
    }
}

impl Invalidatable for LinearScale {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

impl std::fmt::Debug for LinearScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearScale")
            .field("data_range", &(self.data_min, self.data_max))
            .field("minimum", &self.minimum)
            .field("maximum", &self.maximum)
            .field("inverted", &self.inverted)
            .field("logarithmic", &self.logarithmic)
            .finish_non_exhaustive()
    }
}

/// Empty ranges become `[0, 1]`, half-open ones get a unit span and a
/// zero-width range is widened by 0.5 on each side.
fn normalized_data_range(data_min: f64, data_max: f64) -> (f64, f64) {
    match (data_min.is_finite(), data_max.is_finite()) {
        (false, false) => (0.0, 1.0),
        (true, false) => (data_min, data_min + 1.0),
        (false, true) => (data_max - 1.0, data_max),
        (true, true) if roughly_equal(data_min, data_max, 1e-10) => {
            (data_min - 0.5, data_max + 0.5)
        }
        (true, true) => (data_min, data_max),
    }
}
