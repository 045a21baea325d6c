use serde::{Deserialize, Serialize};

use crate::core::primitives::{align_left, align_right, round_to};
use crate::core::{Invalidatable, Signal, SignalMask, StateMask, StatefulCore};

/// Smallest interval the generator will step by.
pub const MIN_TICK_INTERVAL: f64 = 1e-7;
const LOG_FLOOR: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TicksMode {
    #[default]
    Linear,
    Logarithmic,
}

/// Major tick layout produced for a scale extent.
#[derive(Debug, Clone, PartialEq)]
pub struct MajorTicksLayout {
    pub minimum: f64,
    pub maximum: f64,
    pub ticks: Vec<f64>,
    /// Ticks the configuration asked for before `limit` cut generation.
    pub requested: usize,
}

impl MajorTicksLayout {
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.requested > self.ticks.len()
    }
}

/// Interval/count based tick generator for numeric scales.
#[derive(Debug)]
pub struct LinearTicks {
    core: StatefulCore,
    interval: Option<f64>,
    count: usize,
    base: f64,
    explicit: Option<Vec<f64>>,
    mode: TicksMode,
}

impl LinearTicks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: StatefulCore::new(
                "linear_ticks",
                StateMask::none(),
                SignalMask::from_signal(Signal::NeedsReapplication),
            ),
            interval: None,
            count: 5,
            base: 0.0,
            explicit: None,
            mode: TicksMode::Linear,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Option<f64> {
        self.interval
    }

    /// `None` or a non-positive value switches back to count mode.
    pub fn set_interval(&mut self, interval: Option<f64>) -> &mut Self {
        let interval = interval.filter(|value| value.is_finite() && *value > 0.0);
        if self.interval != interval {
            self.interval = interval;
            self.explicit = None;
            self.changed();
        }
        self
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn set_count(&mut self, count: usize) -> &mut Self {
        let count = count.max(2);
        if self.count != count || self.interval.is_some() {
            self.count = count;
            self.interval = None;
            self.explicit = None;
            self.changed();
        }
        self
    }

    #[must_use]
    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn set_base(&mut self, base: f64) -> &mut Self {
        let base = if base.is_finite() { base } else { 0.0 };
        if self.base != base {
            self.base = base;
            self.changed();
        }
        self
    }

    #[must_use]
    pub fn explicit(&self) -> Option<&[f64]> {
        self.explicit.as_deref()
    }

    /// Uses `ticks` verbatim, sorted ascending.
    pub fn set(&mut self, ticks: Vec<f64>) -> &mut Self {
        let mut ticks: Vec<f64> = ticks.into_iter().filter(|tick| tick.is_finite()).collect();
        ticks.sort_by(f64::total_cmp);
        self.explicit = Some(ticks);
        self.changed();
        self
    }

    #[must_use]
    pub fn mode(&self) -> TicksMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TicksMode) -> &mut Self {
        if self.mode != mode {
            self.mode = mode;
            self.changed();
        }
        self
    }

    fn changed(&self) {
        self.core.dispatch_signal(Signal::NeedsReapplication);
    }

    /// Lays out major ticks over `[minimum, maximum]`, snapping the bounds to
    /// the tick interval where allowed. At most `limit` ticks are generated.
    #[must_use]
    pub fn setup_major(
        &self,
        minimum: f64,
        maximum: f64,
        can_modify_min: bool,
        can_modify_max: bool,
        limit: usize,
    ) -> MajorTicksLayout {
        if let Some(explicit) = &self.explicit {
            return MajorTicksLayout {
                minimum,
                maximum,
                ticks: explicit.clone(),
                requested: explicit.len(),
            };
        }
        match self.mode {
            TicksMode::Linear => {
                self.setup_linear(minimum, maximum, can_modify_min, can_modify_max, limit)
            }
            TicksMode::Logarithmic => {
                self.setup_logarithmic(minimum, maximum, can_modify_min, can_modify_max, limit)
            }
        }
    }

    fn setup_linear(
        &self,
        mut minimum: f64,
        mut maximum: f64,
        can_modify_min: bool,
        can_modify_max: bool,
        limit: usize,
    ) -> MajorTicksLayout {
        let interval = self
            .interval
            .unwrap_or_else(|| nice_interval(maximum - minimum, self.count))
            .max(MIN_TICK_INTERVAL);
        if can_modify_min {
            minimum = align_left(minimum, interval, self.base);
        }
        if can_modify_max {
            maximum = align_right(maximum, interval, self.base);
        }
        let start = align_right(minimum, interval, self.base);
        let (ticks, requested) = step_ticks(start, maximum, interval, limit, |value| value);
        MajorTicksLayout {
            minimum,
            maximum,
            ticks,
            requested,
        }
    }

    fn setup_logarithmic(
        &self,
        minimum: f64,
        maximum: f64,
        can_modify_min: bool,
        can_modify_max: bool,
        limit: usize,
    ) -> MajorTicksLayout {
        let mut log_min = to_log_space(minimum);
        let mut log_max = to_log_space(maximum);
        let interval = self
            .interval
            .unwrap_or_else(|| nice_interval(log_max - log_min, self.count))
            .max(MIN_TICK_INTERVAL);

        let mut layout_min = minimum;
        let mut layout_max = maximum;
        if can_modify_min {
            log_min = align_left(log_min, interval, self.base);
            layout_min = from_log_space(log_min);
        }
        if can_modify_max {
            log_max = align_right(log_max, interval, self.base);
            layout_max = from_log_space(log_max);
        }
        let (ticks, requested) =
            step_ticks(round_to(log_min, 7), log_max, interval, limit, from_log_space);
        MajorTicksLayout {
            minimum: layout_min,
            maximum: layout_max,
            ticks,
            requested,
        }
    }

    /// Fills every gap between consecutive `majors` with evenly spaced minor
    /// ticks, extending to `original_min`/`original_max` at both ends.
    #[must_use]
    pub fn setup_minor(&self, majors: &[f64], original_min: f64, original_max: f64, limit: usize) -> Vec<f64> {
        if let Some(explicit) = &self.explicit {
            return explicit.clone();
        }
        if majors.len() < 2 {
            return Vec::new();
        }
        let (to_space, from_space): (fn(f64) -> f64, fn(f64) -> f64) = match self.mode {
            TicksMode::Linear => (linear_space, linear_space),
            TicksMode::Logarithmic => (to_log_space, from_log_space),
        };

        let original_min = to_space(original_min);
        let original_max = to_space(original_max);
        let mut ticks = Vec::new();
        let mut last: Option<f64> = None;
        let mut interval = MIN_TICK_INTERVAL;
        for pair in majors.windows(2) {
            let low = to_space(pair[0]);
            let high = to_space(pair[1]);
            interval = self
                .interval
                .unwrap_or((high - low) / (self.count - 1) as f64)
                .max(MIN_TICK_INTERVAL);
            let start = round_to(if last.is_none() { original_min.min(low) } else { low }, 7);
            let (segment, _) = step_ticks(start, high, interval, limit, |value| value);
            for value in segment {
                if last != Some(value) {
                    ticks.push(from_space(value));
                }
                last = Some(value);
            }
            if ticks.len() >= limit {
                return ticks;
            }
        }
        if let Some(mut value) = last {
            value = round_to(value + interval, 7);
            while value <= original_max && ticks.len() < limit {
                ticks.push(from_space(value));
                value = round_to(value + interval, 7);
            }
        }
        ticks
    }
}

impl Default for LinearTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl Invalidatable for LinearTicks {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

fn linear_space(value: f64) -> f64 {
    value
}

fn to_log_space(value: f64) -> f64 {
    value.max(LOG_FLOOR).log10()
}

fn from_log_space(value: f64) -> f64 {
    round_to(10_f64.powf(value), 7)
}

/// Rounds `range / (count - 1)` to the closest "nice" step from powers of ten
/// and powers of two around it.
#[must_use]
pub fn nice_interval(range: f64, count: usize) -> f64 {
    let steps = count.max(2) - 1;
    let interval = range / steps as f64;
    if !interval.is_finite() || interval <= 0.0 {
        return MIN_TICK_INTERVAL;
    }
    let log = interval.ln();
    let pow10_floor = 10_f64.powf((log / std::f64::consts::LN_10).floor());
    let pow10_ceil = 10_f64.powf((log / std::f64::consts::LN_10).ceil());
    let log = (interval / pow10_ceil).ln();
    let pow2_floor = 2_f64.powf(log.floor()) * pow10_ceil;
    let pow2_ceil = 2_f64.powf(log.ceil()) * pow10_ceil;
    [pow10_floor, pow10_ceil, pow2_floor, pow2_ceil]
        .into_iter()
        .map(|candidate| align_right(interval, candidate, 0.0))
        .fold(f64::INFINITY, f64::min)
}

/// Steps from `start` to `end` inclusive, rounding every value to 7 digits.
/// Returns the mapped ticks and how many the full walk would produce.
fn step_ticks(
    start: f64,
    end: f64,
    interval: f64,
    limit: usize,
    map: impl Fn(f64) -> f64,
) -> (Vec<f64>, usize) {
    let mut ticks = Vec::new();
    let mut value = start;
    while value <= end {
        if ticks.len() >= limit {
            let remaining = ((end - value) / interval).floor() as usize + 1;
            return (ticks, limit.saturating_add(remaining));
        }
        ticks.push(map(value));
        let next = round_to(value + interval, 7);
        if next <= value {
            break;
        }
        value = next;
    }
    let requested = ticks.len();
    (ticks, requested)
}
