use std::cell::RefCell;
use std::fmt;

use indexmap::IndexSet;
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::core::{ConsistencyState, Invalidatable, Signal, SignalMask, StateMask, StatefulCore};
use crate::scales::ordinal_ticks::OrdinalTicks;

/// Category key of an ordinal scale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryKey {
    Number(OrderedFloat<f64>),
    Text(String),
}

impl CategoryKey {
    /// Numeric value of a number key.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(value.0),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for CategoryKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for CategoryKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CategoryKey {
    fn from(value: f64) -> Self {
        Self::Number(OrderedFloat(value))
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value.0),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct TickCache {
    ticks: Vec<f64>,
    minor_ticks: Vec<f64>,
}

/// Maps discrete categories to evenly spaced ratios.
///
/// The first occurrence of a key fixes its index. Tick ratios are
/// `index / (count - 1)`, a single category sits at 0.5.
pub struct OrdinalScale {
    core: StatefulCore,
    values: IndexSet<CategoryKey>,
    old_values: Vec<CategoryKey>,
    names: Option<Vec<String>>,
    inverted: bool,
    ticks: OrdinalTicks,
    minor_ticks: OrdinalTicks,
    cache: RefCell<Option<TickCache>>,
}

impl OrdinalScale {
    #[must_use]
    pub fn new() -> Self {
        let core = StatefulCore::new(
            "ordinal_scale",
            StateMask::from_state(ConsistencyState::ScaleRecalculation),
            Signal::NeedsReapplication | Signal::NeedsRecalculation,
        );
        let ticks = OrdinalTicks::new();
        let minor_ticks = OrdinalTicks::new();
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
            values: IndexSet::new(),
            old_values: Vec::new(),
            names: None,
            inverted: false,
            ticks,
            minor_ticks,
            cache: RefCell::new(None),
        }
    }

    /// Replaces the category order. Duplicates collapse onto their first index.
    pub fn set_values<I, K>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = K>,
        K: Into<CategoryKey>,
    {
        self.reset_data_range();
        self.extend_data_range(values);
        self.check_scale_changed(false);
        self
    }

    pub fn reset_data_range(&mut self) -> &mut Self {
        self.old_values = self.values.iter().cloned().collect();
        self.values.clear();
        self.core
            .invalidate(ConsistencyState::ScaleRecalculation, SignalMask::none());
        self
    }

    /// Appends keys not seen yet, keeping existing indices.
    pub fn extend_data_range<I, K>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = K>,
        K: Into<CategoryKey>,
    {
        let before = self.values.len();
        self.values.extend(values.into_iter().map(Into::into));
        if self.values.len() != before {
            self.core
                .invalidate(ConsistencyState::ScaleRecalculation, SignalMask::none());
        }
        self
    }

    /// Dispatches `NeedsReapplication` when the categories differ from the
    /// ones before the last reset.
    pub fn check_scale_changed(&self, silently: bool) -> bool {
        let changed = !self.values.iter().eq(self.old_values.iter());
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

    #[must_use]
    pub fn values(&self) -> Vec<CategoryKey> {
        self.values.iter().cloned().collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn index_of(&self, key: &CategoryKey) -> Option<usize> {
        self.values.get_index_of(key)
    }

    /// Display labels overlay. `None` falls back to the keys themselves.
    pub fn set_names(&mut self, names: Option<Vec<String>>) -> &mut Self {
        if self.names != names {
            self.names = names;
            self.core
                .invalidate(ConsistencyState::ScaleRecalculation, Signal::NeedsReapplication);
        }
        self
    }

    /// One label per category: missing names fall back to the key, extra
    /// names are ignored.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, key)| self.name_at(index, key))
            .collect()
    }

    fn name_at(&self, index: usize, key: &CategoryKey) -> String {
        self.names
            .as_ref()
            .and_then(|names| names.get(index))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Label for a tick index; indices outside the categories have none.
    #[must_use]
    pub fn label_for_index(&self, index: f64) -> Option<String> {
        if index < 0.0 || index.fract() != 0.0 {
            return None;
        }
        let index = index as usize;
        self.values
            .get_index(index)
            .map(|key| self.name_at(index, key))
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

    fn apply_inversion(&self, ratio: f64) -> f64 {
        if self.inverted { 1.0 - ratio } else { ratio }
    }

    /// Ratio of a category index on the tick grid.
    #[must_use]
    pub fn index_ratio(&self, index: f64) -> f64 {
        let count = self.values.len();
        let ratio = if count > 1 {
            index / (count - 1) as f64
        } else {
            0.5
        };
        self.apply_inversion(ratio)
    }

    /// Tick ratio of `key`, NaN for unknown keys.
    #[must_use]
    pub fn transform(&self, key: &CategoryKey) -> f64 {
        self.index_of(key)
            .map_or(f64::NAN, |index| self.index_ratio(index as f64))
    }

    /// Position inside the band of `key`: `index / count + sub_range / count`.
    #[must_use]
    pub fn band_transform(&self, key: &CategoryKey, sub_range_ratio: f64) -> f64 {
        let count = self.values.len() as f64;
        self.index_of(key).map_or(f64::NAN, |index| {
            self.apply_inversion(index as f64 / count + sub_range_ratio / count)
        })
    }

    /// Nearest category on the tick grid.
    #[must_use]
    pub fn inverse_transform(&self, ratio: f64) -> Option<CategoryKey> {
        let count = self.values.len();
        if count == 0 || ratio.is_nan() {
            return None;
        }
        let ratio = self.apply_inversion(ratio);
        let index = (ratio * (count - 1) as f64).round().clamp(0.0, (count - 1) as f64);
        self.values.get_index(index as usize).cloned()
    }

    /// Category whose band contains `ratio`.
    #[must_use]
    pub fn band_inverse_transform(&self, ratio: f64) -> Option<CategoryKey> {
        let count = self.values.len();
        if count == 0 || ratio.is_nan() {
            return None;
        }
        let ratio = self.apply_inversion(ratio);
        let index = ((ratio * count as f64).ceil() - 1.0).clamp(0.0, (count - 1) as f64);
        self.values.get_index(index as usize).cloned()
    }

    #[must_use]
    pub fn point_width_ratio(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        1.0 / self.values.len() as f64
    }

    #[must_use]
    pub fn ticks(&self) -> &OrdinalTicks {
        &self.ticks
    }

    pub fn ticks_mut(&mut self) -> &mut OrdinalTicks {
        &mut self.ticks
    }

    #[must_use]
    pub fn minor_ticks(&self) -> &OrdinalTicks {
        &self.minor_ticks
    }

    pub fn minor_ticks_mut(&mut self) -> &mut OrdinalTicks {
        &mut self.minor_ticks
    }

    fn with_cache<R>(&self, read: impl FnOnce(&TickCache) -> R) -> R {
        let dirty = self
            .core
            .has_invalidation_state(ConsistencyState::ScaleRecalculation);
        if dirty || self.cache.borrow().is_none() {
            let count = self.values.len();
            let cache = TickCache {
                ticks: self.ticks.get(count),
                minor_ticks: self.minor_ticks.get(count),
            };
            debug!(
                categories = count,
                ticks = cache.ticks.len(),
                minor_ticks = cache.minor_ticks.len(),
                "ordinal ticks recalculated"
            );
            *self.cache.borrow_mut() = Some(cache);
            self.core
                .mark_consistent(ConsistencyState::ScaleRecalculation);
        }
        match self.cache.borrow().as_ref() {
            Some(cache) => read(cache),
            None => read(&TickCache::default()),
        }
    }

    #[must_use]
    pub fn ticks_values(&self) -> Vec<f64> {
        self.with_cache(|cache| cache.ticks.clone())
    }

    #[must_use]
    pub fn minor_ticks_values(&self) -> Vec<f64> {
        self.with_cache(|cache| cache.minor_ticks.clone())
    }

    /// Lower bound: the smaller of the first major and the first minor tick.
    #[must_use]
    pub fn minimum(&self) -> f64 {
        let count = self.values.len();
        self.with_cache(|cache| {
            match (cache.ticks.first(), cache.minor_ticks.first()) {
                (Some(major), Some(minor)) => major.min(*minor),
                (Some(only), None) | (None, Some(only)) => *only,
                (None, None) => 0.0_f64.min(count.saturating_sub(1) as f64),
            }
        })
    }

    /// Upper bound: the larger of the last major and the last minor tick.
    #[must_use]
    pub fn maximum(&self) -> f64 {
        let count = self.values.len();
        self.with_cache(|cache| {
            match (cache.ticks.last(), cache.minor_ticks.last()) {
                (Some(major), Some(minor)) => major.max(*minor),
                (Some(only), None) | (None, Some(only)) => *only,
                (None, None) => count.saturating_sub(1) as f64,
            }
        })
    }
}

impl Default for OrdinalScale {
    fn default() -> Self {
        Self::new()
    }
}

impl Invalidatable for OrdinalScale {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

impl fmt::Debug for OrdinalScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrdinalScale")
            .field("values", &self.values)
            .field("names", &self.names)
            .field("inverted", &self.inverted)
            .finish_non_exhaustive()
    }
}
