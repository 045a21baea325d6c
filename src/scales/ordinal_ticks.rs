use crate::core::{Invalidatable, Signal, SignalMask, StateMask, StatefulCore};

/// Tick set of an ordinal scale, expressed as category indices.
///
/// Either derived from an interval (every n-th category, first and last
/// always included) or set explicitly. Explicit sets are kept verbatim:
/// duplicates and indices outside the category range survive.
#[derive(Debug)]
pub struct OrdinalTicks {
    core: StatefulCore,
    interval: usize,
    explicit: Option<Vec<f64>>,
}

impl OrdinalTicks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: StatefulCore::new(
                "ordinal_ticks",
                StateMask::none(),
                SignalMask::from_signal(Signal::NeedsReapplication),
            ),
            interval: 1,
            explicit: None,
        }
    }

    #[must_use]
    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Samples every `interval`-th category; 0 is treated as 1.
    pub fn set_interval(&mut self, interval: usize) -> &mut Self {
        let interval = interval.max(1);
        if self.interval != interval || self.explicit.is_some() {
            self.interval = interval;
            self.explicit = None;
            self.core.dispatch_signal(Signal::NeedsReapplication);
        }
        self
    }

    pub fn set(&mut self, explicit: Vec<f64>) -> &mut Self {
        self.explicit = Some(explicit);
        self.core.dispatch_signal(Signal::NeedsReapplication);
        self
    }

    /// Drops an explicit set and returns to interval mode.
    pub fn reset(&mut self) -> &mut Self {
        if self.explicit.take().is_some() {
            self.core.dispatch_signal(Signal::NeedsReapplication);
        }
        self
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.explicit.is_some()
    }

    /// Tick indices for a scale with `count` categories.
    #[must_use]
    pub fn get(&self, count: usize) -> Vec<f64> {
        if let Some(explicit) = &self.explicit {
            return explicit.clone();
        }
        if count == 0 {
            return Vec::new();
        }
        let last = count - 1;
        let mut ticks: Vec<f64> = (0..count)
            .step_by(self.interval)
            .map(|index| index as f64)
            .collect();
        if ticks.last().copied() != Some(last as f64) {
            ticks.push(last as f64);
        }
        ticks
    }
}

impl Default for OrdinalTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl Invalidatable for OrdinalTicks {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_forces_first_and_last() {
        let mut ticks = OrdinalTicks::new();
        ticks.set_interval(3);
        assert_eq!(ticks.get(8), vec![0.0, 3.0, 6.0, 7.0]);
        assert_eq!(ticks.get(7), vec![0.0, 3.0, 6.0]);
        assert_eq!(ticks.get(1), vec![0.0]);
        assert!(ticks.get(0).is_empty());
    }

    #[test]
    fn explicit_set_is_verbatim() {
        let mut ticks = OrdinalTicks::new();
        ticks.set(vec![3.0, 3.0, 6.0, 6.0, 42.0]);
        assert_eq!(ticks.get(5), vec![3.0, 3.0, 6.0, 6.0, 42.0]);
        ticks.reset();
        assert_eq!(ticks.get(3), vec![0.0, 1.0, 2.0]);
    }
}
