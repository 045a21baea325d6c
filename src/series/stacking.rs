use indexmap::IndexMap;

use crate::scales::CategoryKey;

/// Bottom and top of one stacked value, in data units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackedValue {
    pub zero: f64,
    pub value: f64,
    /// No earlier series contributed at this category.
    pub zero_missing: bool,
}

/// Running positive and negative totals per category, shared by the series
/// of one stack in drawing order.
#[derive(Debug, Clone, Default)]
pub struct StackAccumulator {
    totals: IndexMap<CategoryKey, (f64, f64)>,
}

impl StackAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.totals.clear();
    }

    /// Places `value` on top of the totals of `key`. Positive values grow
    /// the positive total, negative ones the negative total; missing values
    /// leave the stack untouched and yield `None`.
    pub fn stack(&mut self, key: &CategoryKey, value: f64) -> Option<StackedValue> {
        if !value.is_finite() {
            return None;
        }
        let zero_missing = !self.totals.contains_key(key);
        let (positive, negative) = self.totals.entry(key.clone()).or_insert((0.0, 0.0));
        let total = if value >= 0.0 { positive } else { negative };
        let zero = *total;
        *total += value;
        Some(StackedValue {
            zero,
            value: *total,
            zero_missing,
        })
    }

    /// Current totals of `key`, `(0, 0)` when nothing is stacked yet.
    #[must_use]
    pub fn totals(&self, key: &CategoryKey) -> (f64, f64) {
        self.totals.get(key).copied().unwrap_or((0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_stack_separately() {
        let mut stack = StackAccumulator::new();
        let key = CategoryKey::from("a");
        let first = stack.stack(&key, 3.0).expect("finite value");
        assert_eq!((first.zero, first.value, first.zero_missing), (0.0, 3.0, true));
        let below = stack.stack(&key, -2.0).expect("finite value");
        assert_eq!((below.zero, below.value, below.zero_missing), (0.0, -2.0, false));
        let second = stack.stack(&key, 4.0).expect("finite value");
        assert_eq!((second.zero, second.value), (3.0, 7.0));
        assert!(stack.stack(&key, f64::NAN).is_none());
        assert_eq!(stack.totals(&key), (7.0, -2.0));
    }
}
