use crate::table::indicators::register_outputs;
use crate::table::{ComputerId, CyclicQueue, Table, TableMapping};

/// Simple moving average over the last `period` present values.
///
/// Missing inputs yield NaN and leave the window untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SmaContext {
    queue: CyclicQueue<f64>,
    sum: f64,
}

impl SmaContext {
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self {
            queue: CyclicQueue::new(period),
            sum: 0.0,
        }
    }

    #[must_use]
    pub fn period(&self) -> usize {
        self.queue.capacity()
    }

    pub fn start(&mut self) {
        self.queue.clear();
        self.sum = 0.0;
    }

    pub fn calculate(&mut self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        if let Some(evicted) = self.queue.enqueue(value) {
            self.sum -= evicted;
        }
        self.sum += value;
        if self.queue.is_full() {
            self.sum / self.queue.len() as f64
        } else {
            f64::NAN
        }
    }
}

/// SMA wired into a table; reads the `value` alias, writes `result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaComputer {
    pub computer: ComputerId,
    pub result: usize,
}

impl SmaComputer {
    pub fn attach(
        table: &mut Table,
        mapping: &TableMapping,
        period: usize,
        alias: Option<&str>,
    ) -> Option<Self> {
        let computer = table.create_computer(mapping)?;
        let [result] = register_outputs(table, computer, [("result", alias.map(str::to_owned))])?;
        table.set_context(computer, SmaContext::new(period));
        table.set_start_function(computer, SmaContext::start);
        table.set_calculation_function(computer, |row, context: &mut SmaContext| {
            let value = context.calculate(row.get("value"));
            row.set("result", value);
        });
        table.recompute();
        Some(Self { computer, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_after_warm_up() {
        let mut sma = SmaContext::new(3);
        assert!(sma.calculate(1.0).is_nan());
        assert!(sma.calculate(2.0).is_nan());
        assert_eq!(sma.calculate(3.0), 2.0);
        assert!(sma.calculate(f64::NAN).is_nan());
        assert_eq!(sma.calculate(7.0), 4.0);
    }
}
