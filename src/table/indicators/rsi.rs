use crate::table::indicators::register_outputs;
use crate::table::{ComputerId, CyclicQueue, Table, TableMapping};

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Relative strength index state.
///
/// The first result appears once `period` present values are queued and
/// sums the deltas of the whole window. Later results smooth the previous
/// sums by `(period - 1) / period` and add the newest delta.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiContext {
    queue: CyclicQueue<f64>,
    upward_change: f64,
    downward_change: f64,
    primed: bool,
}

impl RsiContext {
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self {
            queue: CyclicQueue::new(period),
            upward_change: 0.0,
            downward_change: 0.0,
            primed: false,
        }
    }

    #[must_use]
    pub fn period(&self) -> usize {
        self.queue.capacity()
    }

    pub fn start(&mut self) {
        self.queue.clear();
        self.upward_change = 0.0;
        self.downward_change = 0.0;
        self.primed = false;
    }

    pub fn calculate(&mut self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        self.queue.enqueue(value);
        if !self.queue.is_full() {
            return f64::NAN;
        }

        if self.primed {
            let period = self.period() as f64;
            let smoothing = (period - 1.0) / period;
            self.upward_change *= smoothing;
            self.downward_change *= smoothing;
            let delta = match (self.queue.latest(0), self.queue.latest(1)) {
                (Some(newest), Some(previous)) => newest - previous,
                _ => 0.0,
            };
            if delta > 0.0 {
                self.upward_change += delta;
            } else {
                self.downward_change -= delta;
            }
        } else {
            self.upward_change = 0.0;
            self.downward_change = 0.0;
            let mut previous: Option<f64> = None;
            for current in self.queue.iter().copied() {
                if let Some(previous) = previous {
                    let delta = current - previous;
                    if delta > 0.0 {
                        self.upward_change += delta;
                    } else {
                        self.downward_change -= delta;
                    }
                }
                previous = Some(current);
            }
            self.primed = true;
        }

        if self.downward_change == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + self.upward_change / self.downward_change)
        }
    }
}

impl Default for RsiContext {
    fn default() -> Self {
        Self::new(DEFAULT_RSI_PERIOD)
    }
}

/// RSI wired into a table; reads the `value` alias, writes `result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsiComputer {
    pub computer: ComputerId,
    pub result: usize,
}

impl RsiComputer {
    pub fn attach(
        table: &mut Table,
        mapping: &TableMapping,
        period: usize,
        alias: Option<&str>,
    ) -> Option<Self> {
        let computer = table.create_computer(mapping)?;
        let [result] = register_outputs(table, computer, [("result", alias.map(str::to_owned))])?;
        table.set_context(computer, RsiContext::new(period));
        table.set_start_function(computer, RsiContext::start);
        table.set_calculation_function(computer, |row, context: &mut RsiContext| {
            let value = context.calculate(row.get("value"));
            row.set("result", value);
        });
        table.recompute();
        Some(Self { computer, result })
    }
}
