use crate::table::indicators::sma::SmaContext;
use crate::table::indicators::{prefixed, register_outputs};
use crate::table::{ComputerId, CyclicQueue, Table, TableMapping};

/// One stochastic oscillator sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticValues {
    pub k: f64,
    pub d: f64,
    pub slow_d: f64,
}

impl StochasticValues {
    const MISSING: Self = Self {
        k: f64::NAN,
        d: f64::NAN,
        slow_d: f64::NAN,
    };
}

/// %K over `k_period` highs and lows, %D as its SMA and slow %D as the SMA
/// of %D. A flat window yields a %K of 0.
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticContext {
    highs: CyclicQueue<f64>,
    lows: CyclicQueue<f64>,
    d: SmaContext,
    slow_d: SmaContext,
}

impl StochasticContext {
    #[must_use]
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self {
            highs: CyclicQueue::new(k_period),
            lows: CyclicQueue::new(k_period),
            d: SmaContext::new(d_period),
            slow_d: SmaContext::new(d_period),
        }
    }

    pub fn start(&mut self) {
        self.highs.clear();
        self.lows.clear();
        self.d.start();
        self.slow_d.start();
    }

    pub fn calculate(&mut self, high: f64, low: f64, close: f64) -> StochasticValues {
        if high.is_nan() || low.is_nan() || close.is_nan() {
            return StochasticValues::MISSING;
        }
        self.highs.enqueue(high);
        self.lows.enqueue(low);
        if !self.highs.is_full() {
            return StochasticValues::MISSING;
        }
        let highest = self.highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = self.lows.iter().copied().fold(f64::INFINITY, f64::min);
        let range = highest - lowest;
        let k = if range == 0.0 {
            0.0
        } else {
            100.0 * (close - lowest) / range
        };
        let d = self.d.calculate(k);
        let slow_d = self.slow_d.calculate(d);
        StochasticValues { k, d, slow_d }
    }
}

/// Stochastic wired into a table; reads `high`, `low`, `close` and writes
/// `k`, `d`, `slow_d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticComputer {
    pub computer: ComputerId,
    pub k: usize,
    pub d: usize,
    pub slow_d: usize,
}

impl StochasticComputer {
    pub fn attach(
        table: &mut Table,
        mapping: &TableMapping,
        k_period: usize,
        d_period: usize,
        alias_prefix: Option<&str>,
    ) -> Option<Self> {
        let computer = table.create_computer(mapping)?;
        let [k, d, slow_d] = register_outputs(
            table,
            computer,
            ["k", "d", "slow_d"].map(|name| (name, prefixed(alias_prefix, name))),
        )?;
        table.set_context(computer, StochasticContext::new(k_period, d_period));
        table.set_start_function(computer, StochasticContext::start);
        table.set_calculation_function(computer, |row, context: &mut StochasticContext| {
            let values = context.calculate(row.get("high"), row.get("low"), row.get("close"));
            row.set("k", values.k);
            row.set("d", values.d);
            row.set("slow_d", values.slow_d);
        });
        table.recompute();
        Some(Self {
            computer,
            k,
            d,
            slow_d,
        })
    }
}
