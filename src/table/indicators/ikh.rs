use crate::table::indicators::{prefixed, register_outputs};
use crate::table::{ComputerId, CyclicQueue, Table, TableMapping};

pub const DEFAULT_CONVERSION_PERIOD: usize = 9;
pub const DEFAULT_BASE_PERIOD: usize = 26;
pub const DEFAULT_LEADING_PERIOD: usize = 52;

/// Ichimoku Kinko Hyo lines of one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkhValues {
    pub conversion: f64,
    pub base: f64,
    pub leading_a: f64,
    pub leading_b: f64,
    pub lagging: f64,
}

/// Rendering offsets in rows. The values are computed unshifted; series
/// drawing the leading spans move them forward, the lagging line back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IkhShifts {
    pub leading: isize,
    pub lagging: isize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IkhContext {
    conversion_period: usize,
    base_period: usize,
    leading_period: usize,
    window: CyclicQueue<(f64, f64)>,
}

impl IkhContext {
    #[must_use]
    pub fn new(conversion_period: usize, base_period: usize, leading_period: usize) -> Self {
        let conversion_period = conversion_period.max(1);
        let base_period = base_period.max(1);
        let leading_period = leading_period.max(1);
        let longest = conversion_period.max(base_period).max(leading_period);
        Self {
            conversion_period,
            base_period,
            leading_period,
            window: CyclicQueue::new(longest),
        }
    }

    #[must_use]
    pub fn shifts(&self) -> IkhShifts {
        let base = isize::try_from(self.base_period).unwrap_or(isize::MAX);
        IkhShifts {
            leading: base,
            lagging: -base,
        }
    }

    pub fn start(&mut self) {
        self.window.clear();
    }

    /// Midpoint of the highest high and lowest low over the last `period` rows.
    fn midpoint(&self, period: usize) -> f64 {
        if self.window.len() < period {
            return f64::NAN;
        }
        let (highest, lowest) = (0..period)
            .filter_map(|offset| self.window.latest(offset))
            .fold((f64::NEG_INFINITY, f64::INFINITY), |(high, low), (h, l)| {
                (high.max(*h), low.min(*l))
            });
        (highest + lowest) / 2.0
    }

    pub fn calculate(&mut self, high: f64, low: f64, close: f64) -> IkhValues {
        if high.is_nan() || low.is_nan() {
            return IkhValues {
                conversion: f64::NAN,
                base: f64::NAN,
                leading_a: f64::NAN,
                leading_b: f64::NAN,
                lagging: close,
            };
        }
        self.window.enqueue((high, low));
        let conversion = self.midpoint(self.conversion_period);
        let base = self.midpoint(self.base_period);
        IkhValues {
            conversion,
            base,
            leading_a: (conversion + base) / 2.0,
            leading_b: self.midpoint(self.leading_period),
            lagging: close,
        }
    }
}

impl Default for IkhContext {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONVERSION_PERIOD,
            DEFAULT_BASE_PERIOD,
            DEFAULT_LEADING_PERIOD,
        )
    }
}

/// IKH wired into a table; reads `high`, `low`, `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IkhComputer {
    pub computer: ComputerId,
    pub conversion: usize,
    pub base: usize,
    pub leading_a: usize,
    pub leading_b: usize,
    pub lagging: usize,
    pub shifts: IkhShifts,
}

impl IkhComputer {
    pub fn attach(
        table: &mut Table,
        mapping: &TableMapping,
        context: IkhContext,
        alias_prefix: Option<&str>,
    ) -> Option<Self> {
        let shifts = context.shifts();
        let computer = table.create_computer(mapping)?;
        let [conversion, base, leading_a, leading_b, lagging] = register_outputs(
            table,
            computer,
            ["conversion", "base", "leading_a", "leading_b", "lagging"]
                .map(|name| (name, prefixed(alias_prefix, name))),
        )?;
        table.set_context(computer, context);
        table.set_start_function(computer, IkhContext::start);
        table.set_calculation_function(computer, |row, context: &mut IkhContext| {
            let values = context.calculate(row.get("high"), row.get("low"), row.get("close"));
            row.set("conversion", values.conversion);
            row.set("base", values.base);
            row.set("leading_a", values.leading_a);
            row.set("leading_b", values.leading_b);
            row.set("lagging", values.lagging);
        });
        table.recompute();
        Some(Self {
            computer,
            conversion,
            base,
            leading_a,
            leading_b,
            lagging,
            shifts,
        })
    }
}
