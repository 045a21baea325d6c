//! Technical indicators built on table computers.
//!
//! Each indicator exposes its rolling context (usable on a plain value
//! stream) and an `attach` function wiring that context into a
//! [`Table`] computer.

pub mod ikh;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use ikh::{IkhComputer, IkhContext, IkhShifts, IkhValues};
pub use rsi::{RsiComputer, RsiContext};
pub use sma::{SmaComputer, SmaContext};
pub use stochastic::{StochasticComputer, StochasticContext, StochasticValues};

use crate::table::{ComputerId, Table};

/// Registers `name` on `computer`, aliased at table level when `alias` is set.
fn register_output(
    table: &mut Table,
    computer: ComputerId,
    name: &str,
    alias: Option<String>,
) -> Option<usize> {
    match alias {
        Some(alias) => table.add_output_field_aliased(computer, name, &alias),
        None => table.add_output_field(computer, name),
    }
}

/// Registers every output of a freshly created computer, or removes the
/// computer again when one of them is rejected.
fn register_outputs<const N: usize>(
    table: &mut Table,
    computer: ComputerId,
    outputs: [(&str, Option<String>); N],
) -> Option<[usize; N]> {
    let mut indexes = [0; N];
    for (slot, (name, alias)) in indexes.iter_mut().zip(outputs) {
        match register_output(table, computer, name, alias) {
            Some(index) => *slot = index,
            None => {
                table.remove_last_computer(computer);
                return None;
            }
        }
    }
    Some(indexes)
}

/// Alias for one output of a multi-output indicator: `prefix_name`.
fn prefixed(prefix: Option<&str>, name: &str) -> Option<String> {
    prefix.map(|prefix| format!("{prefix}_{name}"))
}
