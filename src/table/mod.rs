//! Keyed columnar table with computed columns and indicator computers.

pub mod computer;
pub mod cyclic_queue;
pub mod indicators;
pub mod row;
pub mod store;

pub use computer::{ComputerId, TableMapping};
pub use cyclic_queue::CyclicQueue;
pub use row::{ColumnIndex, ComputerRow, RowRef};
pub use store::Table;
