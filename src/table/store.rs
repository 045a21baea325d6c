use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::core::primitives::{datetime_to_millis, decimal_to_f64};
use crate::core::{
    ConsistencyState, ErrorCode, Invalidatable, SharedReporter, Signal, SignalMask, StateMask, StatefulCore,
    WarningCode, default_reporter,
};
use crate::error::{ChartError, ChartResult};
use crate::table::computer::{
    ComputerId, ComputerSlot, TableMapping, typed_calculation, typed_start,
};
use crate::table::row::{ColumnIndex, ComputerRow, RowRef};

#[derive(Debug, Clone)]
struct Snapshot {
    keys: Vec<f64>,
    stored: Vec<Vec<f64>>,
}

/// Keyed columnar store with computed columns.
///
/// Rows stay ordered by key; adding a row with an existing key replaces it.
/// Computers run row-major: for every row, each computer in registration
/// order, so later computers can read earlier outputs of the same row.
pub struct Table {
    core: StatefulCore,
    reporter: SharedReporter,
    names: IndexMap<String, ColumnIndex>,
    field_count: usize,
    keys: Vec<f64>,
    stored: Vec<Vec<f64>>,
    computed: Vec<Vec<f64>>,
    computers: Vec<ComputerSlot>,
    transaction: Option<Snapshot>,
}

impl Table {
    #[must_use]
    pub fn new(fields: &[&str]) -> Self {
        Self::with_reporter(fields, default_reporter())
    }

    /// Duplicate field names collapse onto their first column.
    #[must_use]
    pub fn with_reporter(fields: &[&str], reporter: SharedReporter) -> Self {
        let mut names = IndexMap::new();
        for field in fields {
            let next = names.len();
            names
                .entry((*field).to_owned())
                .or_insert(ColumnIndex::Stored(next));
        }
        let field_count = names.len();
        Self {
            core: StatefulCore::new(
                "table",
                StateMask::from_state(ConsistencyState::Data),
                SignalMask::from_signal(Signal::DataChanged),
            ),
            reporter,
            names,
            field_count,
            keys: Vec::new(),
            stored: vec![Vec::new(); field_count],
            computed: Vec::new(),
            computers: Vec::new(),
            transaction: None,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn keys(&self) -> &[f64] {
        &self.keys
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Column of a stored field or table-level output alias.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<ColumnIndex> {
        self.names.get(name).copied()
    }

    #[must_use]
    pub fn get(&self, row: usize, field: &str) -> Option<f64> {
        self.row(row).and_then(|row| row.get(field))
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        let key = *self.keys.get(index)?;
        Some(RowRef {
            index,
            key,
            stored: &self.stored,
            computed: &self.computed,
            names: &self.names,
        })
    }

    /// Rows in key order.
    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        (0..self.keys.len()).filter_map(|index| self.row(index))
    }

    /// Whole column by name; NaN marks rows a computer has not filled yet.
    #[must_use]
    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let column = self.field_index(name)?;
        Some(self.column(column))
    }

    #[must_use]
    pub fn column(&self, column: ColumnIndex) -> Vec<f64> {
        let cells = match column {
            ColumnIndex::Stored(index) => self.stored.get(index),
            ColumnIndex::Computed(index) => self.computed.get(index),
        };
        match cells {
            Some(cells) => {
                let mut values = cells.clone();
                values.resize(self.keys.len(), f64::NAN);
                values
            }
            None => vec![f64::NAN; self.keys.len()],
        }
    }

    /// Inserts or replaces the row at `key`. `values` follow the field order.
    pub fn add_row(&mut self, key: f64, values: &[f64]) -> ChartResult<()> {
        self.validate_row(key, values)?;
        self.place_row(key, values);
        self.data_changed();
        Ok(())
    }

    /// Adds a batch of rows. Nothing is inserted unless every row is valid.
    pub fn add_rows<I, V>(&mut self, rows: I) -> ChartResult<()>
    where
        I: IntoIterator<Item = (f64, V)>,
        V: AsRef<[f64]>,
    {
        let rows: Vec<(f64, V)> = rows.into_iter().collect();
        for (key, values) in &rows {
            self.validate_row(*key, values.as_ref())?;
        }
        if rows.is_empty() {
            return Ok(());
        }
        for (key, values) in &rows {
            self.place_row(*key, values.as_ref());
        }
        self.data_changed();
        Ok(())
    }

    /// Timestamped row with exact decimal prices.
    pub fn add_price_row(&mut self, time: DateTime<Utc>, values: &[Decimal]) -> ChartResult<()> {
        let converted = values
            .iter()
            .zip(self.names.keys())
            .map(|(value, field)| decimal_to_f64(*value, field))
            .collect::<ChartResult<Vec<_>>>()?;
        if converted.len() != values.len() {
            return Err(self.arity_error(values.len()));
        }
        self.add_row(datetime_to_millis(time), &converted)
    }

    fn arity_error(&self, got: usize) -> ChartError {
        ChartError::InvalidData(format!(
            "table row must have {} values, got {got}",
            self.field_count
        ))
    }

    fn validate_row(&self, key: f64, values: &[f64]) -> ChartResult<()> {
        if !key.is_finite() {
            return Err(ChartError::InvalidData("table row key must be finite".to_owned()));
        }
        if values.len() != self.field_count {
            return Err(self.arity_error(values.len()));
        }
        Ok(())
    }

    /// Writes a validated row. Computed cells of the row read NaN until the
    /// next recompute.
    fn place_row(&mut self, key: f64, values: &[f64]) {
        let position = self.keys.partition_point(|existing| *existing < key);
        if self.keys.get(position) == Some(&key) {
            for (column, value) in self.stored.iter_mut().zip(values) {
                column[position] = *value;
            }
            for column in &mut self.computed {
                if let Some(cell) = column.get_mut(position) {
                    *cell = f64::NAN;
                }
            }
            trace!(key, "table row replaced");
        } else {
            self.keys.insert(position, key);
            for (column, value) in self.stored.iter_mut().zip(values) {
                column.insert(position, *value);
            }
            for column in &mut self.computed {
                if position <= column.len() {
                    column.insert(position, f64::NAN);
                }
            }
        }
    }

    /// Removes rows with keys in `[from, to]`; returns how many went away.
    pub fn remove_range(&mut self, from: f64, to: f64) -> usize {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        let start = self.keys.partition_point(|key| *key < from);
        let end = self.keys.partition_point(|key| *key <= to);
        if start >= end {
            return 0;
        }
        self.keys.drain(start..end);
        for column in &mut self.stored {
            column.drain(start..end);
        }
        for column in &mut self.computed {
            let end = end.min(column.len());
            if start < end {
                column.drain(start..end);
            }
        }
        self.data_changed();
        end - start
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Defers recomputation until commit. A nested start only warns.
    pub fn start_transaction(&mut self) -> bool {
        if self.transaction.is_some() {
            self.reporter
                .warning(WarningCode::TableAlreadyInTransaction, &[]);
            return false;
        }
        self.transaction = Some(Snapshot {
            keys: self.keys.clone(),
            stored: self.stored.clone(),
        });
        true
    }

    pub fn commit_transaction(&mut self) -> bool {
        if self.transaction.take().is_none() {
            return false;
        }
        self.data_changed();
        true
    }

    /// Restores the rows as they were when the transaction started.
    pub fn rollback_transaction(&mut self) -> bool {
        match self.transaction.take() {
            Some(snapshot) => {
                self.keys = snapshot.keys;
                self.stored = snapshot.stored;
                debug!(rows = self.keys.len(), "table transaction rolled back");
                self.recompute();
                true
            }
            None => false,
        }
    }

    fn data_changed(&mut self) {
        if self.transaction.is_some() {
            return;
        }
        self.recompute();
        self.core
            .invalidate(ConsistencyState::Data, Signal::DataChanged);
    }

    /// Binds computer aliases to table columns.
    pub fn map_as(&self, pairs: &[(&str, &str)]) -> ChartResult<TableMapping> {
        let mut columns = IndexMap::new();
        for (alias, field) in pairs {
            let column = self
                .field_index(field)
                .ok_or_else(|| ChartError::UnknownField((*field).to_owned()))?;
            columns.insert((*alias).to_owned(), column);
        }
        Ok(TableMapping {
            table: self.core.id(),
            columns,
        })
    }

    /// Registers a computer bound to `mapping`.
    pub fn create_computer(&mut self, mapping: &TableMapping) -> Option<ComputerId> {
        if mapping.table != self.core.id() {
            self.reporter
                .error(ErrorCode::TableMappingDifferentTable, &[]);
            return None;
        }
        self.computers
            .push(ComputerSlot::new(mapping.columns.clone()));
        Some(ComputerId(self.computers.len() - 1))
    }

    /// Drops `computer` together with its output columns and aliases.
    ///
    /// Only the most recently created computer can be removed, so the ids
    /// and column indexes handed out before stay valid.
    pub fn remove_last_computer(&mut self, computer: ComputerId) -> bool {
        if computer.0 + 1 != self.computers.len() {
            return false;
        }
        let Some(slot) = self.computers.pop() else {
            return false;
        };
        let owned = |index: &usize| slot.outputs.values().any(|output| output == index);
        self.names.retain(|_, column| match column {
            ColumnIndex::Computed(index) => !owned(index),
            ColumnIndex::Stored(_) => true,
        });
        // Columns only go away when they are the tail; otherwise they stay
        // unreferenced so other outputs keep their indexes.
        while self.computed.len().checked_sub(1).is_some_and(|last| owned(&last)) {
            self.computed.pop();
        }
        debug!(computer = computer.0, "table computer removed");
        true
    }

    #[must_use]
    pub fn computer_count(&self) -> usize {
        self.computers.len()
    }

    pub fn set_context<C: 'static>(&mut self, computer: ComputerId, context: C) -> bool {
        match self.computers.get_mut(computer.0) {
            Some(slot) => {
                slot.context = Box::new(context);
                true
            }
            None => false,
        }
    }

    pub fn set_start_function<C, F>(&mut self, computer: ComputerId, start: F) -> bool
    where
        C: 'static,
        F: Fn(&mut C) + 'static,
    {
        match self.computers.get_mut(computer.0) {
            Some(slot) => {
                slot.start = Some(typed_start(start));
                true
            }
            None => false,
        }
    }

    pub fn set_calculation_function<C, F>(&mut self, computer: ComputerId, calculate: F) -> bool
    where
        C: 'static,
        F: Fn(&mut ComputerRow<'_>, &mut C) + 'static,
    {
        match self.computers.get_mut(computer.0) {
            Some(slot) => {
                slot.calculate = Some(typed_calculation(calculate));
                true
            }
            None => false,
        }
    }

    /// Adds an output column owned by `computer`.
    ///
    /// Returns the computed column index, or `None` after reporting a
    /// duplicate name for this computer.
    pub fn add_output_field(&mut self, computer: ComputerId, name: &str) -> Option<usize> {
        let slot = self.computers.get(computer.0)?;
        if slot.outputs.contains_key(name) {
            self.reporter
                .error(ErrorCode::TableComputerOutputFieldDuplicate, &[name]);
            return None;
        }
        let index = self.computed.len();
        self.computed.push(vec![f64::NAN; self.keys.len()]);
        self.computers[computer.0]
            .outputs
            .insert(name.to_owned(), index);
        Some(index)
    }

    /// Like [`Self::add_output_field`], also exposing the column as `alias`
    /// to rows, mappings and [`Self::column_values`].
    pub fn add_output_field_aliased(
        &mut self,
        computer: ComputerId,
        name: &str,
        alias: &str,
    ) -> Option<usize> {
        self.computers.get(computer.0)?;
        if self.names.contains_key(alias) {
            self.reporter
                .error(ErrorCode::TableFieldNameDuplicate, &[alias]);
            return None;
        }
        let index = self.add_output_field(computer, name)?;
        self.names
            .insert(alias.to_owned(), ColumnIndex::Computed(index));
        Some(index)
    }

    /// Index of an output registered by `computer`.
    #[must_use]
    pub fn output_index(&self, computer: ComputerId, name: &str) -> Option<usize> {
        self.computers
            .get(computer.0)
            .and_then(|slot| slot.outputs.get(name).copied())
    }

    /// Runs every computer over all rows from scratch.
    pub fn recompute(&mut self) {
        let rows = self.keys.len();
        for column in &mut self.computed {
            column.clear();
            column.resize(rows, f64::NAN);
        }
        for slot in &mut self.computers {
            slot.run_start();
        }

        let Self {
            names,
            keys,
            stored,
            computed,
            computers,
            ..
        } = self;
        for (index, key) in keys.iter().enumerate() {
            for slot in computers.iter_mut() {
                let ComputerSlot {
                    mapping,
                    outputs,
                    context,
                    calculate,
                    ..
                } = slot;
                let Some(calculate) = calculate else {
                    continue;
                };
                let mut row = ComputerRow {
                    index,
                    key: *key,
                    stored: stored.as_slice(),
                    computed: computed.as_mut_slice(),
                    names: &*names,
                    mapping: &*mapping,
                    outputs: &*outputs,
                };
                calculate(&mut row, context.as_mut());
            }
        }
        debug!(
            rows,
            computers = self.computers.len(),
            "table computers recalculated"
        );
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("names", &self.names)
            .field("rows", &self.keys.len())
            .field("computers", &self.computers)
            .field("in_transaction", &self.transaction.is_some())
            .finish_non_exhaustive()
    }
}

impl Invalidatable for Table {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_stay_sorted_and_replace_by_key() {
        let mut table = Table::new(&["value"]);
        table
            .add_rows([(3.0, [30.0]), (1.0, [10.0]), (2.0, [20.0])])
            .expect("valid rows");
        table.add_row(2.0, &[22.0]).expect("valid row");
        assert_eq!(table.keys(), &[1.0, 2.0, 3.0]);
        assert_eq!(table.get(1, "value"), Some(22.0));
    }

    #[test]
    fn remove_range_is_inclusive() {
        let mut table = Table::new(&["value"]);
        table
            .add_rows((0..6).map(|key| (f64::from(key), [f64::from(key)])))
            .expect("valid rows");
        assert_eq!(table.remove_range(4.0, 1.0), 4);
        assert_eq!(table.keys(), &[0.0, 5.0]);
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let mut table = Table::new(&["open", "close"]);
        assert!(table.add_row(1.0, &[1.0]).is_err());
        assert!(table.add_row(f64::NAN, &[1.0, 2.0]).is_err());
    }
}
