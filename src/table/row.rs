use indexmap::IndexMap;

/// Column address inside a table: stored data or a computer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnIndex {
    Stored(usize),
    Computed(usize),
}

/// Read-only view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    pub(crate) index: usize,
    pub(crate) key: f64,
    pub(crate) stored: &'a [Vec<f64>],
    pub(crate) computed: &'a [Vec<f64>],
    pub(crate) names: &'a IndexMap<String, ColumnIndex>,
}

impl RowRef<'_> {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn key(&self) -> f64 {
        self.key
    }

    /// Value of a stored field or aliased output, `None` for unknown names.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .get(name)
            .map(|column| self.get_column(*column))
    }

    #[must_use]
    pub fn get_column(&self, column: ColumnIndex) -> f64 {
        read_cell(self.stored, self.computed, column, self.index)
    }
}

/// Row handed to a computer's calculation function.
///
/// `get` resolves the computer's own mapping first, then its outputs, then
/// table-level names. Unknown names read as NaN.
pub struct ComputerRow<'a> {
    pub(crate) index: usize,
    pub(crate) key: f64,
    pub(crate) stored: &'a [Vec<f64>],
    pub(crate) computed: &'a mut [Vec<f64>],
    pub(crate) names: &'a IndexMap<String, ColumnIndex>,
    pub(crate) mapping: &'a IndexMap<String, ColumnIndex>,
    pub(crate) outputs: &'a IndexMap<String, usize>,
}

impl ComputerRow<'_> {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn key(&self) -> f64 {
        self.key
    }

    #[must_use]
    pub fn get(&self, name: &str) -> f64 {
        let column = self
            .mapping
            .get(name)
            .copied()
            .or_else(|| self.outputs.get(name).map(|index| ColumnIndex::Computed(*index)))
            .or_else(|| self.names.get(name).copied());
        column.map_or(f64::NAN, |column| {
            read_cell(self.stored, self.computed, column, self.index)
        })
    }

    /// Writes one of the computer's own outputs; other names are ignored.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.outputs.get(name) {
            Some(index) => self.set_column(*index, value),
            None => false,
        }
    }

    /// Writes a computed column by the index `add_output_field` returned.
    pub fn set_column(&mut self, index: usize, value: f64) -> bool {
        if !self.outputs.values().any(|owned| *owned == index) {
            return false;
        }
        match self
            .computed
            .get_mut(index)
            .and_then(|column| column.get_mut(self.index))
        {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }
}

fn read_cell(stored: &[Vec<f64>], computed: &[Vec<f64>], column: ColumnIndex, row: usize) -> f64 {
    let cells = match column {
        ColumnIndex::Stored(index) => stored.get(index),
        ColumnIndex::Computed(index) => computed.get(index),
    };
    cells
        .and_then(|cells| cells.get(row))
        .copied()
        .unwrap_or(f64::NAN)
}
