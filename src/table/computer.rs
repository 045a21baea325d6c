use std::any::Any;
use std::fmt;

use indexmap::IndexMap;
use tracing::warn;

use crate::core::EntityId;
use crate::table::row::{ColumnIndex, ComputerRow};

/// Handle of a computer registered with a [`crate::table::Table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComputerId(pub(crate) usize);

impl ComputerId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Alias to column binding, valid only for the table that built it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMapping {
    pub(crate) table: EntityId,
    pub(crate) columns: IndexMap<String, ColumnIndex>,
}

impl TableMapping {
    #[must_use]
    pub fn table_id(&self) -> EntityId {
        self.table
    }

    #[must_use]
    pub fn column(&self, alias: &str) -> Option<ColumnIndex> {
        self.columns.get(alias).copied()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

pub(crate) type StartFn = Box<dyn Fn(&mut dyn Any)>;
pub(crate) type CalcFn = Box<dyn Fn(&mut ComputerRow<'_>, &mut dyn Any)>;

/// Registered computer: mapping, outputs, context and the two functions.
pub(crate) struct ComputerSlot {
    pub(crate) mapping: IndexMap<String, ColumnIndex>,
    pub(crate) outputs: IndexMap<String, usize>,
    pub(crate) context: Box<dyn Any>,
    pub(crate) start: Option<StartFn>,
    pub(crate) calculate: Option<CalcFn>,
}

impl ComputerSlot {
    pub(crate) fn new(mapping: IndexMap<String, ColumnIndex>) -> Self {
        Self {
            mapping,
            outputs: IndexMap::new(),
            context: Box::new(()),
            start: None,
            calculate: None,
        }
    }

    pub(crate) fn run_start(&mut self) {
        if let Some(start) = &self.start {
            start(self.context.as_mut());
        }
    }
}

impl fmt::Debug for ComputerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputerSlot")
            .field("mapping", &self.mapping)
            .field("outputs", &self.outputs)
            .field("has_start", &self.start.is_some())
            .field("has_calculation", &self.calculate.is_some())
            .finish_non_exhaustive()
    }
}

/// Wraps a typed start function; a context of another type is left alone.
pub(crate) fn typed_start<C, F>(start: F) -> StartFn
where
    C: 'static,
    F: Fn(&mut C) + 'static,
{
    Box::new(move |context: &mut dyn Any| match context.downcast_mut::<C>() {
        Some(context) => start(context),
        None => warn!(
            expected = std::any::type_name::<C>(),
            "computer start skipped: context type mismatch"
        ),
    })
}

pub(crate) fn typed_calculation<C, F>(calculate: F) -> CalcFn
where
    C: 'static,
    F: Fn(&mut ComputerRow<'_>, &mut C) + 'static,
{
    Box::new(
        move |row: &mut ComputerRow<'_>, context: &mut dyn Any| match context.downcast_mut::<C>() {
            Some(context) => calculate(row, context),
            None => warn!(
                expected = std::any::type_name::<C>(),
                row = row.index(),
                "computer calculation skipped: context type mismatch"
            ),
        },
    )
}
