use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ChartError, ChartResult};
use crate::series::bar3d::Bar3dDrawer;
use crate::series::column::ColumnDrawer;
use crate::series::column3d::Column3dDrawer;
use crate::series::drawer::{Drawer, DrawerKind};
use crate::series::line::LineDrawer;
use crate::series::ohlc::OhlcDrawer;
use crate::series::spline::SplineDrawer;
use crate::series::spline_area::SplineAreaDrawer;
use crate::series::step_area::StepAreaDrawer;

pub type DrawerFactory = fn() -> Box<dyn Drawer>;

fn boxed<D: Drawer + Default + 'static>() -> Box<dyn Drawer> {
    Box::new(D::default())
}

/// Maps series kinds to drawer constructors.
///
/// Charts receive a registry explicitly; there is no process-wide table.
#[derive(Debug, Clone, Default)]
pub struct DrawerRegistry {
    factories: IndexMap<DrawerKind, DrawerFactory>,
}

impl DrawerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in drawer.
    #[must_use]
    pub fn with_defaults() -> Self {
        let factories: [(DrawerKind, DrawerFactory); 8] = [
            (DrawerKind::Line, boxed::<LineDrawer>),
            (DrawerKind::Spline, boxed::<SplineDrawer>),
            (DrawerKind::SplineArea, boxed::<SplineAreaDrawer>),
            (DrawerKind::StepArea, boxed::<StepAreaDrawer>),
            (DrawerKind::Column, boxed::<ColumnDrawer>),
            (DrawerKind::Column3d, boxed::<Column3dDrawer>),
            (DrawerKind::Bar3d, boxed::<Bar3dDrawer>),
            (DrawerKind::Ohlc, boxed::<OhlcDrawer>),
        ];
        let factories = factories.into_iter().collect();
        Self { factories }
    }

    /// Registers a factory; a kind can only be registered once.
    pub fn register(&mut self, kind: DrawerKind, factory: DrawerFactory) -> ChartResult<()> {
        if self.factories.contains_key(&kind) {
            return Err(ChartError::InvalidData(format!(
                "drawer for `{kind}` is already registered"
            )));
        }
        self.factories.insert(kind, factory);
        debug!(%kind, "drawer registered");
        Ok(())
    }

    /// Replaces the factory of `kind`, returning the previous one.
    pub fn replace(&mut self, kind: DrawerKind, factory: DrawerFactory) -> Option<DrawerFactory> {
        self.factories.insert(kind, factory)
    }

    pub fn unregister(&mut self, kind: DrawerKind) -> bool {
        self.factories.shift_remove(&kind).is_some()
    }

    #[must_use]
    pub fn contains(&self, kind: DrawerKind) -> bool {
        self.factories.contains_key(&kind)
    }

    #[must_use]
    pub fn create(&self, kind: DrawerKind) -> Option<Box<dyn Drawer>> {
        self.factories.get(&kind).map(|factory| factory())
    }

    pub fn kinds(&self) -> impl Iterator<Item = DrawerKind> + '_ {
        self.factories.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
