//! Series and the drawers that turn their points into paths.
//!
//! A [`Series`] maps its data through shared scales into [`PointMeta`]
//! values; a [`Drawer`] picked from the [`DrawerRegistry`] writes them into
//! the named shapes of the series' [`crate::render::ShapeManager`].

mod bar3d;
mod capabilities;
mod cartesian;
mod column;
mod column3d;
mod drawer;
mod line;
mod ohlc;
mod point;
mod registry;
mod spline;
mod spline_area;
mod stacking;
mod step_area;
mod three_d;

pub use bar3d::Bar3dDrawer;
pub use capabilities::{DrawerCapabilities, DrawerCapability};
pub use cartesian::{
    DataPoint, PointValue, Series, SeriesSettings, table_ohlc_points, table_points,
};
pub use column::ColumnDrawer;
pub use column3d::Column3dDrawer;
pub use drawer::{DrawContext, Drawer, DrawerKind, StepDirection, draw_points};
pub use line::LineDrawer;
pub use ohlc::OhlcDrawer;
pub use point::{Ohlc, PointMeta};
pub use registry::{DrawerFactory, DrawerRegistry};
pub use spline::{CubicSegment, SplineDrawer, spline_segments};
pub use spline_area::SplineAreaDrawer;
pub use stacking::{StackAccumulator, StackedValue};
pub use step_area::StepAreaDrawer;
pub use three_d::{ResolvedShift, ThreeDShift, pixel_shift};
