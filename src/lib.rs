//! chart-kernel: backend-agnostic charting kernel.
//!
//! Entities (scales, series, axes, markers) share one invalidation model:
//! each owns a [`core::StatefulCore`] that records which parts are stale and
//! notifies listeners with coalesced signals. A [`Chart`] composes them,
//! keeps scales fitted to the data and resolves pending state in a fixed
//! draw pass before handing a [`render::RenderFrame`] to a renderer.

pub mod api;
pub mod core;
pub mod error;
pub mod geometry;
pub mod render;
pub mod scales;
pub mod series;
pub mod table;
pub mod telemetry;

pub use api::{Chart, ChartConfig, PlotInsets, SeriesConfig, ThreeDConfig};
pub use error::{ChartError, ChartResult};
