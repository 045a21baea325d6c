mod chart;
mod config;

pub use chart::Chart;
pub use config::{ChartConfig, PlotInsets, SeriesConfig, ThreeDConfig};
