use serde::{Deserialize, Serialize};

use crate::core::Rect;
use crate::error::{ChartError, ChartResult};
use crate::geometry::AxisOrientation;
use crate::render::Color;
use crate::series::{DrawerKind, SeriesSettings, ThreeDShift};

/// Depth applied to every 3D series of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeDConfig {
    pub x_shift: f64,
    pub y_shift: f64,
    pub z_padding_x: f64,
    pub z_padding_y: f64,
}

impl Default for ThreeDConfig {
    fn default() -> Self {
        Self {
            x_shift: 10.0,
            y_shift: 10.0,
            z_padding_x: 0.0,
            z_padding_y: 0.0,
        }
    }
}

impl ThreeDConfig {
    /// Shift handed to the `series_index`-th of `series_count` 3D series.
    #[must_use]
    pub fn shift_for(&self, series_count: usize, series_index: usize) -> ThreeDShift {
        ThreeDShift {
            x_shift: self.x_shift,
            y_shift: self.y_shift,
            z_padding_x: self.z_padding_x,
            z_padding_y: self.z_padding_y,
            series_count: series_count.max(1),
            series_index,
        }
    }
}

/// Space between the container edge and the plot, where axes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotInsets {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Default for PlotInsets {
    fn default() -> Self {
        Self {
            left: 50.0,
            top: 10.0,
            right: 10.0,
            bottom: 30.0,
        }
    }
}

impl PlotInsets {
    /// Axis area on `orientation`'s side of `plot`, within `container`.
    #[must_use]
    pub fn axis_area(&self, orientation: AxisOrientation, plot: Rect) -> Rect {
        match orientation {
            AxisOrientation::Bottom => Rect::new(plot.left, plot.bottom(), plot.width, self.bottom),
            AxisOrientation::Top => Rect::new(plot.left, plot.top - self.top, plot.width, self.top),
            AxisOrientation::Left => Rect::new(plot.left - self.left, plot.top, self.left, plot.height),
            AxisOrientation::Right => Rect::new(plot.right(), plot.top, self.right, plot.height),
        }
    }
}

/// One series a chart creates from its drawer registry at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub name: String,
    pub kind: DrawerKind,
    #[serde(default)]
    pub settings: SeriesSettings,
}

impl SeriesConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: DrawerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            settings: SeriesSettings::default(),
        }
    }
}

/// Serializable chart setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: f64,
    pub height: f64,
    pub insets: PlotInsets,
    pub background: Option<Color>,
    pub three_d: ThreeDConfig,
    pub series: Vec<SeriesConfig>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            insets: PlotInsets::default(),
            background: None,
            three_d: ThreeDConfig::default(),
            series: Vec::new(),
        }
    }
}

impl ChartConfig {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_insets(mut self, insets: PlotInsets) -> Self {
        self.insets = insets;
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    #[must_use]
    pub fn with_three_d(mut self, three_d: ThreeDConfig) -> Self {
        self.three_d = three_d;
        self
    }

    #[must_use]
    pub fn with_series(mut self, series: SeriesConfig) -> Self {
        self.series.push(series);
        self
    }

    #[must_use]
    pub fn container(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Container minus the insets.
    #[must_use]
    pub fn plot_bounds(&self) -> Rect {
        let container = self.container();
        Rect::new(
            container.left + self.insets.left,
            container.top + self.insets.top,
            container.width - self.insets.left - self.insets.right,
            container.height - self.insets.top - self.insets.bottom,
        )
    }

    pub fn validate(&self) -> ChartResult<()> {
        self.container().validate()?;
        let insets = [
            self.insets.left,
            self.insets.top,
            self.insets.right,
            self.insets.bottom,
        ];
        if insets.iter().any(|inset| !inset.is_finite() || *inset < 0.0) {
            return Err(ChartError::InvalidData(
                "plot insets must be finite and non-negative".to_owned(),
            ));
        }
        self.plot_bounds().validate()?;
        if let Some(background) = self.background {
            background.validate()?;
        }
        Ok(())
    }

    pub fn to_json_string(&self) -> ChartResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ChartError::InvalidData(format!("failed to serialize chart config: {e}")))
    }

    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| ChartError::InvalidData(format!("failed to parse chart config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
