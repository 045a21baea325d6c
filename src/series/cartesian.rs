use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::core::settings::{non_negative, settings_schema, unit_ratio};
use crate::core::{
    Boundable, ConsistencyState, Drawable, ErrorCode, Invalidatable, ListenerKey, Rect,
    SharedReporter, Signal, SignalMask, StateMask, StatefulCore, default_reporter,
};
use crate::error::{ChartError, ChartResult};
use crate::render::{Color, PointState, RenderFrame, ShapeConfig, ShapeManager, Stroke};
use crate::scales::{CategoryKey, ScaleRef};
use crate::series::capabilities::{DrawerCapabilities, DrawerCapability};
use crate::series::drawer::{DrawContext, Drawer, DrawerKind, StepDirection, draw_points};
use crate::series::point::{Ohlc, PointMeta};
use crate::series::registry::DrawerRegistry;
use crate::series::stacking::{StackAccumulator, StackedValue};
use crate::series::three_d::ThreeDShift;
use crate::table::Table;

settings_schema! {
    /// Serializable series settings; each setter invalidates the series.
    pub struct SeriesSettings {
        enabled / set_enabled: bool = true,
            normalize = std::convert::identity,
            states = [Enabled],
            signals = [NeedsRedraw, EnabledStateChanged, NeedsRecalculation];
        connect_missing_points / set_connect_missing_points: bool = false,
            normalize = std::convert::identity,
            states = [SeriesPoints],
            signals = [NeedsRedraw];
        stacked / set_stacked: bool = false,
            normalize = std::convert::identity,
            states = [SeriesPoints],
            signals = [NeedsRedraw, NeedsRecalculation];
        vertical / set_vertical: bool = false,
            normalize = std::convert::identity,
            states = [SeriesPoints, Bounds],
            signals = [NeedsRedraw, BoundsChanged];
        stroke_thickness / set_stroke_thickness: f64 = 1.0,
            normalize = non_negative,
            states = [Appearance, SeriesPoints],
            signals = [NeedsRedraw];
        point_width_ratio / set_point_width_ratio: f64 = 0.9,
            normalize = unit_ratio,
            states = [SeriesPoints],
            signals = [NeedsRedraw];
        step_direction / set_step_direction: StepDirection = StepDirection::Center,
            normalize = std::convert::identity,
            states = [SeriesPoints],
            signals = [NeedsRedraw];
        spline_tension / set_spline_tension: f64 = 1.0,
            normalize = unit_ratio,
            states = [SeriesPoints],
            signals = [NeedsRedraw];
        z_index / set_z_index: f64 = 30.0,
            normalize = std::convert::identity,
            states = [ZIndex],
            signals = [NeedsRedraw];
        color / set_color: Color = Color::rgb(0.39, 0.71, 0.96),
            normalize = std::convert::identity,
            states = [Appearance, SeriesColor],
            signals = [NeedsRedraw];
        hatch_fill / set_hatch_fill: Option<Color> = None,
            normalize = std::convert::identity,
            states = [Appearance, SeriesHatchFill],
            signals = [NeedsRedraw];
        rising_color / set_rising_color: Color = Color::rgb(0.25, 0.6, 0.36),
            normalize = std::convert::identity,
            states = [Appearance, SeriesColor],
            signals = [NeedsRedraw];
        falling_color / set_falling_color: Color = Color::rgb(0.86, 0.24, 0.22),
            normalize = std::convert::identity,
            states = [Appearance, SeriesColor],
            signals = [NeedsRedraw];
    }
}

/// Y part of one data point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointValue {
    Value(f64),
    Ohlc(Ohlc),
    Missing,
}

/// One x key with its value.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub x: CategoryKey,
    pub value: PointValue,
}

impl DataPoint {
    /// NaN values are stored as missing.
    #[must_use]
    pub fn new(x: impl Into<CategoryKey>, value: f64) -> Self {
        let value = if value.is_nan() {
            PointValue::Missing
        } else {
            PointValue::Value(value)
        };
        Self { x: x.into(), value }
    }

    #[must_use]
    pub fn ohlc(x: impl Into<CategoryKey>, open: f64, high: f64, low: f64, close: f64) -> Self {
        let ohlc = Ohlc::new(open, high, low, close);
        let value = if ohlc.is_complete() {
            PointValue::Ohlc(ohlc)
        } else {
            PointValue::Missing
        };
        Self { x: x.into(), value }
    }

    #[must_use]
    pub fn missing(x: impl Into<CategoryKey>) -> Self {
        Self {
            x: x.into(),
            value: PointValue::Missing,
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self.value, PointValue::Missing)
    }

    /// Value used for stacking; the close for OHLC points.
    #[must_use]
    pub fn stack_value(&self) -> f64 {
        match self.value {
            PointValue::Value(value) => value,
            PointValue::Ohlc(ohlc) => ohlc.close,
            PointValue::Missing => f64::NAN,
        }
    }
}

/// Points of one table column keyed by row key.
///
/// `row_shift` moves each value `row_shift` rows forward (negative: back),
/// as the leading and lagging IKH lines need; values shifted past the table
/// are dropped.
pub fn table_points(table: &Table, field: &str, row_shift: isize) -> ChartResult<Vec<DataPoint>> {
    let values = table
        .column_values(field)
        .ok_or_else(|| ChartError::UnknownField(field.to_owned()))?;
    let keys = table.keys();
    Ok(values
        .iter()
        .enumerate()
        .filter_map(|(row, value)| {
            let target = row.checked_add_signed(row_shift)?;
            keys.get(target).map(|key| DataPoint::new(*key, *value))
        })
        .collect())
}

/// OHLC points from four table fields, in open/high/low/close order.
pub fn table_ohlc_points(table: &Table, fields: [&str; 4]) -> ChartResult<Vec<DataPoint>> {
    let columns = fields
        .iter()
        .map(|field| {
            table
                .column_values(field)
                .ok_or_else(|| ChartError::UnknownField((*field).to_owned()))
        })
        .collect::<ChartResult<Vec<_>>>()?;
    Ok(table
        .keys()
        .iter()
        .enumerate()
        .map(|(row, key)| {
            DataPoint::ohlc(
                *key,
                columns[0][row],
                columns[1][row],
                columns[2][row],
                columns[3][row],
            )
        })
        .collect())
}

const SERIES_STATES: StateMask = StateMask::VISUAL
    .with(ConsistencyState::Data)
    .with(ConsistencyState::SeriesPoints)
    .with(ConsistencyState::SeriesHatchFill)
    .with(ConsistencyState::SeriesColor);

/// Data plus drawer: the unit a chart lays out, stacks and draws.
pub struct Series {
    core: StatefulCore,
    reporter: SharedReporter,
    name: String,
    drawer: Box<dyn Drawer>,
    shapes: ShapeManager,
    settings: SeriesSettings,
    data: Vec<DataPoint>,
    x_scale: Option<ScaleRef>,
    y_scale: Option<ScaleRef>,
    scale_listeners: Vec<(StatefulCore, ListenerKey)>,
    bounds: Option<Rect>,
    three_d: ThreeDShift,
    stacked: Vec<Option<StackedValue>>,
    point_states: IndexMap<usize, PointState>,
    points: Vec<PointMeta>,
    point_width: f64,
}

impl Series {
    #[must_use]
    pub fn new(name: impl Into<String>, drawer: Box<dyn Drawer>) -> Self {
        Self::with_reporter(name, drawer, default_reporter())
    }

    #[must_use]
    pub fn with_reporter(name: impl Into<String>, drawer: Box<dyn Drawer>, reporter: SharedReporter) -> Self {
        let shapes = ShapeManager::new(drawer.default_shapes());
        let mut series = Self {
            core: StatefulCore::new("series", SERIES_STATES, SignalMask::all()),
            reporter,
            name: name.into(),
            drawer,
            shapes,
            settings: SeriesSettings::default(),
            data: Vec::new(),
            x_scale: None,
            y_scale: None,
            scale_listeners: Vec::new(),
            bounds: None,
            three_d: ThreeDShift::default(),
            stacked: Vec::new(),
            point_states: IndexMap::new(),
            points: Vec::new(),
            point_width: 0.0,
        };
        series.refresh_palette();
        series
    }

    /// Series drawn by the factory `registry` holds for `kind`.
    pub fn from_registry(
        registry: &DrawerRegistry,
        kind: DrawerKind,
        name: impl Into<String>,
        reporter: SharedReporter,
    ) -> ChartResult<Self> {
        let drawer = registry
            .create(kind)
            .ok_or_else(|| ChartError::InvalidData(format!("no drawer registered for `{kind}`")))?;
        Ok(Self::with_reporter(name, drawer, reporter))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> DrawerKind {
        self.drawer.kind()
    }

    #[must_use]
    pub fn capabilities(&self) -> DrawerCapabilities {
        self.drawer.capabilities()
    }

    #[must_use]
    pub fn settings(&self) -> &SeriesSettings {
        &self.settings
    }

    /// Runs `change` against the settings; the setters invalidate the series.
    pub fn configure<R>(&mut self, change: impl FnOnce(&mut SeriesSettings, &StatefulCore) -> R) -> R {
        let result = change(&mut self.settings, &self.core);
        self.refresh_palette();
        result
    }

    /// Replaces every setting at once, e.g. from a deserialized snapshot.
    pub fn set_settings(&mut self, settings: SeriesSettings) {
        if self.settings == settings {
            return;
        }
        self.settings = settings;
        self.refresh_palette();
        self.core.invalidate(
            SERIES_STATES,
            Signal::NeedsRedraw | Signal::NeedsRecalculation,
        );
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled()
    }

    /// Vertical when the drawer is inherently vertical or the setting asks for it.
    #[must_use]
    pub fn is_vertical(&self) -> bool {
        self.settings.vertical() || self.capabilities().contains(DrawerCapability::IsVertical)
    }

    /// Stacked only when the drawer supports stacking.
    #[must_use]
    pub fn is_stacked(&self) -> bool {
        self.settings.stacked() && self.capabilities().supports_stack()
    }

    #[must_use]
    pub fn shapes(&self) -> &ShapeManager {
        &self.shapes
    }

    /// Swaps the shape declarations; the palette is kept.
    pub fn set_shapes(&mut self, configs: Vec<ShapeConfig>) {
        let palette = self.shapes.palette().clone();
        self.shapes = ShapeManager::new(configs).with_palette(palette);
        self.core.invalidate(
            ConsistencyState::Appearance | ConsistencyState::SeriesPoints,
            Signal::NeedsRedraw,
        );
    }

    fn refresh_palette(&mut self) {
        let color = self.settings.color();
        let thickness = self.settings.stroke_thickness();
        let hatch = self.settings.hatch_fill();
        let rising = Stroke::new(self.settings.rising_color(), thickness);
        let falling = Stroke::new(self.settings.falling_color(), thickness);
        let palette = self.shapes.palette_mut();
        for state in [PointState::Normal, PointState::Hover, PointState::Selected] {
            let base = match state {
                PointState::Normal => color,
                PointState::Hover => color.shaded(1.15),
                PointState::Selected => color.shaded(0.85),
            };
            palette
                .set_fill("fill", state, Some(base))
                .set_fill("sideFill", state, Some(base.shaded(0.8)))
                .set_fill("topFill", state, Some(base.shaded(1.1)))
                .set_fill("hatchFill", state, hatch)
                .set_stroke("stroke", state, Some(Stroke::new(base.shaded(0.8), thickness)))
                .set_stroke("rising", state, Some(rising))
                .set_stroke("falling", state, Some(falling));
        }
    }

    #[must_use]
    pub fn data(&self) -> &[DataPoint] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<DataPoint>) {
        self.data = data;
        self.stacked.clear();
        self.point_states.retain(|index, _| *index < self.data.len());
        debug!(series = %self.name, points = self.data.len(), "series data set");
        self.core.invalidate(
            ConsistencyState::Data | ConsistencyState::SeriesPoints,
            Signal::DataChanged | Signal::NeedsRecalculation | Signal::NeedsRedraw,
        );
    }

    /// Interaction state of one point; `Normal` clears it.
    pub fn set_point_state(&mut self, index: usize, state: PointState) -> &mut Self {
        let changed = if state == PointState::Normal {
            self.point_states.shift_remove(&index).is_some()
        } else {
            self.point_states.insert(index, state) != Some(state)
        };
        if changed {
            self.core.invalidate(
                ConsistencyState::Appearance | ConsistencyState::SeriesPoints,
                Signal::NeedsRedraw,
            );
        }
        self
    }

    #[must_use]
    pub fn point_state(&self, index: usize) -> PointState {
        self.point_states.get(&index).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn x_scale(&self) -> Option<&ScaleRef> {
        self.x_scale.as_ref()
    }

    #[must_use]
    pub fn y_scale(&self) -> Option<&ScaleRef> {
        self.y_scale.as_ref()
    }

    pub fn set_x_scale(&mut self, scale: ScaleRef) -> &mut Self {
        self.x_scale = Some(scale);
        self.rewire_scales();
        self
    }

    pub fn set_y_scale(&mut self, scale: ScaleRef) -> &mut Self {
        self.y_scale = Some(scale);
        self.rewire_scales();
        self
    }

    /// Scale changes reposition the points of this series.
    fn rewire_scales(&mut self) {
        for (core, key) in self.scale_listeners.drain(..) {
            core.unlisten_signals(key);
        }
        for scale in self.x_scale.iter().chain(self.y_scale.iter()) {
            let scale_core = scale.core();
            let series = self.core.downgrade();
            let key = scale_core.listen_signals(
                Signal::NeedsReapplication | Signal::NeedsRecalculation,
                move |_| {
                    if let Some(series) = series.upgrade() {
                        series.invalidate(ConsistencyState::SeriesPoints, Signal::NeedsRedraw);
                    }
                },
            );
            self.scale_listeners.push((scale_core, key));
        }
        self.core
            .invalidate(ConsistencyState::SeriesPoints, Signal::NeedsRedraw);
    }

    #[must_use]
    pub fn three_d(&self) -> ThreeDShift {
        self.three_d
    }

    pub fn set_three_d(&mut self, three_d: ThreeDShift) {
        if self.three_d != three_d {
            self.three_d = three_d;
            self.core
                .invalidate(ConsistencyState::SeriesPoints, Signal::NeedsRedraw);
        }
    }

    /// X keys of present and missing points, in data order.
    #[must_use]
    pub fn x_keys(&self) -> Vec<CategoryKey> {
        self.data.iter().map(|point| point.x.clone()).collect()
    }

    /// Values the y scale must cover: stacked bounds when stacked, highs and
    /// lows for OHLC, plus the zero line for zero-based drawers.
    #[must_use]
    pub fn y_range_values(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.data.len() + 1);
        if self.is_stacked() && !self.stacked.is_empty() {
            for stacked in self.stacked.iter().flatten() {
                values.push(stacked.zero);
                values.push(stacked.value);
            }
        } else {
            for point in &self.data {
                match point.value {
                    PointValue::Value(value) => values.push(value),
                    PointValue::Ohlc(ohlc) => {
                        values.push(ohlc.high);
                        values.push(ohlc.low);
                    }
                    PointValue::Missing => {}
                }
            }
        }
        if self.capabilities().needs_zero() && !values.is_empty() {
            values.push(0.0);
        }
        values
    }

    /// Stacks this series on `stack`. Series of one stack must be applied in
    /// drawing order.
    pub fn apply_stack(&mut self, stack: &mut StackAccumulator) {
        self.stacked = self
            .data
            .iter()
            .map(|point| stack.stack(&point.x, point.stack_value()))
            .collect();
        trace!(series = %self.name, "stack applied");
    }

    pub fn clear_stack(&mut self) {
        self.stacked.clear();
    }

    /// Point metadata of the last draw pass.
    #[must_use]
    pub fn points(&self) -> &[PointMeta] {
        &self.points
    }

    /// Pixel width of one point in the last computed pass.
    #[must_use]
    pub fn point_width(&self) -> f64 {
        self.point_width
    }

    /// Transforms the data through both scales into pixel metadata.
    pub fn compute_points(&mut self) -> ChartResult<&[PointMeta]> {
        let bounds = self
            .bounds
            .ok_or_else(|| ChartError::InvalidData(format!("bounds are not set for series `{}`", self.name)))?;
        let x_scale = self.x_scale.as_ref().ok_or(ChartError::MissingScale("series x"))?;
        let y_scale = self.y_scale.as_ref().ok_or(ChartError::MissingScale("series y"))?;
        let vertical = self.is_vertical();
        let stacked = self.is_stacked();

        let (category_length, category_start, category_sign) = if vertical {
            (bounds.height, bounds.bottom(), -1.0)
        } else {
            (bounds.width, bounds.left, 1.0)
        };
        let category_px = |ratio: f64| category_start + category_sign * ratio * category_length;
        let value_px = |ratio: f64| {
            if vertical {
                bounds.left + ratio * bounds.width
            } else {
                bounds.bottom() - ratio * bounds.height
            }
        };

        let band = if x_scale.is_ordinal() {
            x_scale.point_width_ratio()
        } else {
            1.0 / self.data.len().max(1) as f64
        };
        self.point_width = band * category_length * self.settings.point_width_ratio();

        let base_zero = value_px(y_scale.transform(0.0).clamp(0.0, 1.0));
        let mut points = Vec::with_capacity(self.data.len());
        for (index, point) in self.data.iter().enumerate() {
            let x_ratio = x_scale.transform_key(&point.x, 0.5);
            let state = self.point_states.get(&index).copied().unwrap_or_default();
            if !x_ratio.is_finite() {
                points.push(PointMeta::missing(index, f64::NAN).with_state(state));
                continue;
            }
            let x = category_px(x_ratio);
            let meta = match point.value {
                PointValue::Missing => PointMeta::missing(index, x),
                PointValue::Ohlc(ohlc) => {
                    let pixels = ohlc.map(|value| value_px(y_scale.transform(value)));
                    PointMeta::with_ohlc(index, x, pixels, ohlc.close > ohlc.open)
                }
                PointValue::Value(value) => match self.stacked.get(index).copied().flatten() {
                    Some(stack) if stacked => {
                        let mut meta = PointMeta::new(
                            index,
                            x,
                            value_px(y_scale.transform(stack.value)),
                            value_px(y_scale.transform(stack.zero)),
                        );
                        meta.zero_missing = stack.zero_missing;
                        meta
                    }
                    _ => PointMeta::new(index, x, value_px(y_scale.transform(value)), base_zero),
                },
            };
            points.push(meta.with_state(state));
        }

        if stacked && self.settings.connect_missing_points() {
            mark_stack_gaps(&mut points);
        }
        self.points = points;
        Ok(&self.points)
    }

    fn draw_context(&self) -> DrawContext {
        DrawContext {
            state: PointState::Normal,
            base_z_index: self.settings.z_index(),
            vertical: self.is_vertical(),
            stacked: self.is_stacked(),
            connect_missing: self.settings.connect_missing_points(),
            point_width: self.point_width,
            stroke_thickness: self.settings.stroke_thickness(),
            step_direction: self.settings.step_direction(),
            spline_tension: self.settings.spline_tension(),
            three_d: self.three_d,
        }
    }

    /// Detaches scale listeners and every listener of this series.
    pub fn dispose(&mut self) {
        for (core, key) in self.scale_listeners.drain(..) {
            core.unlisten_signals(key);
        }
        self.core.dispose();
    }
}

/// Stacked points next to a gap drop to their own zero on the gap side.
fn mark_stack_gaps(points: &mut [PointMeta]) {
    let missing: Vec<bool> = points.iter().map(|point| point.missing).collect();
    for (index, point) in points.iter_mut().enumerate() {
        if point.missing {
            continue;
        }
        if index > 0 && missing[index - 1] {
            point.prev_value = point.zero;
            point.prev_zero = point.zero;
        }
        if missing.get(index + 1).copied().unwrap_or(false) {
            point.next_value = point.zero;
            point.next_zero = point.zero;
        }
    }
}

impl Invalidatable for Series {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

impl Boundable for Series {
    fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) -> ChartResult<()> {
        let bounds = bounds.validate()?;
        if self.bounds != Some(bounds) {
            self.bounds = Some(bounds);
            self.core.invalidate(
                ConsistencyState::Bounds | ConsistencyState::SeriesPoints,
                Signal::BoundsChanged | Signal::NeedsRedraw,
            );
        }
        Ok(())
    }
}

impl Drawable for Series {
    fn draw(&mut self, frame: &mut RenderFrame) -> ChartResult<()> {
        self.shapes.clear_shapes();
        if !self.is_enabled() {
            self.core.mark_consistent(SERIES_STATES);
            return Ok(());
        }
        if self.x_scale.is_none() || self.y_scale.is_none() {
            self.reporter.error(ErrorCode::ScaleNotSet, &[]);
            return Ok(());
        }
        if self.bounds.is_none() {
            self.reporter.error(ErrorCode::ContainerNotSet, &[]);
            return Ok(());
        }
        let kind = self.kind().to_string();
        if !self.shapes.validate_requirements(
            &self.name,
            &kind,
            self.drawer.required_shapes(),
            &*self.reporter,
        ) {
            return Ok(());
        }

        self.compute_points()?;
        let context = self.draw_context();
        draw_points(self.drawer.as_mut(), &context, &self.points, &mut self.shapes);
        frame.extend_from_manager(&self.shapes);
        self.core.mark_consistent(SERIES_STATES);
        debug!(series = %self.name, kind = %kind, points = self.points.len(), "series frame built");
        Ok(())
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("points", &self.data.len())
            .field("settings", &self.settings)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::core::RecordingReporter;
    use crate::scales::{LinearScale, OrdinalScale};
    use crate::series::column::ColumnDrawer;
    use crate::series::line::LineDrawer;

    fn scales() -> (ScaleRef, ScaleRef) {
        let mut x = OrdinalScale::new();
        x.set_values(["a", "b"]);
        let mut y = LinearScale::new();
        y.set_minimum(Some(0.0)).set_maximum(Some(10.0));
        (ScaleRef::ordinal(x), ScaleRef::linear(y))
    }

    #[test]
    fn points_sit_in_band_centers() {
        let (x, y) = scales();
        let mut series = Series::new("line", Box::new(LineDrawer::new()));
        series.set_x_scale(x).set_y_scale(y);
        series.set_bounds(Rect::new(0.0, 0.0, 100.0, 50.0)).expect("valid bounds");
        series.set_data(vec![DataPoint::new("a", 5.0), DataPoint::new("b", 10.0)]);
        let points = series.compute_points().expect("scales and bounds set");
        assert_eq!((points[0].x, points[0].value, points[0].zero), (25.0, 25.0, 50.0));
        assert_eq!((points[1].x, points[1].value), (75.0, 0.0));
        assert_eq!(series.point_width(), 45.0);
    }

    #[test]
    fn drawing_without_scales_reports() {
        let reporter = Rc::new(RecordingReporter::new());
        let mut series = Series::with_reporter("orphan", Box::new(ColumnDrawer::new()), reporter.clone());
        series.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0)).expect("valid bounds");
        let mut frame = RenderFrame::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        series.draw(&mut frame).expect("reported, not failed");
        assert_eq!(reporter.count_errors(ErrorCode::ScaleNotSet), 1);
        assert!(frame.is_empty());
    }

    #[test]
    fn drawing_without_bounds_reports() {
        let reporter = Rc::new(RecordingReporter::new());
        let (x, y) = scales();
        let mut series = Series::with_reporter("floating", Box::new(ColumnDrawer::new()), reporter.clone());
        series.set_x_scale(x).set_y_scale(y);
        let mut frame = RenderFrame::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        series.draw(&mut frame).expect("reported, not failed");
        assert_eq!(reporter.count_errors(ErrorCode::ContainerNotSet), 1);
        assert!(frame.is_empty());
    }

    #[test]
    fn incomplete_shapes_are_reported() {
        let reporter = Rc::new(RecordingReporter::new());
        let (x, y) = scales();
        let mut series = Series::with_reporter("columns", Box::new(ColumnDrawer::new()), reporter.clone());
        series.set_x_scale(x).set_y_scale(y);
        series.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0)).expect("valid bounds");
        series.set_shapes(vec![ShapeConfig::path("path", 0.0)]);
        series.set_data(vec![DataPoint::new("a", 1.0)]);
        let mut frame = RenderFrame::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        series.draw(&mut frame).expect("reported, not failed");
        assert_eq!(reporter.count_errors(ErrorCode::WrongShapesConfig), 1);
        assert!(frame.is_empty());
    }

    #[test]
    fn stacking_moves_the_zero_to_the_series_below() {
        let (x, y) = scales();
        let mut stack = StackAccumulator::new();
        let mut lower = Series::new("lower", Box::new(ColumnDrawer::new()));
        let mut upper = Series::new("upper", Box::new(ColumnDrawer::new()));
        for series in [&mut lower, &mut upper] {
            series.set_x_scale(x.clone()).set_y_scale(y.clone());
            series.configure(|settings, core| settings.set_stacked(core, true));
            series.set_bounds(Rect::new(0.0, 0.0, 100.0, 100.0)).expect("valid bounds");
            series.set_data(vec![DataPoint::new("a", 4.0)]);
            series.apply_stack(&mut stack);
        }
        assert_eq!(upper.y_range_values(), vec![4.0, 8.0, 0.0]);
        let point = upper.compute_points().expect("scales and bounds set")[0];
        assert_eq!((point.zero, point.value), (60.0, 20.0));
    }

    #[test]
    fn settings_declare_their_invalidation() {
        let descriptor = SeriesSettings::descriptor("stacked").expect("declared setting");
        assert!(descriptor.signals.contains_signal(Signal::NeedsRecalculation));
        assert_eq!(SeriesSettings::DESCRIPTORS.len(), 13);
    }
}
