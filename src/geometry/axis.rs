use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::settings::{non_negative, settings_schema};
use crate::core::{
    Boundable, ConsistencyState, Drawable, ErrorCode, Invalidatable, ListenerKey, Point, Rect,
    SharedReporter, Signal, SignalMask, StateMask, StatefulCore, default_reporter,
};
use crate::error::ChartResult;
use crate::render::{
    Color, Path, PathSink, PointState, RenderFrame, Shape, ShapeType, Stroke, TextHAlign,
    TextPrimitive,
};
use crate::scales::{ScaleRef, TickMark, TickSource};

/// Side of the plot an axis is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrientation {
    #[default]
    Bottom,
    Top,
    Left,
    Right,
}

impl AxisOrientation {
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Bottom | Self::Top)
    }
}

/// One tick line in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSegment {
    pub value: f64,
    pub ratio: f64,
    pub from: Point,
    pub to: Point,
}

/// Where a tick label goes. `position` is the pixel offset along the axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub text: String,
    pub position: f64,
    pub x: f64,
    pub y: f64,
    pub h_align: TextHAlign,
}

/// Resolved geometry of one axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisGeometry {
    pub line: Option<(Point, Point)>,
    pub major: Vec<TickSegment>,
    pub minor: Vec<TickSegment>,
    pub labels: Vec<LabelAnchor>,
}

/// Places ticks and labels of any [`TickSource`] along one side of `bounds`.
///
/// `bounds` is the axis area; the axis line runs along its edge facing the
/// plot and ticks point away from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLayout {
    pub orientation: AxisOrientation,
    pub bounds: Rect,
    pub tick_length: f64,
    pub minor_tick_length: f64,
    pub label_padding: f64,
    pub font_size_px: f64,
}

impl AxisLayout {
    #[must_use]
    pub fn new(orientation: AxisOrientation, bounds: Rect) -> Self {
        Self {
            orientation,
            bounds,
            tick_length: 5.0,
            minor_tick_length: 2.0,
            label_padding: 3.0,
            font_size_px: 11.0,
        }
    }

    /// Pixel offset of `ratio` along the axis.
    #[must_use]
    pub fn position(&self, ratio: f64) -> f64 {
        if self.orientation.is_horizontal() {
            self.bounds.left + ratio * self.bounds.width
        } else {
            self.bounds.bottom() - ratio * self.bounds.height
        }
    }

    /// Coordinate of the axis line across the axis and the outward direction.
    fn base(&self) -> (f64, f64) {
        match self.orientation {
            AxisOrientation::Bottom => (self.bounds.top, 1.0),
            AxisOrientation::Top => (self.bounds.bottom(), -1.0),
            AxisOrientation::Left => (self.bounds.right(), -1.0),
            AxisOrientation::Right => (self.bounds.left, 1.0),
        }
    }

    fn point(&self, along: f64, across: f64) -> Point {
        if self.orientation.is_horizontal() {
            Point::new(along, across)
        } else {
            Point::new(across, along)
        }
    }

    #[must_use]
    pub fn axis_line(&self) -> (Point, Point) {
        let (base, _) = self.base();
        (
            self.point(self.position(0.0), base),
            self.point(self.position(1.0), base),
        )
    }

    /// Tick segments for ticks whose ratio falls inside `[0, 1]`.
    #[must_use]
    pub fn tick_segments(&self, ticks: &[TickMark], length: f64) -> Vec<TickSegment> {
        let (base, direction) = self.base();
        ticks
            .iter()
            .filter(|tick| (0.0..=1.0).contains(&tick.ratio))
            .map(|tick| {
                let along = self.position(tick.ratio);
                TickSegment {
                    value: tick.value,
                    ratio: tick.ratio,
                    from: self.point(along, base),
                    to: self.point(along, base + direction * length),
                }
            })
            .collect()
    }

    /// Label anchors of labelled in-range ticks, outside the tick ends.
    #[must_use]
    pub fn label_anchors(&self, ticks: &[TickMark]) -> Vec<LabelAnchor> {
        let (base, direction) = self.base();
        let across = base + direction * (self.tick_length + self.label_padding);
        let h_align = match self.orientation {
            AxisOrientation::Bottom | AxisOrientation::Top => TextHAlign::Center,
            AxisOrientation::Left => TextHAlign::Right,
            AxisOrientation::Right => TextHAlign::Left,
        };
        ticks
            .iter()
            .filter(|tick| !tick.label.is_empty() && (0.0..=1.0).contains(&tick.ratio))
            .map(|tick| {
                let position = self.position(tick.ratio);
                let anchor = self.point(position, across);
                LabelAnchor {
                    text: tick.label.clone(),
                    position,
                    x: anchor.x,
                    y: anchor.y,
                    h_align,
                }
            })
            .collect()
    }

    /// Smallest distance between two label anchors that keeps them apart.
    ///
    /// Widths are estimated from the character count; there are no font
    /// metrics at this level.
    #[must_use]
    pub fn min_label_spacing(&self, labels: &[LabelAnchor]) -> f64 {
        if self.orientation.is_horizontal() {
            let widest = labels
                .iter()
                .map(|label| label.text.chars().count())
                .max()
                .unwrap_or(0);
            widest as f64 * self.font_size_px * 0.6 + self.label_padding
        } else {
            self.font_size_px + self.label_padding
        }
    }

    #[must_use]
    pub fn layout<S: TickSource + ?Sized>(&self, source: &S, thin_overlapping: bool) -> AxisGeometry {
        let major = source.major_ticks();
        let mut labels = self.label_anchors(&major);
        if thin_overlapping {
            let spacing = self.min_label_spacing(&labels);
            labels = thin_labels(labels, spacing);
        }
        AxisGeometry {
            line: Some(self.axis_line()),
            major: self.tick_segments(&major, self.tick_length),
            minor: self.tick_segments(&source.minor_ticks(), self.minor_tick_length),
            labels,
        }
    }
}

/// Drops labels closer than `min_spacing` to the previously kept one.
///
/// The last label wins over the one kept before it when it fits, and a lone
/// survivor is replaced by the last label.
#[must_use]
pub fn thin_labels(mut labels: Vec<LabelAnchor>, min_spacing: f64) -> Vec<LabelAnchor> {
    labels.sort_by(|a, b| a.position.total_cmp(&b.position));
    if labels.len() < 2 || !min_spacing.is_finite() || min_spacing <= 0.0 {
        return labels;
    }

    let mut kept = vec![0];
    let mut last_kept = 0;
    for index in 1..labels.len() {
        if labels[index].position - labels[last_kept].position >= min_spacing {
            kept.push(index);
            last_kept = index;
        }
    }

    let last = labels.len() - 1;
    if last_kept != last {
        if kept.len() == 1 {
            kept[0] = last;
        } else {
            let penultimate = kept[kept.len() - 2];
            if labels[last].position - labels[penultimate].position >= min_spacing {
                if let Some(slot) = kept.last_mut() {
                    *slot = last;
                }
            }
        }
    }

    let mut labels: Vec<Option<LabelAnchor>> = labels.into_iter().map(Some).collect();
    kept.into_iter()
        .filter_map(|index| labels[index].take())
        .collect()
}

settings_schema! {
    pub struct AxisSettings {
        enabled / set_enabled: bool = true,
            normalize = std::convert::identity,
            states = [Enabled],
            signals = [NeedsRedraw, EnabledStateChanged];
        orientation / set_orientation: AxisOrientation = AxisOrientation::Bottom,
            normalize = std::convert::identity,
            states = [Bounds, AxisTicks, AxisLabels],
            signals = [NeedsRedraw, BoundsChanged];
        title / set_title: Option<String> = None,
            normalize = std::convert::identity,
            states = [AxisTitle],
            signals = [NeedsRedraw];
        tick_length / set_tick_length: f64 = 5.0,
            normalize = non_negative,
            states = [AxisTicks],
            signals = [NeedsRedraw];
        minor_tick_length / set_minor_tick_length: f64 = 2.0,
            normalize = non_negative,
            states = [AxisTicks],
            signals = [NeedsRedraw];
        label_padding / set_label_padding: f64 = 3.0,
            normalize = non_negative,
            states = [AxisLabels],
            signals = [NeedsRedrawLabels, NeedsRedraw];
        font_size / set_font_size: f64 = 11.0,
            normalize = non_negative,
            states = [AxisLabels, AxisOverlap],
            signals = [NeedsRedrawLabels, NeedsRedraw];
        allow_overlap / set_allow_overlap: bool = false,
            normalize = std::convert::identity,
            states = [AxisOverlap],
            signals = [NeedsRedrawLabels, NeedsRedraw];
        stroke_color / set_stroke_color: Color = Color::rgb(0.78, 0.78, 0.78),
            normalize = std::convert::identity,
            states = [Appearance],
            signals = [NeedsRedraw];
        label_color / set_label_color: Color = Color::rgb(0.13, 0.13, 0.13),
            normalize = std::convert::identity,
            states = [Appearance, AxisLabels],
            signals = [NeedsRedrawLabels, NeedsRedraw];
        z_index / set_z_index: f64 = 35.0,
            normalize = std::convert::identity,
            states = [ZIndex],
            signals = [NeedsRedraw];
    }
}

const AXIS_STATES: StateMask = StateMask::VISUAL
    .with(ConsistencyState::AxisTitle)
    .with(ConsistencyState::AxisLabels)
    .with(ConsistencyState::AxisTicks)
    .with(ConsistencyState::AxisOverlap);

/// Axis entity: a scale rendered along one side of the plot.
pub struct Axis {
    core: StatefulCore,
    reporter: SharedReporter,
    settings: AxisSettings,
    scale: Option<ScaleRef>,
    scale_listener: Option<(StatefulCore, ListenerKey)>,
    bounds: Option<Rect>,
    geometry: AxisGeometry,
}

impl Axis {
    #[must_use]
    pub fn new() -> Self {
        Self::with_reporter(default_reporter())
    }

    #[must_use]
    pub fn with_reporter(reporter: SharedReporter) -> Self {
        Self {
            core: StatefulCore::new("axis", AXIS_STATES, SignalMask::all()),
            reporter,
            settings: AxisSettings::default(),
            scale: None,
            scale_listener: None,
            bounds: None,
            geometry: AxisGeometry::default(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AxisSettings {
        &self.settings
    }

    pub fn configure<R>(&mut self, change: impl FnOnce(&mut AxisSettings, &StatefulCore) -> R) -> R {
        change(&mut self.settings, &self.core)
    }

    #[must_use]
    pub fn orientation(&self) -> AxisOrientation {
        self.settings.orientation()
    }

    #[must_use]
    pub fn scale(&self) -> Option<&ScaleRef> {
        self.scale.as_ref()
    }

    /// Binds the axis to `scale`; tick changes on the scale relayout the axis.
    pub fn set_scale(&mut self, scale: ScaleRef) -> &mut Self {
        if let Some((core, key)) = self.scale_listener.take() {
            core.unlisten_signals(key);
        }
        let scale_core = scale.core();
        let axis = self.core.downgrade();
        let key = scale_core.listen_signals(
            Signal::NeedsReapplication | Signal::NeedsRecalculation,
            move |_| {
                if let Some(axis) = axis.upgrade() {
                    axis.invalidate(
                        ConsistencyState::AxisTicks
                            | ConsistencyState::AxisLabels
                            | ConsistencyState::AxisOverlap,
                        Signal::NeedsRedrawLabels | Signal::NeedsRedraw,
                    );
                }
            },
        );
        self.scale_listener = Some((scale_core, key));
        self.scale = Some(scale);
        self.core.invalidate(
            ConsistencyState::AxisTicks | ConsistencyState::AxisLabels,
            Signal::NeedsRedraw,
        );
        self
    }

    /// Geometry of the last draw pass.
    #[must_use]
    pub fn geometry(&self) -> &AxisGeometry {
        &self.geometry
    }

    fn layout(&self, bounds: Rect) -> AxisLayout {
        AxisLayout {
            orientation: self.settings.orientation(),
            bounds,
            tick_length: self.settings.tick_length(),
            minor_tick_length: self.settings.minor_tick_length(),
            label_padding: self.settings.label_padding(),
            font_size_px: self.settings.font_size(),
        }
    }

    fn title_primitive(&self, bounds: Rect, title: &str) -> TextPrimitive {
        let center = bounds.center();
        let font = self.settings.font_size();
        let (x, y) = match self.settings.orientation() {
            AxisOrientation::Bottom => (center.x, bounds.bottom() - self.settings.label_padding()),
            AxisOrientation::Top => (center.x, bounds.top + font),
            AxisOrientation::Left => (bounds.left + font, center.y),
            AxisOrientation::Right => (bounds.right() - font, center.y),
        };
        TextPrimitive::new(title, x, y, font, self.settings.label_color(), TextHAlign::Center)
    }

    pub fn dispose(&mut self) {
        if let Some((core, key)) = self.scale_listener.take() {
            core.unlisten_signals(key);
        }
        self.core.dispose();
    }
}

impl Default for Axis {
    fn default() -> Self {
        Self::new()
    }
}

impl Invalidatable for Axis {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

impl Boundable for Axis {
    fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) -> ChartResult<()> {
        let bounds = bounds.validate()?;
        if self.bounds != Some(bounds) {
            self.bounds = Some(bounds);
            self.core.invalidate(
                ConsistencyState::Bounds | ConsistencyState::AxisTicks | ConsistencyState::AxisOverlap,
                Signal::BoundsChanged | Signal::NeedsRedraw,
            );
        }
        Ok(())
    }
}

impl Drawable for Axis {
    fn draw(&mut self, frame: &mut RenderFrame) -> ChartResult<()> {
        self.geometry = AxisGeometry::default();
        if !self.settings.enabled() {
            self.core.mark_consistent(AXIS_STATES);
            return Ok(());
        }
        let Some(scale) = self.scale.as_ref() else {
            self.reporter.error(ErrorCode::ScaleNotSet, &["axis"]);
            return Ok(());
        };
        let Some(bounds) = self.bounds else {
            return Ok(());
        };

        let geometry = self
            .layout(bounds)
            .layout(scale, !self.settings.allow_overlap());
        let stroke = Stroke::new(self.settings.stroke_color(), 1.0);
        let z_index = self.settings.z_index();
        let mut push_path = |name: &str, path: Path| {
            if !path.is_empty() {
                frame.push_shape(Shape {
                    name: name.to_owned(),
                    shape_type: ShapeType::Path,
                    state: PointState::Normal,
                    z_index,
                    fill: None,
                    stroke: Some(stroke),
                    is_hatch_fill: false,
                    path,
                });
            }
        };

        let mut line = Path::new();
        if let Some((from, to)) = geometry.line {
            line.move_to(from.x, from.y).line_to(to.x, to.y);
        }
        push_path("line", line);
        for (name, segments) in [("ticks", &geometry.major), ("minorTicks", &geometry.minor)] {
            let mut path = Path::new();
            for segment in segments {
                path.move_to(segment.from.x, segment.from.y)
                    .line_to(segment.to.x, segment.to.y);
            }
            push_path(name, path);
        }

        for label in &geometry.labels {
            frame.push_text(TextPrimitive::new(
                label.text.clone(),
                label.x,
                label.y,
                self.settings.font_size(),
                self.settings.label_color(),
                label.h_align,
            ));
        }
        if let Some(title) = self.settings.title().filter(|title| !title.is_empty()) {
            frame.push_text(self.title_primitive(bounds, &title));
        }

        debug!(
            orientation = ?self.settings.orientation(),
            ticks = geometry.major.len(),
            labels = geometry.labels.len(),
            "axis frame built"
        );
        self.geometry = geometry;
        self.core.mark_consistent(AXIS_STATES);
        Ok(())
    }
}

impl fmt::Debug for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Axis")
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
    use crate::scales::OrdinalScale;

    fn tick(value: f64, ratio: f64, label: &str) -> TickMark {
        TickMark {
            value,
            ratio,
            label: label.to_owned(),
        }
    }

    #[test]
    fn bottom_ticks_point_down_from_the_top_edge() {
        let layout = AxisLayout::new(AxisOrientation::Bottom, Rect::new(0.0, 100.0, 200.0, 30.0));
        let segments = layout.tick_segments(&[tick(0.0, 0.0, "0"), tick(1.0, 0.5, "1"), tick(2.0, 1.5, "2")], 5.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].from, Point::new(100.0, 100.0));
        assert_eq!(segments[1].to, Point::new(100.0, 105.0));
        let labels = layout.label_anchors(&[tick(1.0, 0.5, "1")]);
        assert_eq!((labels[0].x, labels[0].y), (100.0, 108.0));
        assert_eq!(labels[0].h_align, TextHAlign::Center);
    }

    #[test]
    fn left_axis_grows_upwards() {
        let layout = AxisLayout::new(AxisOrientation::Left, Rect::new(0.0, 0.0, 40.0, 100.0));
        let segments = layout.tick_segments(&[tick(0.0, 0.0, ""), tick(1.0, 1.0, "")], 5.0);
        assert_eq!(segments[0].from, Point::new(40.0, 100.0));
        assert_eq!(segments[0].to, Point::new(35.0, 100.0));
        assert_eq!(segments[1].from, Point::new(40.0, 0.0));
        assert_eq!(layout.axis_line(), (Point::new(40.0, 100.0), Point::new(40.0, 0.0)));
        assert!(layout.label_anchors(&[tick(0.0, 0.0, "")]).is_empty());
    }

    #[test]
    fn thinning_keeps_the_last_label() {
        let anchors: Vec<LabelAnchor> = [0.0, 10.0, 20.0, 30.0, 40.0]
            .iter()
            .map(|position| LabelAnchor {
                text: position.to_string(),
                position: *position,
                x: *position,
                y: 0.0,
                h_align: TextHAlign::Center,
            })
            .collect();
        let kept: Vec<f64> = thin_labels(anchors.clone(), 15.0)
            .iter()
            .map(|label| label.position)
            .collect();
        assert_eq!(kept, vec![0.0, 20.0, 40.0]);
        let kept: Vec<f64> = thin_labels(anchors, 100.0)
            .iter()
            .map(|label| label.position)
            .collect();
        assert_eq!(kept, vec![40.0]);
    }

    #[test]
    fn axis_draws_ticks_and_labels_of_its_scale() {
        let mut ordinal = OrdinalScale::new();
        ordinal.set_values(["a", "b", "c"]);
        let mut axis = Axis::new();
        axis.set_scale(ScaleRef::ordinal(ordinal));
        axis.set_bounds(Rect::new(0.0, 100.0, 300.0, 30.0)).expect("valid bounds");
        axis.configure(|settings, core| settings.set_title(core, Some("Category".to_owned())));
        let mut frame = RenderFrame::new(Rect::new(0.0, 0.0, 300.0, 130.0));
        axis.draw(&mut frame).expect("axis draws");
        assert_eq!(axis.geometry().major.len(), 3);
        let texts: Vec<&str> = frame.texts.iter().map(|text| text.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c", "Category"]);
        assert!(frame.shapes.iter().any(|shape| shape.name == "ticks"));
        assert!(axis.is_consistent());
    }

    #[test]
    fn axis_without_scale_reports() {
        let reporter = Rc::new(RecordingReporter::new());
        let mut axis = Axis::with_reporter(reporter.clone());
        axis.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0)).expect("valid bounds");
        let mut frame = RenderFrame::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        axis.draw(&mut frame).expect("reported, not failed");
        assert_eq!(reporter.count_errors(ErrorCode::ScaleNotSet), 1);
        assert!(frame.is_empty());
    }

    #[test]
    fn scale_changes_relayout_the_axis() {
        let mut ordinal = OrdinalScale::new();
        ordinal.set_values(["a"]);
        let scale = ScaleRef::ordinal(ordinal);
        let mut axis = Axis::new();
        axis.set_scale(scale.clone());
        axis.core().mark_consistent(AXIS_STATES);
        if let ScaleRef::Ordinal(ordinal) = &scale {
            ordinal.borrow_mut().set_values(["a", "b"]);
        }
        assert!(axis.has_invalidation_state(ConsistencyState::AxisTicks));
    }
}
