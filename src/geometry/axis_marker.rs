use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::settings::{non_negative, settings_schema};
use crate::core::{
    Boundable, ConsistencyState, Drawable, ErrorCode, Invalidatable, ListenerKey, Point, Rect,
    SharedReporter, Signal, SignalMask, StateMask, StatefulCore, WarningCode, default_reporter,
};
use crate::error::ChartResult;
use crate::render::{Color, Path, PathSink, PointState, RenderFrame, Shape, ShapeType, Stroke};
use crate::scales::{CategoryKey, ScaleRef};
use crate::series::pixel_shift;

/// Direction of the marker line: a horizontal marker spans the plot width at
/// one value of a vertical scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerLayout {
    #[default]
    Horizontal,
    Vertical,
}

settings_schema! {
    pub struct AxisMarkerSettings {
        enabled / set_enabled: bool = true,
            normalize = std::convert::identity,
            states = [Enabled],
            signals = [NeedsRedraw, EnabledStateChanged];
        value / set_value: f64 = 0.0,
            normalize = std::convert::identity,
            states = [MarkerLayout],
            signals = [NeedsRedraw];
        color / set_color: Color = Color::rgb(220.0 / 255.0, 10.0 / 255.0, 10.0 / 255.0),
            normalize = std::convert::identity,
            states = [Appearance],
            signals = [NeedsRedraw];
        thickness / set_thickness: f64 = 1.0,
            normalize = non_negative,
            states = [Appearance, MarkerLayout],
            signals = [NeedsRedraw];
        z_index / set_z_index: f64 = 41.0,
            normalize = std::convert::identity,
            states = [ZIndex],
            signals = [NeedsRedraw];
    }
}

const MARKER_STATES: StateMask = StateMask::VISUAL.with(ConsistencyState::MarkerLayout);

/// A line drawn across the plot at one scale value.
///
/// Immutable markers keep the scale and layout they were built with; their
/// setters only warn.
pub struct AxisMarker {
    core: StatefulCore,
    reporter: SharedReporter,
    layout: MarkerLayout,
    scale: Option<ScaleRef>,
    scale_listener: Option<(StatefulCore, ListenerKey)>,
    immutable: bool,
    settings: AxisMarkerSettings,
    bounds: Option<Rect>,
    line: Option<(Point, Point)>,
}

impl AxisMarker {
    #[must_use]
    pub fn new() -> Self {
        Self::with_reporter(default_reporter())
    }

    #[must_use]
    pub fn with_reporter(reporter: SharedReporter) -> Self {
        Self {
            core: StatefulCore::new("axis-marker", MARKER_STATES, SignalMask::all()),
            reporter,
            layout: MarkerLayout::default(),
            scale: None,
            scale_listener: None,
            immutable: false,
            settings: AxisMarkerSettings::default(),
            bounds: None,
            line: None,
        }
    }

    /// Marker whose scale and layout are fixed at construction.
    #[must_use]
    pub fn immutable(scale: ScaleRef, layout: MarkerLayout, reporter: SharedReporter) -> Self {
        let mut marker = Self::with_reporter(reporter);
        marker.layout = layout;
        marker.attach_scale(scale);
        marker.immutable = true;
        marker
    }

    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    #[must_use]
    pub fn layout(&self) -> MarkerLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: MarkerLayout) -> &mut Self {
        if self.immutable {
            self.reporter
                .warning(WarningCode::ImmutableMarkerLayout, &[]);
            return self;
        }
        if self.layout != layout {
            self.layout = layout;
            self.core.invalidate(
                ConsistencyState::Bounds | ConsistencyState::MarkerLayout,
                Signal::NeedsRedraw | Signal::BoundsChanged,
            );
        }
        self
    }

    #[must_use]
    pub fn scale(&self) -> Option<&ScaleRef> {
        self.scale.as_ref()
    }

    pub fn set_scale(&mut self, scale: ScaleRef) -> &mut Self {
        if self.immutable {
            self.reporter
                .warning(WarningCode::ImmutableMarkerScale, &[]);
            return self;
        }
        if self.scale.as_ref().is_some_and(|current| current.same_scale(&scale)) {
            return self;
        }
        self.attach_scale(scale);
        self.core.invalidate(
            ConsistencyState::Bounds | ConsistencyState::MarkerLayout,
            Signal::NeedsRedraw | Signal::BoundsChanged,
        );
        self
    }

    /// Recalculated scales pass their recalculation on; reapplied scales
    /// only need the marker redrawn.
    fn attach_scale(&mut self, scale: ScaleRef) {
        if let Some((core, key)) = self.scale_listener.take() {
            core.unlisten_signals(key);
        }
        let scale_core = scale.core();
        let marker = self.core.downgrade();
        let key = scale_core.listen_signals(
            Signal::NeedsReapplication | Signal::NeedsRecalculation,
            move |event| {
                let Some(marker) = marker.upgrade() else {
                    return;
                };
                let mut signals = Signal::NeedsRedraw | Signal::BoundsChanged;
                if event.needs_recalculation() {
                    signals |= Signal::NeedsRecalculation;
                }
                marker.invalidate(ConsistencyState::MarkerLayout, signals);
            },
        );
        self.scale_listener = Some((scale_core, key));
        self.scale = Some(scale);
    }

    #[must_use]
    pub fn settings(&self) -> &AxisMarkerSettings {
        &self.settings
    }

    /// Runs `change` against the settings; the setters invalidate the marker.
    pub fn configure<R>(
        &mut self,
        change: impl FnOnce(&mut AxisMarkerSettings, &StatefulCore) -> R,
    ) -> R {
        change(&mut self.settings, &self.core)
    }

    /// Pixel endpoints of the last draw pass.
    #[must_use]
    pub fn line(&self) -> Option<(Point, Point)> {
        self.line
    }

    /// Endpoints for the current value, snapped so odd thicknesses land on
    /// pixel centers. `None` when the value has no ratio on the scale.
    #[must_use]
    pub fn compute_line(&self) -> Option<(Point, Point)> {
        let bounds = self.bounds?;
        let scale = self.scale.as_ref()?;
        let ratio = scale.transform_key(&CategoryKey::from(self.settings.value()), 0.5);
        if !ratio.is_finite() {
            return None;
        }
        let ratio = ratio.clamp(0.0, 1.0);
        let shift = -pixel_shift(self.settings.thickness());
        match self.layout {
            MarkerLayout::Horizontal => {
                let mut y = (bounds.top + bounds.height - ratio * bounds.height).round();
                if ratio == 1.0 {
                    y -= shift;
                } else {
                    y += shift;
                }
                Some((Point::new(bounds.left, y), Point::new(bounds.right(), y)))
            }
            MarkerLayout::Vertical => {
                let mut x = (bounds.left + ratio * bounds.width).round();
                if ratio == 1.0 {
                    x += shift;
                } else {
                    x -= shift;
                }
                Some((Point::new(x, bounds.top), Point::new(x, bounds.bottom())))
            }
        }
    }

    /// Detaches the scale listener and every listener of this marker.
    pub fn dispose(&mut self) {
        if let Some((core, key)) = self.scale_listener.take() {
            core.unlisten_signals(key);
        }
        self.core.dispose();
    }
}

impl Default for AxisMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl Invalidatable for AxisMarker {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

impl Boundable for AxisMarker {
    fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) -> ChartResult<()> {
        let bounds = bounds.validate()?;
        if self.bounds != Some(bounds) {
            self.bounds = Some(bounds);
            self.core.invalidate(
                ConsistencyState::Bounds | ConsistencyState::MarkerLayout,
                Signal::BoundsChanged | Signal::NeedsRedraw,
            );
        }
        Ok(())
    }
}

impl Drawable for AxisMarker {
    fn draw(&mut self, frame: &mut RenderFrame) -> ChartResult<()> {
        self.line = None;
        if !self.settings.enabled() {
            self.core.mark_consistent(MARKER_STATES);
            return Ok(());
        }
        if self.scale.is_none() {
            self.reporter.error(ErrorCode::ScaleNotSet, &["axis marker"]);
            return Ok(());
        }
        self.line = self.compute_line();
        if let Some((from, to)) = self.line {
            let mut path = Path::new();
            path.move_to(from.x, from.y).line_to(to.x, to.y);
            frame.push_shape(Shape {
                name: "marker".to_owned(),
                shape_type: ShapeType::Path,
                state: PointState::Normal,
                z_index: self.settings.z_index(),
                fill: None,
                stroke: Some(Stroke::new(self.settings.color(), self.settings.thickness())),
                is_hatch_fill: false,
                path,
            });
            debug!(layout = ?self.layout, value = self.settings.value(), "axis marker drawn");
        } else {
            trace!(value = self.settings.value(), "axis marker value outside the scale");
        }
        self.core.mark_consistent(MARKER_STATES);
        Ok(())
    }
}

impl fmt::Debug for AxisMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AxisMarker")
            .field("layout", &self.layout)
            .field("immutable", &self.immutable)
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
    use crate::scales::LinearScale;

    fn scale() -> ScaleRef {
        let mut linear = LinearScale::new();
        linear.set_minimum(Some(0.0)).set_maximum(Some(10.0));
        ScaleRef::linear(linear)
    }

    fn drawn(marker: &mut AxisMarker) -> String {
        let mut frame = RenderFrame::new(Rect::new(0.0, 0.0, 100.0, 50.0));
        marker.draw(&mut frame).expect("marker draws");
        frame.shapes[0].path.to_svg_data()
    }

    #[test]
    fn horizontal_line_is_snapped_to_pixel_centers() {
        let mut marker = AxisMarker::new();
        marker.set_scale(scale());
        marker.set_bounds(Rect::new(0.0, 0.0, 100.0, 50.0)).expect("valid bounds");
        marker.configure(|settings, core| settings.set_value(core, 5.0));
        assert_eq!(drawn(&mut marker), "M 0 24.5 L 100 24.5");

        marker.configure(|settings, core| settings.set_thickness(core, 2.0));
        assert_eq!(drawn(&mut marker), "M 0 25 L 100 25");
    }

    #[test]
    fn vertical_line_at_the_top_of_the_range_stays_inside() {
        let mut marker = AxisMarker::new();
        marker.set_scale(scale()).set_layout(MarkerLayout::Vertical);
        marker.set_bounds(Rect::new(0.0, 0.0, 100.0, 50.0)).expect("valid bounds");
        marker.configure(|settings, core| settings.set_value(core, 10.0));
        assert_eq!(drawn(&mut marker), "M 99.5 0 L 99.5 50");
    }

    #[test]
    fn immutable_marker_warns_and_keeps_its_setup() {
        let reporter = Rc::new(RecordingReporter::new());
        let original = scale();
        let mut marker =
            AxisMarker::immutable(original.clone(), MarkerLayout::Vertical, reporter.clone());
        marker
            .set_layout(MarkerLayout::Horizontal)
            .set_scale(scale())
            .set_layout(MarkerLayout::Horizontal);
        assert_eq!(reporter.count_warnings(WarningCode::ImmutableMarkerLayout), 2);
        assert_eq!(reporter.count_warnings(WarningCode::ImmutableMarkerScale), 1);
        assert_eq!(marker.layout(), MarkerLayout::Vertical);
        assert!(marker.scale().is_some_and(|scale| scale.same_scale(&original)));
    }

    #[test]
    fn scale_recalculation_reaches_marker_listeners() {
        let scale = scale();
        let mut marker = AxisMarker::new();
        marker.set_scale(scale.clone());
        marker.core().mark_consistent(MARKER_STATES);
        let seen = Rc::new(std::cell::Cell::new(SignalMask::none()));
        let sink = seen.clone();
        marker.listen_signals(SignalMask::all(), move |event| sink.set(event.signals));
        scale.core().invalidate(
            ConsistencyState::ScaleRecalculation,
            Signal::NeedsRecalculation,
        );
        assert!(seen.get().contains_signal(Signal::NeedsRecalculation));
        assert!(seen.get().contains_signal(Signal::BoundsChanged));
        assert!(marker.has_invalidation_state(ConsistencyState::MarkerLayout));
    }

    #[test]
    fn drawing_without_scale_reports() {
        let reporter = Rc::new(RecordingReporter::new());
        let mut marker = AxisMarker::with_reporter(reporter.clone());
        marker.set_bounds(Rect::new(0.0, 0.0, 10.0, 10.0)).expect("valid bounds");
        let mut frame = RenderFrame::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        marker.draw(&mut frame).expect("reported, not failed");
        assert_eq!(reporter.count_errors(ErrorCode::ScaleNotSet), 1);
        assert!(frame.is_empty());
    }
}
