use crate::core::Point;
use crate::render::{GroupId, PointState, ShapeConfig, ShapeManager, ShapeType};
use crate::series::capabilities::{DrawerCapabilities, DrawerCapability};
use crate::series::drawer::{DrawContext, Drawer, DrawerKind, Pen, with_paths};
use crate::series::point::PointMeta;

const STROKE: &str = "stroke";

/// One cubic piece of a smoothed polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub control1: Point,
    pub control2: Point,
    pub to: Point,
}

/// Cardinal spline through `points`. `tension` 1 is Catmull-Rom, 0 gives
/// straight segments; end tangents reuse the end points.
#[must_use]
pub fn spline_segments(points: &[Point], tension: f64) -> Vec<CubicSegment> {
    let factor = if tension.is_finite() { tension.clamp(0.0, 1.0) / 6.0 } else { 0.0 };
    points
        .windows(2)
        .enumerate()
        .map(|(index, pair)| {
            let (p1, p2) = (pair[0], pair[1]);
            let p0 = if index == 0 { p1 } else { points[index - 1] };
            let p3 = points.get(index + 2).copied().unwrap_or(p2);
            CubicSegment {
                control1: Point::new(p1.x + (p2.x - p0.x) * factor, p1.y + (p2.y - p0.y) * factor),
                control2: Point::new(p2.x - (p3.x - p1.x) * factor, p2.y - (p3.y - p1.y) * factor),
                to: p2,
            }
        })
        .collect()
}

/// Writes the spline through `points`; the pen must already sit on the first one.
pub(crate) fn trace_spline(pen: &mut Pen<'_>, points: &[Point], tension: f64) {
    for segment in spline_segments(points, tension) {
        pen.curve_to(
            segment.control1.x,
            segment.control1.y,
            segment.control2.x,
            segment.control2.y,
            segment.to.x,
            segment.to.y,
        );
    }
}

/// Smoothed line; points are buffered per segment and emitted on finalize.
#[derive(Debug, Default)]
pub struct SplineDrawer {
    vertical: bool,
    state: PointState,
    base_z_index: f64,
    tension: f64,
    group: Option<GroupId>,
    buffer: Vec<Point>,
}

impl SplineDrawer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drawer for SplineDrawer {
    fn kind(&self) -> DrawerKind {
        DrawerKind::Spline
    }

    fn capabilities(&self) -> DrawerCapabilities {
        DrawerCapability::SupportsConnectingMissing | DrawerCapability::IsLineBased
    }

    fn required_shapes(&self) -> &'static [(&'static str, ShapeType)] {
        &[(STROKE, ShapeType::Path)]
    }

    fn default_shapes(&self) -> Vec<ShapeConfig> {
        vec![ShapeConfig::path(STROKE, 1.0).with_stroke(STROKE)]
    }

    fn start_drawing(&mut self, context: &DrawContext) {
        self.vertical = context.vertical;
        self.state = context.state;
        self.base_z_index = context.base_z_index;
        self.tension = context.spline_tension;
        self.group = None;
        self.buffer.clear();
    }

    fn draw_first_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager) {
        self.group = Some(shapes.get_shapes_group(self.state, None, None, self.base_z_index));
        self.buffer.clear();
        self.buffer.push(Point::new(point.x, point.value));
    }

    fn draw_subsequent_point(&mut self, point: &PointMeta, _shapes: &mut ShapeManager) {
        self.buffer.push(Point::new(point.x, point.value));
    }

    fn finalize_segment(&mut self, shapes: &mut ShapeManager) {
        let (Some(group), Some(first)) = (self.group, self.buffer.first().copied()) else {
            return;
        };
        let buffer = std::mem::take(&mut self.buffer);
        with_paths(shapes, group, &[STROKE], self.vertical, |pen| {
            pen.move_to(first.x, first.y);
            trace_spline(pen, &buffer, self.tension);
        });
    }
}
