//! Drawer contract and the per-series point loop that drives it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::render::{GroupId, Path, PathSink, PointState, ShapeConfig, ShapeManager, ShapeType};
use crate::series::capabilities::DrawerCapabilities;
use crate::series::point::PointMeta;
use crate::series::three_d::ThreeDShift;

/// Series type a drawer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawerKind {
    Line,
    Spline,
    SplineArea,
    StepArea,
    Column,
    #[serde(rename = "column-3d")]
    Column3d,
    #[serde(rename = "bar-3d")]
    Bar3d,
    Ohlc,
}

impl DrawerKind {
    pub const ALL: [Self; 8] = [
        Self::Line,
        Self::Spline,
        Self::SplineArea,
        Self::StepArea,
        Self::Column,
        Self::Column3d,
        Self::Bar3d,
        Self::Ohlc,
    ];
}

impl fmt::Display for DrawerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Line => "line",
            Self::Spline => "spline",
            Self::SplineArea => "spline-area",
            Self::StepArea => "step-area",
            Self::Column => "column",
            Self::Column3d => "column-3d",
            Self::Bar3d => "bar-3d",
            Self::Ohlc => "ohlc",
        })
    }
}

/// Where a step area crosses between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDirection {
    Forward,
    Backward,
    #[default]
    Center,
}

/// Series-level settings a drawer reads once per pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawContext {
    pub state: PointState,
    pub base_z_index: f64,
    pub vertical: bool,
    pub stacked: bool,
    pub connect_missing: bool,
    pub point_width: f64,
    pub stroke_thickness: f64,
    pub step_direction: StepDirection,
    pub spline_tension: f64,
    pub three_d: ThreeDShift,
}

impl Default for DrawContext {
    fn default() -> Self {
        Self {
            state: PointState::Normal,
            base_z_index: 0.0,
            vertical: false,
            stacked: false,
            connect_missing: false,
            point_width: 10.0,
            stroke_thickness: 1.0,
            step_direction: StepDirection::Center,
            spline_tension: 1.0,
            three_d: ThreeDShift::default(),
        }
    }
}

/// Geometry strategy of one series type.
///
/// The series feeds points in order: the first point after a break goes to
/// [`Drawer::draw_first_point`], the rest to
/// [`Drawer::draw_subsequent_point`]. See [`draw_points`].
pub trait Drawer: fmt::Debug {
    fn kind(&self) -> DrawerKind;

    fn capabilities(&self) -> DrawerCapabilities;

    /// Shape roles and types the drawer writes into.
    fn required_shapes(&self) -> &'static [(&'static str, ShapeType)];

    /// Shape declarations satisfying [`Drawer::required_shapes`].
    fn default_shapes(&self) -> Vec<ShapeConfig>;

    fn start_drawing(&mut self, context: &DrawContext);

    fn draw_first_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager);

    fn draw_subsequent_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager);

    fn draw_missing_point(&mut self, _point: &PointMeta, _shapes: &mut ShapeManager) {}

    fn finalize_segment(&mut self, _shapes: &mut ShapeManager) {}

    fn finalize_drawing(&mut self, _shapes: &mut ShapeManager) {}
}

/// Runs one draw pass of `drawer` over `points`.
///
/// A missing point breaks the segment unless the drawer supports connecting
/// missing points and the series asks for it.
pub fn draw_points(
    drawer: &mut dyn Drawer,
    context: &DrawContext,
    points: &[PointMeta],
    shapes: &mut ShapeManager,
) {
    let bridges_gaps = context.connect_missing && drawer.capabilities().supports_connecting_missing();
    drawer.start_drawing(context);
    let mut prev_point_drawn = false;
    for point in points {
        if point.missing {
            drawer.draw_missing_point(point, shapes);
            if !bridges_gaps && prev_point_drawn {
                drawer.finalize_segment(shapes);
                prev_point_drawn = false;
            }
            continue;
        }
        if prev_point_drawn {
            drawer.draw_subsequent_point(point, shapes);
        } else {
            drawer.draw_first_point(point, shapes);
        }
        prev_point_drawn = true;
    }
    if prev_point_drawn {
        drawer.finalize_segment(shapes);
    }
    drawer.finalize_drawing(shapes);
    debug!(kind = %drawer.kind(), points = points.len(), "series drawn");
}

/// Path writer that swaps axes for vertical series.
pub(crate) struct Pen<'a> {
    path: &'a mut Path,
    vertical: bool,
}

impl<'a> Pen<'a> {
    pub(crate) fn new(path: &'a mut Path, vertical: bool) -> Self {
        Self { path, vertical }
    }

    fn xy(&self, x: f64, y: f64) -> (f64, f64) {
        if self.vertical { (y, x) } else { (x, y) }
    }

    pub(crate) fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        let (x, y) = self.xy(x, y);
        self.path.move_to(x, y);
        self
    }

    pub(crate) fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        let (x, y) = self.xy(x, y);
        self.path.line_to(x, y);
        self
    }

    pub(crate) fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> &mut Self {
        let (x1, y1) = self.xy(x1, y1);
        let (x2, y2) = self.xy(x2, y2);
        let (x, y) = self.xy(x, y);
        self.path.curve_to(x1, y1, x2, y2, x, y);
        self
    }

    pub(crate) fn close(&mut self) -> &mut Self {
        self.path.close();
        self
    }
}

/// Applies `draw` to every named path of `group` that exists.
pub(crate) fn with_paths(
    shapes: &mut ShapeManager,
    group: GroupId,
    names: &[&str],
    vertical: bool,
    mut draw: impl FnMut(&mut Pen<'_>),
) {
    for name in names {
        if let Some(path) = shapes.path_mut(group, name) {
            draw(&mut Pen::new(path, vertical));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Drawer for Recorder {
        fn kind(&self) -> DrawerKind {
            DrawerKind::Line
        }

        fn capabilities(&self) -> DrawerCapabilities {
            crate::series::capabilities::DrawerCapability::SupportsConnectingMissing.into()
        }

        fn required_shapes(&self) -> &'static [(&'static str, ShapeType)] {
            &[]
        }

        fn default_shapes(&self) -> Vec<ShapeConfig> {
            Vec::new()
        }

        fn start_drawing(&mut self, _context: &DrawContext) {
            self.calls.push("start".to_owned());
        }

        fn draw_first_point(&mut self, point: &PointMeta, _shapes: &mut ShapeManager) {
            self.calls.push(format!("first {}", point.index));
        }

        fn draw_subsequent_point(&mut self, point: &PointMeta, _shapes: &mut ShapeManager) {
            self.calls.push(format!("next {}", point.index));
        }

        fn finalize_segment(&mut self, _shapes: &mut ShapeManager) {
            self.calls.push("segment".to_owned());
        }

        fn finalize_drawing(&mut self, _shapes: &mut ShapeManager) {
            self.calls.push("done".to_owned());
        }
    }

    fn points() -> Vec<PointMeta> {
        vec![
            PointMeta::new(0, 0.0, 1.0, 0.0),
            PointMeta::missing(1, 1.0),
            PointMeta::new(2, 2.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn missing_points_break_segments() {
        let mut recorder = Recorder::default();
        let mut shapes = ShapeManager::default();
        draw_points(&mut recorder, &DrawContext::default(), &points(), &mut shapes);
        assert_eq!(
            recorder.calls,
            ["start", "first 0", "segment", "first 2", "segment", "done"]
        );
    }

    #[test]
    fn connected_missing_points_keep_the_segment() {
        let mut recorder = Recorder::default();
        let mut shapes = ShapeManager::default();
        let context = DrawContext {
            connect_missing: true,
            ..DrawContext::default()
        };
        draw_points(&mut recorder, &context, &points(), &mut shapes);
        assert_eq!(recorder.calls, ["start", "first 0", "next 2", "segment", "done"]);
    }

    #[test]
    fn vertical_pen_swaps_axes() {
        let mut path = Path::new();
        Pen::new(&mut path, true).move_to(1.0, 2.0).line_to(3.0, 4.0);
        assert_eq!(path.to_svg_data(), "M 2 1 L 4 3");
    }
}
