use crate::core::Point;
use crate::render::{GroupId, PointState, ShapeConfig, ShapeManager, ShapeType};
use crate::series::capabilities::{DrawerCapabilities, DrawerCapability};
use crate::series::drawer::{DrawContext, Drawer, DrawerKind, with_paths};
use crate::series::point::PointMeta;
use crate::series::spline::trace_spline;

const FILL: &str = "fill";
const HATCH_FILL: &str = "hatchFill";
const STROKE: &str = "stroke";

/// Smoothed area between the spline of values and the zero line.
///
/// Stacked segments close back along the zero of every point, so the fill
/// sits on the series below.
#[derive(Debug, Default)]
pub struct SplineAreaDrawer {
    vertical: bool,
    stacked: bool,
    state: PointState,
    base_z_index: f64,
    tension: f64,
    group: Option<GroupId>,
    tops: Vec<Point>,
    zeroes: Vec<Point>,
}

impl SplineAreaDrawer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drawer for SplineAreaDrawer {
    fn kind(&self) -> DrawerKind {
        DrawerKind::SplineArea
    }

    fn capabilities(&self) -> DrawerCapabilities {
        DrawerCapability::NeedsZero
            | DrawerCapability::SupportsStack
            | DrawerCapability::SupportsConnectingMissing
            | DrawerCapability::IsLineBased
    }

    fn required_shapes(&self) -> &'static [(&'static str, ShapeType)] {
        &[
            (FILL, ShapeType::Path),
            (HATCH_FILL, ShapeType::Path),
            (STROKE, ShapeType::Path),
        ]
    }

    fn default_shapes(&self) -> Vec<ShapeConfig> {
        vec![
            ShapeConfig::path(FILL, 1.0).with_fill(FILL),
            ShapeConfig::path(HATCH_FILL, 2.0).hatch(),
            ShapeConfig::path(STROKE, 3.0).with_stroke(STROKE),
        ]
    }

    fn start_drawing(&mut self, context: &DrawContext) {
        self.vertical = context.vertical;
        self.stacked = context.stacked;
        self.state = context.state;
        self.base_z_index = context.base_z_index;
        self.tension = context.spline_tension;
        self.group = None;
        self.tops.clear();
        self.zeroes.clear();
    }

    fn draw_first_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager) {
        self.group = Some(shapes.get_shapes_group(self.state, None, None, self.base_z_index));
        self.tops.clear();
        self.zeroes.clear();
        self.draw_subsequent_point(point, shapes);
    }

    fn draw_subsequent_point(&mut self, point: &PointMeta, _shapes: &mut ShapeManager) {
        self.tops.push(Point::new(point.x, point.value));
        self.zeroes.push(Point::new(point.x, point.zero));
    }

    fn finalize_segment(&mut self, shapes: &mut ShapeManager) {
        let tops = std::mem::take(&mut self.tops);
        let zeroes = std::mem::take(&mut self.zeroes);
        let (Some(group), Some(first), Some(first_zero), Some(last_zero)) =
            (self.group, tops.first(), zeroes.first(), zeroes.last())
        else {
            return;
        };
        let stacked = self.stacked;
        let tension = self.tension;
        with_paths(shapes, group, &[FILL, HATCH_FILL], self.vertical, |pen| {
            pen.move_to(first_zero.x, first_zero.y).line_to(first.x, first.y);
            trace_spline(pen, &tops, tension);
            if stacked {
                for zero in zeroes.iter().rev() {
                    pen.line_to(zero.x, zero.y);
                }
            } else {
                pen.line_to(last_zero.x, last_zero.y);
            }
            pen.close();
        });
        with_paths(shapes, group, &[STROKE], self.vertical, |pen| {
            pen.move_to(first.x, first.y);
            trace_spline(pen, &tops, tension);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PathCommand;
    use crate::series::drawer::draw_points;

    fn draw(stacked: bool) -> ShapeManager {
        let mut drawer = SplineAreaDrawer::new();
        let mut shapes = ShapeManager::new(drawer.default_shapes());
        let points = [
            PointMeta::new(0, 0.0, 10.0, 50.0),
            PointMeta::new(1, 10.0, 20.0, 40.0),
        ];
        let context = DrawContext {
            stacked,
            ..DrawContext::default()
        };
        draw_points(&mut drawer, &context, &points, &mut shapes);
        shapes
    }

    #[test]
    fn unstacked_fill_closes_at_the_last_zero() {
        let shapes = draw(false);
        let fill = shapes.groups()[0].path(FILL).expect("fill path");
        let commands = fill.commands();
        assert_eq!(commands[0], PathCommand::MoveTo { x: 0.0, y: 50.0 });
        assert_eq!(commands[3], PathCommand::LineTo { x: 10.0, y: 40.0 });
        assert_eq!(commands.last(), Some(&PathCommand::Close));
    }

    #[test]
    fn stacked_fill_walks_the_zeroes_back() {
        let shapes = draw(true);
        let fill = shapes.groups()[0].path(FILL).expect("fill path");
        let commands = fill.commands();
        assert_eq!(commands[4], PathCommand::LineTo { x: 0.0, y: 50.0 });
        let stroke = shapes.groups()[0].path(STROKE).expect("stroke path");
        assert_eq!(stroke.len(), 2);
    }
}
