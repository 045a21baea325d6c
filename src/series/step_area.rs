use crate::core::Point;
use crate::render::{GroupId, PointState, ShapeConfig, ShapeManager, ShapeType};
use crate::series::capabilities::{DrawerCapabilities, DrawerCapability};
use crate::series::drawer::{DrawContext, Drawer, DrawerKind, Pen, StepDirection, with_paths};
use crate::series::point::PointMeta;

const FILL: &str = "fill";
const HATCH_FILL: &str = "hatchFill";
const STROKE: &str = "stroke";
const AREA: [&str; 2] = [FILL, HATCH_FILL];
const ALL: [&str; 3] = [FILL, HATCH_FILL, STROKE];

/// Area drawn as horizontal runs joined by vertical steps.
///
/// Unstacked segments close straight down to the zero line. Stacked ones
/// keep a stack of `(x, zero)` corners and close back along it with the same
/// step direction, so the fill follows the series below.
#[derive(Debug, Default)]
pub struct StepAreaDrawer {
    vertical: bool,
    stacked: bool,
    direction: StepDirection,
    state: PointState,
    base_z_index: f64,
    group: Option<GroupId>,
    prev_x: f64,
    prev_y: f64,
    last_drawn_x: f64,
    zero_y: f64,
    zeroes: Vec<Point>,
}

impl StepAreaDrawer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cross_x(&self, x: f64) -> f64 {
        match self.direction {
            StepDirection::Forward => x,
            StepDirection::Backward => self.prev_x,
            StepDirection::Center => (x + self.prev_x) / 2.0,
        }
    }

    fn start_segment(&self, shapes: &mut ShapeManager, group: GroupId, x: f64, y: f64, zero: f64) {
        with_paths(shapes, group, &AREA, self.vertical, |pen| {
            pen.move_to(x, zero).line_to(x, y);
        });
        with_paths(shapes, group, &[STROKE], self.vertical, |pen| {
            pen.move_to(x, y);
        });
    }

    /// Vertical step at the crossing of the previous run, then the new run.
    fn continue_segment(&self, shapes: &mut ShapeManager, group: GroupId, x: f64, y: f64) {
        let cross_x = self.cross_x(x);
        let prev_y = self.prev_y;
        with_paths(shapes, group, &ALL, self.vertical, |pen| {
            pen.line_to(cross_x, prev_y).line_to(cross_x, y).line_to(x, y);
        });
    }

    fn close_along_zeroes(&self, pen: &mut Pen<'_>, zeroes: &[Point]) {
        let mut prev: Option<Point> = None;
        for zero in zeroes.iter().rev() {
            if let Some(prev) = prev {
                match self.direction {
                    StepDirection::Forward => {
                        pen.line_to(prev.x, zero.y);
                    }
                    StepDirection::Backward => {
                        pen.line_to(zero.x, prev.y);
                    }
                    StepDirection::Center => {
                        let middle = (zero.x + prev.x) / 2.0;
                        pen.line_to(middle, prev.y).line_to(middle, zero.y);
                    }
                }
            }
            pen.line_to(zero.x, zero.y);
            prev = Some(*zero);
        }
        pen.close();
    }

    fn close_segment(&mut self, shapes: &mut ShapeManager) {
        let Some(group) = self.group else {
            return;
        };
        if self.stacked {
            let zeroes = std::mem::take(&mut self.zeroes);
            with_paths(shapes, group, &AREA, self.vertical, |pen| {
                self.close_along_zeroes(pen, &zeroes);
            });
        } else {
            let (x, zero) = (self.last_drawn_x, self.zero_y);
            with_paths(shapes, group, &AREA, self.vertical, |pen| {
                pen.line_to(x, zero).close();
            });
        }
    }
}

impl Drawer for StepAreaDrawer {
    fn kind(&self) -> DrawerKind {
        DrawerKind::StepArea
    }

    fn capabilities(&self) -> DrawerCapabilities {
        DrawerCapability::NeedsZero
            | DrawerCapability::SupportsConnectingMissing
            | DrawerCapability::SupportsStack
            | DrawerCapability::SupportsStepDirection
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
        self.direction = context.step_direction;
        self.state = context.state;
        self.base_z_index = context.base_z_index;
        self.group = None;
        self.zeroes.clear();
    }

    fn draw_first_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager) {
        let group = shapes.get_shapes_group(self.state, None, None, self.base_z_index);
        self.group = Some(group);
        let (x, y, zero) = (point.x, point.value, point.zero);

        if self.stacked {
            if point.has_next_stack() {
                with_paths(shapes, group, &[STROKE], self.vertical, |pen| {
                    pen.move_to(x, y).line_to(x, y);
                });
                self.start_segment(shapes, group, x, point.next_value, point.next_zero);
                self.zeroes = vec![Point::new(x, point.next_zero)];
                self.prev_y = point.next_value;
            } else {
                self.start_segment(shapes, group, x, y, zero);
                self.zeroes = vec![Point::new(x, zero)];
                self.prev_y = y;
            }
        } else {
            self.start_segment(shapes, group, x, y, zero);
            self.last_drawn_x = x;
            self.zero_y = zero;
            self.prev_y = y;
        }
        self.prev_x = x;
    }

    fn draw_subsequent_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager) {
        let Some(group) = self.group else {
            return;
        };
        let (x, y, zero) = (point.x, point.value, point.zero);

        if !self.stacked {
            self.continue_segment(shapes, group, x, y);
            self.last_drawn_x = x;
            self.prev_x = x;
            self.prev_y = y;
            return;
        }

        if point.has_prev_stack() {
            self.continue_segment(shapes, group, x, point.prev_value);
            self.zeroes.push(Point::new(x, point.prev_zero));
            self.prev_x = x;
            self.prev_y = point.prev_value;
            self.close_segment(shapes);
            self.start_segment(shapes, group, x, y, zero);
            self.zeroes = vec![Point::new(x, zero)];
        } else {
            self.continue_segment(shapes, group, x, y);
            self.zeroes.push(Point::new(x, zero));
        }

        if point.has_next_stack() {
            with_paths(shapes, group, &[STROKE], self.vertical, |pen| {
                pen.line_to(x, y);
            });
            self.close_segment(shapes);
            self.start_segment(shapes, group, x, point.next_value, point.next_zero);
            self.zeroes = vec![Point::new(x, point.next_zero)];
            self.prev_y = point.next_value;
        } else {
            self.prev_y = y;
        }
        self.prev_x = x;
    }

    fn finalize_segment(&mut self, shapes: &mut ShapeManager) {
        self.close_segment(shapes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::drawer::draw_points;

    fn draw(direction: StepDirection, stacked: bool, points: &[PointMeta]) -> ShapeManager {
        let mut drawer = StepAreaDrawer::new();
        let mut shapes = ShapeManager::new(drawer.default_shapes());
        let context = DrawContext {
            stacked,
            step_direction: direction,
            ..DrawContext::default()
        };
        draw_points(&mut drawer, &context, points, &mut shapes);
        shapes
    }

    #[test]
    fn forward_steps_cross_at_the_new_point() {
        let points = [
            PointMeta::new(0, 0.0, 10.0, 50.0),
            PointMeta::new(1, 20.0, 30.0, 50.0),
        ];
        let shapes = draw(StepDirection::Forward, false, &points);
        let group = &shapes.groups()[0];
        assert_eq!(
            group.path(STROKE).expect("stroke").to_svg_data(),
            "M 0 10 L 20 10 L 20 30 L 20 30"
        );
        assert_eq!(
            group.path(FILL).expect("fill").to_svg_data(),
            "M 0 50 L 0 10 L 20 10 L 20 30 L 20 30 L 20 50 Z"
        );
    }

    #[test]
    fn center_steps_cross_halfway() {
        let points = [
            PointMeta::new(0, 0.0, 10.0, 50.0),
            PointMeta::new(1, 20.0, 30.0, 50.0),
        ];
        let shapes = draw(StepDirection::Center, false, &points);
        let stroke = shapes.groups()[0].path(STROKE).expect("stroke");
        assert_eq!(stroke.to_svg_data(), "M 0 10 L 10 10 L 10 30 L 20 30");
    }

    #[test]
    fn stacked_area_closes_along_the_zeroes_stack() {
        let points = [
            PointMeta::new(0, 0.0, 10.0, 40.0),
            PointMeta::new(1, 20.0, 5.0, 30.0),
        ];
        let shapes = draw(StepDirection::Backward, true, &points);
        let fill = shapes.groups()[0].path(FILL).expect("fill");
        assert_eq!(
            fill.to_svg_data(),
            "M 0 40 L 0 10 L 0 10 L 0 5 L 20 5 L 20 30 L 0 30 L 0 40 Z"
        );
    }

    #[test]
    fn stacked_gap_drops_to_the_next_zero() {
        let mut before_gap = PointMeta::new(0, 0.0, 10.0, 40.0);
        before_gap.next_value = 40.0;
        before_gap.next_zero = 40.0;
        let shapes = draw(StepDirection::Forward, true, &[before_gap]);
        let stroke = shapes.groups()[0].path(STROKE).expect("stroke");
        assert_eq!(stroke.to_svg_data(), "M 0 10 L 0 10 M 0 40");
        let fill = shapes.groups()[0].path(FILL).expect("fill");
        assert_eq!(fill.to_svg_data(), "M 0 40 L 0 40 L 0 40 Z");
    }
}
