use crate::render::{PointState, ShapeConfig, ShapeManager, ShapeType};
use crate::series::capabilities::{DrawerCapabilities, DrawerCapability};
use crate::series::drawer::{DrawContext, Drawer, DrawerKind, with_paths};
use crate::series::point::PointMeta;
use crate::series::three_d::{
    BACK, BOTTOM, FACE_SHAPES, FRONT, FRONT_HATCH, LEFT, RIGHT, ResolvedShift, TOP, face_configs,
    pixel_shift,
};

/// Horizontal bar extruded up and to the right by the chart depth.
///
/// Bars are always laid out vertically: `point.x` is the vertical category
/// position and `value`/`zero` are horizontal.
#[derive(Debug, Default)]
pub struct Bar3dDrawer {
    state: PointState,
    base_z_index: f64,
    point_width: f64,
    pixel_shift: f64,
    shift: ResolvedShift,
}

impl Bar3dDrawer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_point(&self, point: &PointMeta, shapes: &mut ShapeManager) {
        let state = if point.state == PointState::Normal { self.state } else { point.state };
        let group = shapes.get_shapes_group(state, None, Some(point.index), self.base_z_index);
        let h = self.point_width;
        let x = point.zero.min(point.value) + self.shift.offset_x;
        let y = point.x - h / 2.0 - self.shift.offset_y;
        let w = (point.zero - point.value).abs();
        let (xs, ys, ps) = (self.shift.x_shift, self.shift.y_shift, self.pixel_shift);

        with_paths(shapes, group, &[BOTTOM], false, |pen| {
            pen.move_to(x + ps, y + h)
                .line_to(x + w, y + h)
                .line_to(x + w + xs - ps, y + h - ys + ps)
                .line_to(x + xs, y + h - ys)
                .close();
        });
        with_paths(shapes, group, &[BACK], false, |pen| {
            pen.move_to(x + xs, y - ys)
                .line_to(x + xs + w, y - ys)
                .line_to(x + xs + w, y - ys + h)
                .line_to(x + xs, y - ys + h)
                .close();
        });
        with_paths(shapes, group, &[LEFT], false, |pen| {
            pen.move_to(x, y)
                .line_to(x + xs + ps, y - ys + ps)
                .line_to(x + xs, y + h - ys)
                .line_to(x, y + h - ps)
                .close();
        });
        with_paths(shapes, group, &[RIGHT], false, |pen| {
            pen.move_to(x + w, y)
                .line_to(x + w + xs, y - ys + ps)
                .line_to(x + w + xs, y + h - ys)
                .line_to(x + w, y + h - ps)
                .close();
        });
        with_paths(shapes, group, &[FRONT, FRONT_HATCH], false, |pen| {
            pen.move_to(x, y)
                .line_to(x + w, y)
                .line_to(x + w, y + h)
                .line_to(x, y + h)
                .close();
        });
        with_paths(shapes, group, &[TOP], false, |pen| {
            pen.move_to(x + ps, y)
                .line_to(x + w, y)
                .line_to(x + w + xs - ps, y - ys + ps)
                .line_to(x + xs, y - ys)
                .close();
        });
    }
}

impl Drawer for Bar3dDrawer {
    fn kind(&self) -> DrawerKind {
        DrawerKind::Bar3d
    }

    fn capabilities(&self) -> DrawerCapabilities {
        DrawerCapability::NeedsZero
            | DrawerCapability::SupportsStack
            | DrawerCapability::IsDiscreteBased
            | DrawerCapability::IsWidthBased
            | DrawerCapability::Is3dBased
            | DrawerCapability::IsVertical
    }

    fn required_shapes(&self) -> &'static [(&'static str, ShapeType)] {
        FACE_SHAPES
    }

    fn default_shapes(&self) -> Vec<ShapeConfig> {
        face_configs()
    }

    fn start_drawing(&mut self, context: &DrawContext) {
        self.state = context.state;
        self.base_z_index = context.base_z_index;
        self.point_width = context.point_width;
        self.pixel_shift = pixel_shift(context.stroke_thickness);
        self.shift = context.three_d.resolve(context.stacked);
    }

    fn draw_first_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager) {
        self.draw_point(point, shapes);
    }

    fn draw_subsequent_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager) {
        self.draw_point(point, shapes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rect;
    use crate::series::drawer::draw_points;
    use crate::series::three_d::ThreeDShift;

    fn context(series_index: usize) -> DrawContext {
        DrawContext {
            point_width: 10.0,
            stroke_thickness: 1.0,
            three_d: ThreeDShift {
                x_shift: 20.0,
                y_shift: 20.0,
                series_count: 2,
                series_index,
                ..ThreeDShift::default()
            },
            ..DrawContext::default()
        }
    }

    #[test]
    fn front_face_spans_zero_to_value() {
        let mut drawer = Bar3dDrawer::new();
        let mut shapes = ShapeManager::new(drawer.default_shapes());
        draw_points(&mut drawer, &context(1), &[PointMeta::new(0, 50.0, 90.0, 10.0)], &mut shapes);
        let front = shapes.groups()[0].path(FRONT).expect("front face");
        assert_eq!(front.bounds(), Some(Rect::new(10.0, 45.0, 80.0, 10.0)));
        let left = shapes.groups()[0].path(LEFT).expect("left face");
        assert_eq!(left.to_svg_data(), "M 10 45 L 20.5 35.5 L 20 45 L 10 54.5 Z");
    }

    #[test]
    fn back_series_moves_into_its_depth_slot() {
        let mut drawer = Bar3dDrawer::new();
        let mut shapes = ShapeManager::new(drawer.default_shapes());
        draw_points(&mut drawer, &context(0), &[PointMeta::new(0, 50.0, 90.0, 10.0)], &mut shapes);
        let front = shapes.groups()[0].path(FRONT).expect("front face");
        assert_eq!(front.bounds(), Some(Rect::new(20.0, 35.0, 80.0, 10.0)));
    }
}
