use crate::render::{PointState, ShapeConfig, ShapeManager, ShapeType};
use crate::series::capabilities::{DrawerCapabilities, DrawerCapability};
use crate::series::drawer::{DrawContext, Drawer, DrawerKind, with_paths};
use crate::series::point::PointMeta;
use crate::series::three_d::{
    BACK, BOTTOM, FACE_SHAPES, FRONT, FRONT_HATCH, LEFT, RIGHT, ResolvedShift, TOP, face_configs,
    pixel_shift,
};

/// Column extruded up and to the right by the chart depth.
#[derive(Debug, Default)]
pub struct Column3dDrawer {
    state: PointState,
    base_z_index: f64,
    point_width: f64,
    pixel_shift: f64,
    shift: ResolvedShift,
}

impl Column3dDrawer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_point(&self, point: &PointMeta, shapes: &mut ShapeManager) {
        let state = if point.state == PointState::Normal { self.state } else { point.state };
        let group = shapes.get_shapes_group(state, None, Some(point.index), self.base_z_index);
        let w = self.point_width;
        let x = point.x - w / 2.0 + self.shift.offset_x;
        let y = point.zero.min(point.value) - self.shift.offset_y;
        let h = (point.zero - point.value).abs();
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
        for (face, left) in [(LEFT, x), (RIGHT, x + w)] {
            with_paths(shapes, group, &[face], false, |pen| {
                pen.move_to(left, y)
                    .line_to(left + xs - ps, y - ys + ps)
                    .line_to(left + xs, y + h - ys)
                    .line_to(left, y + h - ps)
                    .close();
            });
        }
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

impl Drawer for Column3dDrawer {
    fn kind(&self) -> DrawerKind {
        DrawerKind::Column3d
    }

    fn capabilities(&self) -> DrawerCapabilities {
        DrawerCapability::NeedsZero
            | DrawerCapability::SupportsStack
            | DrawerCapability::IsDiscreteBased
            | DrawerCapability::IsWidthBased
            | DrawerCapability::Is3dBased
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
    use crate::series::drawer::draw_points;
    use crate::series::three_d::ThreeDShift;

    fn draw(thickness: f64) -> ShapeManager {
        let mut drawer = Column3dDrawer::new();
        let mut shapes = ShapeManager::new(drawer.default_shapes());
        let context = DrawContext {
            point_width: 20.0,
            stroke_thickness: thickness,
            three_d: ThreeDShift {
                x_shift: 8.0,
                y_shift: 6.0,
                ..ThreeDShift::default()
            },
            ..DrawContext::default()
        };
        draw_points(&mut drawer, &context, &[PointMeta::new(0, 50.0, 40.0, 100.0)], &mut shapes);
        shapes
    }

    #[test]
    fn faces_follow_the_depth_shift() {
        let shapes = draw(2.0);
        let group = &shapes.groups()[0];
        assert_eq!(
            group.path(TOP).expect("top face").to_svg_data(),
            "M 40 40 L 60 40 L 68 34 L 48 34 Z"
        );
        assert_eq!(
            group.path(BACK).expect("back face").to_svg_data(),
            "M 48 34 L 68 34 L 68 94 L 48 94 Z"
        );
        assert_eq!(group.shapes.len(), 7);
    }

    #[test]
    fn odd_strokes_shift_inner_corners() {
        let shapes = draw(1.0);
        let left = shapes.groups()[0].path(LEFT).expect("left face");
        assert_eq!(left.to_svg_data(), "M 40 40 L 47.5 34.5 L 48 94 L 40 99.5 Z");
    }
}
