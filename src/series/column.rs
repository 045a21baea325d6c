use crate::render::{PointState, ShapeConfig, ShapeManager, ShapeType};
use crate::series::capabilities::{DrawerCapabilities, DrawerCapability};
use crate::series::drawer::{DrawContext, Drawer, DrawerKind, with_paths};
use crate::series::point::PointMeta;

const PATH: &str = "path";
const HATCH_FILL: &str = "hatchFill";

/// One rectangle per point between the zero line and the value.
#[derive(Debug, Default)]
pub struct ColumnDrawer {
    vertical: bool,
    state: PointState,
    base_z_index: f64,
    point_width: f64,
}

impl ColumnDrawer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_point(&self, point: &PointMeta, shapes: &mut ShapeManager) {
        let state = if point.state == PointState::Normal { self.state } else { point.state };
        let group = shapes.get_shapes_group(state, None, Some(point.index), self.base_z_index);
        let left = point.x - self.point_width / 2.0;
        let right = left + self.point_width;
        let top = point.zero.min(point.value);
        let bottom = point.zero.max(point.value);
        with_paths(shapes, group, &[PATH, HATCH_FILL], self.vertical, |pen| {
            pen.move_to(left, top)
                .line_to(right, top)
                .line_to(right, bottom)
                .line_to(left, bottom)
                .close();
        });
    }
}

impl Drawer for ColumnDrawer {
    fn kind(&self) -> DrawerKind {
        DrawerKind::Column
    }

    fn capabilities(&self) -> DrawerCapabilities {
        DrawerCapability::NeedsZero
            | DrawerCapability::SupportsStack
            | DrawerCapability::IsDiscreteBased
            | DrawerCapability::IsWidthBased
    }

    fn required_shapes(&self) -> &'static [(&'static str, ShapeType)] {
        &[(PATH, ShapeType::Path), (HATCH_FILL, ShapeType::Path)]
    }

    fn default_shapes(&self) -> Vec<ShapeConfig> {
        vec![
            ShapeConfig::path(PATH, 1.0).with_fill("fill").with_stroke("stroke"),
            ShapeConfig::path(HATCH_FILL, 2.0).hatch(),
        ]
    }

    fn start_drawing(&mut self, context: &DrawContext) {
        self.vertical = context.vertical;
        self.state = context.state;
        self.base_z_index = context.base_z_index;
        self.point_width = context.point_width;
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

    #[test]
    fn columns_span_zero_to_value() {
        let mut drawer = ColumnDrawer::new();
        let mut shapes = ShapeManager::new(drawer.default_shapes());
        let points = [
            PointMeta::new(0, 10.0, 20.0, 50.0),
            PointMeta::new(1, 30.0, 70.0, 50.0),
        ];
        draw_points(&mut drawer, &DrawContext::default(), &points, &mut shapes);
        assert_eq!(shapes.groups().len(), 2);
        assert_eq!(shapes.groups()[1].index, Some(1));
        let up = shapes.groups()[0].path(PATH).expect("column path");
        assert_eq!(up.bounds(), Some(Rect::new(5.0, 20.0, 10.0, 30.0)));
        let down = shapes.groups()[1].path(PATH).expect("column path");
        assert_eq!(down.bounds(), Some(Rect::new(25.0, 50.0, 10.0, 20.0)));
    }

    #[test]
    fn vertical_columns_become_bars() {
        let mut drawer = ColumnDrawer::new();
        let mut shapes = ShapeManager::new(drawer.default_shapes());
        let context = DrawContext {
            vertical: true,
            ..DrawContext::default()
        };
        draw_points(&mut drawer, &context, &[PointMeta::new(0, 10.0, 80.0, 0.0)], &mut shapes);
        let bar = shapes.groups()[0].path(PATH).expect("bar path");
        assert_eq!(bar.bounds(), Some(Rect::new(0.0, 5.0, 80.0, 10.0)));
    }
}
