use crate::render::{GroupId, PointState, ShapeConfig, ShapeManager, ShapeType};
use crate::series::capabilities::{DrawerCapabilities, DrawerCapability};
use crate::series::drawer::{DrawContext, Drawer, DrawerKind, with_paths};
use crate::series::point::PointMeta;

const STROKE: &str = "stroke";

/// Polyline through every present point.
#[derive(Debug, Default)]
pub struct LineDrawer {
    vertical: bool,
    state: PointState,
    base_z_index: f64,
    group: Option<GroupId>,
}

impl LineDrawer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drawer for LineDrawer {
    fn kind(&self) -> DrawerKind {
        DrawerKind::Line
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
        self.group = None;
    }

    fn draw_first_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager) {
        let group = shapes.get_shapes_group(self.state, None, None, self.base_z_index);
        self.group = Some(group);
        with_paths(shapes, group, &[STROKE], self.vertical, |pen| {
            pen.move_to(point.x, point.value);
        });
    }

    fn draw_subsequent_point(&mut self, point: &PointMeta, shapes: &mut ShapeManager) {
        let Some(group) = self.group else {
            return;
        };
        with_paths(shapes, group, &[STROKE], self.vertical, |pen| {
            pen.line_to(point.x, point.value);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::drawer::draw_points;

    #[test]
    fn gaps_start_new_groups() {
        let mut drawer = LineDrawer::new();
        let mut shapes = ShapeManager::new(drawer.default_shapes());
        let points = [
            PointMeta::new(0, 0.0, 10.0, 0.0),
            PointMeta::new(1, 5.0, 20.0, 0.0),
            PointMeta::missing(2, 10.0),
            PointMeta::new(3, 15.0, 5.0, 0.0),
        ];
        draw_points(&mut drawer, &DrawContext::default(), &points, &mut shapes);
        assert_eq!(shapes.groups().len(), 2);
        let first = shapes.groups()[0].path(STROKE).expect("stroke path");
        assert_eq!(first.to_svg_data(), "M 0 10 L 5 20");
        let second = shapes.groups()[1].path(STROKE).expect("stroke path");
        assert_eq!(second.to_svg_data(), "M 15 5");
    }
}
