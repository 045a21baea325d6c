use crate::render::{PointState, ShapeConfig, ShapeManager, ShapeType};
use crate::series::capabilities::{DrawerCapabilities, DrawerCapability};
use crate::series::drawer::{DrawContext, Drawer, DrawerKind, with_paths};
use crate::series::point::PointMeta;

const RISING: &str = "rising";
const FALLING: &str = "falling";

/// Open-high-low-close bars: a high-low stem with open and close ticks.
///
/// Rising points (close above open) and falling points go to separate
/// shapes so they can be stroked differently.
#[derive(Debug, Default)]
pub struct OhlcDrawer {
    vertical: bool,
    state: PointState,
    base_z_index: f64,
    point_width: f64,
}

impl OhlcDrawer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_point(&self, point: &PointMeta, shapes: &mut ShapeManager) {
        let Some(ohlc) = point.ohlc else {
            return;
        };
        let name = if point.rising { RISING } else { FALLING };
        let state = if point.state == PointState::Normal { self.state } else { point.state };
        let only = [name];
        let group = shapes.get_shapes_group(state, Some(&only[..]), Some(point.index), self.base_z_index);
        let x = point.x;
        let half_width = self.point_width / 2.0;
        with_paths(shapes, group, &[name], self.vertical, |pen| {
            pen.move_to(x, ohlc.high)
                .line_to(x, ohlc.low)
                .move_to(x - half_width, ohlc.open)
                .line_to(x, ohlc.open)
                .move_to(x + half_width, ohlc.close)
                .line_to(x, ohlc.close);
        });
    }
}

impl Drawer for OhlcDrawer {
    fn kind(&self) -> DrawerKind {
        DrawerKind::Ohlc
    }

    fn capabilities(&self) -> DrawerCapabilities {
        DrawerCapability::IsDiscreteBased
            | DrawerCapability::IsWidthBased
            | DrawerCapability::IsOhlcBased
    }

    fn required_shapes(&self) -> &'static [(&'static str, ShapeType)] {
        &[(RISING, ShapeType::Path), (FALLING, ShapeType::Path)]
    }

    fn default_shapes(&self) -> Vec<ShapeConfig> {
        vec![
            ShapeConfig::path(RISING, 1.0).with_stroke(RISING),
            ShapeConfig::path(FALLING, 1.0).with_stroke(FALLING),
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
    use crate::series::drawer::draw_points;
    use crate::series::point::Ohlc;

    #[test]
    fn rising_and_falling_use_separate_shapes() {
        let mut drawer = OhlcDrawer::new();
        let mut shapes = ShapeManager::new(drawer.default_shapes());
        let points = [
            PointMeta::with_ohlc(0, 10.0, Ohlc::new(40.0, 10.0, 50.0, 20.0), true),
            PointMeta::with_ohlc(1, 30.0, Ohlc::new(20.0, 10.0, 50.0, 40.0), false),
        ];
        draw_points(&mut drawer, &DrawContext::default(), &points, &mut shapes);

        let rising = &shapes.groups()[0];
        assert_eq!(rising.shapes.len(), 1);
        assert_eq!(
            rising.path(RISING).expect("rising path").to_svg_data(),
            "M 10 10 L 10 50 M 5 40 L 10 40 M 15 20 L 10 20"
        );
        assert!(shapes.groups()[1].path(FALLING).is_some());
        assert!(shapes.groups()[1].path(RISING).is_none());
    }
}
