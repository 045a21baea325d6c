use chart_kernel::core::{Point, Rect};
use chart_kernel::geometry::{LineExtent, clip_line_by_rect, clip_segment_by_rect};
use proptest::prelude::*;

const BOUNDS: Rect = Rect::new(10.0, 20.0, 300.0, 200.0);

fn inside_with_tolerance(point: Point, rect: Rect) -> bool {
    const EPSILON: f64 = 1e-6;
    point.x >= rect.left - EPSILON
        && point.x <= rect.right() + EPSILON
        && point.y >= rect.top - EPSILON
        && point.y <= rect.bottom() + EPSILON
}

fn point() -> impl Strategy<Value = Point> {
    (-500.0f64..800.0, -500.0f64..800.0).prop_map(|(x, y)| Point::new(x, y))
}

proptest! {
    #[test]
    fn clipped_lines_stay_inside_the_rect(from in point(), to in point()) {
        for extent in [LineExtent::Segment, LineExtent::Ray, LineExtent::Infinite] {
            if let Some((start, end)) = extent.clip(from, to, BOUNDS) {
                prop_assert!(inside_with_tolerance(start, BOUNDS));
                prop_assert!(inside_with_tolerance(end, BOUNDS));
            }
        }
    }

    #[test]
    fn segments_inside_the_rect_are_untouched(
        fx in 10.0f64..310.0,
        fy in 20.0f64..220.0,
        tx in 10.0f64..310.0,
        ty in 20.0f64..220.0
    ) {
        prop_assume!(fx != tx || fy != ty);
        let from = Point::new(fx, fy);
        let to = Point::new(tx, ty);

        let (start, end) = clip_segment_by_rect(from, to, BOUNDS).expect("visible segment");

        prop_assert!((start.x - from.x).abs() < 1e-6 && (start.y - from.y).abs() < 1e-6);
        prop_assert!((end.x - to.x).abs() < 1e-6 && (end.y - to.y).abs() < 1e-6);
    }

    #[test]
    fn infinite_lines_keep_their_direction(from in point(), to in point()) {
        prop_assume!(from.x != to.x);
        if let Some((start, end)) = clip_line_by_rect(from, to, BOUNDS) {
            prop_assert!((end.x - start.x) * (to.x - from.x) >= 0.0);
        }
    }
}
