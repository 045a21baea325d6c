//! Clipping and visibility helpers for drawing annotations inside plot bounds.
//!
//! Clipped lines keep the direction of their input points: the first
//! returned point is always the one met first when walking from `from`
//! towards `to`.

use serde::{Deserialize, Serialize};

use crate::core::{Point, Rect};
use crate::render::PathSink;

/// How far a line through two anchors extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineExtent {
    #[default]
    Segment,
    Ray,
    Infinite,
}

impl LineExtent {
    /// Visible part of the line through `from` and `to` within `rect`.
    #[must_use]
    pub fn clip(self, from: Point, to: Point, rect: Rect) -> Option<(Point, Point)> {
        match self {
            Self::Segment => clip_segment_by_rect(from, to, rect),
            Self::Ray => clip_ray_by_rect(from, to, rect),
            Self::Infinite => clip_line_by_rect(from, to, rect),
        }
    }
}

/// Infinite line through `from` and `to`, clipped to `rect`.
///
/// Coincident points yield the point itself when it lies inside `rect`.
#[must_use]
pub fn clip_line_by_rect(from: Point, to: Point, rect: Rect) -> Option<(Point, Point)> {
    let (left, top, right, bottom) = (rect.left, rect.top, rect.right(), rect.bottom());
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if !from.is_finite() || !to.is_finite() {
        return None;
    }

    let (start, end) = if dx == 0.0 && dy == 0.0 {
        return rect.contains(from).then_some((from, from));
    } else if dy == 0.0 {
        if from.y < top || from.y > bottom {
            return None;
        }
        (Point::new(left, from.y), Point::new(right, from.y))
    } else if dx == 0.0 {
        if from.x < left || from.x > right {
            return None;
        }
        (Point::new(from.x, top), Point::new(from.x, bottom))
    } else {
        let k = dy / dx;
        let b = from.y - from.x * k;
        let left_y = left * k + b;
        let right_y = right * k + b;
        if (left_y < top && right_y < top) || (left_y > bottom && right_y > bottom) {
            return None;
        }
        let top_point = Point::new((top - b) / k, top);
        let bottom_point = Point::new((bottom - b) / k, bottom);
        let start = if left_y < top {
            top_point
        } else if left_y > bottom {
            bottom_point
        } else {
            Point::new(left, left_y)
        };
        let end = if right_y < top {
            top_point
        } else if right_y > bottom {
            bottom_point
        } else {
            Point::new(right, right_y)
        };
        (start, end)
    };

    if from.x > to.x || (from.x == to.x && from.y > to.y) {
        Some((end, start))
    } else {
        Some((start, end))
    }
}

/// Coordinate that grows along the direction `from -> to`: x unless the line
/// is vertical.
fn along(from: Point, to: Point) -> fn(Point) -> f64 {
    fn x(point: Point) -> f64 {
        point.x
    }
    fn y(point: Point) -> f64 {
        point.y
    }
    if to.x == from.x { y } else { x }
}

/// Ray starting at `from` and passing through `to`, clipped to `rect`.
#[must_use]
pub fn clip_ray_by_rect(from: Point, to: Point, rect: Rect) -> Option<(Point, Point)> {
    let (mut start, end) = clip_line_by_rect(from, to, rect)?;
    let component = along(from, to);
    let direction = component(to) - component(from);
    if direction == 0.0 {
        return Some((start, end));
    }
    if (component(end) - component(from)) * direction < 0.0 {
        return None;
    }
    if (component(start) - component(from)) * direction < 0.0 {
        start = from;
    }
    Some((start, end))
}

/// Segment between `from` and `to`, clipped to `rect`.
#[must_use]
pub fn clip_segment_by_rect(from: Point, to: Point, rect: Rect) -> Option<(Point, Point)> {
    let (mut start, mut end) = clip_line_by_rect(from, to, rect)?;
    let component = along(from, to);
    let direction = component(to) - component(from);
    if direction == 0.0 {
        return Some((start, end));
    }
    if (component(end) - component(from)) * direction < 0.0
        || (component(start) - component(to)) * direction > 0.0
    {
        return None;
    }
    if (component(start) - component(from)) * direction < 0.0 {
        start = from;
    }
    if (component(end) - component(to)) * direction > 0.0 {
        end = to;
    }
    Some((start, end))
}

/// Rectangle spanned by two corners, clipped to `rect`.
#[must_use]
pub fn clip_rect_by_rect(a: Point, b: Point, rect: Rect) -> Option<Rect> {
    Rect::from_corners(a, b).intersection(rect)
}

/// Appends a closed ellipse around `center` to `sink` as two half arcs.
pub fn ellipse_path<S: PathSink>(sink: &mut S, center: Point, rx: f64, ry: f64) -> &mut S {
    let (rx, ry) = (rx.abs(), ry.abs());
    sink.move_to(center.x + rx, center.y)
        .arc_to(rx, ry, 0.0, 180.0)
        .arc_to(rx, ry, 180.0, 180.0)
        .close()
}

/// Bounding box of an ellipse.
#[must_use]
pub fn ellipse_bounds(center: Point, rx: f64, ry: f64) -> Rect {
    let (rx, ry) = (rx.abs(), ry.abs());
    Rect::new(center.x - rx, center.y - ry, rx * 2.0, ry * 2.0)
}

#[must_use]
pub fn is_ellipse_visible(center: Point, rx: f64, ry: f64, bounds: Rect) -> bool {
    ellipse_bounds(center, rx, ry).intersects(bounds)
}

#[must_use]
pub fn is_rect_visible(a: Point, b: Point, bounds: Rect) -> bool {
    Rect::from_corners(a, b).intersects(bounds)
}

/// A value anchor is visible while its y lies within the bounds.
#[must_use]
pub fn is_value_visible(y: f64, bounds: Rect) -> bool {
    y >= bounds.top && y <= bounds.bottom()
}

/// X anchors are visible unless they all fall on the same side of the
/// bounds. NaN anchors are ignored; no finite anchor means invisible.
#[must_use]
pub fn are_x_anchors_visible(xs: &[f64], bounds: Rect) -> bool {
    let mut anchors = xs.iter().copied().filter(|x| !x.is_nan()).peekable();
    if anchors.peek().is_none() {
        return false;
    }
    let (mut all_left, mut all_right) = (true, true);
    for x in anchors {
        all_left &= x < bounds.left;
        all_right &= x > bounds.right();
    }
    !all_left && !all_right
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Path;

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn diagonal_line_spans_the_rect() {
        assert_eq!(
            clip_line_by_rect(p(10.0, 10.0), p(20.0, 20.0), BOUNDS),
            Some((p(0.0, 0.0), p(100.0, 100.0)))
        );
        assert_eq!(
            clip_line_by_rect(p(20.0, 20.0), p(10.0, 10.0), BOUNDS),
            Some((p(100.0, 100.0), p(0.0, 0.0)))
        );
    }

    #[test]
    fn steep_line_enters_through_top_and_bottom() {
        let (start, end) =
            clip_line_by_rect(p(50.0, 50.0), p(60.0, 70.0), BOUNDS).expect("crosses");
        assert_eq!(start, p(25.0, 0.0));
        assert_eq!(end, p(75.0, 100.0));
    }

    #[test]
    fn axis_aligned_and_degenerate_lines() {
        assert_eq!(
            clip_line_by_rect(p(5.0, 40.0), p(6.0, 40.0), BOUNDS),
            Some((p(0.0, 40.0), p(100.0, 40.0)))
        );
        assert_eq!(
            clip_line_by_rect(p(30.0, 90.0), p(30.0, 10.0), BOUNDS),
            Some((p(30.0, 100.0), p(30.0, 0.0)))
        );
        assert_eq!(clip_line_by_rect(p(5.0, 140.0), p(6.0, 140.0), BOUNDS), None);
        assert_eq!(
            clip_line_by_rect(p(5.0, 5.0), p(5.0, 5.0), BOUNDS),
            Some((p(5.0, 5.0), p(5.0, 5.0)))
        );
        assert_eq!(clip_line_by_rect(p(-5.0, 5.0), p(-5.0, 5.0), BOUNDS), None);
    }

    #[test]
    fn line_passing_beside_the_rect_is_hidden() {
        assert_eq!(clip_line_by_rect(p(0.0, -50.0), p(10.0, -60.0), BOUNDS), None);
    }

    #[test]
    fn ray_starts_at_its_origin() {
        assert_eq!(
            clip_ray_by_rect(p(40.0, 40.0), p(50.0, 50.0), BOUNDS),
            Some((p(40.0, 40.0), p(100.0, 100.0)))
        );
        assert_eq!(
            clip_ray_by_rect(p(40.0, 40.0), p(30.0, 30.0), BOUNDS),
            Some((p(40.0, 40.0), p(0.0, 0.0)))
        );
        assert_eq!(clip_ray_by_rect(p(120.0, 50.0), p(130.0, 50.0), BOUNDS), None);
        assert_eq!(
            clip_ray_by_rect(p(50.0, 20.0), p(50.0, 10.0), BOUNDS),
            Some((p(50.0, 20.0), p(50.0, 0.0)))
        );
    }

    #[test]
    fn segment_keeps_inner_endpoints() {
        assert_eq!(
            clip_segment_by_rect(p(-20.0, 50.0), p(60.0, 50.0), BOUNDS),
            Some((p(0.0, 50.0), p(60.0, 50.0)))
        );
        assert_eq!(
            clip_segment_by_rect(p(60.0, 50.0), p(-20.0, 50.0), BOUNDS),
            Some((p(60.0, 50.0), p(0.0, 50.0)))
        );
        assert_eq!(
            clip_segment_by_rect(p(110.0, 50.0), p(120.0, 50.0), BOUNDS),
            None
        );
        assert_eq!(
            clip_segment_by_rect(p(-20.0, 50.0), p(-10.0, 50.0), BOUNDS),
            None
        );
        assert_eq!(
            LineExtent::Segment.clip(p(10.0, 10.0), p(20.0, 20.0), BOUNDS),
            Some((p(10.0, 10.0), p(20.0, 20.0)))
        );
    }

    #[test]
    fn rect_and_ellipse_helpers() {
        assert_eq!(
            clip_rect_by_rect(p(120.0, 50.0), p(80.0, -10.0), BOUNDS),
            Some(Rect::new(80.0, 0.0, 20.0, 50.0))
        );
        assert_eq!(clip_rect_by_rect(p(120.0, 50.0), p(110.0, 60.0), BOUNDS), None);

        let mut path = Path::new();
        ellipse_path(&mut path, p(50.0, 50.0), 10.0, 5.0);
        assert_eq!(path.len(), 4);
        assert_eq!(path.current_point(), Some(p(60.0, 50.0)));
        assert!(is_ellipse_visible(p(105.0, 50.0), 10.0, 5.0, BOUNDS));
        assert!(!is_ellipse_visible(p(115.0, 50.0), 10.0, 5.0, BOUNDS));
        assert!(is_rect_visible(p(-10.0, -10.0), p(1.0, 1.0), BOUNDS));
    }

    #[test]
    fn anchor_visibility() {
        assert!(is_value_visible(100.0, BOUNDS));
        assert!(!is_value_visible(-0.5, BOUNDS));
        assert!(are_x_anchors_visible(&[-10.0, 150.0], BOUNDS));
        assert!(are_x_anchors_visible(&[f64::NAN, 50.0], BOUNDS));
        assert!(!are_x_anchors_visible(&[-10.0, -1.0], BOUNDS));
        assert!(!are_x_anchors_visible(&[101.0, f64::NAN], BOUNDS));
        assert!(!are_x_anchors_visible(&[f64::NAN], BOUNDS));
    }
}
