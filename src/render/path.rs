use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::core::{Point, Rect};
use crate::error::{ChartError, ChartResult};

/// One vector drawing command in pixel space.
///
/// `ArcTo` angles are in degrees, measured clockwise from the positive x
/// axis; the arc starts at the current point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    CurveTo { x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
    ArcTo { rx: f64, ry: f64, start_angle: f64, sweep_angle: f64 },
    Close,
}

/// Capability set a drawing backend exposes to drawers.
pub trait PathSink {
    fn move_to(&mut self, x: f64, y: f64) -> &mut Self;

    fn line_to(&mut self, x: f64, y: f64) -> &mut Self;

    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> &mut Self;

    fn arc_to(&mut self, rx: f64, ry: f64, start_angle: f64, sweep_angle: f64) -> &mut Self;

    fn close(&mut self) -> &mut Self;

    /// Closed axis-aligned rectangle, clockwise from the top-left corner.
    fn rect(&mut self, rect: Rect) -> &mut Self
    where
        Self: Sized,
    {
        self.move_to(rect.left, rect.top)
            .line_to(rect.right(), rect.top)
            .line_to(rect.right(), rect.bottom())
            .line_to(rect.left, rect.bottom())
            .close()
    }
}

/// Recorded path: an ordered list of [`PathCommand`] values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    commands: Vec<PathCommand>,
    #[serde(skip)]
    current: Option<Point>,
    #[serde(skip)]
    subpath_start: Option<Point>,
}

impl Path {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[must_use]
    pub fn current_point(&self) -> Option<Point> {
        self.current
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.current = None;
        self.subpath_start = None;
    }

    /// Endpoints of every command; control points are included for curves.
    fn anchor_points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.commands.len());
        let mut current: Option<Point> = None;
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => {
                    current = Some(Point::new(x, y));
                    points.push(Point::new(x, y));
                }
                PathCommand::CurveTo { x1, y1, x2, y2, x, y } => {
                    points.push(Point::new(x1, y1));
                    points.push(Point::new(x2, y2));
                    points.push(Point::new(x, y));
                    current = Some(Point::new(x, y));
                }
                PathCommand::ArcTo {
                    rx,
                    ry,
                    start_angle,
                    sweep_angle,
                } => {
                    if let Some(from) = current {
                        let end = arc_end(from, rx, ry, start_angle, sweep_angle);
                        points.push(end);
                        current = Some(end);
                    }
                }
                PathCommand::Close => {}
            }
        }
        points
    }

    /// Bounding box of anchors and control points, `None` for empty paths.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let points = self.anchor_points();
        let first = *points.first()?;
        let (min, max) = points.iter().fold((first, first), |(min, max), point| {
            (
                Point::new(min.x.min(point.x), min.y.min(point.y)),
                Point::new(max.x.max(point.x), max.y.max(point.y)),
            )
        });
        Some(Rect::from_corners(min, max))
    }

    pub fn validate(&self) -> ChartResult<()> {
        let finite = self.commands.iter().all(|command| match *command {
            PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => {
                x.is_finite() && y.is_finite()
            }
            PathCommand::CurveTo { x1, y1, x2, y2, x, y } => [x1, y1, x2, y2, x, y]
                .iter()
                .all(|value| value.is_finite()),
            PathCommand::ArcTo {
                rx,
                ry,
                start_angle,
                sweep_angle,
            } => [rx, ry, start_angle, sweep_angle]
                .iter()
                .all(|value| value.is_finite()),
            PathCommand::Close => true,
        });
        if !finite {
            return Err(ChartError::InvalidData(
                "path coordinates must be finite".to_owned(),
            ));
        }
        if let Some(first) = self.commands.first() {
            if !matches!(first, PathCommand::MoveTo { .. }) {
                return Err(ChartError::InvalidData(
                    "path must start with a move command".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// SVG path data, mostly for debugging and snapshot tests.
    #[must_use]
    pub fn to_svg_data(&self) -> String {
        let mut data = String::new();
        let mut current: Option<Point> = None;
        for command in &self.commands {
            if !data.is_empty() {
                data.push(' ');
            }
            match *command {
                PathCommand::MoveTo { x, y } => {
                    let _ = write!(data, "M {x} {y}");
                    current = Some(Point::new(x, y));
                }
                PathCommand::LineTo { x, y } => {
                    let _ = write!(data, "L {x} {y}");
                    current = Some(Point::new(x, y));
                }
                PathCommand::CurveTo { x1, y1, x2, y2, x, y } => {
                    let _ = write!(data, "C {x1} {y1} {x2} {y2} {x} {y}");
                    current = Some(Point::new(x, y));
                }
                PathCommand::ArcTo {
                    rx,
                    ry,
                    start_angle,
                    sweep_angle,
                } => {
                    let from = current.unwrap_or(Point::new(0.0, 0.0));
                    let end = arc_end(from, rx, ry, start_angle, sweep_angle);
                    let large = u8::from(sweep_angle.abs() > 180.0);
                    let sweep = u8::from(sweep_angle > 0.0);
                    let _ = write!(data, "A {rx} {ry} 0 {large} {sweep} {} {}", end.x, end.y);
                    current = Some(end);
                }
                PathCommand::Close => data.push('Z'),
            }
        }
        data
    }
}

impl PathSink for Path {
    fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.commands.push(PathCommand::MoveTo { x, y });
        self.current = Some(Point::new(x, y));
        self.subpath_start = self.current;
        self
    }

    /// A line with no open subpath starts one instead.
    fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        if self.current.is_none() {
            return self.move_to(x, y);
        }
        self.commands.push(PathCommand::LineTo { x, y });
        self.current = Some(Point::new(x, y));
        self
    }

    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> &mut Self {
        if self.current.is_none() {
            self.move_to(x1, y1);
        }
        self.commands
            .push(PathCommand::CurveTo { x1, y1, x2, y2, x, y });
        self.current = Some(Point::new(x, y));
        self
    }

    fn arc_to(&mut self, rx: f64, ry: f64, start_angle: f64, sweep_angle: f64) -> &mut Self {
        let Some(from) = self.current else {
            return self;
        };
        self.commands.push(PathCommand::ArcTo {
            rx,
            ry,
            start_angle,
            sweep_angle,
        });
        self.current = Some(arc_end(from, rx, ry, start_angle, sweep_angle));
        self
    }

    fn close(&mut self) -> &mut Self {
        if self.current.is_some() {
            self.commands.push(PathCommand::Close);
            self.current = self.subpath_start;
        }
        self
    }
}

/// End of an arc that starts at `from`, located at `start_angle` on the
/// ellipse, and sweeps `sweep_angle` degrees.
#[must_use]
pub fn arc_end(from: Point, rx: f64, ry: f64, start_angle: f64, sweep_angle: f64) -> Point {
    let start = start_angle.to_radians();
    let end = (start_angle + sweep_angle).to_radians();
    let center = Point::new(from.x - rx * start.cos(), from.y - ry * start.sin());
    Point::new(center.x + rx * end.cos(), center.y + ry * end.sin())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn rect_closes_back_to_start() {
        let mut path = Path::new();
        path.rect(Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(path.len(), 5);
        assert_eq!(path.current_point(), Some(Point::new(1.0, 2.0)));
        assert_eq!(path.bounds(), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(path.to_svg_data(), "M 1 2 L 4 2 L 4 6 L 1 6 Z");
    }

    #[test]
    fn half_arc_ends_opposite() {
        let end = arc_end(Point::new(10.0, 0.0), 10.0, 10.0, 0.0, 180.0);
        assert_relative_eq!(end.x, -10.0, epsilon = 1e-9);
        assert_relative_eq!(end.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn arcs_without_current_point_are_dropped() {
        let mut path = Path::new();
        path.arc_to(1.0, 1.0, 0.0, 90.0).close();
        assert!(path.is_empty());
        path.line_to(1.0, 1.0);
        assert_eq!(path.commands()[0], PathCommand::MoveTo { x: 1.0, y: 1.0 });
    }

    #[test]
    fn non_finite_coordinates_fail_validation() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(f64::NAN, 1.0);
        assert!(path.validate().is_err());
    }
}
