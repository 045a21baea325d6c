use serde::{Deserialize, Serialize};

use crate::render::{ShapeConfig, ShapeType};

pub(crate) const BOTTOM: &str = "bottom";
pub(crate) const BACK: &str = "back";
pub(crate) const LEFT: &str = "left";
pub(crate) const RIGHT: &str = "right";
pub(crate) const FRONT: &str = "front";
pub(crate) const TOP: &str = "top";
pub(crate) const FRONT_HATCH: &str = "frontHatch";

/// Face roles of a 3D column or bar, back to front.
pub(crate) const FACE_SHAPES: &[(&str, ShapeType)] = &[
    (BOTTOM, ShapeType::Path),
    (BACK, ShapeType::Path),
    (LEFT, ShapeType::Path),
    (RIGHT, ShapeType::Path),
    (FRONT, ShapeType::Path),
    (TOP, ShapeType::Path),
    (FRONT_HATCH, ShapeType::Path),
];

/// Side faces use the `sideFill` palette entry, the cap uses `topFill`.
pub(crate) fn face_configs() -> Vec<ShapeConfig> {
    vec![
        ShapeConfig::path(BOTTOM, 1.0).with_fill("sideFill"),
        ShapeConfig::path(BACK, 2.0).with_fill("sideFill"),
        ShapeConfig::path(LEFT, 3.0).with_fill("sideFill"),
        ShapeConfig::path(RIGHT, 4.0).with_fill("sideFill"),
        ShapeConfig::path(FRONT, 5.0).with_fill("fill").with_stroke("stroke"),
        ShapeConfig::path(TOP, 6.0).with_fill("topFill"),
        ShapeConfig::path(FRONT_HATCH, 7.0).hatch(),
    ]
}

/// Half-pixel correction for crisp odd-width strokes; NaN yields 0.
#[must_use]
pub fn pixel_shift(thickness: f64) -> f64 {
    if thickness.is_finite() && thickness.rem_euclid(2.0) == 1.0 {
        0.5
    } else {
        0.0
    }
}

/// Depth settings shared by every 3D series of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeDShift {
    pub x_shift: f64,
    pub y_shift: f64,
    pub z_padding_x: f64,
    pub z_padding_y: f64,
    pub series_count: usize,
    pub series_index: usize,
}

impl Default for ThreeDShift {
    fn default() -> Self {
        Self {
            x_shift: 10.0,
            y_shift: 10.0,
            z_padding_x: 0.0,
            z_padding_y: 0.0,
            series_count: 1,
            series_index: 0,
        }
    }
}

/// Depth of one series after distribution, plus the offset of its slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedShift {
    pub x_shift: f64,
    pub y_shift: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl ThreeDShift {
    /// Stacked series share the full depth. Otherwise the depth is split
    /// into one slot per series; the first series sits in the back slot.
    #[must_use]
    pub fn resolve(&self, stacked: bool) -> ResolvedShift {
        if stacked || self.series_count <= 1 {
            return ResolvedShift {
                x_shift: self.x_shift,
                y_shift: self.y_shift,
                offset_x: 0.0,
                offset_y: 0.0,
            };
        }
        let count = self.series_count as f64;
        let gaps = (count - 1.0) / count;
        let x_shift = (self.x_shift / count - self.z_padding_x * gaps).max(0.0);
        let y_shift = (self.y_shift / count - self.z_padding_y * gaps).max(0.0);
        let draw_index = self
            .series_count
            .saturating_sub(1)
            .saturating_sub(self.series_index) as f64;
        ResolvedShift {
            x_shift,
            y_shift,
            offset_x: (x_shift + self.z_padding_x) * draw_index,
            offset_y: (y_shift + self.z_padding_y) * draw_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn only_odd_integral_thickness_shifts() {
        assert_eq!(pixel_shift(1.0), 0.5);
        assert_eq!(pixel_shift(3.0), 0.5);
        assert_eq!(pixel_shift(2.0), 0.0);
        assert_eq!(pixel_shift(1.5), 0.0);
        assert_eq!(pixel_shift(f64::NAN), 0.0);
    }

    #[test]
    fn clustered_series_split_the_depth() {
        let shift = ThreeDShift {
            x_shift: 30.0,
            y_shift: 15.0,
            z_padding_x: 3.0,
            z_padding_y: 0.0,
            series_count: 3,
            series_index: 0,
        };
        let back = shift.resolve(false);
        assert_relative_eq!(back.x_shift, 8.0);
        assert_relative_eq!(back.y_shift, 5.0);
        assert_relative_eq!(back.offset_x, 22.0);
        assert_relative_eq!(back.offset_y, 10.0);

        let front = ThreeDShift { series_index: 2, ..shift }.resolve(false);
        assert_eq!(front.offset_x, 0.0);
        assert_eq!(shift.resolve(true).x_shift, 30.0);
    }
}
