//! Axis layout, axis markers and annotation clipping.

mod annotation;
mod axis;
mod axis_marker;

pub use annotation::{
    LineExtent, are_x_anchors_visible, clip_line_by_rect, clip_ray_by_rect, clip_rect_by_rect,
    clip_segment_by_rect, ellipse_bounds, ellipse_path, is_ellipse_visible, is_rect_visible,
    is_value_visible,
};
pub use axis::{
    Axis, AxisGeometry, AxisLayout, AxisOrientation, AxisSettings, LabelAnchor, TickSegment,
    thin_labels,
};
pub use axis_marker::{AxisMarker, AxisMarkerSettings, MarkerLayout};
