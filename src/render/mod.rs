mod frame;
mod null_renderer;
mod path;
mod primitives;
mod shape_manager;

pub use frame::RenderFrame;
pub use null_renderer::NullRenderer;
pub use path::{Path, PathCommand, PathSink, arc_end};
pub use primitives::{Color, Stroke, TextHAlign, TextPrimitive};
pub use shape_manager::{
    GroupId, PointState, Shape, ShapeConfig, ShapeManager, ShapePalette, ShapeType, ShapesGroup,
    StateValues,
};

use crate::error::ChartResult;

/// Contract implemented by any rendering backend.
///
/// Backends receive a fully materialized `RenderFrame` of styled paths, so
/// drawing code stays isolated from scales, series and invalidation.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()>;
}
