use crate::core::Rect;
use crate::error::ChartResult;
use crate::render::{Shape, ShapeManager, TextPrimitive};

/// Backend-agnostic scene for one chart draw pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub bounds: Rect,
    pub shapes: Vec<Shape>,
    pub texts: Vec<TextPrimitive>,
}

impl RenderFrame {
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            shapes: Vec::new(),
            texts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: TextPrimitive) -> Self {
        self.texts.push(text);
        self
    }

    pub fn push_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn push_text(&mut self, text: TextPrimitive) {
        self.texts.push(text);
    }

    /// Copies every drawn shape of `shapes` into the frame.
    pub fn extend_from_manager(&mut self, shapes: &ShapeManager) {
        self.shapes
            .extend(shapes.shapes().into_iter().cloned());
    }

    /// Stable ascending z sort, so backends painting in order draw the
    /// lowest z first and higher shapes on top.
    pub fn sort_by_z_index(&mut self) {
        self.shapes
            .sort_by(|a, b| a.z_index.total_cmp(&b.z_index));
    }

    pub fn validate(&self) -> ChartResult<()> {
        self.bounds.validate()?;
        for shape in &self.shapes {
            shape.path.validate()?;
            if let Some(fill) = shape.fill {
                fill.validate()?;
            }
            if let Some(stroke) = shape.stroke {
                stroke.validate()?;
            }
        }
        for text in &self.texts {
            text.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.texts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Path, PathSink, PointState, ShapeType};

    fn shape(name: &str, z_index: f64) -> Shape {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        Shape {
            name: name.to_owned(),
            shape_type: ShapeType::Path,
            state: PointState::Normal,
            z_index,
            fill: None,
            stroke: None,
            is_hatch_fill: false,
            path,
        }
    }

    #[test]
    fn lowest_z_index_is_painted_first() {
        let mut frame = RenderFrame::new(Rect::new(0.0, 0.0, 10.0, 10.0))
            .with_shape(shape("grid", 5.0))
            .with_shape(shape("background", f64::MIN))
            .with_shape(shape("series", 30.0))
            .with_shape(shape("label", 5.0));
        frame.sort_by_z_index();
        let order: Vec<&str> = frame.shapes.iter().map(|shape| shape.name.as_str()).collect();
        assert_eq!(order, ["background", "grid", "label", "series"]);
    }
}
