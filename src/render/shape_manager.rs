use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::core::{ErrorCode, Reporter};
use crate::render::path::Path;
use crate::render::primitives::{Color, Stroke};

/// Geometry kind a shape role is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    Path,
    Rect,
    Circle,
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Rect => "rect",
            Self::Circle => "circle",
        })
    }
}

/// Interaction state a shapes group is colored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointState {
    #[default]
    Normal,
    Hover,
    Selected,
}

/// Per-state values; hover and selected fall back to normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateValues<T> {
    pub normal: Option<T>,
    pub hover: Option<T>,
    pub selected: Option<T>,
}

impl<T> Default for StateValues<T> {
    fn default() -> Self {
        Self {
            normal: None,
            hover: None,
            selected: None,
        }
    }
}

impl<T: Copy> StateValues<T> {
    #[must_use]
    pub fn uniform(value: T) -> Self {
        Self {
            normal: Some(value),
            hover: None,
            selected: None,
        }
    }

    #[must_use]
    pub fn resolve(&self, state: PointState) -> Option<T> {
        let specific = match state {
            PointState::Normal => self.normal,
            PointState::Hover => self.hover,
            PointState::Selected => self.selected,
        };
        specific.or(self.normal)
    }

    pub fn set(&mut self, state: PointState, value: Option<T>) {
        match state {
            PointState::Normal => self.normal = value,
            PointState::Hover => self.hover = value,
            PointState::Selected => self.selected = value,
        }
    }
}

/// Declaration of one named shape role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeConfig {
    pub name: String,
    pub shape_type: ShapeType,
    pub fill_name: Option<String>,
    pub stroke_name: Option<String>,
    pub is_hatch_fill: bool,
    pub z_index: f64,
}

impl ShapeConfig {
    #[must_use]
    pub fn path(name: impl Into<String>, z_index: f64) -> Self {
        Self {
            name: name.into(),
            shape_type: ShapeType::Path,
            fill_name: None,
            stroke_name: None,
            is_hatch_fill: false,
            z_index,
        }
    }

    #[must_use]
    pub fn with_type(mut self, shape_type: ShapeType) -> Self {
        self.shape_type = shape_type;
        self
    }

    #[must_use]
    pub fn with_fill(mut self, fill_name: impl Into<String>) -> Self {
        self.fill_name = Some(fill_name.into());
        self
    }

    #[must_use]
    pub fn with_stroke(mut self, stroke_name: impl Into<String>) -> Self {
        self.stroke_name = Some(stroke_name.into());
        self
    }

    /// Hatch shapes take their fill from the hatch palette entry.
    #[must_use]
    pub fn hatch(mut self) -> Self {
        self.is_hatch_fill = true;
        self
    }
}

/// Named fills and strokes shape configs refer to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapePalette {
    pub fills: IndexMap<String, StateValues<Color>>,
    pub strokes: IndexMap<String, StateValues<Stroke>>,
}

impl ShapePalette {
    pub fn set_fill(&mut self, name: &str, state: PointState, color: Option<Color>) -> &mut Self {
        self.fills
            .entry(name.to_owned())
            .or_default()
            .set(state, color);
        self
    }

    pub fn set_stroke(&mut self, name: &str, state: PointState, stroke: Option<Stroke>) -> &mut Self {
        self.strokes
            .entry(name.to_owned())
            .or_default()
            .set(state, stroke);
        self
    }

    #[must_use]
    pub fn fill(&self, name: &str, state: PointState) -> Option<Color> {
        self.fills.get(name).and_then(|values| values.resolve(state))
    }

    #[must_use]
    pub fn stroke(&self, name: &str, state: PointState) -> Option<Stroke> {
        self.strokes
            .get(name)
            .and_then(|values| values.resolve(state))
    }
}

/// A styled path produced by a drawer.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub name: String,
    pub shape_type: ShapeType,
    pub state: PointState,
    pub z_index: f64,
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
    pub is_hatch_fill: bool,
    pub path: Path,
}

/// Shapes created together for one point or one whole series.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapesGroup {
    /// Point index for discrete drawers, `None` for series-wide groups.
    pub index: Option<usize>,
    pub state: PointState,
    pub base_z_index: f64,
    pub shapes: SmallVec<[Shape; 4]>,
}

impl ShapesGroup {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|shape| shape.name == name)
    }

    /// Path of the named shape, if the group has it.
    pub fn path_mut(&mut self, name: &str) -> Option<&mut Path> {
        self.get_mut(name).map(|shape| &mut shape.path)
    }

    #[must_use]
    pub fn path(&self, name: &str) -> Option<&Path> {
        self.get(name).map(|shape| &shape.path)
    }
}

/// Handle of a group inside a [`ShapeManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

/// Creates, styles and keeps the shapes a series draws into.
#[derive(Debug, Clone, Default)]
pub struct ShapeManager {
    defs: IndexMap<String, ShapeConfig>,
    palette: ShapePalette,
    groups: Vec<ShapesGroup>,
}

impl ShapeManager {
    /// Later configs with a repeated name replace earlier ones.
    #[must_use]
    pub fn new(configs: impl IntoIterator<Item = ShapeConfig>) -> Self {
        let defs = configs
            .into_iter()
            .map(|config| (config.name.clone(), config))
            .collect();
        Self {
            defs,
            palette: ShapePalette::default(),
            groups: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_palette(mut self, palette: ShapePalette) -> Self {
        self.palette = palette;
        self
    }

    #[must_use]
    pub fn palette(&self) -> &ShapePalette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut ShapePalette {
        &mut self.palette
    }

    #[must_use]
    pub fn config(&self, name: &str) -> Option<&ShapeConfig> {
        self.defs.get(name)
    }

    /// Whether every required role exists with the required type.
    #[must_use]
    pub fn check_requirements(&self, required: &[(&str, ShapeType)]) -> bool {
        required.iter().all(|(name, shape_type)| {
            self.defs
                .get(*name)
                .is_some_and(|config| config.shape_type == *shape_type)
        })
    }

    /// [`Self::check_requirements`] reporting `WRONG_SHAPES_CONFIG` on failure.
    pub fn validate_requirements(
        &self,
        series_name: &str,
        series_type: &str,
        required: &[(&str, ShapeType)],
        reporter: &dyn Reporter,
    ) -> bool {
        if self.check_requirements(required) {
            return true;
        }
        let listing = required
            .iter()
            .map(|(name, shape_type)| format!("{name} ({shape_type})"))
            .collect::<Vec<_>>()
            .join(", ");
        reporter.error(
            ErrorCode::WrongShapesConfig,
            &[series_name, series_type, listing.as_str()],
        );
        false
    }

    fn create_shape(&self, config: &ShapeConfig, state: PointState, base_z_index: f64) -> Shape {
        let fill = if config.is_hatch_fill {
            self.palette.fill("hatchFill", state)
        } else {
            config
                .fill_name
                .as_deref()
                .and_then(|name| self.palette.fill(name, state))
        };
        let stroke = config
            .stroke_name
            .as_deref()
            .and_then(|name| self.palette.stroke(name, state));
        Shape {
            name: config.name.clone(),
            shape_type: config.shape_type,
            state,
            z_index: config.z_index + base_z_index,
            fill,
            stroke,
            is_hatch_fill: config.is_hatch_fill,
            path: Path::new(),
        }
    }

    /// Creates a group with every declared shape.
    pub fn add_shapes_group(
        &mut self,
        state: PointState,
        index: Option<usize>,
        base_z_index: f64,
    ) -> GroupId {
        self.get_shapes_group(state, None, index, base_z_index)
    }

    /// Creates a group limited to `only` when given; unknown names are skipped.
    pub fn get_shapes_group(
        &mut self,
        state: PointState,
        only: Option<&[&str]>,
        index: Option<usize>,
        base_z_index: f64,
    ) -> GroupId {
        let shapes = self
            .defs
            .values()
            .filter(|config| only.is_none_or(|names| names.contains(&config.name.as_str())))
            .map(|config| self.create_shape(config, state, base_z_index))
            .collect();
        self.groups.push(ShapesGroup {
            index,
            state,
            base_z_index,
            shapes,
        });
        trace!(group = self.groups.len() - 1, ?index, "shapes group created");
        GroupId(self.groups.len() - 1)
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&ShapesGroup> {
        self.groups.get(id.0)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut ShapesGroup> {
        self.groups.get_mut(id.0)
    }

    /// Path of the named shape in group `id`.
    pub fn path_mut(&mut self, id: GroupId, name: &str) -> Option<&mut Path> {
        self.groups.get_mut(id.0)?.path_mut(name)
    }

    pub fn groups(&self) -> &[ShapesGroup] {
        &self.groups
    }

    pub fn update_z_index(&mut self, id: GroupId, base_z_index: f64) {
        let Some(group) = self.groups.get_mut(id.0) else {
            return;
        };
        group.base_z_index = base_z_index;
        for shape in &mut group.shapes {
            if let Some(config) = self.defs.get(&shape.name) {
                shape.z_index = config.z_index + base_z_index;
            }
        }
    }

    /// Restyles a group for `state`, keeping its geometry.
    pub fn update_colors(&mut self, id: GroupId, state: PointState) {
        let Some(group) = self.groups.get(id.0) else {
            return;
        };
        let restyled: Vec<Shape> = group
            .shapes
            .iter()
            .filter_map(|shape| {
                let config = self.defs.get(&shape.name)?;
                let mut fresh = self.create_shape(config, state, group.base_z_index);
                fresh.path = shape.path.clone();
                Some(fresh)
            })
            .collect();
        if let Some(group) = self.groups.get_mut(id.0) {
            group.state = state;
            group.shapes = restyled.into_iter().collect();
        }
    }

    /// Drops all groups; the next draw pass starts from scratch.
    pub fn clear_shapes(&mut self) {
        self.groups.clear();
    }

    /// Every non-empty shape, ordered by z-index (stable for ties).
    #[must_use]
    pub fn shapes(&self) -> Vec<&Shape> {
        let mut shapes: Vec<&Shape> = self
            .groups
            .iter()
            .flat_map(|group| group.shapes.iter())
            .filter(|shape| !shape.path.is_empty())
            .collect();
        shapes.sort_by(|a, b| a.z_index.total_cmp(&b.z_index));
        shapes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecordingReporter;

    fn manager() -> ShapeManager {
        let mut manager = ShapeManager::new([
            ShapeConfig::path("fill", 1.0).with_fill("fill"),
            ShapeConfig::path("hatchFill", 2.0).hatch(),
            ShapeConfig::path("stroke", 3.0).with_stroke("stroke"),
        ]);
        manager
            .palette_mut()
            .set_fill("fill", PointState::Normal, Some(Color::rgb(0.0, 0.0, 1.0)))
            .set_fill("fill", PointState::Hover, Some(Color::rgb(1.0, 0.0, 0.0)));
        manager
    }

    #[test]
    fn hover_falls_back_to_normal_per_entry() {
        let mut shapes = manager();
        shapes
            .palette_mut()
            .set_stroke("stroke", PointState::Normal, Some(Stroke::new(Color::rgb(0.0, 0.0, 0.0), 1.0)));
        let id = shapes.add_shapes_group(PointState::Hover, Some(3), 10.0);
        let group = shapes.group(id).expect("group exists");
        assert_eq!(group.get("fill").and_then(|shape| shape.fill), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert!(group.get("stroke").and_then(|shape| shape.stroke).is_some());
        assert_eq!(group.get("stroke").map(|shape| shape.z_index), Some(13.0));
    }

    #[test]
    fn requirement_mismatch_is_reported() {
        let shapes = manager();
        let reporter = RecordingReporter::new();
        assert!(shapes.check_requirements(&[("stroke", ShapeType::Path)]));
        assert!(!shapes.validate_requirements(
            "Series 0",
            "line",
            &[("stroke", ShapeType::Rect)],
            &reporter,
        ));
        assert_eq!(reporter.count_errors(ErrorCode::WrongShapesConfig), 1);
    }

    #[test]
    fn only_subset_and_z_update() {
        let mut shapes = manager();
        let id = shapes.get_shapes_group(PointState::Normal, Some(&["stroke", "missing"][..]), None, 0.0);
        assert_eq!(shapes.group(id).map(|group| group.shapes.len()), Some(1));
        shapes.update_z_index(id, 5.0);
        assert_eq!(shapes.group(id).and_then(|group| group.get("stroke")).map(|shape| shape.z_index), Some(8.0));
    }
}
