use std::cell::OnceCell;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::primitives::{datetime_to_millis, millis_to_datetime};
use crate::core::{ConsistencyState, Invalidatable, Signal, SignalMask, StateMask, StatefulCore};
use crate::error::{ChartError, ChartResult};
use crate::scales::interpolation::{PieceType, SegmentInterpolator};

/// Piecewise continuous scale mapping a domain onto an output range.
///
/// Each of the `domain.len() - 1` segments has its own [`PieceType`]. Values
/// outside the domain extrapolate through the first or last segment.
#[derive(Debug)]
pub struct ContinuousScale {
    core: StatefulCore,
    domain: Vec<f64>,
    range: Vec<f64>,
    piece_types: Vec<PieceType>,
    compiled: OnceCell<CompiledTransform>,
}

impl ContinuousScale {
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: StatefulCore::new(
                "continuous_scale",
                StateMask::from_state(ConsistencyState::ScaleRecalculation),
                SignalMask::from_signal(Signal::NeedsReapplication),
            ),
            domain: vec![0.0, 1.0],
            range: vec![0.0, 1.0],
            piece_types: vec![PieceType::Linear],
            compiled: OnceCell::new(),
        }
    }

    /// Builds a scale in one step; `piece_types` may be empty for all-linear.
    pub fn with_mapping(
        domain: Vec<f64>,
        range: Vec<f64>,
        piece_types: Vec<PieceType>,
    ) -> ChartResult<Self> {
        let mut scale = Self::new();
        scale.configure(domain, range, piece_types)?;
        Ok(scale)
    }

    #[must_use]
    pub fn domain(&self) -> &[f64] {
        &self.domain
    }

    #[must_use]
    pub fn range(&self) -> &[f64] {
        &self.range
    }

    #[must_use]
    pub fn piece_types(&self) -> &[PieceType] {
        &self.piece_types
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.domain.len() - 1
    }

    /// Replaces domain, range and piece types together.
    pub fn configure(
        &mut self,
        domain: Vec<f64>,
        range: Vec<f64>,
        piece_types: Vec<PieceType>,
    ) -> ChartResult<()> {
        validate_bounds("domain", &domain)?;
        validate_bounds("range", &range)?;
        if domain.len() != range.len() {
            return Err(ChartError::InvalidData(format!(
                "scale range must have {} values to match the domain, got {}",
                domain.len(),
                range.len()
            )));
        }
        let piece_types = normalize_piece_types(piece_types, domain.len() - 1)?;
        validate_log_segments(&domain, &piece_types)?;

        self.domain = domain;
        self.range = range;
        self.piece_types = piece_types;
        self.drop_compiled();
        Ok(())
    }

    pub fn set_domain(&mut self, domain: Vec<f64>) -> ChartResult<()> {
        let range = self.range.clone();
        let pieces = self.piece_types.clone();
        self.configure(domain, range, pieces)
    }

    pub fn set_range(&mut self, range: Vec<f64>) -> ChartResult<()> {
        let domain = self.domain.clone();
        let pieces = self.piece_types.clone();
        self.configure(domain, range, pieces)
    }

    pub fn set_piece_types(&mut self, piece_types: Vec<PieceType>) -> ChartResult<()> {
        let domain = self.domain.clone();
        let range = self.range.clone();
        self.configure(domain, range, piece_types)
    }

    fn drop_compiled(&mut self) {
        self.compiled = OnceCell::new();
        self.core.invalidate(
            ConsistencyState::ScaleRecalculation,
            Signal::NeedsReapplication,
        );
    }

    /// Whether the cached transform pair is currently built.
    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    fn compiled(&self) -> &CompiledTransform {
        self.compiled.get_or_init(|| {
            debug!(
                segments = self.piece_types.len(),
                "compile continuous scale transform"
            );
            self.core
                .mark_consistent(ConsistencyState::ScaleRecalculation);
            CompiledTransform::build(&self.domain, &self.range, &self.piece_types)
        })
    }

    #[must_use]
    pub fn transform(&self, value: f64) -> f64 {
        self.compiled().transform(value)
    }

    #[must_use]
    pub fn inverse_transform(&self, ratio: f64) -> f64 {
        self.compiled().inverse_transform(ratio)
    }

    #[must_use]
    pub fn transform_time(&self, time: DateTime<Utc>) -> f64 {
        self.transform(datetime_to_millis(time))
    }

    #[must_use]
    pub fn inverse_transform_time(&self, ratio: f64) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.inverse_transform(ratio))
    }

    /// Transforms a batch of values with one compiled transform.
    #[must_use]
    pub fn transform_batch(&self, values: &[f64]) -> Vec<f64> {
        let compiled = self.compiled();

        #[cfg(feature = "parallel-transform")]
        {
            use rayon::prelude::*;
            return values
                .par_iter()
                .map(|value| compiled.transform(*value))
                .collect();
        }

        #[cfg(not(feature = "parallel-transform"))]
        {
            values
                .iter()
                .map(|value| compiled.transform(*value))
                .collect()
        }
    }
}

impl Default for ContinuousScale {
    fn default() -> Self {
        Self::new()
    }
}

impl Invalidatable for ContinuousScale {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

#[derive(Debug, Clone)]
struct CompiledTransform {
    domain: Vec<f64>,
    range: Vec<f64>,
    forward: Vec<SegmentInterpolator>,
    backward: Vec<SegmentInterpolator>,
    range_ascending: bool,
}

impl CompiledTransform {
    fn build(domain: &[f64], range: &[f64], piece_types: &[PieceType]) -> Self {
        let mut domain = domain.to_vec();
        let mut range = range.to_vec();
        let mut piece_types = piece_types.to_vec();
        if domain[0] > domain[domain.len() - 1] {
            domain.reverse();
            range.reverse();
            piece_types.reverse();
        }

        let forward = domain
            .windows(2)
            .zip(&piece_types)
            .map(|(bounds, kind)| SegmentInterpolator::new(*kind, bounds[0], bounds[1]))
            .collect();
        let backward = range
            .windows(2)
            .map(|bounds| SegmentInterpolator::new(PieceType::Linear, bounds[0], bounds[1]))
            .collect();
        let range_ascending = range[0] <= range[range.len() - 1];

        Self {
            domain,
            range,
            forward,
            backward,
            range_ascending,
        }
    }

    fn transform(&self, value: f64) -> f64 {
        let index = segment_index(&self.domain, value, true);
        self.backward[index].deinterpolate(self.forward[index].interpolate(value))
    }

    fn inverse_transform(&self, ratio: f64) -> f64 {
        let index = segment_index(&self.range, ratio, self.range_ascending);
        self.forward[index].deinterpolate(self.backward[index].interpolate(ratio))
    }
}

/// Binary search for the segment containing `value`, clamped so values
/// outside the bounds land in the first or last segment.
fn segment_index(bounds: &[f64], value: f64, ascending: bool) -> usize {
    let segments = bounds.len() - 1;
    if segments == 1 {
        return 0;
    }
    let insertion = if ascending {
        bounds.partition_point(|bound| *bound < value)
    } else {
        bounds.partition_point(|bound| *bound > value)
    };
    insertion.clamp(1, segments) - 1
}

fn validate_bounds(name: &str, values: &[f64]) -> ChartResult<()> {
    if values.len() < 2 {
        return Err(ChartError::InvalidData(format!(
            "scale {name} must contain at least two values"
        )));
    }
    if values.iter().any(|value| !value.is_finite()) {
        return Err(ChartError::InvalidData(format!(
            "scale {name} values must be finite"
        )));
    }
    let ascending = values.windows(2).all(|pair| pair[0] <= pair[1]);
    let descending = values.windows(2).all(|pair| pair[0] >= pair[1]);
    if !ascending && !descending {
        return Err(ChartError::InvalidData(format!(
            "scale {name} must be monotonic"
        )));
    }
    Ok(())
}

fn normalize_piece_types(
    piece_types: Vec<PieceType>,
    segments: usize,
) -> ChartResult<Vec<PieceType>> {
    if piece_types.is_empty() {
        return Ok(vec![PieceType::Linear; segments]);
    }
    if piece_types.len() != segments {
        return Err(ChartError::InvalidData(format!(
            "scale needs {segments} piece types, got {}",
            piece_types.len()
        )));
    }
    Ok(piece_types)
}

fn validate_log_segments(domain: &[f64], piece_types: &[PieceType]) -> ChartResult<()> {
    for (bounds, kind) in domain.windows(2).zip(piece_types) {
        if *kind != PieceType::Log {
            continue;
        }
        let (a, b) = (bounds[0], bounds[1]);
        if a == 0.0 || b == 0.0 || (a < 0.0) != (b < 0.0) {
            return Err(ChartError::InvalidData(
                "log scale segment must not contain zero".to_owned(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn transform_is_lazy_and_dropped_on_change() {
        let mut scale =
            ContinuousScale::with_mapping(vec![0.0, 10.0], vec![0.0, 1.0], Vec::new())
                .expect("valid mapping");
        assert!(!scale.is_compiled());
        assert_relative_eq!(scale.transform(5.0), 0.5);
        assert!(scale.is_compiled());

        scale.set_domain(vec![0.0, 20.0]).expect("valid domain");
        assert!(!scale.is_compiled());
        assert_relative_eq!(scale.transform(5.0), 0.25);
    }

    #[test]
    fn segment_search_clamps_outside_values() {
        assert_eq!(segment_index(&[0.0, 1.0, 2.0, 3.0], -5.0, true), 0);
        assert_eq!(segment_index(&[0.0, 1.0, 2.0, 3.0], 1.5, true), 1);
        assert_eq!(segment_index(&[0.0, 1.0, 2.0, 3.0], 2.0, true), 1);
        assert_eq!(segment_index(&[0.0, 1.0, 2.0, 3.0], 9.0, true), 2);
        assert_eq!(segment_index(&[3.0, 2.0, 1.0, 0.0], 2.5, false), 0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let result = ContinuousScale::with_mapping(vec![0.0, 1.0, 2.0], vec![0.0, 1.0], Vec::new());
        assert!(result.is_err());
    }
}
