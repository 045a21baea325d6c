use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::api::config::ChartConfig;
use crate::core::{
    Boundable, ConsistencyState, Drawable, EntityId, Invalidatable, ListenerKey, Rect,
    SharedReporter, Signal, SignalEvent, SignalMask, StateMask, StatefulCore, WeakStatefulCore,
    default_reporter,
};
use crate::error::{ChartError, ChartResult};
use crate::geometry::{Axis, AxisMarker};
use crate::render::{Path, PathSink, PointState, RenderFrame, Renderer, Shape, ShapeType};
use crate::scales::ScaleRef;
use crate::series::{DrawerKind, DrawerRegistry, Series, StackAccumulator};

const CHART_STATES: StateMask = StateMask::VISUAL
    .with(ConsistencyState::ScaleRecalculation)
    .with(ConsistencyState::ChartSeries)
    .with(ConsistencyState::ChartAxes);

/// States a change in the series list dirties.
const SERIES_LAYOUT: StateMask = StateMask::none()
    .with(ConsistencyState::ZIndex)
    .with(ConsistencyState::Bounds)
    .with(ConsistencyState::PixelBounds)
    .with(ConsistencyState::ScaleRecalculation)
    .with(ConsistencyState::ChartSeries);

/// Chart states a child signal dirties.
fn chart_states_for(signals: SignalMask) -> StateMask {
    let mut states = StateMask::none();
    if signals.contains_signal(Signal::NeedsRedraw) {
        states |= ConsistencyState::Appearance | ConsistencyState::ZIndex;
    }
    if signals.contains_signal(Signal::EnabledStateChanged) {
        states |= ConsistencyState::PixelBounds | ConsistencyState::ScaleRecalculation;
    }
    if signals.contains_signal(Signal::BoundsChanged) {
        states |= ConsistencyState::Bounds;
    }
    if signals.intersects(Signal::NeedsRecalculation | Signal::NeedsReapplication) {
        states |= ConsistencyState::ScaleRecalculation;
    }
    states
}

fn forward_to(chart: WeakStatefulCore) -> impl Fn(&SignalEvent) + 'static {
    move |event| {
        if let Some(chart) = chart.upgrade() {
            let states = chart_states_for(event.signals);
            if !states.is_none() {
                chart.invalidate(states, Signal::NeedsRedraw);
            }
        }
    }
}

struct Subscription {
    core: StatefulCore,
    key: ListenerKey,
}

impl Subscription {
    fn cancel(self) {
        self.core.unlisten_signals(self.key);
    }
}

/// Composition root: owns the series, axes and markers of one chart, keeps
/// the shared scales in sync with the data and runs the ordered draw pass.
pub struct Chart<R: Renderer> {
    core: StatefulCore,
    renderer: R,
    reporter: SharedReporter,
    config: ChartConfig,
    registry: DrawerRegistry,
    series: Vec<Series>,
    axes: Vec<Axis>,
    markers: Vec<AxisMarker>,
    entity_listeners: IndexMap<EntityId, Subscription>,
    scale_listeners: IndexMap<EntityId, Subscription>,
    background: Option<Shape>,
    draw_order: Vec<usize>,
    last_pass: Vec<ConsistencyState>,
}

impl<R: Renderer> Chart<R> {
    pub fn new(renderer: R, config: ChartConfig) -> ChartResult<Self> {
        Self::with_reporter(renderer, config, default_reporter())
    }

    pub fn with_reporter(renderer: R, config: ChartConfig, reporter: SharedReporter) -> ChartResult<Self> {
        Self::with_registry(renderer, config, reporter, DrawerRegistry::with_defaults())
    }

    /// Chart resolving drawer kinds through `registry`; configured series
    /// are created from it right away.
    pub fn with_registry(
        renderer: R,
        config: ChartConfig,
        reporter: SharedReporter,
        registry: DrawerRegistry,
    ) -> ChartResult<Self> {
        config.validate()?;
        let mut chart = Self {
            core: StatefulCore::new("chart", CHART_STATES, SignalMask::all()),
            renderer,
            reporter,
            config,
            registry,
            series: Vec::new(),
            axes: Vec::new(),
            markers: Vec::new(),
            entity_listeners: IndexMap::new(),
            scale_listeners: IndexMap::new(),
            background: None,
            draw_order: Vec::new(),
            last_pass: Vec::new(),
        };
        let configured = chart.config.series.clone();
        for series_config in configured {
            let index = chart.create_series(series_config.kind, series_config.name)?;
            if let Some(series) = chart.series.get_mut(index) {
                series.set_settings(series_config.settings);
            }
        }
        chart.core.invalidate(CHART_STATES, Signal::NeedsRedraw);
        Ok(chart)
    }

    #[must_use]
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &DrawerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DrawerRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Resizes the container.
    pub fn resize(&mut self, width: f64, height: f64) -> ChartResult<()> {
        let mut config = self.config.clone();
        config.width = width;
        config.height = height;
        config.validate()?;
        if config != self.config {
            self.config = config;
            self.core.invalidate(
                ConsistencyState::Container | ConsistencyState::Bounds | ConsistencyState::PixelBounds,
                Signal::BoundsChanged | Signal::NeedsRedraw,
            );
        }
        Ok(())
    }

    fn listen_entity(&mut self, core: &StatefulCore) {
        let key = core.listen_signals(SignalMask::all(), forward_to(self.core.downgrade()));
        self.entity_listeners.insert(
            core.id(),
            Subscription {
                core: core.clone(),
                key,
            },
        );
    }

    fn forget_entity(&mut self, core: &StatefulCore) {
        if let Some(subscription) = self.entity_listeners.shift_remove(&core.id()) {
            subscription.cancel();
        }
    }

    /// Adds a series and returns its index.
    pub fn add_series(&mut self, series: Series) -> usize {
        self.listen_entity(series.core());
        debug!(series = series.name(), kind = %series.kind(), "series added");
        self.series.push(series);
        self.sync_scale_listeners();
        self.core.invalidate(SERIES_LAYOUT, Signal::NeedsRedraw);
        self.series.len() - 1
    }

    /// Creates a series of `kind` from the registry.
    pub fn create_series(&mut self, kind: DrawerKind, name: impl Into<String>) -> ChartResult<usize> {
        let series = Series::from_registry(&self.registry, kind, name, self.reporter.clone())?;
        Ok(self.add_series(series))
    }

    pub fn remove_series(&mut self, index: usize) -> Option<Series> {
        if index >= self.series.len() {
            return None;
        }
        let series = self.series.remove(index);
        self.forget_entity(series.core());
        self.sync_scale_listeners();
        self.core.invalidate(SERIES_LAYOUT, Signal::NeedsRedraw);
        Some(series)
    }

    #[must_use]
    pub fn series(&self, index: usize) -> Option<&Series> {
        self.series.get(index)
    }

    /// Mutable series access. Scales swapped through it are picked up by
    /// the next draw pass.
    pub fn series_mut(&mut self, index: usize) -> Option<&mut Series> {
        self.series.get_mut(index)
    }

    #[must_use]
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn add_axis(&mut self, axis: Axis) -> usize {
        self.listen_entity(axis.core());
        self.axes.push(axis);
        self.sync_scale_listeners();
        self.core.invalidate(
            ConsistencyState::ChartAxes | ConsistencyState::Bounds,
            Signal::NeedsRedraw,
        );
        self.axes.len() - 1
    }

    #[must_use]
    pub fn axis(&self, index: usize) -> Option<&Axis> {
        self.axes.get(index)
    }

    pub fn axis_mut(&mut self, index: usize) -> Option<&mut Axis> {
        self.axes.get_mut(index)
    }

    pub fn add_marker(&mut self, marker: AxisMarker) -> usize {
        self.listen_entity(marker.core());
        self.markers.push(marker);
        self.sync_scale_listeners();
        self.core.invalidate(
            ConsistencyState::ChartAxes | ConsistencyState::Bounds,
            Signal::NeedsRedraw,
        );
        self.markers.len() - 1
    }

    #[must_use]
    pub fn marker(&self, index: usize) -> Option<&AxisMarker> {
        self.markers.get(index)
    }

    pub fn marker_mut(&mut self, index: usize) -> Option<&mut AxisMarker> {
        self.markers.get_mut(index)
    }

    fn scales(&self) -> Vec<ScaleRef> {
        let mut scales: Vec<ScaleRef> = Vec::new();
        let mut push = |scale: Option<&ScaleRef>| {
            if let Some(scale) = scale {
                if !scales.iter().any(|known| known.same_scale(scale)) {
                    scales.push(scale.clone());
                }
            }
        };
        for series in &self.series {
            push(series.x_scale());
            push(series.y_scale());
        }
        for axis in &self.axes {
            push(axis.scale());
        }
        for marker in &self.markers {
            push(marker.scale());
        }
        scales
    }

    /// Listens to every scale in use exactly once and drops listeners of
    /// scales no longer referenced.
    fn sync_scale_listeners(&mut self) {
        let cores: Vec<StatefulCore> = self.scales().iter().map(ScaleRef::core).collect();
        let stale: Vec<EntityId> = self
            .scale_listeners
            .keys()
            .filter(|id| !cores.iter().any(|core| core.id() == **id))
            .copied()
            .collect();
        for id in stale {
            if let Some(subscription) = self.scale_listeners.shift_remove(&id) {
                subscription.cancel();
            }
        }
        for core in cores {
            if self.scale_listeners.contains_key(&core.id()) {
                continue;
            }
            let key = core.listen_signals(
                Signal::NeedsRecalculation | Signal::NeedsReapplication,
                forward_to(self.core.downgrade()),
            );
            self.scale_listeners.insert(core.id(), Subscription { core, key });
        }
    }

    /// States resolved by the last draw pass, in resolution order.
    #[must_use]
    pub fn last_pass(&self) -> &[ConsistencyState] {
        &self.last_pass
    }

    /// True when the chart or any child has pending invalidation.
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        !self.core.is_consistent()
            || self.series.iter().any(|series| !series.is_consistent())
            || self.axes.iter().any(|axis| !axis.is_consistent())
            || self.markers.iter().any(|marker| !marker.is_consistent())
    }

    /// Runs the full draw pass and hands the frame to the renderer.
    ///
    /// Signals raised by children while the pass runs are resolved by the
    /// pass itself and are not re-dispatched to chart listeners.
    pub fn draw(&mut self) -> ChartResult<RenderFrame> {
        self.core.suspend_dispatching();
        let result = self.draw_pass();
        self.core.resume_dispatching(false);
        let frame = result?;
        self.renderer.render(&frame)?;
        Ok(frame)
    }

    /// Draws only when something changed since the last pass.
    pub fn draw_if_invalidated(&mut self) -> ChartResult<Option<RenderFrame>> {
        if !self.needs_redraw() {
            trace!("chart consistent, draw skipped");
            return Ok(None);
        }
        self.draw().map(Some)
    }

    fn draw_pass(&mut self) -> ChartResult<RenderFrame> {
        self.sync_scale_listeners();
        self.last_pass.clear();
        for state in ConsistencyState::DRAW_ORDER {
            if self.core.has_invalidation_state(state) {
                self.resolve(state)?;
                self.core.mark_consistent(state);
                self.last_pass.push(state);
            }
        }
        if self
            .core
            .has_invalidation_state(ConsistencyState::ScaleRecalculation | ConsistencyState::ChartSeries)
            || self.series.iter().any(|series| series.has_invalidation_state(ConsistencyState::Data))
        {
            self.recalculate_scales();
        }

        let mut frame = RenderFrame::new(self.config.container());
        if let Some(background) = &self.background {
            frame.push_shape(background.clone());
        }
        for &index in &self.draw_order {
            if let Some(series) = self.series.get_mut(index) {
                series.draw(&mut frame)?;
            }
        }
        for axis in &mut self.axes {
            axis.draw(&mut frame)?;
        }
        for marker in &mut self.markers {
            marker.draw(&mut frame)?;
        }
        frame.sort_by_z_index();
        self.core.mark_consistent(CHART_STATES);
        debug!(
            shapes = frame.shapes.len(),
            texts = frame.texts.len(),
            resolved = self.last_pass.len(),
            "chart frame built"
        );
        Ok(frame)
    }

    fn resolve(&mut self, state: ConsistencyState) -> ChartResult<()> {
        match state {
            ConsistencyState::Appearance => {
                self.background = self.config.background.map(|fill| {
                    let mut path = Path::new();
                    path.rect(self.config.container());
                    Shape {
                        name: "background".to_owned(),
                        shape_type: ShapeType::Rect,
                        state: PointState::Normal,
                        z_index: f64::MIN,
                        fill: Some(fill),
                        stroke: None,
                        is_hatch_fill: false,
                        path,
                    }
                });
            }
            ConsistencyState::Container => {
                self.config.container().validate()?;
            }
            ConsistencyState::ZIndex => {
                let mut order: Vec<usize> = (0..self.series.len()).collect();
                order.sort_by(|a, b| {
                    let za = self.series[*a].settings().z_index();
                    let zb = self.series[*b].settings().z_index();
                    za.total_cmp(&zb)
                });
                self.draw_order = order;
            }
            ConsistencyState::Bounds => {
                let plot = self.config.plot_bounds();
                for series in &mut self.series {
                    series.set_bounds(plot)?;
                }
                for marker in &mut self.markers {
                    marker.set_bounds(plot)?;
                }
                for axis in &mut self.axes {
                    let area = self.config.insets.axis_area(axis.orientation(), plot);
                    if area.is_valid() {
                        axis.set_bounds(area)?;
                    }
                }
            }
            ConsistencyState::PixelBounds => {
                let three_d: Vec<usize> = self
                    .series
                    .iter()
                    .enumerate()
                    .filter(|(_, series)| series.is_enabled() && series.capabilities().is_3d_based())
                    .map(|(index, _)| index)
                    .collect();
                let count = three_d.len();
                for (slot, index) in three_d.into_iter().enumerate() {
                    let shift = self.config.three_d.shift_for(count, slot);
                    self.series[index].set_three_d(shift);
                }
            }
            other => {
                return Err(ChartError::InvalidData(format!(
                    "`{other:?}` is not a draw pass state"
                )));
            }
        }
        trace!(state = ?state, "chart state resolved");
        Ok(())
    }

    /// Restacks the series and refits the scales to the data.
    ///
    /// Linear scales are reset and extended with the values of every enabled
    /// series; ordinal scales only grow with new keys, so categories keep
    /// their positions.
    fn recalculate_scales(&mut self) {
        let mut stacks: IndexMap<EntityId, StackAccumulator> = IndexMap::new();
        for series in &mut self.series {
            match series.y_scale().map(ScaleRef::core) {
                Some(core) if series.is_enabled() && series.is_stacked() => {
                    let stack = stacks.entry(core.id()).or_default();
                    series.apply_stack(stack);
                }
                _ => series.clear_stack(),
            }
        }

        let scales = self.scales();
        for scale in &scales {
            if let ScaleRef::Linear(linear) = scale {
                linear.borrow_mut().reset_data_range();
            }
        }
        let mut grown: Vec<StatefulCore> = Vec::new();
        for series in self.series.iter().filter(|series| series.is_enabled()) {
            if let Some(scale) = series.x_scale() {
                match scale {
                    ScaleRef::Ordinal(ordinal) => {
                        let grew = {
                            let mut ordinal = ordinal.borrow_mut();
                            let before = ordinal.count();
                            ordinal.extend_data_range(series.x_keys());
                            ordinal.count() != before
                        };
                        if grew {
                            grown.push(scale.core());
                        }
                    }
                    ScaleRef::Linear(linear) => {
                        let numbers = series.x_keys().into_iter().filter_map(|key| key.as_number());
                        linear.borrow_mut().extend_data_range(numbers);
                    }
                    ScaleRef::Continuous(_) => {}
                }
            }
            if let Some(ScaleRef::Linear(linear)) = series.y_scale() {
                linear.borrow_mut().extend_data_range(series.y_range_values());
            }
        }
        for scale in &scales {
            match scale {
                ScaleRef::Linear(linear) => {
                    linear.borrow().check_scale_changed(false);
                }
                ScaleRef::Ordinal(_) | ScaleRef::Continuous(_) => {}
            }
        }
        for core in grown {
            core.invalidate(ConsistencyState::ScaleRecalculation, Signal::NeedsReapplication);
        }
        debug!(scales = scales.len(), stacks = stacks.len(), "chart scales recalculated");
    }

    /// Detaches every listener the chart installed.
    pub fn dispose(&mut self) {
        for (_, subscription) in self.entity_listeners.drain(..) {
            subscription.cancel();
        }
        for (_, subscription) in self.scale_listeners.drain(..) {
            subscription.cancel();
        }
        self.core.dispose();
    }
}

impl<R: Renderer> Invalidatable for Chart<R> {
    fn core(&self) -> &StatefulCore {
        &self.core
    }
}

impl<R: Renderer> Boundable for Chart<R> {
    fn bounds(&self) -> Option<Rect> {
        Some(self.config.container())
    }

    /// Only the size is kept; the container always starts at the origin.
    fn set_bounds(&mut self, bounds: Rect) -> ChartResult<()> {
        let bounds = bounds.validate()?;
        self.resize(bounds.width, bounds.height)
    }
}

impl<R: Renderer> fmt::Debug for Chart<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chart")
            .field("config", &self.config)
            .field("series", &self.series)
            .field("axes", &self.axes)
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::render::NullRenderer;
    use crate::scales::{LinearScale, OrdinalScale};
    use crate::series::DataPoint;

    fn chart_with_columns() -> Chart<NullRenderer> {
        let mut chart = Chart::new(NullRenderer::default(), ChartConfig::new(300.0, 200.0))
            .expect("valid config");
        let index = chart
            .create_series(DrawerKind::Column, "columns")
            .expect("default drawer");
        let series = chart.series_mut(index).expect("series exists");
        series
            .set_x_scale(ScaleRef::ordinal(OrdinalScale::new()))
            .set_y_scale(ScaleRef::linear(LinearScale::new()));
        series.set_data(vec![DataPoint::new("a", 2.0), DataPoint::new("b", 8.0)]);
        chart
    }

    #[test]
    fn first_pass_resolves_every_state_in_order() {
        let mut chart = chart_with_columns();
        let frame = chart.draw().expect("draw pass");
        assert_eq!(chart.last_pass(), &ConsistencyState::DRAW_ORDER);
        assert!(!frame.is_empty());
        assert!(chart.is_consistent());
        assert_eq!(chart.renderer().frames_rendered, 1);
    }

    #[test]
    fn consistent_chart_skips_drawing() {
        let mut chart = chart_with_columns();
        chart.draw().expect("draw pass");
        assert!(chart.draw_if_invalidated().expect("gate").is_none());

        chart.resize(400.0, 200.0).expect("valid size");
        assert!(chart.draw_if_invalidated().expect("gate").is_some());
        assert_eq!(
            chart.last_pass(),
            &[
                ConsistencyState::Container,
                ConsistencyState::Bounds,
                ConsistencyState::PixelBounds
            ]
        );
    }

    #[test]
    fn ordinal_scale_collects_series_keys() {
        let mut chart = chart_with_columns();
        chart.draw().expect("draw pass");
        let series = chart.series(0).expect("series exists");
        let Some(ScaleRef::Ordinal(ordinal)) = series.x_scale() else {
            panic!("ordinal x scale expected");
        };
        assert_eq!(ordinal.borrow().count(), 2);
        assert_eq!(series.points().len(), 2);
    }

    #[test]
    fn series_changes_reach_chart_listeners() {
        let mut chart = chart_with_columns();
        chart.draw().expect("draw pass");
        let redraws = Rc::new(Cell::new(0));
        let counter = redraws.clone();
        chart.listen_signals(Signal::NeedsRedraw, move |_| counter.set(counter.get() + 1));

        let series = chart.series_mut(0).expect("series exists");
        series.set_data(vec![DataPoint::new("c", 1.0)]);
        let notified = redraws.get();
        assert!(notified >= 1);
        assert!(chart.has_invalidation_state(ConsistencyState::ScaleRecalculation));

        let frames = chart.renderer().frames_rendered;
        chart.draw().expect("draw pass");
        assert_eq!(redraws.get(), notified);
        assert_eq!(chart.renderer().frames_rendered, frames + 1);
    }
}
