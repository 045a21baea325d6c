use chart_kernel::core::{ConsistencyState, Invalidatable};
use chart_kernel::geometry::{Axis, AxisMarker, AxisOrientation};
use chart_kernel::render::{Color, NullRenderer};
use chart_kernel::scales::{LinearScale, OrdinalScale, ScaleRef};
use chart_kernel::series::{DataPoint, DrawerKind};
use chart_kernel::{Chart, ChartConfig, SeriesConfig};

fn shared_scales() -> (ScaleRef, ScaleRef) {
    (
        ScaleRef::ordinal(OrdinalScale::new()),
        ScaleRef::linear(LinearScale::new()),
    )
}

fn quarterly(offset: f64) -> Vec<DataPoint> {
    vec![
        DataPoint::new("q1", 1.0 + offset),
        DataPoint::new("q2", 4.0 + offset),
        DataPoint::new("q3", 2.0 + offset),
    ]
}

fn three_d_chart() -> Chart<NullRenderer> {
    let config = ChartConfig::new(400.0, 300.0)
        .with_series(SeriesConfig::new("north", DrawerKind::Column3d))
        .with_series(SeriesConfig::new("south", DrawerKind::Column3d))
        .with_series(SeriesConfig::new("trend", DrawerKind::Line));
    let mut chart = Chart::new(NullRenderer::default(), config).expect("valid config");
    let (x, y) = shared_scales();
    for index in 0..chart.series_count() {
        let series = chart.series_mut(index).expect("configured series");
        series.set_x_scale(x.clone()).set_y_scale(y.clone());
        series.set_data(quarterly(index as f64));
    }
    chart
}

#[test]
fn configured_series_are_created_from_the_registry() {
    let chart = three_d_chart();
    assert_eq!(chart.series_count(), 3);
    assert_eq!(
        chart.series(0).map(|series| series.kind()),
        Some(DrawerKind::Column3d)
    );
    assert_eq!(chart.series(2).map(|series| series.name()), Some("trend"));
}

#[test]
fn three_d_depth_is_split_between_enabled_series() {
    let mut chart = three_d_chart();
    chart.draw().expect("draw pass");

    let north = chart.series(0).expect("series").three_d();
    let south = chart.series(1).expect("series").three_d();
    assert_eq!((north.series_count, north.series_index), (2, 0));
    assert_eq!((south.series_count, south.series_index), (2, 1));
    assert_eq!(chart.series(2).expect("series").three_d().series_count, 1);

    chart
        .series_mut(1)
        .expect("series")
        .configure(|settings, core| settings.set_enabled(core, false));
    assert!(chart.has_invalidation_state(ConsistencyState::PixelBounds));
    chart.draw().expect("draw pass");

    let north = chart.series(0).expect("series").three_d();
    assert_eq!((north.series_count, north.series_index), (1, 0));
}

#[test]
fn shared_scales_fit_every_series() {
    let mut chart = three_d_chart();
    chart.draw().expect("draw pass");

    let series = chart.series(2).expect("series");
    let Some(ScaleRef::Linear(y)) = series.y_scale() else {
        panic!("linear y scale expected");
    };
    let y = y.borrow();
    assert!(y.minimum() <= 0.0);
    assert!(y.maximum() >= 6.0);

    let Some(ScaleRef::Ordinal(x)) = series.x_scale() else {
        panic!("ordinal x scale expected");
    };
    assert_eq!(x.borrow().count(), 3);
}

#[test]
fn axes_and_markers_join_the_frame() {
    let mut chart = three_d_chart();
    let y = chart
        .series(0)
        .and_then(|series| series.y_scale().cloned())
        .expect("y scale");
    let x = chart
        .series(0)
        .and_then(|series| series.x_scale().cloned())
        .expect("x scale");

    let mut bottom = Axis::new();
    bottom.set_scale(x);
    chart.add_axis(bottom);
    let mut left = Axis::new();
    left.configure(|settings, core| settings.set_orientation(core, AxisOrientation::Left));
    left.set_scale(y.clone());
    chart.add_axis(left);
    let mut marker = AxisMarker::new();
    marker.set_scale(y);
    marker.configure(|settings, core| settings.set_value(core, 3.0));
    chart.add_marker(marker);

    let frame = chart.draw().expect("draw pass");

    assert!(frame.shapes.iter().any(|shape| shape.name == "marker"));
    assert!(frame.texts.iter().any(|text| text.text == "q2"));
    assert!(chart.marker(0).and_then(AxisMarker::line).is_some());
    assert!(
        frame
            .shapes
            .windows(2)
            .all(|pair| pair[0].z_index <= pair[1].z_index)
    );
}

#[test]
fn redraw_happens_only_after_changes() {
    let mut chart = three_d_chart();
    assert!(chart.draw_if_invalidated().expect("gate").is_some());
    assert!(chart.draw_if_invalidated().expect("gate").is_none());
    assert_eq!(chart.renderer().frames_rendered, 1);

    chart
        .series_mut(2)
        .expect("series")
        .set_data(quarterly(10.0));
    assert!(chart.draw_if_invalidated().expect("gate").is_some());
    assert_eq!(chart.renderer().frames_rendered, 2);
}

#[test]
fn background_is_drawn_below_everything() {
    let config = ChartConfig::new(200.0, 100.0).with_background(Color::rgb(1.0, 1.0, 1.0));
    let mut chart = Chart::new(NullRenderer::default(), config).expect("valid config");

    let frame = chart.draw().expect("draw pass");

    assert_eq!(frame.shapes.len(), 1);
    assert_eq!(frame.shapes[0].name, "background");
}

#[test]
fn every_default_drawer_renders() {
    let mut chart = Chart::new(NullRenderer::default(), ChartConfig::default()).expect("valid config");
    let (x, y) = shared_scales();
    for kind in DrawerKind::ALL {
        let index = chart.create_series(kind, kind.to_string()).expect("default drawer");
        let data = match kind {
            DrawerKind::Ohlc => vec![
                DataPoint::ohlc("a", 2.0, 5.0, 1.0, 4.0),
                DataPoint::ohlc("b", 4.0, 6.0, 2.0, 3.0),
            ],
            _ => vec![DataPoint::new("a", 2.0), DataPoint::new("b", 5.0)],
        };
        let series = chart.series_mut(index).expect("created series");
        series.set_x_scale(x.clone()).set_y_scale(y.clone());
        series.set_data(data);
    }

    let frame = chart.draw().expect("draw pass");

    assert_eq!(chart.series_count(), DrawerKind::ALL.len());
    assert!(!frame.shapes.is_empty());
    assert_eq!(chart.renderer().last_shape_count, frame.shapes.len());
}

#[test]
fn unknown_drawer_kinds_fail_to_create() {
    let mut chart = Chart::new(NullRenderer::default(), ChartConfig::default()).expect("valid config");
    chart.registry_mut().unregister(DrawerKind::Spline);

    assert!(chart.create_series(DrawerKind::Spline, "curve").is_err());
    assert_eq!(chart.series_count(), 0);
}

#[test]
fn invalid_sizes_are_rejected() {
    let mut chart = Chart::new(NullRenderer::default(), ChartConfig::default()).expect("valid config");
    assert!(chart.resize(10.0, 10.0).is_err());
    assert_eq!(chart.config().width, 800.0);
    assert!(Chart::new(NullRenderer::default(), ChartConfig::new(0.0, 100.0)).is_err());
}
