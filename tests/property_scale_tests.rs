use chart_kernel::scales::{ContinuousScale, LinearScale, OrdinalScale, PieceType};
use proptest::prelude::*;

proptest! {
    #[test]
    fn linear_segment_round_trip_property(
        start in -1_000_000.0f64..1_000_000.0,
        span in 0.001f64..1_000_000.0,
        factor in 0.001f64..0.999
    ) {
        let end = start + span;
        let value = start + factor * span;
        let scale = ContinuousScale::with_mapping(vec![start, end], vec![0.0, 1.0], Vec::new())
            .expect("valid mapping");

        let recovered = scale.inverse_transform(scale.transform(value));

        prop_assert!((recovered - value).abs() <= 1e-7 * value.abs().max(1.0));
    }

    #[test]
    fn log_segment_round_trip_property(
        start in 0.001f64..1_000.0,
        ratio in 1.01f64..10_000.0,
        factor in 0.001f64..0.999
    ) {
        let end = start * ratio;
        let value = start + factor * (end - start);
        let scale = ContinuousScale::with_mapping(
            vec![start, end],
            vec![0.0, 1.0],
            vec![PieceType::Log],
        )
        .expect("valid mapping");

        let recovered = scale.inverse_transform(scale.transform(value));

        prop_assert!((recovered - value).abs() <= 1e-7 * value.abs().max(1.0));
    }

    #[test]
    fn mixed_pieces_round_trip_property(value in 0.01f64..99.99) {
        let scale = ContinuousScale::with_mapping(
            vec![0.0, 10.0, 100.0],
            vec![0.0, 0.5, 1.0],
            vec![PieceType::Linear, PieceType::Log],
        )
        .expect("valid mapping");

        let ratio = scale.transform(value);
        prop_assert!((0.0..=1.0).contains(&ratio));
        prop_assert!((scale.inverse_transform(ratio) - value).abs() <= 1e-7 * value.max(1.0));
    }

    #[test]
    fn linear_scale_ticks_cover_the_data(
        low in -10_000.0f64..10_000.0,
        span in 0.5f64..10_000.0
    ) {
        let mut scale = LinearScale::new();
        scale.extend_data_range([low, low + span]);

        let ticks = scale.ticks_values();
        prop_assert!(scale.minimum() <= low);
        prop_assert!(scale.maximum() >= low + span);
        prop_assert!(!ticks.is_empty());
        prop_assert!(ticks.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

#[test]
fn ordinal_bounds_widen_to_both_tick_sets() {
    let mut scale = OrdinalScale::new();
    scale.ticks_mut().set(vec![0.0, 3.0, 6.0, 9.0]);
    scale.minor_ticks_mut().set(vec![1.0, 4.0, 7.0]);

    assert_eq!(scale.minimum(), 0.0);
    assert_eq!(scale.maximum(), 9.0);
}

#[test]
fn ordinal_bounds_tolerate_duplicate_ticks() {
    let mut scale = OrdinalScale::new();
    scale.ticks_mut().set(vec![3.0, 3.0, 6.0, 6.0]);

    assert_eq!(scale.minimum(), 3.0);
    assert_eq!(scale.maximum(), 6.0);
}

#[test]
fn ordinal_keys_keep_their_first_index() {
    let mut scale = OrdinalScale::new();
    scale.set_values(["b", "a", "b", "c"]);

    assert_eq!(scale.count(), 3);
    assert_eq!(scale.index_of(&"b".into()), Some(0));
    assert_eq!(scale.transform(&"a".into()), 0.5);
    assert_eq!(scale.transform(&"c".into()), 1.0);
}
