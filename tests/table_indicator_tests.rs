use std::cell::Cell;
use std::rc::Rc;

use approx::assert_relative_eq;
use chart_kernel::core::{ErrorCode, Invalidatable, RecordingReporter, Signal, WarningCode};
use chart_kernel::table::Table;
use chart_kernel::table::indicators::{RsiComputer, SmaComputer, StochasticComputer};

fn zigzag_table(rows: usize) -> Table {
    let mut table = Table::new(&["value"]);
    for row in 0..rows {
        let value = if row % 2 == 0 { 10.0 } else { 11.0 };
        table.add_row(row as f64, &[value]).expect("valid row");
    }
    table
}

#[test]
fn rsi_stays_missing_until_the_window_fills() {
    let mut table = zigzag_table(13);
    let mapping = table.map_as(&[("value", "value")]).expect("known field");
    RsiComputer::attach(&mut table, &mapping, 14, Some("rsi")).expect("registered");

    let rsi = table.column_values("rsi").expect("aliased output");
    assert_eq!(rsi.len(), 13);
    assert!(rsi.iter().all(|value| value.is_nan()));
}

#[test]
fn first_rsi_sums_the_whole_window() {
    let mut table = zigzag_table(15);
    let mapping = table.map_as(&[("value", "value")]).expect("known field");
    RsiComputer::attach(&mut table, &mapping, 14, Some("rsi")).expect("registered");

    let rsi = table.column_values("rsi").expect("aliased output");
    assert!(rsi[12].is_nan());
    // 13 deltas: seven rises and six falls of one
    assert_relative_eq!(rsi[13], 100.0 - 100.0 / (1.0 + 7.0 / 6.0));
    // smoothed by 13/14, then one more fall
    let up = 7.0 * 13.0 / 14.0;
    let down = 6.0 * 13.0 / 14.0 + 1.0;
    assert_relative_eq!(rsi[14], 100.0 - 100.0 / (1.0 + up / down));
}

#[test]
fn duplicate_output_field_is_rejected() {
    let reporter = RecordingReporter::new();
    let mut table = Table::with_reporter(&["value"], Rc::new(reporter.clone()));
    let mapping = table.map_as(&[("value", "value")]).expect("known field");
    let computer = table.create_computer(&mapping).expect("same table");

    let first = table.add_output_field(computer, "result");
    let second = table.add_output_field(computer, "result");

    assert!(first.is_some());
    assert_eq!(second, None);
    assert_eq!(table.output_index(computer, "result"), first);
    assert_eq!(
        reporter.count_errors(ErrorCode::TableComputerOutputFieldDuplicate),
        1
    );
}

#[test]
fn mapping_from_another_table_is_reported() {
    let reporter = RecordingReporter::new();
    let other = Table::new(&["value"]);
    let mapping = other.map_as(&[("value", "value")]).expect("known field");
    let mut table = Table::with_reporter(&["value"], Rc::new(reporter.clone()));

    assert!(table.create_computer(&mapping).is_none());
    assert_eq!(reporter.count_errors(ErrorCode::TableMappingDifferentTable), 1);
}

#[test]
fn computed_columns_follow_new_rows() {
    let mut table = Table::new(&["value"]);
    table
        .add_rows((0..3).map(|row| (row as f64, vec![row as f64 * 2.0])))
        .expect("valid rows");
    let mapping = table.map_as(&[("value", "value")]).expect("known field");
    SmaComputer::attach(&mut table, &mapping, 2, Some("sma")).expect("registered");

    table.add_row(3.0, &[6.0]).expect("valid row");

    let sma = table.column_values("sma").expect("aliased output");
    assert!(sma[0].is_nan());
    assert_relative_eq!(sma[1], 1.0);
    assert_relative_eq!(sma[3], 5.0);
}

fn table_with_sma(reporter: &RecordingReporter) -> Table {
    let mut table = Table::with_reporter(&["value"], Rc::new(reporter.clone()));
    table
        .add_rows([(1.0, [1.0]), (2.0, [2.0])])
        .expect("valid rows");
    let mapping = table.map_as(&[("value", "value")]).expect("known field");
    SmaComputer::attach(&mut table, &mapping, 1, Some("sma")).expect("registered");
    table
}

fn same_values(actual: &[f64], expected: &[f64]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
}

/// Counts `start` calls, one per full recompute.
fn count_recomputes(table: &mut Table) -> Rc<Cell<usize>> {
    let starts = Rc::new(Cell::new(0_usize));
    let mapping = table.map_as(&[("value", "value")]).expect("known field");
    let computer = table.create_computer(&mapping).expect("same table");
    table.set_context(computer, Rc::clone(&starts));
    table.set_start_function(computer, |starts: &mut Rc<Cell<usize>>| {
        starts.set(starts.get() + 1);
    });
    starts
}

#[test]
fn rejected_batch_inserts_nothing() {
    let reporter = RecordingReporter::new();
    let mut table = table_with_sma(&reporter);
    let changes = Rc::new(Cell::new(0_usize));
    let seen = Rc::clone(&changes);
    table.listen_signals(Signal::DataChanged, move |_| seen.set(seen.get() + 1));

    let result = table.add_rows([(0.0, vec![100.0]), (3.0, vec![1.0, 2.0])]);

    assert!(result.is_err());
    assert_eq!(table.keys(), &[1.0, 2.0]);
    assert_eq!(table.column_values("value").expect("stored"), vec![1.0, 2.0]);
    assert_eq!(table.column_values("sma").expect("aliased output"), vec![1.0, 2.0]);
    assert_eq!(changes.get(), 0);
}

#[test]
fn outputs_stay_aligned_with_rows_during_a_transaction() {
    let reporter = RecordingReporter::new();
    let mut table = table_with_sma(&reporter);
    assert!(table.start_transaction());

    table.add_row(0.0, &[5.0]).expect("valid row");
    table.add_row(2.0, &[8.0]).expect("valid row");
    assert!(same_values(
        &table.column_values("sma").expect("aliased output"),
        &[f64::NAN, 1.0, f64::NAN]
    ));

    assert_eq!(table.remove_range(1.0, 1.0), 1);
    assert!(same_values(
        &table.column_values("sma").expect("aliased output"),
        &[f64::NAN, f64::NAN]
    ));

    assert!(table.commit_transaction());
    assert_eq!(table.column_values("sma").expect("aliased output"), vec![5.0, 8.0]);
}

#[test]
fn nested_transaction_start_only_warns() {
    let reporter = RecordingReporter::new();
    let mut table = table_with_sma(&reporter);

    assert!(table.start_transaction());
    assert!(!table.start_transaction());
    assert!(table.in_transaction());
    assert_eq!(
        reporter.count_warnings(WarningCode::TableAlreadyInTransaction),
        1
    );
}

#[test]
fn commit_recomputes_once() {
    let reporter = RecordingReporter::new();
    let mut table = table_with_sma(&reporter);
    let starts = count_recomputes(&mut table);
    let changes = Rc::new(Cell::new(0_usize));
    let seen = Rc::clone(&changes);
    table.listen_signals(Signal::DataChanged, move |_| seen.set(seen.get() + 1));

    table.start_transaction();
    for key in 3..8 {
        table.add_row(f64::from(key), &[f64::from(key)]).expect("valid row");
    }
    table.remove_range(1.0, 1.0);
    assert_eq!(starts.get(), 0);
    assert_eq!(changes.get(), 0);

    assert!(table.commit_transaction());
    assert_eq!(starts.get(), 1);
    assert_eq!(changes.get(), 1);
    assert_eq!(table.row_count(), 6);
}

#[test]
fn rollback_restores_the_rows_at_start() {
    let reporter = RecordingReporter::new();
    let mut table = table_with_sma(&reporter);

    table.start_transaction();
    table.add_row(0.0, &[9.0]).expect("valid row");
    table.add_row(1.0, &[7.0]).expect("valid row");
    table.remove_range(2.0, 2.0);
    assert!(table.rollback_transaction());

    assert!(!table.in_transaction());
    assert_eq!(table.keys(), &[1.0, 2.0]);
    assert_eq!(table.column_values("value").expect("stored"), vec![1.0, 2.0]);
    assert_eq!(table.column_values("sma").expect("aliased output"), vec![1.0, 2.0]);
}

#[test]
fn finishing_without_a_transaction_does_nothing() {
    let reporter = RecordingReporter::new();
    let mut table = table_with_sma(&reporter);

    assert!(!table.commit_transaction());
    assert!(!table.rollback_transaction());
    assert_eq!(reporter.count_warnings(WarningCode::TableAlreadyInTransaction), 0);
}

#[test]
fn rejected_alias_leaves_no_computer_behind() {
    let reporter = RecordingReporter::new();
    let mut table = Table::with_reporter(&["value"], Rc::new(reporter.clone()));
    table.add_row(0.0, &[1.0]).expect("valid row");
    let mapping = table.map_as(&[("value", "value")]).expect("known field");

    assert!(SmaComputer::attach(&mut table, &mapping, 2, Some("value")).is_none());
    assert_eq!(table.computer_count(), 0);
    assert_eq!(reporter.count_errors(ErrorCode::TableFieldNameDuplicate), 1);
}

#[test]
fn partly_registered_indicator_is_removed_with_its_aliases() {
    let reporter = RecordingReporter::new();
    let mut table = Table::with_reporter(&["value"], Rc::new(reporter.clone()));
    table
        .add_rows([(0.0, [1.0]), (1.0, [2.0])])
        .expect("valid rows");
    let values = table.map_as(&[("value", "value")]).expect("known field");
    SmaComputer::attach(&mut table, &values, 1, Some("st_d")).expect("registered");
    let prices = table
        .map_as(&[("high", "value"), ("low", "value"), ("close", "value")])
        .expect("known field");

    assert!(StochasticComputer::attach(&mut table, &prices, 2, 2, Some("st")).is_none());

    assert_eq!(table.computer_count(), 1);
    assert_eq!(table.column_values("st_k"), None);
    assert_eq!(table.column_values("st_d").expect("sma alias kept"), vec![1.0, 2.0]);
    table.add_row(2.0, &[3.0]).expect("valid row");
    assert_eq!(table.column_values("st_d").expect("sma alias kept"), vec![1.0, 2.0, 3.0]);
}
