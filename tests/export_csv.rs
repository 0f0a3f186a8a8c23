use std::fs;

use rust_decimal_macros::dec;
use tally::{export::write_csv, TallySession};
use tally_config::Config;
use tally_core::ExportOptions;
use tally_domain::{RangeMode, RowOrder, TotalsStyle};
use tempfile::tempdir;

fn session() -> TallySession {
    let mut session = TallySession::in_memory(Config::default());
    session
        .bootstrap("admin", "admin@example.com", "correct horse")
        .expect("bootstrap");
    session
        .apply_delta("Feb-25", "sanciones", dec!(10))
        .expect("add");
    session
        .apply_delta("Jan-25", "sanciones", dec!(20.5))
        .expect("add");
    session
        .apply_delta("Jan-25", "ingresos_reales_vs_fact", dec!(15))
        .expect("add");
    session
}

fn lines(bytes: Vec<u8>) -> Vec<String> {
    String::from_utf8(bytes)
        .expect("utf8")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn formulas_sum_every_numeric_column() {
    let session = session();
    let document = session
        .export("Feb-25", "Jan-25", ExportOptions::default())
        .expect("export");

    let mut out = Vec::new();
    write_csv(&document, &mut out, TotalsStyle::Formulas).expect("csv");
    let lines = lines(out);

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Period,Maintenance income,DPPP,"));
    assert!(lines[0].ends_with(",Total,Actual income vs invoiced,Reconciliation difference"));
    assert!(lines[1].starts_with("Feb-25,"));
    assert!(lines[2].starts_with("Jan-25,"));
    assert!(lines[3].starts_with("TOTAL,=SUM(B2:B3),=SUM(C2:C3),"));
    assert!(lines[3].ends_with(",=SUM(Q2:Q3)"));
}

#[test]
fn value_totals_are_written_with_two_decimals() {
    let session = session();
    let document = session
        .export("Feb-25", "Jan-25", ExportOptions::default())
        .expect("export");

    let mut out = Vec::new();
    write_csv(&document, &mut out, TotalsStyle::Values).expect("csv");
    let lines = lines(out);
    let totals: Vec<&str> = lines[3].split(',').collect();

    // Sanctions, Total, Actual income vs invoiced, Reconciliation difference.
    assert_eq!(totals[10], "30.50");
    assert_eq!(totals[14], "30.50");
    assert_eq!(totals[15], "15.00");
    assert_eq!(totals[16], "15.50");

    let jan: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(jan[1], "0.00");
    assert_eq!(jan[16], "5.50");
}

#[test]
fn chronological_order_sorts_rows_and_export_to_path_creates_directories() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("reports").join("q1.csv");
    let session = session();

    let rows = session
        .export_to_path(
            "Feb-25",
            "Jan-25",
            &path,
            ExportOptions {
                range: RangeMode::Insertion,
                order: RowOrder::Chronological,
            },
            TotalsStyle::Values,
        )
        .expect("export");
    assert_eq!(rows, 2);

    let text = fs::read_to_string(&path).expect("read");
    let labels: Vec<&str> = text
        .lines()
        .map(|line| line.split(',').next().unwrap_or_default())
        .collect();
    assert_eq!(labels, vec!["Period", "Jan-25", "Feb-25", "TOTAL"]);
}

#[test]
fn missing_boundary_writes_nothing() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("out.csv");
    let session = session();

    let err = session
        .export_to_path(
            "Jan-25",
            "Dec-25",
            &path,
            ExportOptions::default(),
            TotalsStyle::Formulas,
        )
        .unwrap_err();
    assert!(err.is_user_error());
    assert!(!path.exists());
}
