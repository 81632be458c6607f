//! End-to-end pipeline tests
//!
//! Drives the full ingest, schedule, and execute path over real feed
//! files and checks the per-symbol output files.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use feed_classifier::ingest::{ingest_file, IngestError};
use feed_classifier::scheduler::FeedScheduler;

fn write_feed(dir: &tempfile::TempDir, lines: &[String]) -> PathBuf {
    let path = dir.path().join("input.json");
    let mut file = fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    path
}

fn book_line(symbol: &str, bids: &[(f64, f64, f64)], asks: &[(f64, f64, f64)]) -> String {
    let side = |levels: &[(f64, f64, f64)]| -> String {
        let rows: Vec<String> = levels
            .iter()
            .map(|(count, quantity, price)| {
                format!(r#"{{"count": {count}, "quantity": {quantity}, "price": {price}}}"#)
            })
            .collect();
        format!("[{}]", rows.join(", "))
    };
    format!(
        r#"{{"book": {{"symbol": "{symbol}", "bid": {}, "ask": {}}}}}"#,
        side(bids),
        side(asks)
    )
}

fn trade_line(symbol: &str, quantity: f64, price: f64) -> String {
    format!(r#"{{"trade": {{"symbol": "{symbol}", "price": {price}, "quantity": {quantity}}}}}"#)
}

#[test]
fn test_two_symbols_interleaved() {
    let feed_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    // NVDA: partial aggressive sell. AMD: full aggressive buy whose
    // remainder posts on the new best bid. Lines interleave freely;
    // only per-symbol order matters.
    let path = write_feed(
        &feed_dir,
        &[
            book_line(
                "NVDA",
                &[(1.0, 100.0, 11.11), (1.0, 1380.0, 11.01)],
                &[(1.0, 860.0, 11.14)],
            ),
            book_line(
                "AMD",
                &[(1.0, 2780.0, 10.97), (1.0, 2300.0, 10.82)],
                &[(1.0, 620.0, 11.07), (1.0, 1820.0, 11.08), (1.0, 860.0, 11.14)],
            ),
            trade_line("NVDA", 100.0, 11.11),
            trade_line("AMD", 620.0, 11.07),
            trade_line("NVDA", 1360.0, 11.01),
            trade_line("AMD", 1820.0, 11.08),
            book_line("NVDA", &[(1.0, 20.0, 11.11)], &[(1.0, 860.0, 11.14)]),
            book_line(
                "AMD",
                &[(1.0, 100.0, 11.11), (1.0, 2780.0, 10.97), (1.0, 2300.0, 10.82)],
                &[(1.0, 860.0, 11.14)],
            ),
        ],
    );

    let mut scheduler = FeedScheduler::new(out_dir.path());
    let summary = ingest_file(&path, &mut scheduler).unwrap();
    assert_eq!(summary.records, 8);

    let stats = scheduler.execute(4);
    assert_eq!(stats.tasks_executed, 6);

    assert_eq!(
        fs::read_to_string(out_dir.path().join("NVDA.txt")).unwrap(),
        "AGGRESSIVE SELL 1460.00 @ 11.01\n"
    );
    assert_eq!(
        fs::read_to_string(out_dir.path().join("AMD.txt")).unwrap(),
        "AGGRESSIVE BUY 2540.00 @ 11.11\n"
    );
}

#[test]
fn test_passive_and_cancel_lines_in_input_order() {
    let feed_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let path = write_feed(
        &feed_dir,
        &[
            book_line("TSLA", &[], &[]),
            book_line("TSLA", &[(1.0, 1300.0, 50.10)], &[]),
            book_line(
                "TSLA",
                &[(1.0, 900.0, 50.12), (1.0, 1300.0, 50.10)],
                &[(1.0, 1900.0, 50.14)],
            ),
            book_line("TSLA", &[(1.0, 900.0, 50.12)], &[(1.0, 1900.0, 50.14)]),
        ],
    );

    let mut scheduler = FeedScheduler::new(out_dir.path());
    ingest_file(&path, &mut scheduler).unwrap();
    scheduler.execute(2);

    assert_eq!(
        fs::read_to_string(out_dir.path().join("TSLA.txt")).unwrap(),
        "PASSIVE BUY 1300.00 @ 50.10\n\
         PASSIVE BUY 900.00 @ 50.12\n\
         PASSIVE SELL 1900.00 @ 50.14\n\
         CANCEL BUY 1300.00 @ 50.10\n"
    );
}

#[test]
fn test_bootstrap_only_symbol_yields_empty_file() {
    let feed_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let path = write_feed(&feed_dir, &[book_line("QQQ", &[(1.0, 10.0, 1.0)], &[])]);

    let mut scheduler = FeedScheduler::new(out_dir.path());
    ingest_file(&path, &mut scheduler).unwrap();
    let stats = scheduler.execute(2);

    assert_eq!(stats.tasks_executed, 0);
    assert_eq!(fs::read_to_string(out_dir.path().join("QQQ.txt")).unwrap(), "");
}

#[test]
fn test_unknown_symbol_trade_produces_no_file() {
    let feed_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let path = write_feed(
        &feed_dir,
        &[
            book_line("NVDA", &[(1.0, 10.0, 1.0)], &[]),
            trade_line("GHOST", 5.0, 1.0),
        ],
    );

    let mut scheduler = FeedScheduler::new(out_dir.path());
    ingest_file(&path, &mut scheduler).unwrap();
    scheduler.execute(2);

    assert!(out_dir.path().join("NVDA.txt").exists());
    assert!(!out_dir.path().join("GHOST.txt").exists());
}

#[test]
fn test_invalid_trade_diagnostic_reaches_the_sink() {
    let feed_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    // A trade strictly inside the spread satisfies neither aggression
    // rule.
    let path = write_feed(
        &feed_dir,
        &[
            book_line("NVDA", &[(1.0, 100.0, 10.00)], &[(1.0, 100.0, 20.00)]),
            book_line("NVDA", &[(1.0, 100.0, 10.00)], &[(1.0, 100.0, 20.00)]),
            trade_line("NVDA", 50.0, 15.00),
            book_line("NVDA", &[(1.0, 100.0, 10.00)], &[(1.0, 100.0, 20.00)]),
        ],
    );

    let mut scheduler = FeedScheduler::new(out_dir.path());
    ingest_file(&path, &mut scheduler).unwrap();
    scheduler.execute(2);

    assert_eq!(
        fs::read_to_string(out_dir.path().join("NVDA.txt")).unwrap(),
        "invalid trade\n"
    );
}

#[test]
fn test_malformed_line_aborts_before_execution() {
    let feed_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let path = write_feed(
        &feed_dir,
        &[
            book_line("NVDA", &[(1.0, 10.0, 1.0)], &[]),
            "{\"book\": oops".to_string(),
            book_line("NVDA", &[(1.0, 20.0, 1.0)], &[]),
        ],
    );

    let mut scheduler = FeedScheduler::new(out_dir.path());
    let err = ingest_file(&path, &mut scheduler).unwrap_err();
    match err {
        IngestError::MalformedLine { line, .. } => assert_eq!(line, 2),
        other => panic!("expected MalformedLine, got {other:?}"),
    }
}

#[test]
fn test_unknown_shape_aborts_with_line_number() {
    let feed_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();

    let path = write_feed(
        &feed_dir,
        &[
            book_line("NVDA", &[(1.0, 10.0, 1.0)], &[]),
            r#"{"candle": {"symbol": "NVDA", "open": 1.0}}"#.to_string(),
        ],
    );

    let mut scheduler = FeedScheduler::new(out_dir.path());
    let err = ingest_file(&path, &mut scheduler).unwrap_err();
    match err {
        IngestError::UnknownRecord { line } => assert_eq!(line, 2),
        other => panic!("expected UnknownRecord, got {other:?}"),
    }
}
