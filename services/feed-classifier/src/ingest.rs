//! Feed ingest front-end
//!
//! Reads the JSON-lines market data feed strictly sequentially,
//! identifies each record's kind and symbol, and hands it to the
//! scheduler. Any unreadable, malformed, or unrecognized line aborts
//! ingest with a diagnostic carrying the 1-based line number;
//! parallelism begins only after ingest completes.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use types::ids::Symbol;
use types::record::{OrderBookRecord, TradeRecord};

use crate::scheduler::FeedScheduler;
use crate::sink::SinkError;

/// Errors that abort ingest. All are fatal: the graph is never executed
/// after any of them.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open input file {path}: {source}")]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed at line {line}: {source}")]
    ReadLine {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON at line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown record shape at line {line}")]
    UnknownRecord { line: usize },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// One line of the feed: a book snapshot or a trade.
#[derive(Debug, Deserialize)]
enum FeedRecord {
    #[serde(rename = "book")]
    Book(BookMessage),
    #[serde(rename = "trade")]
    Trade(TradeMessage),
}

#[derive(Debug, Deserialize)]
struct BookMessage {
    symbol: Symbol,
    #[serde(flatten)]
    record: OrderBookRecord,
}

#[derive(Debug, Deserialize)]
struct TradeMessage {
    symbol: Symbol,
    #[serde(flatten)]
    record: TradeRecord,
}

/// Counts of what one ingest pass routed into the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Total records routed.
    pub records: u64,
    /// Book snapshot records.
    pub books: u64,
    /// Trade records.
    pub trades: u64,
}

/// Read the feed at `path` and route every record into `scheduler`.
pub fn ingest_file(path: &Path, scheduler: &mut FeedScheduler) -> Result<IngestSummary, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;

    let reader = BufReader::new(file);
    let mut summary = IngestSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| IngestError::ReadLine {
            line: line_no,
            source,
        })?;

        match parse_record(&line, line_no)? {
            FeedRecord::Book(message) => {
                scheduler.submit_book(message.symbol, message.record)?;
                summary.books += 1;
            }
            FeedRecord::Trade(message) => {
                scheduler.submit_trade(message.symbol, message.record);
                summary.trades += 1;
            }
        }
        summary.records += 1;
    }

    info!(
        records = summary.records,
        books = summary.books,
        trades = summary.trades,
        "ingest complete"
    );
    Ok(summary)
}

/// Parse one feed line in two stages so the diagnostic distinguishes
/// invalid JSON from a well-formed object of unexpected shape.
fn parse_record(line: &str, line_no: usize) -> Result<FeedRecord, IngestError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|source| IngestError::MalformedLine {
            line: line_no,
            source,
        })?;

    serde_json::from_value(value).map_err(|_| IngestError::UnknownRecord { line: line_no })
}
