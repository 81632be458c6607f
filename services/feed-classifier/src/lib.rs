//! Order Flow Classification Service
//!
//! Consumes a JSON-lines market data feed (book snapshots and trades)
//! and produces, per instrument, a text stream of classified order
//! events:
//! - PASSIVE: resting liquidity added without crossing the book
//! - CANCEL: resting liquidity removed or reduced
//! - AGGRESSIVE: liquidity consumed by a trade-initiating order
//!
//! Processing has two phases. Ingest is strictly sequential: each line
//! is parsed, keyed by symbol, and turned into a task chained after the
//! symbol's previous task. Execution then runs the resulting graph on a
//! fixed worker pool; chains for different symbols run in parallel
//! while each symbol's tasks run in input order, so every output file
//! is deterministic for any worker count.
//!
//! # Architecture
//!
//! ```text
//! JSON lines feed
//!       │
//!  ┌────▼────┐
//!  │ Ingest  │  ← sequential parse, symbol extraction
//!  └────┬────┘
//!       │
//!  ┌────▼──────┐
//!  │ Scheduler │  ← per-symbol task chains, static graph
//!  └────┬──────┘
//!       │ worker pool
//!  ┌────▼───────┐
//!  │ Classifier │  ← per-instrument diff + classification
//!  └────┬───────┘
//!       │
//!  <symbol>.txt sinks
//! ```

pub mod classifier;
pub mod ingest;
pub mod scheduler;
pub mod sink;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
