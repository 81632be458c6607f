//! Per-symbol output sinks
//!
//! One append-only text file per instrument, `<out_dir>/<symbol>.txt`.
//! A sink is written exclusively by its symbol's task chain, which
//! serializes all writes; no sink-level locking exists.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use types::ids::Symbol;

/// Errors raised while creating or writing a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot create sink file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("sink write failed: {0}")]
    Write(#[from] io::Error),
}

/// Buffered append-only writer for one symbol's classified events.
///
/// The file is created (truncating any previous run's output) as soon
/// as the symbol is first seen, so even a symbol that never produces a
/// line yields an empty output file.
#[derive(Debug)]
pub struct SymbolSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SymbolSink {
    /// Create the sink file for `symbol` under `out_dir`.
    pub fn create(out_dir: &Path, symbol: &Symbol) -> Result<Self, SinkError> {
        let path = out_dir.join(format!("{symbol}.txt"));
        let file = File::create(&path).map_err(|source| SinkError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Append one text block. Empty blocks are a no-op.
    pub fn append(&mut self, text: &str) -> Result<(), SinkError> {
        if text.is_empty() {
            return Ok(());
        }
        self.writer.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Flush buffered output to the file.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Path of the sink file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
