//! Instrument identifier types
//!
//! Symbols arrive as opaque strings on the wire and are used as routing
//! keys for per-instrument classifiers, task chains, and output sinks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument symbol
///
/// Opaque exchange ticker (e.g., "NVDA", "AMD"). Also names the
/// per-symbol output file `<symbol>.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol from a string
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
