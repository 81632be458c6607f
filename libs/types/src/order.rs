//! Order side and classification labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::BUY => Side::SELL,
            Side::SELL => Side::BUY,
        }
    }

    /// Whether `candidate` is a more aggressive price than `resting` on
    /// this side. A bid improves by paying more, an ask by asking less.
    pub fn improves(&self, candidate: f64, resting: f64) -> bool {
        match self {
            Side::BUY => candidate > resting,
            Side::SELL => candidate < resting,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::BUY => write!(f, "BUY"),
            Side::SELL => write!(f, "SELL"),
        }
    }
}

/// Classification label for one observed book change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intention {
    /// Resting liquidity removed or reduced
    Cancel,
    /// Resting liquidity added without crossing the book
    Passive,
    /// Liquidity consumed by a trade-initiating order
    Aggressive,
}

impl fmt::Display for Intention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intention::Cancel => write!(f, "CANCEL"),
            Intention::Passive => write!(f, "PASSIVE"),
            Intention::Aggressive => write!(f, "AGGRESSIVE"),
        }
    }
}
