//! Market data record types
//!
//! Wire-shaped records consumed by the engine: full book snapshots and
//! single executions. Field names mirror the JSON feed (`bid` / `ask`
//! arrays of `{count, quantity, price}` rows).

use serde::{Deserialize, Serialize};

/// A single price row on one side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Number of resting orders at this price. Carried for input
    /// fidelity; the classifier never reads it.
    pub count: f64,
    /// Total resting size at this price.
    pub quantity: f64,
    /// Price of the row.
    pub price: f64,
}

impl Level {
    /// Create a new level.
    pub fn new(count: f64, quantity: f64, price: f64) -> Self {
        Self {
            count,
            quantity,
            price,
        }
    }
}

/// The full visible book for one instrument at an instant.
///
/// Bids are sorted strictly descending by price (best bid first), asks
/// strictly ascending (best ask first); prices are unique within a
/// side. Sorted order is an input contract of the feed, not validated
/// here. Either side may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookRecord {
    /// Buy-side levels, best bid first.
    #[serde(rename = "bid")]
    pub bids: Vec<Level>,
    /// Sell-side levels, best ask first.
    #[serde(rename = "ask")]
    pub asks: Vec<Level>,
}

impl OrderBookRecord {
    /// The most aggressive buy level, if any.
    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.first()
    }

    /// The most aggressive sell level, if any.
    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.first()
    }

    /// Whether both sides are empty.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// A single execution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Execution price.
    pub price: f64,
    /// Executed quantity.
    pub quantity: f64,
}

impl TradeRecord {
    /// Create a new trade record.
    pub fn new(quantity: f64, price: f64) -> Self {
        Self { price, quantity }
    }

    /// Whether price and quantity are finite and positive.
    pub fn is_valid(&self) -> bool {
        self.price.is_finite()
            && self.price > 0.0
            && self.quantity.is_finite()
            && self.quantity > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_book() -> OrderBookRecord {
        OrderBookRecord {
            bids: vec![Level::new(1.0, 100.0, 11.11), Level::new(1.0, 1380.0, 11.01)],
            asks: vec![Level::new(1.0, 860.0, 11.14)],
        }
    }

    #[test]
    fn test_best_levels() {
        let book = make_book();
        assert_eq!(book.best_bid().unwrap().price, 11.11);
        assert_eq!(book.best_ask().unwrap().price, 11.14);
    }

    #[test]
    fn test_empty_book() {
        let book = OrderBookRecord::default();
        assert!(book.is_empty());
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_one_sided_book() {
        let book = OrderBookRecord {
            bids: vec![Level::new(1.0, 1300.0, 50.10)],
            asks: Vec::new(),
        };
        assert!(!book.is_empty());
        assert!(book.best_ask().is_none());
        assert_eq!(book.best_bid().unwrap().quantity, 1300.0);
    }

    #[test]
    fn test_book_deserialization_wire_shape() {
        let json = r#"{"bid":[{"count":1,"quantity":100,"price":11.11}],"ask":[]}"#;
        let book: OrderBookRecord = serde_json::from_str(json).unwrap();
        assert_eq!(book.bids.len(), 1);
        assert!(book.asks.is_empty());
        assert_eq!(book.bids[0].price, 11.11);
        assert_eq!(book.bids[0].quantity, 100.0);
    }

    #[test]
    fn test_trade_validity() {
        assert!(TradeRecord::new(100.0, 11.11).is_valid());
        assert!(!TradeRecord::new(0.0, 11.11).is_valid());
        assert!(!TradeRecord::new(100.0, -11.11).is_valid());
        assert!(!TradeRecord::new(f64::NAN, 11.11).is_valid());
        assert!(!TradeRecord::new(100.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_trade_deserialization() {
        let json = r#"{"price":11.01,"quantity":1360}"#;
        let trade: TradeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(trade.price, 11.01);
        assert_eq!(trade.quantity, 1360.0);
    }
}
