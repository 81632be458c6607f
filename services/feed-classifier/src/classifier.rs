//! Per-instrument order flow classifier
//!
//! Holds the last observed book snapshot and a buffered run of trades
//! for one instrument, and labels every book-to-book change as PASSIVE,
//! CANCEL, or AGGRESSIVE flow.
//!
//! Output is produced only when a snapshot arrives:
//! - no trades since the previous snapshot: a side-wise merge diff over
//!   the two sorted price ladders, one PASSIVE or CANCEL line per
//!   changed level;
//! - trades since the previous snapshot: the whole run is classified as
//!   a single aggressive order, folding in any residual remainder the
//!   aggressor left resting on the new book.

use std::fmt;
use std::fmt::Write as _;

use types::numeric::{approx_eq, approx_zero};
use types::order::{Intention, Side};
use types::record::{Level, OrderBookRecord, TradeRecord};

/// One classified book change, rendered as a single output line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedEvent {
    /// What happened to resting liquidity.
    pub intention: Intention,
    /// Which side of the book changed.
    pub side: Side,
    /// Quantity for the event. Negative for a reduction at an unchanged
    /// price; the sign is part of the output contract.
    pub quantity: f64,
    /// Price the event applies to.
    pub price: f64,
}

impl ClassifiedEvent {
    pub fn new(intention: Intention, side: Side, quantity: f64, price: f64) -> Self {
        Self {
            intention,
            side,
            quantity,
            price,
        }
    }
}

impl fmt::Display for ClassifiedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:.2} @ {:.2}",
            self.intention, self.side, self.quantity, self.price
        )
    }
}

/// Trades buffered between two consecutive snapshots.
///
/// Adjacent same-price trades are coalesced into one entry carrying the
/// summed quantity. Insertion order is preserved, so the first entry
/// holds the earliest price of the run and the last entry the latest;
/// runs arrive in price-monotonic order (descending under sell
/// aggression, ascending under buy aggression).
#[derive(Debug, Default)]
pub struct TradeRun {
    entries: Vec<TradeRecord>,
}

impl TradeRun {
    /// Append one trade, coalescing into the last entry when the price
    /// matches within tolerance.
    pub fn append(&mut self, trade: TradeRecord) {
        match self.entries.last_mut() {
            Some(last) if approx_eq(last.price, trade.price) => {
                last.quantity += trade.quantity;
            }
            _ => self.entries.push(trade),
        }
    }

    /// Total quantity across all buffered entries.
    pub fn total_quantity(&self) -> f64 {
        self.entries.iter().map(|trade| trade.quantity).sum()
    }

    /// Earliest and latest entries of the run, if non-empty.
    pub fn bounds(&self) -> Option<(&TradeRecord, &TradeRecord)> {
        Some((self.entries.first()?, self.entries.last()?))
    }

    /// Number of coalesced entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no trades are buffered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all buffered entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Stateful classifier for a single instrument.
///
/// Mutated only by the instrument's task chain, so at most one call is
/// in flight at any time; no lock guards the state.
#[derive(Debug, Default)]
pub struct InstrumentClassifier {
    /// The previously adopted snapshot, if any.
    prev_book: Option<OrderBookRecord>,
    /// Trades seen since the previous snapshot.
    trades: TradeRun,
}

impl InstrumentClassifier {
    /// Create a classifier with no prior snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer one trade into the current run.
    ///
    /// Returns `false` (buffering nothing) for invalid input: a
    /// non-finite or non-positive price or quantity. The stored book is
    /// never touched.
    pub fn record_trade(&mut self, trade: TradeRecord) -> bool {
        if !trade.is_valid() {
            return false;
        }
        self.trades.append(trade);
        true
    }

    /// Process a new snapshot against the stored one.
    ///
    /// Returns the text block to append to the symbol sink: empty for
    /// the first snapshot, one line per changed level when no trades
    /// are buffered, and exactly one AGGRESSIVE line (or an
    /// `invalid trade` diagnostic) when the run is non-empty. `None`
    /// yields an `update invalid book` diagnostic and leaves all state
    /// unchanged.
    pub fn update_book(&mut self, new_book: Option<OrderBookRecord>) -> String {
        let Some(new_book) = new_book else {
            return "update invalid book\n".to_string();
        };

        let Some(old_book) = self.prev_book.take() else {
            // First snapshot: adopt it and stay silent.
            self.prev_book = Some(new_book);
            return String::new();
        };

        let mut out = String::new();
        match self.trades.bounds() {
            None => {
                diff_side(Side::BUY, &old_book.bids, &new_book.bids, &mut out);
                diff_side(Side::SELL, &old_book.asks, &new_book.asks, &mut out);
            }
            Some((first, last)) => {
                classify_aggression(
                    first,
                    last,
                    self.trades.total_quantity(),
                    &old_book,
                    &new_book,
                    &mut out,
                );
            }
        }

        self.trades.clear();
        self.prev_book = Some(new_book);
        out
    }

    /// The last adopted snapshot, if any.
    pub fn book(&self) -> Option<&OrderBookRecord> {
        self.prev_book.as_ref()
    }

    /// Number of coalesced trade entries currently buffered.
    pub fn buffered_trades(&self) -> usize {
        self.trades.len()
    }
}

/// Merge-diff one side of two consecutive snapshots.
///
/// Walks both sorted ladders front to back. A level present only in the
/// new ladder is passive flow, a level present only in the old ladder
/// is a cancel, and an equal-price pair emits the signed quantity delta
/// (nothing when the quantity is unchanged).
fn diff_side(side: Side, old: &[Level], new: &[Level], out: &mut String) {
    let mut old_idx = 0;
    let mut new_idx = 0;

    while old_idx < old.len() || new_idx < new.len() {
        if old_idx == old.len() {
            let added = &new[new_idx];
            push_event(
                out,
                ClassifiedEvent::new(Intention::Passive, side, added.quantity, added.price),
            );
            new_idx += 1;
            continue;
        }

        if new_idx == new.len() {
            let gone = &old[old_idx];
            push_event(
                out,
                ClassifiedEvent::new(Intention::Cancel, side, gone.quantity, gone.price),
            );
            old_idx += 1;
            continue;
        }

        let old_level = &old[old_idx];
        let new_level = &new[new_idx];

        if approx_eq(old_level.price, new_level.price) {
            let delta = new_level.quantity - old_level.quantity;
            if !approx_zero(delta) {
                let intention = if delta > 0.0 {
                    Intention::Passive
                } else {
                    Intention::Cancel
                };
                // Reductions at an unchanged price keep the negative delta.
                push_event(out, ClassifiedEvent::new(intention, side, delta, new_level.price));
            }
            old_idx += 1;
            new_idx += 1;
            continue;
        }

        if side.improves(new_level.price, old_level.price) {
            // The new ladder reached this price first: fresh liquidity.
            push_event(
                out,
                ClassifiedEvent::new(Intention::Passive, side, new_level.quantity, new_level.price),
            );
            new_idx += 1;
        } else {
            // The old ladder reached it first: that level is gone.
            push_event(
                out,
                ClassifiedEvent::new(Intention::Cancel, side, old_level.quantity, old_level.price),
            );
            old_idx += 1;
        }
    }
}

/// Classify a non-empty trade run as one aggressive order.
///
/// The first trade of the run decides the aggression side against the
/// top of the old book's opposite side. The last entry is the deepest
/// price touched; when the new book still rests at or beyond that depth
/// on the consumed side, the aggressor's unfilled remainder posted
/// there and is folded into the reported quantity and price.
fn classify_aggression(
    first: &TradeRecord,
    last: &TradeRecord,
    total_quantity: f64,
    old_book: &OrderBookRecord,
    new_book: &OrderBookRecord,
    out: &mut String,
) {
    let mut quantity = total_quantity;
    let mut price = last.price;

    let sell_into_bids = old_book
        .best_bid()
        .map_or(false, |bid| first.price <= bid.price);
    let buy_into_asks = old_book
        .best_ask()
        .map_or(false, |ask| first.price >= ask.price);

    if sell_into_bids {
        if let Some(ask) = new_book.best_ask() {
            if last.price >= ask.price {
                price = ask.price;
                quantity += ask.quantity;
            }
        }
        push_event(
            out,
            ClassifiedEvent::new(Intention::Aggressive, Side::SELL, quantity, price),
        );
    } else if buy_into_asks {
        if let Some(bid) = new_book.best_bid() {
            if last.price <= bid.price {
                price = bid.price;
                quantity += bid.quantity;
            }
        }
        push_event(
            out,
            ClassifiedEvent::new(Intention::Aggressive, Side::BUY, quantity, price),
        );
    } else {
        out.push_str("invalid trade\n");
    }
}

fn push_event(out: &mut String, event: ClassifiedEvent) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{event}");
}
