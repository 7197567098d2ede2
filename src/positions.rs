//! Position ledger: per-account running inventory of open lots.
//!
//! Each tracked account holds, per instrument, an ordered list of lots
//! (quantity, unit cost, acquisition date). Augmenting postings append a
//! lot; reducing postings consume lots oldest-first (FIFO) and report the
//! cost basis of whatever was consumed, since a pure reduction in the
//! input may elide its cost detail. Reducing more than is available is an
//! inconsistent ledger and fails the run.

use std::collections::HashMap;
use std::collections::VecDeque;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::ledger::Posting;

/// One open lot of an instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub units: Decimal,
    pub unit_cost: Decimal,
    pub acquired: NaiveDate,
}

/// A slice of inventory consumed by a reduction, oldest lot first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedLot {
    /// Units taken from the lot; always positive.
    pub units: Decimal,
    pub unit_cost: Decimal,
    pub acquired: NaiveDate,
}

/// How a posting was booked against inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Booking {
    /// A new lot was recorded at the posting's own cost.
    Augmented,
    /// Existing lots were consumed; carries the resolved cost basis.
    Reduced(Vec<ConsumedLot>),
    /// Not an inventory posting (cash and fee legs carry no cost clause).
    Ignored,
}

/// FIFO lot inventory for one (account, instrument) pair.
#[derive(Debug, Default)]
struct Inventory {
    lots: VecDeque<Lot>,
}

impl Inventory {
    fn available(&self) -> Decimal {
        self.lots.iter().map(|lot| lot.units).sum()
    }

    fn augment(&mut self, units: Decimal, unit_cost: Decimal, acquired: NaiveDate) {
        self.lots.push_back(Lot {
            units,
            unit_cost,
            acquired,
        });
    }

    fn reduce(&mut self, requested: Decimal) -> Option<Vec<ConsumedLot>> {
        if requested > self.available() {
            return None;
        }

        let mut consumed = Vec::new();
        let mut remaining = requested;
        while remaining > Decimal::ZERO {
            let lot = self.lots.front_mut()?;
            let take = remaining.min(lot.units);
            consumed.push(ConsumedLot {
                units: take,
                unit_cost: lot.unit_cost,
                acquired: lot.acquired,
            });
            lot.units -= take;
            remaining -= take;
            if lot.units.is_zero() {
                self.lots.pop_front();
            }
        }
        Some(consumed)
    }
}

/// Running open-lot state for every tracked account.
///
/// Owned by the single processing pass; the only carrier of acquisition
/// date and cost information for later sales.
#[derive(Debug, Default)]
pub struct PositionLedger {
    accounts: HashMap<String, HashMap<String, Inventory>>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book a posting against inventory.
    ///
    /// Postings without a cost clause are ignored. A positive posting with
    /// a priced cost clause augments; a negative posting with any cost
    /// clause (including the bare `{}` marker) reduces FIFO. `txn_date`
    /// stands in for the acquisition date when the cost clause omits one.
    pub fn book(&mut self, posting: &Posting, txn_date: NaiveDate) -> Result<Booking, LedgerError> {
        let Some(spec) = posting.cost.as_ref() else {
            return Ok(Booking::Ignored);
        };

        if posting.units > Decimal::ZERO {
            let Some(unit_cost) = spec.unit_cost else {
                // A positive posting with a bare {} has nothing to book at.
                return Ok(Booking::Ignored);
            };
            self.inventory_mut(&posting.account, &posting.instrument)
                .augment(posting.units, unit_cost, spec.date.unwrap_or(txn_date));
            return Ok(Booking::Augmented);
        }

        if posting.units < Decimal::ZERO {
            let requested = -posting.units;
            let inventory = self.inventory_mut(&posting.account, &posting.instrument);
            let available = inventory.available();
            return match inventory.reduce(requested) {
                Some(consumed) => Ok(Booking::Reduced(consumed)),
                None => Err(LedgerError::InsufficientInventory {
                    account: posting.account.clone(),
                    instrument: posting.instrument.clone(),
                    requested,
                    available,
                }),
            };
        }

        Ok(Booking::Ignored)
    }

    /// Total open units for one (account, instrument) pair.
    pub fn units_of(&self, account: &str, instrument: &str) -> Decimal {
        self.accounts
            .get(account)
            .and_then(|by_instrument| by_instrument.get(instrument))
            .map(|inv| inv.available())
            .unwrap_or(Decimal::ZERO)
    }

    fn inventory_mut(&mut self, account: &str, instrument: &str) -> &mut Inventory {
        self.accounts
            .entry(account.to_string())
            .or_default()
            .entry(instrument.to_string())
            .or_default()
    }
}
