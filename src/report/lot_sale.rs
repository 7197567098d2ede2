//! Lot sale records
//!
//! Converts a matched sale leg into a report-ready [`LotSale`] with
//! computed holding period, tax term, totals, P&L and wash adjustment,
//! and keeps the per-instrument gain/loss/adjustment running totals the
//! summary report rolls up.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::report::extract::SaleLeg;

/// Holding periods of a year or more qualify as long-term.
pub const LONG_TERM_DAYS: i64 = 365;

/// Quantize to cents, half-even.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Tax holding-period classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Short,
    Long,
}

impl Term {
    pub fn from_days_held(days_held: i64) -> Self {
        if days_held >= LONG_TERM_DAYS {
            Term::Long
        } else {
            Term::Short
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Short => write!(f, "SHORT"),
            Term::Long => write!(f, "LONG"),
        }
    }
}

/// One matched sale leg after resolution. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotSale {
    pub sale_no: Option<String>,
    pub reference: String,
    pub acquired: NaiveDate,
    pub sale_date: NaiveDate,
    pub days_held: i64,
    pub term: Term,
    pub instrument: String,
    /// Units sold, positive, quantized to cents.
    pub units: Decimal,
    pub unit_cost: Decimal,
    pub price: Option<Decimal>,
    pub total_cost: Decimal,
    /// Market value of the sale before commission.
    pub total_proceeds: Decimal,
    pub commission: Decimal,
    /// Proceeds net of commission.
    pub net_proceeds: Decimal,
    pub pnl: Decimal,
    pub washed: bool,
    /// Basis adjustment disallowing the loss; present only when washed.
    pub adjustment: Option<Decimal>,
}

impl LotSale {
    /// Pure function over one sale leg plus its ledger-resolved cost.
    pub fn build(leg: &SaleLeg) -> LotSale {
        let units = -leg.units;
        let total_cost = round_cents(units * leg.unit_cost);
        // A leg may legitimately lack a price (reported upstream as a
        // diagnostic); it contributes zero proceeds, not a crash.
        let total_proceeds = leg
            .price
            .map(|price| round_cents(units * price))
            .unwrap_or(Decimal::ZERO);
        let commission = round_cents(leg.commission.unwrap_or(Decimal::ZERO));
        let pnl = round_cents(total_proceeds - total_cost - commission);

        let days_held = leg.sale_date.signed_duration_since(leg.acquired).num_days();
        let term = Term::from_days_held(days_held);

        let adjustment = leg.washed.then_some(-pnl);

        LotSale {
            sale_no: leg.sale_no.clone(),
            reference: leg.reference.clone(),
            acquired: leg.acquired,
            sale_date: leg.sale_date,
            days_held,
            term,
            instrument: leg.instrument.clone(),
            units: round_cents(units),
            unit_cost: round_cents(leg.unit_cost),
            price: leg.price.map(round_cents),
            total_cost,
            total_proceeds,
            commission,
            net_proceeds: total_proceeds - commission,
            pnl,
            washed: leg.washed,
            adjustment,
        }
    }
}

/// Per-instrument decimal totals with a get-or-zero accessor.
///
/// BTreeMap keeps instrument iteration in ascending order for the
/// summary report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstrumentTotals {
    totals: BTreeMap<String, Decimal>,
}

impl InstrumentTotals {
    pub fn add(&mut self, instrument: &str, amount: Decimal) {
        *self.totals.entry(instrument.to_string()).or_default() += amount;
    }

    /// Total for an instrument, zero when never seen.
    pub fn get(&self, instrument: &str) -> Decimal {
        self.totals.get(instrument).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.totals.keys().map(String::as_str)
    }
}

/// Gain/loss/adjustment accumulators for one processing pass.
#[derive(Debug, Default)]
pub struct RunningTotals {
    pub gain: InstrumentTotals,
    pub loss: InstrumentTotals,
    pub adjustment: InstrumentTotals,
}

impl RunningTotals {
    /// Fold one lot sale into the per-instrument buckets: profitable
    /// sales into gain, unwashed losses into loss. A washed loss is
    /// disallowed, so it lands in the adjustment bucket instead of loss.
    pub fn record(&mut self, sale: &LotSale) {
        if sale.total_proceeds > sale.total_cost {
            self.gain.add(&sale.instrument, sale.pnl);
        } else if !sale.washed {
            self.loss.add(&sale.instrument, sale.pnl);
        }
        if sale.washed {
            self.adjustment.add(&sale.instrument, sale.pnl);
        }
    }
}
