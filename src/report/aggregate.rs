//! Aggregation by trade
//!
//! Lot sales are grouped by (sale no., reference) and merged into one
//! record per trade so the report can be cross-checked line-by-line
//! against a brokerage 1099. Scalar fields that disagree across the
//! group collapse to a VARIOUS sentinel; numeric fields sum.

use std::fmt;

use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::Decimal;

use crate::report::lot_sale::{LotSale, Term};

/// A scalar collapsed across merged lot sales: the common value when all
/// members agree, VARIOUS otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merged<T> {
    Single(T),
    Various,
}

impl<T: PartialEq> Merged<T> {
    fn combine(self, next: T) -> Merged<T> {
        match self {
            Merged::Single(value) if value == next => Merged::Single(value),
            _ => Merged::Various,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Merged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Merged::Single(value) => value.fmt(f),
            Merged::Various => write!(f, "VARIOUS"),
        }
    }
}

/// One or more lot sales merged by (sale no., reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateLotSale {
    pub sale_no: Option<String>,
    pub reference: String,
    pub acquired: Merged<NaiveDate>,
    pub sale_date: Merged<NaiveDate>,
    pub days_held: Merged<i64>,
    pub term: Merged<Term>,
    pub instrument: String,
    pub units: Decimal,
    pub unit_cost: Merged<Decimal>,
    pub price: Merged<Option<Decimal>>,
    pub total_cost: Decimal,
    pub total_proceeds: Decimal,
    pub commission: Decimal,
    pub net_proceeds: Decimal,
    pub pnl: Decimal,
    pub washed: bool,
    pub adjustment: Option<Decimal>,
}

impl AggregateLotSale {
    pub fn from_sale(sale: &LotSale) -> Self {
        Self {
            sale_no: sale.sale_no.clone(),
            reference: sale.reference.clone(),
            acquired: Merged::Single(sale.acquired),
            sale_date: Merged::Single(sale.sale_date),
            days_held: Merged::Single(sale.days_held),
            term: Merged::Single(sale.term),
            instrument: sale.instrument.clone(),
            units: sale.units,
            unit_cost: Merged::Single(sale.unit_cost),
            price: Merged::Single(sale.price),
            total_cost: sale.total_cost,
            total_proceeds: sale.total_proceeds,
            commission: sale.commission,
            net_proceeds: sale.net_proceeds,
            pnl: sale.pnl,
            washed: sale.washed,
            adjustment: sale.adjustment,
        }
    }

    /// Reducer over immutable records: fold the next member into the
    /// accumulated aggregate.
    pub fn merge(self, next: &LotSale) -> Self {
        Self {
            sale_no: self.sale_no,
            reference: self.reference,
            instrument: self.instrument,
            acquired: self.acquired.combine(next.acquired),
            sale_date: self.sale_date.combine(next.sale_date),
            days_held: self.days_held.combine(next.days_held),
            term: self.term.combine(next.term),
            units: self.units + next.units,
            unit_cost: self.unit_cost.combine(next.unit_cost),
            price: self.price.combine(next.price),
            total_cost: self.total_cost + next.total_cost,
            total_proceeds: self.total_proceeds + next.total_proceeds,
            commission: self.commission + next.commission,
            net_proceeds: self.net_proceeds + next.net_proceeds,
            pnl: self.pnl + next.pnl,
            washed: self.washed || next.washed,
            adjustment: match (self.adjustment, next.adjustment) {
                (None, None) => None,
                (a, b) => Some(
                    a.unwrap_or(Decimal::ZERO) + b.unwrap_or(Decimal::ZERO),
                ),
            },
        }
    }
}

/// Group lot sales by (sale no., reference) and merge each group,
/// ordered ascending by (reference, sale no.).
pub fn aggregate_sales(sales: &[LotSale]) -> Vec<AggregateLotSale> {
    sales
        .iter()
        .into_group_map_by(|sale| (sale.reference.clone(), sale.sale_no.clone()))
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, members)| {
            let mut iter = members.into_iter();
            let first = AggregateLotSale::from_sale(iter.next().expect("non-empty group"));
            iter.fold(first, AggregateLotSale::merge)
        })
        .collect()
}
