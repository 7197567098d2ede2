//! Ledger data model
//!
//! Transactions and postings as produced by the ledger file parser.
//! Metadata the reporting pipeline cares about (reference id, sale id,
//! wash flag, pre-resolved commission) is resolved into typed fields
//! once at load time rather than probed out of a key/value map downstream.

pub mod parser;

pub use parser::{load_file, load_str};

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Cost clause attached to a posting.
///
/// `{10.00 USD, 2023-01-10}` acquires a lot at that cost and date.
/// The empty clause `{}` marks a reduction whose lot is resolved by the
/// position ledger at booking time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CostSpec {
    pub unit_cost: Option<Decimal>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
}

impl CostSpec {
    /// True for the bare `{}` reduction marker.
    pub fn is_empty(&self) -> bool {
        self.unit_cost.is_none() && self.currency.is_none() && self.date.is_none()
    }
}

/// A single amount being deposited to or withdrawn from an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub account: String,
    /// Signed quantity; sales are negative.
    pub units: Decimal,
    /// Commodity of the units (instrument for lots, currency for cash legs).
    pub instrument: String,
    pub cost: Option<CostSpec>,
    /// Unit sale price from an `@ PRICE` clause.
    pub price: Option<Decimal>,
    /// Set by an external wash-sale detection pass (`wash: true` metadata).
    pub washed: bool,
    /// Pre-resolved commission share (`commission: 7.95` metadata).
    pub commission: Option<Decimal>,
}

/// A dated transaction with its postings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub flag: char,
    pub narration: String,
    /// Sale identifier from `sale:` metadata (brokerage trade number).
    pub sale_no: Option<String>,
    /// External reference from `ref:` metadata (ties legs to a tax form line).
    pub reference: Option<String>,
    pub postings: Vec<Posting>,
    /// Source line of the transaction header, for diagnostics.
    pub line: usize,
}
