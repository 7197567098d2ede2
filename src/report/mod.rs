//! Realized-gains reporting pipeline
//!
//! ledger transactions -> sale leg extraction (consulting the position
//! ledger) -> commission resolution -> lot sale building -> aggregation
//! and summary roll-up. Single-threaded, one pass, deterministic.

pub mod aggregate;
pub mod commission;
pub mod extract;
pub mod lot_sale;
pub mod summary;

use chrono::NaiveDate;
use regex::Regex;

pub use aggregate::{aggregate_sales, AggregateLotSale, Merged};
pub use commission::{CommissionConfig, CommissionMode};
pub use extract::SaleLeg;
pub use lot_sale::{LotSale, RunningTotals, Term};
pub use summary::{SummaryRow, TOTAL_INSTRUMENT};

use crate::error::Result;
use crate::ledger::Transaction;

/// Inputs for one reporting run.
#[derive(Debug)]
pub struct ReportOptions {
    /// Matched against posting accounts, anchored at the start.
    pub account: Regex,
    /// Window start, inclusive; earlier entries only build inventory.
    pub start: NaiveDate,
    /// Window end, exclusive; processing stops at the first entry past it.
    pub end: NaiveDate,
    pub commission: CommissionConfig,
}

/// The three report-ready views over one run.
#[derive(Debug)]
pub struct RealizedGains {
    pub lots: Vec<LotSale>,
    pub aggregates: Vec<AggregateLotSale>,
    pub summary: Vec<SummaryRow>,
}

/// Run the full pipeline over date-ordered transactions.
pub fn build(transactions: &[Transaction], options: &ReportOptions) -> Result<RealizedGains> {
    let legs = extract::extract_sale_legs(transactions, options)?;

    let mut totals = RunningTotals::default();
    let lots: Vec<LotSale> = legs.iter().map(LotSale::build).collect();
    for lot in &lots {
        totals.record(lot);
    }

    let aggregates = aggregate_sales(&lots);
    let summary = summary::roll_up(&totals);

    Ok(RealizedGains {
        lots,
        aggregates,
        summary,
    })
}
