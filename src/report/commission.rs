//! Commission resolution
//!
//! Two live strategies, selected at run time: trust per-leg commission
//! metadata written by an external allocation pass (the default), or
//! compute the split ourselves from the transaction's commission posting,
//! proportionally to each leg's share of the units sold.

use std::fmt;

use clap::ValueEnum;
use rust_decimal::Decimal;

use crate::ledger::Transaction;
use crate::report::extract::SaleLeg;
use crate::report::lot_sale::round_cents;

/// How per-leg commission is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CommissionMode {
    /// Use commission metadata already present on each leg.
    #[default]
    Metadata,
    /// Prorate the transaction's commission posting across its sale legs.
    Computed,
}

impl fmt::Display for CommissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommissionMode::Metadata => write!(f, "metadata"),
            CommissionMode::Computed => write!(f, "computed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommissionConfig {
    pub mode: CommissionMode,
    /// Account fragment identifying the commission posting (computed mode).
    pub account: String,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            mode: CommissionMode::Metadata,
            account: "Commission".to_string(),
        }
    }
}

/// Total commission charged on a transaction: the units of the first
/// posting whose account mentions the commission account fragment.
pub fn transaction_commission(txn: &Transaction, account_fragment: &str) -> Decimal {
    txn.postings
        .iter()
        .find(|p| p.account.contains(account_fragment))
        .map(|p| p.units)
        .unwrap_or(Decimal::ZERO)
}

/// Distribute `total` across the legs proportionally to |units|.
pub fn allocate(legs: &mut [SaleLeg], total: Decimal) {
    let weights: Vec<Decimal> = legs.iter().map(|leg| leg.units.abs()).collect();
    let shares = prorate(total, &weights);
    for (leg, share) in legs.iter_mut().zip(shares) {
        leg.commission = Some(share);
    }
}

/// Split `total` by weight, quantized to cents, with the final share
/// taking the remainder so the shares always sum exactly to `total`.
pub fn prorate(total: Decimal, weights: &[Decimal]) -> Vec<Decimal> {
    let total_weight: Decimal = weights.iter().sum();
    let mut shares = Vec::with_capacity(weights.len());
    let mut allocated = Decimal::ZERO;

    for (i, weight) in weights.iter().enumerate() {
        let share = if i + 1 == weights.len() {
            total - allocated
        } else if total_weight.is_zero() {
            Decimal::ZERO
        } else {
            round_cents(total * weight / total_weight)
        };
        allocated += share;
        shares.push(share);
    }
    shares
}
