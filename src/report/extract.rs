//! Sale leg extraction
//!
//! Walks transactions in date order against a `[start, end)` window,
//! keeping the position ledger current. Transactions before the window
//! only build up opening inventory; the first transaction at or past the
//! end stops the walk. In-window reducing postings on transactions that
//! carry a reference become sale legs, one per consumed lot, so every leg
//! has a single acquisition date and unit cost for the ledger-resolved
//! lot it closes.

use anyhow::Context;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::error;

use crate::error::Result;
use crate::ledger::{Posting, Transaction};
use crate::positions::{Booking, ConsumedLot, PositionLedger};
use crate::report::commission::{self, CommissionMode};
use crate::report::ReportOptions;

/// One matched sale leg: a reducing posting joined with the lot it closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLeg {
    pub sale_no: Option<String>,
    pub reference: String,
    pub sale_date: NaiveDate,
    pub instrument: String,
    /// Signed as posted; sales are negative.
    pub units: Decimal,
    /// Cost basis resolved by the position ledger.
    pub unit_cost: Decimal,
    pub acquired: NaiveDate,
    pub price: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub washed: bool,
}

/// Matches accounts the way `re.match` does: at the start of the string.
pub(crate) fn account_matches(pattern: &Regex, account: &str) -> bool {
    pattern.find(account).is_some_and(|m| m.start() == 0)
}

pub fn extract_sale_legs(
    transactions: &[Transaction],
    options: &ReportOptions,
) -> Result<Vec<SaleLeg>> {
    let mut ledger = PositionLedger::new();
    let mut sales = Vec::new();

    for txn in transactions {
        // Transactions are date-sorted; past the window means done.
        if txn.date >= options.end {
            break;
        }

        if txn.date < options.start {
            // Warm-up: accumulate opening inventory, emit nothing.
            for posting in matching_postings(txn, &options.account) {
                ledger
                    .book(posting, txn.date)
                    .with_context(|| booking_context(txn))?;
            }
            continue;
        }

        let mut txn_legs = Vec::new();
        for posting in matching_postings(txn, &options.account) {
            let booking = ledger
                .book(posting, txn.date)
                .with_context(|| booking_context(txn))?;

            // Legs without a reference are not reportable sales.
            let Some(reference) = txn.reference.as_deref() else {
                continue;
            };
            let Booking::Reduced(consumed) = booking else {
                continue;
            };

            if posting.price.is_none() {
                error!(
                    "missing price on sale of {} {} in {} ({})",
                    -posting.units,
                    posting.instrument,
                    posting.account,
                    txn.date,
                );
            }

            txn_legs.extend(split_into_legs(txn, reference, posting, &consumed));
        }

        // The external allocation mechanism fills per-leg commission
        // metadata; only compute our own split when configured to.
        if options.commission.mode == CommissionMode::Computed && !txn_legs.is_empty() {
            let total = commission::transaction_commission(txn, &options.commission.account);
            commission::allocate(&mut txn_legs, total);
        }

        sales.extend(txn_legs);
    }

    Ok(sales)
}

fn matching_postings<'a>(
    txn: &'a Transaction,
    pattern: &'a Regex,
) -> impl Iterator<Item = &'a Posting> {
    txn.postings
        .iter()
        .filter(move |p| account_matches(pattern, &p.account))
}

fn booking_context(txn: &Transaction) -> String {
    format!(
        "while booking transaction \"{}\" on {} (line {})",
        txn.narration, txn.date, txn.line
    )
}

/// One leg per consumed lot. A posting-level commission is spread across
/// the split legs by unit share so the posting total is preserved.
fn split_into_legs(
    txn: &Transaction,
    reference: &str,
    posting: &Posting,
    consumed: &[ConsumedLot],
) -> Vec<SaleLeg> {
    let weights: Vec<Decimal> = consumed.iter().map(|lot| lot.units).collect();
    let commissions = posting
        .commission
        .map(|total| commission::prorate(total, &weights));

    consumed
        .iter()
        .enumerate()
        .map(|(i, lot)| SaleLeg {
            sale_no: txn.sale_no.clone(),
            reference: reference.to_string(),
            sale_date: txn.date,
            instrument: posting.instrument.clone(),
            units: -lot.units,
            unit_cost: lot.unit_cost,
            acquired: lot.acquired,
            price: posting.price,
            commission: commissions.as_ref().map(|shares| shares[i]),
            washed: posting.washed,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::load_str;
    use crate::report::commission::CommissionConfig;
    use rust_decimal_macros::dec;

    fn options(start: &str, end: &str) -> ReportOptions {
        ReportOptions {
            account: Regex::new("Assets:US:Broker").unwrap(),
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            commission: CommissionConfig::default(),
        }
    }

    const LEDGER: &str = r#"
2022-06-01 * "Opening buy"
  Assets:US:Broker:UMMY    100 UMMY {10.00 USD, 2022-06-01}
  Assets:US:Broker:Cash   -1000.00 USD

2023-03-15 * "Sell in window"
  ref: REF-1
  sale: S-1
  Assets:US:Broker:UMMY    -60 UMMY {} @ 12.00 USD
  Assets:US:Broker:Cash     720.00 USD

2024-02-01 * "Sell past window"
  ref: REF-2
  Assets:US:Broker:UMMY    -40 UMMY {} @ 13.00 USD
"#;

    #[test]
    fn test_window_and_warmup() {
        let (txns, errors) = load_str(LEDGER);
        assert!(errors.is_empty());

        let legs =
            extract_sale_legs(&txns, &options("2023-01-01", "2024-01-01")).unwrap();
        assert_eq!(legs.len(), 1);

        let leg = &legs[0];
        assert_eq!(leg.reference, "REF-1");
        assert_eq!(leg.sale_no.as_deref(), Some("S-1"));
        assert_eq!(leg.units, dec!(-60));
        // Cost resolved from the pre-window lot.
        assert_eq!(leg.unit_cost, dec!(10.00));
        assert_eq!(leg.acquired, "2022-06-01".parse().unwrap());
        assert_eq!(leg.price, Some(dec!(12.00)));
    }

    #[test]
    fn test_sale_without_reference_is_not_a_leg() {
        let src = r#"
2023-01-10 * "Buy"
  Assets:US:Broker:UMMY    100 UMMY {10.00 USD}

2023-03-15 * "Unreferenced sell"
  Assets:US:Broker:UMMY   -100 UMMY {} @ 12.00 USD
"#;
        let (txns, _) = load_str(src);
        let legs =
            extract_sale_legs(&txns, &options("2023-01-01", "2024-01-01")).unwrap();
        assert!(legs.is_empty());
    }

    #[test]
    fn test_multi_lot_sale_splits_with_commission() {
        let src = r#"
2023-01-10 * "Buy one"
  Assets:US:Broker:UMMY    60 UMMY {10.00 USD, 2023-01-10}

2023-02-10 * "Buy two"
  Assets:US:Broker:UMMY    40 UMMY {11.00 USD, 2023-02-10}

2023-06-01 * "Sell all"
  ref: REF-1
  Assets:US:Broker:UMMY   -100 UMMY {} @ 12.00 USD
    commission: 10.00
"#;
        let (txns, _) = load_str(src);
        let legs =
            extract_sale_legs(&txns, &options("2023-01-01", "2024-01-01")).unwrap();
        assert_eq!(legs.len(), 2);

        assert_eq!(legs[0].units, dec!(-60));
        assert_eq!(legs[0].unit_cost, dec!(10.00));
        assert_eq!(legs[0].commission, Some(dec!(6.00)));
        assert_eq!(legs[1].units, dec!(-40));
        assert_eq!(legs[1].unit_cost, dec!(11.00));
        assert_eq!(legs[1].commission, Some(dec!(4.00)));
    }

    #[test]
    fn test_oversell_aborts_extraction() {
        let src = r#"
2023-01-10 * "Buy"
  Assets:US:Broker:UMMY    10 UMMY {10.00 USD}

2023-03-15 * "Oversell"
  ref: REF-1
  Assets:US:Broker:UMMY    -20 UMMY {} @ 12.00 USD
"#;
        let (txns, _) = load_str(src);
        let err = extract_sale_legs(&txns, &options("2023-01-01", "2024-01-01")).unwrap_err();
        assert!(format!("{:?}", err).contains("insufficient inventory"));
    }

    #[test]
    fn test_nonmatching_accounts_are_skipped() {
        let src = r#"
2023-01-10 * "Buy elsewhere"
  Assets:UK:Broker:UMMY    10 UMMY {10.00 USD}

2023-03-15 * "Sell elsewhere"
  ref: REF-1
  Assets:UK:Broker:UMMY   -10 UMMY {} @ 12.00 USD
"#;
        let (txns, _) = load_str(src);
        let legs =
            extract_sale_legs(&txns, &options("2023-01-01", "2024-01-01")).unwrap();
        assert!(legs.is_empty());
    }

    #[test]
    fn test_missing_price_still_emits_leg() {
        let src = r#"
2023-01-10 * "Buy"
  Assets:US:Broker:UMMY    10 UMMY {10.00 USD}

2023-03-15 * "Sell without price"
  ref: REF-1
  Assets:US:Broker:UMMY   -10 UMMY {}
"#;
        let (txns, _) = load_str(src);
        let legs =
            extract_sale_legs(&txns, &options("2023-01-01", "2024-01-01")).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].price, None);
    }
}
