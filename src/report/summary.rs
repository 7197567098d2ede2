//! P&L summary
//!
//! Rolls the per-instrument running totals into one row per instrument
//! (gain, loss, net, wash adjustment) plus a trailing grand-total row
//! keyed by the wildcard symbol.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::report::lot_sale::RunningTotals;

/// Instrument used for the trailing grand-total row.
pub const TOTAL_INSTRUMENT: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub instrument: String,
    pub gain: Decimal,
    pub loss: Decimal,
    pub net: Decimal,
    pub adjustment: Decimal,
}

/// One row per instrument, ascending, wildcard total last.
pub fn roll_up(totals: &RunningTotals) -> Vec<SummaryRow> {
    let instruments: BTreeSet<&str> = totals
        .gain
        .instruments()
        .chain(totals.loss.instruments())
        .chain(totals.adjustment.instruments())
        .collect();

    let mut rows = Vec::with_capacity(instruments.len() + 1);
    let mut gain = Decimal::ZERO;
    let mut loss = Decimal::ZERO;
    let mut adjustment = Decimal::ZERO;

    for instrument in instruments {
        let row = SummaryRow {
            instrument: instrument.to_string(),
            gain: totals.gain.get(instrument),
            loss: totals.loss.get(instrument),
            net: totals.gain.get(instrument) + totals.loss.get(instrument),
            adjustment: totals.adjustment.get(instrument),
        };
        gain += row.gain;
        loss += row.loss;
        adjustment += row.adjustment;
        rows.push(row);
    }

    rows.push(SummaryRow {
        instrument: TOTAL_INSTRUMENT.to_string(),
        gain,
        loss,
        net: gain + loss,
        adjustment,
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_roll_up_covers_all_buckets_and_totals() {
        let mut totals = RunningTotals::default();
        totals.gain.add("AAA", dec!(120.00));
        totals.loss.add("BBB", dec!(-200.00));
        totals.adjustment.add("CCC", dec!(-50.00));

        let rows = roll_up(&totals);
        assert_eq!(rows.len(), 4);

        // Instruments ascending, wildcard last.
        let names: Vec<&str> = rows.iter().map(|r| r.instrument.as_str()).collect();
        assert_eq!(names, vec!["AAA", "BBB", "CCC", "*"]);

        // An instrument with only a loss still shows zero gain.
        assert_eq!(rows[1].gain, dec!(0));
        assert_eq!(rows[1].loss, dec!(-200.00));
        assert_eq!(rows[1].net, dec!(-200.00));

        let total = &rows[3];
        assert_eq!(total.gain, dec!(120.00));
        assert_eq!(total.loss, dec!(-200.00));
        assert_eq!(total.net, dec!(-80.00));
        assert_eq!(total.adjustment, dec!(-50.00));
    }

    #[test]
    fn test_empty_totals_still_emit_wildcard_row() {
        let rows = roll_up(&RunningTotals::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].instrument, "*");
        assert_eq!(rows[0].net, dec!(0));
    }
}
