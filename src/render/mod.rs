//! Report rendering
//!
//! Turns the three report views into human-readable text tables (always
//! written to the report stream) and CSV (written to a caller-specified
//! destination on request). Both forms share one display row per view so
//! the columns line up with the brokerage form being cross-checked.

use std::io;

use rust_decimal::Decimal;
use tabled::{settings::Style, Table, Tabled};

use crate::error::Result;
use crate::report::{AggregateLotSale, LotSale, Merged, SummaryRow};

/// Shared column layout for detail and aggregate rows.
#[derive(Tabled)]
struct LotRow {
    #[tabled(rename = "No")]
    no: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Acquisition Date")]
    acquired: String,
    #[tabled(rename = "Sale Date")]
    sale_date: String,
    #[tabled(rename = "Days Held")]
    days_held: String,
    #[tabled(rename = "Tax Term")]
    term: String,
    #[tabled(rename = "Instrument")]
    instrument: String,
    #[tabled(rename = "Shares")]
    units: String,
    #[tabled(rename = "Share Cost")]
    unit_cost: String,
    #[tabled(rename = "Selling Price")]
    price: String,
    #[tabled(rename = "Cost Basis")]
    total_cost: String,
    #[tabled(rename = "Market Value")]
    total_proceeds: String,
    #[tabled(rename = "Commission")]
    commission: String,
    #[tabled(rename = "Proceeds")]
    net_proceeds: String,
    #[tabled(rename = "Gain")]
    pnl: String,
    #[tabled(rename = "Washed?")]
    washed: String,
    #[tabled(rename = "Adjustment")]
    adjustment: String,
}

const LOT_HEADERS: [&str; 17] = [
    "No",
    "Reference",
    "Acquisition Date",
    "Sale Date",
    "Days Held",
    "Tax Term",
    "Instrument",
    "Shares",
    "Share Cost",
    "Selling Price",
    "Cost Basis",
    "Market Value",
    "Commission",
    "Proceeds",
    "Gain",
    "Washed?",
    "Adjustment",
];

impl LotRow {
    fn record(&self) -> [&str; 17] {
        [
            self.no.as_str(),
            self.reference.as_str(),
            self.acquired.as_str(),
            self.sale_date.as_str(),
            self.days_held.as_str(),
            self.term.as_str(),
            self.instrument.as_str(),
            self.units.as_str(),
            self.unit_cost.as_str(),
            self.price.as_str(),
            self.total_cost.as_str(),
            self.total_proceeds.as_str(),
            self.commission.as_str(),
            self.net_proceeds.as_str(),
            self.pnl.as_str(),
            self.washed.as_str(),
            self.adjustment.as_str(),
        ]
    }
}

fn fmt_money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn fmt_wash(washed: bool) -> String {
    if washed { "W".to_string() } else { String::new() }
}

fn fmt_merged_money(value: &Merged<Decimal>) -> String {
    match value {
        Merged::Single(v) => fmt_money(*v),
        Merged::Various => "VARIOUS".to_string(),
    }
}

fn fmt_merged_price(value: &Merged<Option<Decimal>>) -> String {
    match value {
        Merged::Single(Some(v)) => fmt_money(*v),
        Merged::Single(None) => String::new(),
        Merged::Various => "VARIOUS".to_string(),
    }
}

impl From<&LotSale> for LotRow {
    fn from(sale: &LotSale) -> Self {
        Self {
            no: sale.sale_no.clone().unwrap_or_default(),
            reference: sale.reference.clone(),
            acquired: sale.acquired.to_string(),
            sale_date: sale.sale_date.to_string(),
            days_held: sale.days_held.to_string(),
            term: sale.term.to_string(),
            instrument: sale.instrument.clone(),
            units: fmt_money(sale.units),
            unit_cost: fmt_money(sale.unit_cost),
            price: sale.price.map(fmt_money).unwrap_or_default(),
            total_cost: fmt_money(sale.total_cost),
            total_proceeds: fmt_money(sale.total_proceeds),
            commission: fmt_money(sale.commission),
            net_proceeds: fmt_money(sale.net_proceeds),
            pnl: fmt_money(sale.pnl),
            washed: fmt_wash(sale.washed),
            adjustment: sale.adjustment.map(fmt_money).unwrap_or_default(),
        }
    }
}

impl From<&AggregateLotSale> for LotRow {
    fn from(agg: &AggregateLotSale) -> Self {
        Self {
            no: agg.sale_no.clone().unwrap_or_default(),
            reference: agg.reference.clone(),
            acquired: agg.acquired.to_string(),
            sale_date: agg.sale_date.to_string(),
            days_held: agg.days_held.to_string(),
            term: agg.term.to_string(),
            instrument: agg.instrument.clone(),
            units: fmt_money(agg.units),
            unit_cost: fmt_merged_money(&agg.unit_cost),
            price: fmt_merged_price(&agg.price),
            total_cost: fmt_money(agg.total_cost),
            total_proceeds: fmt_money(agg.total_proceeds),
            commission: fmt_money(agg.commission),
            net_proceeds: fmt_money(agg.net_proceeds),
            pnl: fmt_money(agg.pnl),
            washed: fmt_wash(agg.washed),
            adjustment: agg.adjustment.map(fmt_money).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct SummaryDisplayRow {
    #[tabled(rename = "Currency")]
    instrument: String,
    #[tabled(rename = "Gain")]
    gain: String,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Adj/Wash")]
    adjustment: String,
}

impl From<&SummaryRow> for SummaryDisplayRow {
    fn from(row: &SummaryRow) -> Self {
        Self {
            instrument: row.instrument.clone(),
            gain: fmt_money(row.gain),
            loss: fmt_money(row.loss),
            net: fmt_money(row.net),
            adjustment: fmt_money(row.adjustment),
        }
    }
}

pub fn detail_table(lots: &[LotSale]) -> String {
    let rows: Vec<LotRow> = lots.iter().map(LotRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn aggregate_table(aggs: &[AggregateLotSale]) -> String {
    let rows: Vec<LotRow> = aggs.iter().map(LotRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn summary_table(rows: &[SummaryRow]) -> String {
    let rows: Vec<SummaryDisplayRow> = rows.iter().map(SummaryDisplayRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn write_lot_csv<W: io::Write>(writer: W, rows: Vec<LotRow>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(LOT_HEADERS)?;
    for row in &rows {
        wtr.write_record(row.record())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_detail_csv<W: io::Write>(writer: W, lots: &[LotSale]) -> Result<()> {
    write_lot_csv(writer, lots.iter().map(LotRow::from).collect())
}

pub fn write_aggregate_csv<W: io::Write>(writer: W, aggs: &[AggregateLotSale]) -> Result<()> {
    write_lot_csv(writer, aggs.iter().map(LotRow::from).collect())
}

pub fn write_summary_csv<W: io::Write>(writer: W, rows: &[SummaryRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Currency", "Gain", "Loss", "Net", "Adj/Wash"])?;
    for row in rows {
        let display = SummaryDisplayRow::from(row);
        wtr.write_record([
            &display.instrument,
            &display.gain,
            &display.loss,
            &display.net,
            &display.adjustment,
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
