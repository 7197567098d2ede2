//! Plain-text ledger parser
//!
//! Parses a simplified beancount-style ledger into [`Transaction`]s:
//!
//! ```text
//! ; comment
//! 2023-01-10 * "Buy UMMY"
//!   sale: S-1042
//!   ref: REF-9823
//!   Assets:US:Broker:UMMY    100 UMMY {10.00 USD, 2023-01-10}
//!   Assets:US:Broker:Cash   -1000.00 USD
//! ```
//!
//! Indented `key: value` lines before the first posting attach to the
//! transaction; after a posting they attach to that posting. Malformed
//! lines are collected as advisory [`LoadError`]s and the rest of the
//! file is still loaded.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{LoadError, Result};
use crate::ledger::{CostSpec, Posting, Transaction};

/// Load a ledger file, returning parsed transactions in date order plus
/// any advisory parse errors.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<(Vec<Transaction>, Vec<LoadError>)> {
    let source = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read ledger file {}", path.as_ref().display()))?;
    Ok(load_str(&source))
}

/// Parse ledger text. Transactions come back sorted by date (stable, so
/// same-day entries keep file order); errors carry 1-based line numbers.
pub fn load_str(source: &str) -> (Vec<Transaction>, Vec<LoadError>) {
    let mut parser = Parser::new();
    for (idx, raw) in source.lines().enumerate() {
        parser.feed(idx + 1, raw);
    }
    parser.finish()
}

struct Parser {
    header_re: Regex,
    meta_re: Regex,
    posting_re: Regex,
    transactions: Vec<Transaction>,
    errors: Vec<LoadError>,
    current: Option<Transaction>,
}

impl Parser {
    fn new() -> Self {
        Self {
            // 2023-01-10 * "Buy UMMY"
            header_re: Regex::new(r#"^(\d{4}-\d{2}-\d{2})\s+([*!])\s+"([^"]*)"\s*$"#)
                .expect("header regex"),
            // key: value (keys are lowercase; accounts start uppercase)
            meta_re: Regex::new(r"^\s+([a-z][a-z0-9_-]*):\s*(.+?)\s*$").expect("meta regex"),
            // Account  NUMBER COMMODITY [{...}] [@ PRICE [CUR]]
            posting_re: Regex::new(
                r"(?x)^\s+
                  ([A-Z][A-Za-z0-9:._-]*)\s+
                  (-?[0-9][0-9.]*)\s+
                  ([A-Z][A-Z0-9._-]*)
                  (?:\s*\{([^}]*)\})?
                  (?:\s*@\s*([0-9][0-9.]*)(?:\s+[A-Z][A-Z0-9._-]*)?)?
                  \s*$",
            )
            .expect("posting regex"),
            transactions: Vec::new(),
            errors: Vec::new(),
            current: None,
        }
    }

    fn feed(&mut self, line: usize, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            return;
        }

        if !raw.starts_with(char::is_whitespace) {
            self.flush();
            match self.parse_header(line, raw) {
                Ok(txn) => self.current = Some(txn),
                Err(message) => self.errors.push(LoadError { line, message }),
            }
            return;
        }

        if let Some(caps) = self.meta_re.captures(raw) {
            let key = &caps[1];
            let value = unquote(&caps[2]);
            match self.current.as_mut() {
                Some(txn) => {
                    if let Err(message) = apply_metadata(txn, key, value) {
                        self.errors.push(LoadError { line, message });
                    }
                }
                None => self.errors.push(stray_line(line, trimmed)),
            }
            return;
        }

        match self.parse_posting(raw) {
            Ok(posting) => match self.current.as_mut() {
                Some(txn) => txn.postings.push(posting),
                None => self.errors.push(stray_line(line, trimmed)),
            },
            Err(message) => {
                let error = if self.current.is_some() {
                    LoadError { line, message }
                } else {
                    stray_line(line, trimmed)
                };
                self.errors.push(error);
            }
        }
    }

    fn parse_header(&self, line: usize, raw: &str) -> std::result::Result<Transaction, String> {
        let caps = self
            .header_re
            .captures(raw)
            .ok_or_else(|| format!("unrecognized directive: {}", raw.trim()))?;
        let date = NaiveDate::from_str(&caps[1]).map_err(|e| format!("bad date: {}", e))?;
        Ok(Transaction {
            date,
            flag: caps[2].chars().next().unwrap_or('*'),
            narration: caps[3].to_string(),
            sale_no: None,
            reference: None,
            postings: Vec::new(),
            line,
        })
    }

    fn parse_posting(&self, raw: &str) -> std::result::Result<Posting, String> {
        let caps = self
            .posting_re
            .captures(raw)
            .ok_or_else(|| format!("unparseable posting: {}", raw.trim()))?;

        let units = parse_decimal(&caps[2])?;
        let cost = match caps.get(4) {
            Some(inner) => Some(parse_cost_spec(inner.as_str())?),
            None => None,
        };
        let price = match caps.get(5) {
            Some(p) => Some(parse_decimal(p.as_str())?),
            None => None,
        };

        Ok(Posting {
            account: caps[1].to_string(),
            units,
            instrument: caps[3].to_string(),
            cost,
            price,
            washed: false,
            commission: None,
        })
    }

    fn flush(&mut self) {
        if let Some(txn) = self.current.take() {
            self.transactions.push(txn);
        }
    }

    fn finish(mut self) -> (Vec<Transaction>, Vec<LoadError>) {
        self.flush();
        // Downstream assumes non-decreasing dates; stable sort keeps
        // intra-day file order.
        self.transactions.sort_by_key(|t| t.date);
        (self.transactions, self.errors)
    }
}

/// Parse the inside of a `{...}` clause: empty, `COST CUR`, or `COST CUR, DATE`.
fn parse_cost_spec(inner: &str) -> std::result::Result<CostSpec, String> {
    let inner = inner.trim();
    if inner.is_empty() {
        return Ok(CostSpec::default());
    }

    let (amount_part, date_part) = match inner.split_once(',') {
        Some((a, d)) => (a.trim(), Some(d.trim())),
        None => (inner, None),
    };

    let mut tokens = amount_part.split_whitespace();
    let number = tokens
        .next()
        .ok_or_else(|| format!("empty cost amount in {{{}}}", inner))?;
    let unit_cost = parse_decimal(number)?;
    let currency = tokens.next().map(|c| c.to_string());
    if tokens.next().is_some() {
        return Err(format!("trailing tokens in cost {{{}}}", inner));
    }

    let date = match date_part {
        Some(d) => Some(NaiveDate::from_str(d).map_err(|e| format!("bad cost date {}: {}", d, e))?),
        None => None,
    };

    Ok(CostSpec {
        unit_cost: Some(unit_cost),
        currency,
        date,
    })
}

fn apply_metadata(
    txn: &mut Transaction,
    key: &str,
    value: &str,
) -> std::result::Result<(), String> {
    match (key, txn.postings.last_mut()) {
        // Before the first posting: transaction metadata.
        ("ref", None) => txn.reference = Some(value.to_string()),
        ("sale", None) => txn.sale_no = Some(value.to_string()),
        ("wash", Some(posting)) => {
            posting.washed = value.eq_ignore_ascii_case("true");
        }
        ("commission", Some(posting)) => {
            // Accept either a bare number or an amount with currency.
            let number = value.split_whitespace().next().unwrap_or(value);
            posting.commission = Some(parse_decimal(number)?);
        }
        // Unknown keys (and known keys in the wrong position) are ignored,
        // matching the free-form metadata contract.
        _ => {}
    }
    Ok(())
}

fn stray_line(line: usize, content: &str) -> LoadError {
    LoadError {
        line,
        message: format!("indented line outside a transaction: {}", content),
    }
}

fn parse_decimal(s: &str) -> std::result::Result<Decimal, String> {
    Decimal::from_str(s).map_err(|e| format!("bad number {}: {}", s, e))
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}
