use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::report::CommissionMode;

#[derive(Parser)]
#[command(name = "lotgains")]
#[command(
    version,
    about = "Realized-gain tax-lot reporter with wash-sale adjustments"
)]
#[command(
    long_about = "Compute realized-gain lot sale reports from a plain-text ledger: \
FIFO lot matching, commission proration, wash-sale adjustments, and detail/aggregate/summary \
tables for cross-checking a brokerage tax form."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute lot sale reports over a date window
    Report {
        /// Type of report
        #[arg(value_enum)]
        kind: ReportKind,

        /// Path to the ledger file
        file: String,

        /// Account pattern (regex, matched at the start of the account name)
        account: String,

        /// Start date (YYYY-MM-DD); defaults to Jan 1 of the current year
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD); defaults to Jan 1 of the year after start
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Output filename for the CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Commission resolution strategy
        #[arg(long, value_enum, default_value_t = CommissionMode::Metadata)]
        commission: CommissionMode,

        /// Account fragment identifying commission postings (computed mode)
        #[arg(long, default_value = "Commission")]
        commission_account: String,
    },
}

/// The three report views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// One row per lot sale
    Detail,
    /// One row per (sale no., reference) group
    Aggregate,
    /// Per-instrument gain/loss/adjustment totals
    Summary,
}

/// Resolve the reporting window: start defaults to Jan 1 of `today`'s
/// year, end to Jan 1 of the year after start.
pub fn resolve_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let start = start.unwrap_or_else(|| NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap());
    let end = end.unwrap_or_else(|| NaiveDate::from_ymd_opt(start.year() + 1, 1, 1).unwrap());
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_window_defaults_to_current_year() {
        let (start, end) = resolve_window(None, None, date("2023-07-15"));
        assert_eq!(start, date("2023-01-01"));
        assert_eq!(end, date("2024-01-01"));
    }

    #[test]
    fn test_window_end_follows_explicit_start() {
        let (start, end) = resolve_window(Some(date("2021-03-01")), None, date("2023-07-15"));
        assert_eq!(start, date("2021-03-01"));
        assert_eq!(end, date("2022-01-01"));
    }

    #[test]
    fn test_window_explicit_bounds_win() {
        let (start, end) = resolve_window(
            Some(date("2021-03-01")),
            Some(date("2021-09-01")),
            date("2023-07-15"),
        );
        assert_eq!(start, date("2021-03-01"));
        assert_eq!(end, date("2021-09-01"));
    }

    #[test]
    fn test_cli_parses_report_command() {
        use clap::Parser;
        let cli = Cli::parse_from([
            "lotgains",
            "report",
            "detail",
            "ledger.lg",
            "Assets:US:Broker",
            "--start",
            "2023-01-01",
            "-o",
            "out.csv",
        ]);
        let Commands::Report {
            kind,
            file,
            account,
            start,
            output,
            commission,
            ..
        } = cli.command;
        assert_eq!(kind, ReportKind::Detail);
        assert_eq!(file, "ledger.lg");
        assert_eq!(account, "Assets:US:Broker");
        assert_eq!(start, Some(date("2023-01-01")));
        assert_eq!(output, Some(PathBuf::from("out.csv")));
        assert_eq!(commission, CommissionMode::Metadata);
    }
}
