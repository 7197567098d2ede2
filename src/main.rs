use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use regex::Regex;
use tracing::{info, warn};

use lotgains::cli::{self, Cli, Commands, ReportKind};
use lotgains::ledger;
use lotgains::render;
use lotgains::report::{self, CommissionConfig, CommissionMode, ReportOptions};

fn main() -> Result<()> {
    // Report tables own stdout; diagnostics go to the error stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Report {
            kind,
            file,
            account,
            start,
            end,
            output,
            commission,
            commission_account,
        } => handle_report(
            kind,
            &file,
            &account,
            start,
            end,
            output,
            commission,
            commission_account,
        ),
    }
}

/// Handle report command
#[allow(clippy::too_many_arguments)]
fn handle_report(
    kind: ReportKind,
    file: &str,
    account: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output: Option<PathBuf>,
    commission: CommissionMode,
    commission_account: String,
) -> Result<()> {
    use colored::Colorize;

    let account_re = Regex::new(account)
        .with_context(|| format!("invalid account pattern: {}", account))?;
    let (start, end) = cli::resolve_window(start, end, Local::now().date_naive());

    info!("loading ledger from: {}", file);
    let (transactions, load_errors) = ledger::load_file(file)?;
    for error in &load_errors {
        warn!("ledger load: {}", error);
    }

    let options = ReportOptions {
        account: account_re,
        start,
        end,
        commission: CommissionConfig {
            mode: commission,
            account: commission_account,
        },
    };
    let gains = report::build(&transactions, &options)?;

    match kind {
        ReportKind::Detail => {
            println!("{}", "Detail of all lots".bold());
            println!("{}", "=".repeat(48));
            println!("{}", render::detail_table(&gains.lots));
            if let Some(path) = output {
                write_csv(&path, |file| render::write_detail_csv(file, &gains.lots))?;
            }
        }
        ReportKind::Aggregate => {
            println!(
                "{}",
                "Aggregated by trade & reference (to match the 1099)".bold()
            );
            println!("{}", "=".repeat(48));
            println!("{}", render::aggregate_table(&gains.aggregates));
            if let Some(path) = output {
                write_csv(&path, |file| {
                    render::write_aggregate_csv(file, &gains.aggregates)
                })?;
            }
        }
        ReportKind::Summary => {
            println!("{}", "Summary".bold());
            println!("{}", "=".repeat(48));
            println!("{}", render::summary_table(&gains.summary));
            if let Some(path) = output {
                write_csv(&path, |file| render::write_summary_csv(file, &gains.summary))?;
            }
        }
    }

    Ok(())
}

/// Create the CSV destination and hand it to the writer; the handle is
/// closed when this returns, on success and on error alike.
fn write_csv<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    write(file)?;
    info!("wrote CSV report to {}", path.display());
    Ok(())
}
