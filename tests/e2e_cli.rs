use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const LEDGER: &str = r#"
2023-01-10 * "Buy"
  Assets:US:Broker:UMMY    100 UMMY {10.00 USD, 2023-01-10}
  Assets:US:Broker:Cash   -1000.00 USD

2023-09-12 * "Sell"
  ref: REF-1
  sale: S-1
  Assets:US:Broker:UMMY   -100 UMMY {} @ 8.00 USD
  Assets:US:Broker:Cash     800.00 USD
"#;

fn write_ledger(dir: &TempDir) -> String {
    let path = dir.path().join("ledger.lg");
    fs::write(&path, LEDGER).expect("failed to write ledger fixture");
    path.to_string_lossy().into_owned()
}

fn lotgains() -> Command {
    Command::new(cargo::cargo_bin!("lotgains"))
}

#[test]
fn detail_report_prints_lot_table() {
    let dir = TempDir::new().unwrap();
    let ledger = write_ledger(&dir);

    let mut cmd = lotgains();
    cmd.arg("--no-color")
        .arg("report")
        .arg("detail")
        .arg(&ledger)
        .arg("Assets:US:Broker")
        .arg("--start")
        .arg("2023-01-01");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Detail of all lots"))
        .stdout(predicate::str::contains("REF-1"))
        .stdout(predicate::str::contains("1000.00"))
        .stdout(predicate::str::contains("-200.00"))
        .stdout(predicate::str::contains("SHORT"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn summary_report_shows_wildcard_total() {
    let dir = TempDir::new().unwrap();
    let ledger = write_ledger(&dir);

    let mut cmd = lotgains();
    cmd.arg("--no-color")
        .arg("report")
        .arg("summary")
        .arg(&ledger)
        .arg("Assets:US:Broker")
        .arg("--start")
        .arg("2023-01-01");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Summary"))
        .stdout(predicate::str::contains("*"))
        .stdout(predicate::str::contains("-200.00"));
}

#[test]
fn output_flag_writes_csv() {
    let dir = TempDir::new().unwrap();
    let ledger = write_ledger(&dir);
    let csv_path = dir.path().join("detail.csv");

    let mut cmd = lotgains();
    cmd.arg("report")
        .arg("detail")
        .arg(&ledger)
        .arg("Assets:US:Broker")
        .arg("--start")
        .arg("2023-01-01")
        .arg("-o")
        .arg(&csv_path);

    cmd.assert().success();

    let csv = fs::read_to_string(&csv_path).expect("csv file should exist");
    assert!(csv.starts_with("No,Reference,"));
    assert!(csv.contains("S-1,REF-1,2023-01-10,2023-09-12"));
}

#[test]
fn unknown_report_kind_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let ledger = write_ledger(&dir);

    let mut cmd = lotgains();
    cmd.arg("report")
        .arg("everything")
        .arg(&ledger)
        .arg("Assets:US:Broker");

    cmd.assert().failure().stdout(predicate::str::is_empty());
}

#[test]
fn invalid_date_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let ledger = write_ledger(&dir);

    let mut cmd = lotgains();
    cmd.arg("report")
        .arg("detail")
        .arg(&ledger)
        .arg("Assets:US:Broker")
        .arg("--start")
        .arg("not-a-date");

    cmd.assert().failure().stdout(predicate::str::is_empty());
}

#[test]
fn missing_ledger_file_fails() {
    let mut cmd = lotgains();
    cmd.arg("report")
        .arg("detail")
        .arg("/nonexistent/ledger.lg")
        .arg("Assets:US:Broker");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to read ledger file"));
}

#[test]
fn oversell_aborts_without_output_tables() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.lg");
    fs::write(
        &path,
        r#"
2023-01-10 * "Buy"
  Assets:US:Broker:UMMY    10 UMMY {10.00 USD, 2023-01-10}

2023-06-01 * "Oversell"
  ref: REF-1
  Assets:US:Broker:UMMY   -25 UMMY {} @ 12.00 USD
"#,
    )
    .unwrap();

    let mut cmd = lotgains();
    cmd.arg("report")
        .arg("detail")
        .arg(path.to_string_lossy().as_ref())
        .arg("Assets:US:Broker")
        .arg("--start")
        .arg("2023-01-01");

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Detail of all lots").not())
        .stderr(predicate::str::contains("insufficient inventory"));
}
