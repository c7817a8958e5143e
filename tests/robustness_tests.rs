use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const CREATE: &str = r#"{"type": "CREATE_PAYMENT", "payload": {"id": "p1", "createdAt": "2017-06-17T17:32:04.735Z", "updatedAt": "2017-06-17T17:32:04.735Z"}}"#;

#[test]
fn test_malformed_events_are_skipped() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{CREATE}").unwrap();
    // Not JSON at all
    writeln!(file, "type, client, tx, amount").unwrap();
    // Known kind, missing payload field
    writeln!(file, r#"{{"type": "SET_TIP", "payload": {{"tip": "0.07"}}}}"#).unwrap();
    // Negative amount
    writeln!(file, r#"{{"type": "SET_AMOUNT", "payload": {{"amount": "-5"}}}}"#).unwrap();
    // Valid amount
    writeln!(file, r#"{{"type": "SET_AMOUNT", "payload": {{"amount": "2.5"}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("pos-ledger"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading event"))
        .stdout(predicate::str::contains(
            "p1,2017-06-17T17:32:04.735+00:00,2017-06-17T17:32:04.735+00:00,,,,,2.5,2.5,2.5,,,,,,,",
        ));
}

#[test]
fn test_duplicate_creation_keeps_first_payment() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{CREATE}").unwrap();
    writeln!(file, r#"{{"type": "CREATE_PAYMENT", "payload": {{"id": "p1", "createdAt": "2017-06-18T09:00:00Z", "updatedAt": "2017-06-18T09:00:00Z"}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("pos-ledger"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("p1,2017-06-17T17:32:04.735+00:00"))
        .stdout(predicate::str::contains("2017-06-18").not());
}

#[test]
fn test_strict_mode_reports_rejected_events() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{CREATE}").unwrap();
    writeln!(file, "{CREATE}").unwrap();
    writeln!(file, r#"{{"type": "SET_RECEIPT", "payload": {{"id": "p2", "receipt": "070617/229-9"}}}}"#).unwrap();
    writeln!(file, r#"{{"type": "SET_RECEIPT", "payload": {{"id": "p1", "receipt": "070617/229-9"}}}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("pos-ledger"));
    cmd.arg(file.path()).arg("--strict");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error dispatching event"))
        .stderr(predicate::str::contains("Payment p1 already exists"))
        .stderr(predicate::str::contains("Payment p2 not found"))
        .stdout(predicate::str::contains("070617/229-9"));
}
