//! Smoke tests for the porder binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn profiles_list_names_builtins() {
    Command::cargo_bin("porder")
        .unwrap()
        .args(["profiles", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("amazon"))
        .stdout(predicate::str::contains("blinkit"));
}

#[test]
fn extract_csv_prints_json() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "ASIN,Title,Quantity,Total Amount").unwrap();
    writeln!(file, "B000X1,Widget,5,500.00").unwrap();

    Command::cargo_bin("porder")
        .unwrap()
        .args([
            "extract",
            file.path().to_str().unwrap(),
            "--profile",
            "amazon",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("B000X1"));
}

#[test]
fn extract_missing_file_fails() {
    Command::cargo_bin("porder")
        .unwrap()
        .args(["extract", "/no/such/file.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn unknown_profile_is_an_error() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "a,b").unwrap();

    Command::cargo_bin("porder")
        .unwrap()
        .args([
            "extract",
            file.path().to_str().unwrap(),
            "--profile",
            "acme",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown profile"));
}
