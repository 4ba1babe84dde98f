//! Integration tests for the `tour-plan` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the ranges, dates,
//! lines and tours subcommands through the actual binary, including stdin input,
//! JSON output and error handling.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the plan.json fixture.
fn plan_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/plan.json")
}

/// Helper: read the plan.json fixture as a string.
fn plan_json() -> String {
    std::fs::read_to_string(plan_path()).expect("plan.json fixture must exist")
}

fn tour_plan() -> Command {
    Command::cargo_bin("tour-plan").unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// ranges
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn ranges_text_output() {
    tour_plan()
        .args([
            "ranges", "-i", plan_path(), "--tour", "1", "--from", "2026-03-01", "--to", "2026-04-30",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "10\t2026-03-01\t2026-03-15\tevery 1 week(s) on Mon,Wed; cancel on non-business days",
        ))
        .stdout(predicate::str::contains(
            "11\t2026-03-16\t2026-04-30\tevery 1 month(s) on day 31; move on non-business days",
        ));
}

#[test]
fn ranges_json_output() {
    let output = tour_plan()
        .args([
            "ranges", "-i", plan_path(), "--tour", "1", "--from", "2026-03-01", "--to", "2026-04-30",
            "--format", "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ranges = value.as_array().unwrap();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0]["tour_version_id"], 10);
    assert_eq!(ranges[0]["valid_to"], "2026-03-15");
    assert_eq!(ranges[0]["frequency"]["type"], "weekly");
    assert_eq!(ranges[0]["frequency"]["only_days"], serde_json::json!(["Mon", "Wed"]));
    assert_eq!(ranges[1]["frequency"]["month_day"], 31);
    assert_eq!(ranges[1]["on_non_business_day"], "MoveToNextBusinessDay");
}

#[test]
fn ranges_for_version_without_frequency() {
    tour_plan()
        .args([
            "ranges", "-i", plan_path(), "--tour", "2", "--from", "2026-03-01", "--to", "2026-03-31",
        ])
        .assert()
        .success()
        .stdout("20\t2026-03-10\t2026-03-31\tno deliveries\n");
}

#[test]
fn ranges_from_stdin() {
    tour_plan()
        .args(["ranges", "--tour", "1", "--from", "2026-02-01", "--to", "2026-02-28"])
        .write_stdin(plan_json())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("10\t2026-02-01\t2026-02-28"));
}

#[test]
fn inverted_interval_fails() {
    tour_plan()
        .args([
            "ranges", "-i", plan_path(), "--tour", "1", "--from", "2026-03-31", "--to", "2026-03-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument"));
}

#[test]
fn unknown_tour_fails() {
    tour_plan()
        .args([
            "ranges", "-i", plan_path(), "--tour", "99", "--from", "2026-03-01", "--to", "2026-03-31",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tour 99"));
}

#[test]
fn malformed_date_is_rejected_by_argument_parser() {
    tour_plan()
        .args(["ranges", "-i", plan_path(), "--tour", "1", "--from", "March", "--to", "2026-03-31"])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// dates
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn dates_text_output() {
    // Mar 11 is a holiday; Mar 31 and Apr 30 come from the monthly version.
    tour_plan()
        .args([
            "dates", "-i", plan_path(), "--tour", "1", "--from", "2026-03-01", "--to", "2026-04-30",
        ])
        .assert()
        .success()
        .stdout(
            "2026-03-02\t10\n2026-03-04\t10\n2026-03-09\t10\n2026-03-31\t11\n2026-04-30\t11\n",
        );
}

#[test]
fn dates_json_output() {
    let output = tour_plan()
        .args([
            "dates", "-i", plan_path(), "--tour", "1", "--from", "2026-03-01", "--to", "2026-03-08",
            "--format", "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            { "tour_version_id": 10, "date": "2026-03-02" },
            { "tour_version_id": 10, "date": "2026-03-04" }
        ])
    );
}

#[test]
fn dates_for_tour_without_schedule_are_empty() {
    tour_plan()
        .args([
            "dates", "-i", plan_path(), "--tour", "2", "--from", "2026-03-01", "--to", "2026-03-31",
        ])
        .assert()
        .success()
        .stdout("");
}

// ─────────────────────────────────────────────────────────────────────────────
// lines / tours
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn lines_are_listed_in_sequence() {
    tour_plan()
        .args(["lines", "-i", plan_path(), "--tour-version", "10"])
        .assert()
        .success()
        .stdout("10\t101\t8\t80\n20\t100\t7\t70\n");
}

#[test]
fn lines_of_unknown_version_fail() {
    tour_plan()
        .args(["lines", "-i", plan_path(), "--tour-version", "404"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tour version 404"));
}

#[test]
fn tours_are_listed_per_client() {
    tour_plan()
        .args(["tours", "-i", plan_path()])
        .assert()
        .success()
        .stdout("1\tNorth\n2\tSouth\n");

    tour_plan()
        .args(["tours", "-i", plan_path(), "--client", "5"])
        .assert()
        .success()
        .stdout("3\tHarbour\n");
}

// ─────────────────────────────────────────────────────────────────────────────
// Error handling and logging
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn malformed_document_fails() {
    tour_plan()
        .args(["tours"])
        .write_stdin("{ not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse planning document"));
}

#[test]
fn missing_file_fails() {
    tour_plan()
        .args(["tours", "-i", "/nonexistent/plan.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn verbose_logs_to_stderr_only() {
    tour_plan()
        .env_remove("RUST_LOG")
        .args([
            "-v", "dates", "-i", plan_path(), "--tour", "1", "--from", "2026-03-01", "--to", "2026-03-08",
        ])
        .assert()
        .success()
        .stdout("2026-03-02\t10\n2026-03-04\t10\n")
        .stderr(predicate::str::contains("resolved tour version ranges"));
}
