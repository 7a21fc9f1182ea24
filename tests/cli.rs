//! End-to-end runs of the two binaries: row-cap flags, truncation notes,
//! and the missing-file gate.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn five_row_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"id,name\n1,a\n2,b\n3,c\n4,d\n5,e\n").unwrap();
    file.flush().unwrap();
    file
}

fn read_csv() -> Command {
    Command::cargo_bin("read-csv").unwrap()
}

#[test]
fn head_prints_exactly_k_rows_and_names_the_rest() {
    let file = five_row_csv();
    let output = read_csv()
        .arg(file.path())
        .args(["--head", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Data (2 of 5 rows)"))
        .stdout(predicate::str::contains(
            "*… 3 more rows. Use --rows 0 to output all.*",
        ))
        .get_output()
        .clone();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let data_rows = stdout
        .lines()
        .filter(|line| line.starts_with("| ") && !line.contains("id"))
        .count();
    assert_eq!(data_rows, 2);
}

#[test]
fn rows_cap_truncates_with_note() {
    let file = five_row_csv();
    read_csv()
        .arg(file.path())
        .args(["--rows", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Data (3 of 5 rows)"))
        .stdout(predicate::str::contains(
            "*… 2 more rows. Use --rows 0 to output all.*",
        ));
}

#[test]
fn rows_zero_prints_everything_without_a_note() {
    let file = five_row_csv();
    read_csv()
        .arg(file.path())
        .args(["--rows", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Data (5 of 5 rows)"))
        .stdout(predicate::str::contains("more rows").not());
}

#[test]
fn head_wins_over_rows() {
    let file = five_row_csv();
    read_csv()
        .arg(file.path())
        .args(["--rows", "0", "--head", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Data (1 of 5 rows)"))
        .stdout(predicate::str::contains(
            "*… 4 more rows. Use --rows 0 to output all.*",
        ));
}

#[test]
fn no_data_suppresses_the_sample() {
    let file = five_row_csv();
    read_csv()
        .arg(file.path())
        .args(["--profile", "--no-data"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# CSV Profile:"))
        .stdout(predicate::str::contains("## Data").not());
}

#[test]
fn missing_csv_file_exits_one_with_message() {
    read_csv()
        .arg("/no/such/file.csv")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: File not found: /no/such/file.csv",
        ));
}

#[test]
fn missing_excel_file_exits_one_with_message() {
    Command::cargo_bin("read-excel")
        .unwrap()
        .arg("/no/such/book.xlsx")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: File not found: /no/such/book.xlsx",
        ));
}
