use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sbci(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sbci").unwrap();
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("SEASON")
        .env_remove("PROVIDER")
        .env_remove("SEASONDIR")
        .env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn seasons_lists_both_season_types() {
    let home = TempDir::new().unwrap();
    sbci(home.path())
        .arg("seasons")
        .assert()
        .success()
        .stdout(predicate::str::contains("2026 Winter (W26)"))
        .stdout(predicate::str::contains("2026/27 Summer (S27)"))
        .stdout(predicate::str::contains("Under 21"));
}

#[test]
fn classify_in_one_season() {
    let home = TempDir::new().unwrap();
    sbci(home.path())
        .args(["classify", "2014-06-15", "--season", "W26"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Under 13"));
}

#[test]
fn classify_rejects_bad_date() {
    let home = TempDir::new().unwrap();
    sbci(home.path())
        .args(["classify", "15-06-2014"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn classify_with_settings_brackets() {
    let home = TempDir::new().unwrap();
    let config = home.path().join(".config").join("sbci");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(
        config.join("settings.json"),
        r#"{"age_groups": {"U12": ["01/01/2014", "31/12/2015"], "Mixed": ["01/06/2013", "31/05/2014"]}}"#,
    )
    .unwrap();

    sbci(home.path())
        .args(["classify", "15/06/2014", "--brackets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("U12"));

    sbci(home.path())
        .args(["classify", "2014-03-01", "--brackets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("two age groups"));
}

#[test]
fn read_commbank_statement() {
    let home = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let a = write(
        &data,
        "jan.csv",
        "31/01/2025,-50.00,GYM HIRE,\"+1,950.00\"\n30/01/2025,\"2,000.00\",FEES,\"+2,000.00\"\n",
    );
    let b = write(&data, "overlap.csv", "31/01/2025,-50.00,GYM HIRE,\"+1,950.00\"\n");

    sbci(home.path())
        .arg("read")
        .arg(&a)
        .arg(&b)
        .args(["--schema", "commbank"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 records, 1 repeated"))
        .stdout(predicate::str::contains("Total amount: $1,950.00"));
}

#[test]
fn read_reports_missing_required_columns() {
    let home = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let path = write(&data, "players.csv", "Player\nAnn\n");

    sbci(home.path())
        .arg("read")
        .arg(&path)
        .args(["--schema", "players"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required columns: dob"));
}

#[test]
fn read_unknown_schema() {
    let home = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let path = write(&data, "x.csv", "a\n1\n");

    sbci(home.path())
        .arg("read")
        .arg(&path)
        .args(["--schema", "xero"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown schema: xero"));
}

#[test]
fn schemas_lists_keys() {
    let home = TempDir::new().unwrap();
    sbci(home.path())
        .arg("schemas")
        .assert()
        .success()
        .stdout(predicate::str::contains("trybooking-rego"))
        .stdout(predicate::str::contains("commbank"));
}

#[test]
fn age_groups_csv_to_stdout() {
    let home = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let path = write(&data, "players.csv", "Name,Dob\nAnn Lee,2014-06-15\nOld Timer,01/01/1980\n");

    sbci(home.path())
        .arg("age-groups")
        .arg(&path)
        .arg("--dobs")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Name,Dob,W26,S27"))
        .stdout(predicate::str::contains("Ann Lee,2014-06-15,U13,U14"))
        .stdout(predicate::str::contains("Old Timer,1980-01-01,??"));
}

#[test]
fn age_groups_html_to_file() {
    let home = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let path = write(&data, "players.csv", "Name,Dob\nAnn Lee,2014-06-15\n");
    let out = data.path().join("ages.html");

    sbci(home.path())
        .arg("age-groups")
        .arg(&path)
        .args(["--format", "html", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 1 players"));

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("<th>W26</th>"));
    assert!(html.contains("Ann Lee"));
}

#[test]
fn config_init_writes_defaults() {
    let home = TempDir::new().unwrap();
    sbci(home.path())
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider:     PlayHQ"));

    let path = home.path().join(".config").join("sbci").join("settings.json");
    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("\"season\": \"2021-winter\""));
}

#[test]
fn config_respects_environment() {
    let home = TempDir::new().unwrap();
    sbci(home.path())
        .arg("config")
        .env("SEASON", "2027-summer")
        .assert()
        .success()
        .stdout(predicate::str::contains("Season:       2027-summer"));
}
