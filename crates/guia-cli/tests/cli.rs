use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const REVIEWED_CSV: &str = "\
Document,Guide Number,Registry ID,Authorization Date,Beneficiary Name
guia_001.pdf,17456856,419010,12/05/2024,MATHEUS PEREIRA BOIKO
guia_002.png,Not found,419010,03/01/2024,ANA CLARA SOUZA
";

fn guia() -> Command {
    Command::cargo_bin("guia").unwrap()
}

/// Write a default config so tests never pick up the user's own file.
fn default_config(dir: &Path) -> String {
    let path = dir.join("config.json");
    guia()
        .args(["config", "init", "--output"])
        .arg(&path)
        .assert()
        .success();
    path.to_string_lossy().into_owned()
}

#[test]
fn config_init_then_get_reads_back_defaults() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());

    guia()
        .args(["--config", &config, "config", "get", "ocr.language"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"por\""));
}

#[test]
fn config_set_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());

    guia()
        .args(["--config", &config, "config", "set", "ocr.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn config_set_rejects_pattern_without_group() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());

    guia()
        .args([
            "--config",
            &config,
            "config",
            "set",
            "extraction.patterns.guide_number",
            r#"["Guia \\d+"]"#,
        ])
        .assert()
        .failure();

    guia()
        .args(["--config", &config, "config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn config_path_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    guia()
        .args(["--config"])
        .arg(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn export_csv_to_text_report() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());
    let input = dir.path().join("reviewed.csv");
    let output = dir.path().join("report.txt");
    fs::write(&input, REVIEWED_CSV).unwrap();

    guia()
        .args(["--config", &config, "export"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 records"));

    let report = fs::read_to_string(&output).unwrap();
    assert!(report.contains("=== guia_001.pdf ==="));
    assert!(report.contains("Beneficiary Name: MATHEUS PEREIRA BOIKO"));
    assert!(report.contains("Guide Number: Not found"));
}

#[test]
fn export_round_trips_through_xlsx() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());
    let input = dir.path().join("reviewed.csv");
    let workbook = dir.path().join("guias.xlsx");
    let back = dir.path().join("back.csv");
    fs::write(&input, REVIEWED_CSV).unwrap();

    guia()
        .args(["--config", &config, "export"])
        .arg(&input)
        .arg(&workbook)
        .assert()
        .success();
    assert!(workbook.exists());

    guia()
        .args(["--config", &config, "export"])
        .arg(&workbook)
        .arg(&back)
        .assert()
        .success();

    let csv = fs::read_to_string(&back).unwrap();
    assert_eq!(csv.replace("\r\n", "\n"), REVIEWED_CSV);
}

#[test]
fn export_prints_quality_report() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());
    let input = dir.path().join("reviewed.csv");
    fs::write(&input, REVIEWED_CSV).unwrap();

    guia()
        .args(["--config", &config, "export", "--quality"])
        .arg(&input)
        .arg(dir.path().join("out.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Complete:   1 (50.0%)"))
        .stdout(predicate::str::contains("- guia_002.png"));
}

#[test]
fn export_needs_a_known_format() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());
    let input = dir.path().join("reviewed.csv");
    fs::write(&input, REVIEWED_CSV).unwrap();

    guia()
        .args(["--config", &config, "export"])
        .arg(&input)
        .arg(dir.path().join("out.bin"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--format"));
}

#[test]
fn batch_marks_undecodable_documents_as_errors() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());
    let scans = dir.path().join("scans");
    fs::create_dir(&scans).unwrap();
    fs::write(scans.join("broken.png"), b"not an image").unwrap();
    fs::write(scans.join("broken.pdf"), b"%PDF-garbage").unwrap();
    let output = dir.path().join("out.csv");

    guia()
        .args(["--config", &config, "batch", "--tesseract", "/nonexistent/tesseract"])
        .arg(format!("{}/*", scans.display()))
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"))
        .stderr(predicate::str::contains("OCR engine not available"));

    let csv = fs::read_to_string(&output).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("broken.pdf,Error,Error,Error,Error"));
    assert!(rows[2].starts_with("broken.png,Error,Error,Error,Error"));
}

#[test]
fn batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());

    guia()
        .args(["--config", &config, "batch"])
        .arg(format!("{}/*.pdf", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn process_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = default_config(dir.path());

    guia()
        .args(["--config", &config, "process"])
        .arg(dir.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}
