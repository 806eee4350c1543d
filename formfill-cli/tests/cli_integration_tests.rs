//! Integration tests for the formfill CLI
//!
//! Runs the built binary against generated form templates.

use formfill_test_suite::{utils, FormSnapshot, FormTemplateBuilder};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test helper to get the CLI binary path
fn get_cli_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    if path.ends_with("deps") {
        path.pop(); // Remove "deps" directory
    }
    path.push("formfill");
    #[cfg(windows)]
    path.set_extension("exe");
    path
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(get_cli_path())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run formfill")
}

/// Write a two-field template into `dir` and return its path
fn write_template(dir: &Path) -> PathBuf {
    let pdf = FormTemplateBuilder::new()
        .text_field("Name", [50.0, 700.0, 250.0, 720.0])
        .checkbox("Agree", [50.0, 650.0, 64.0, 664.0])
        .build();
    let path = dir.join("form.pdf");
    fs::write(&path, pdf).unwrap();
    path
}

fn setup() -> (TempDir, PathBuf) {
    let dir = utils::create_test_output_dir().unwrap();
    let template = write_template(dir.path());
    (dir, template)
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fields"));
    assert!(stdout.contains("fill"));
}

#[test]
fn test_cli_fields_prints_json() {
    let (_dir, template) = setup();
    let output = run_cli(&["fields", path_str(&template)]);
    assert!(output.status.success());

    let fields: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = fields
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Name", "Agree"]);
    assert_eq!(fields[1]["type"], "checkbox");
}

#[test]
fn test_cli_fields_missing_file_fails() {
    let dir = utils::create_test_output_dir().unwrap();
    let output = run_cli(&["fields", path_str(&dir.path().join("missing.pdf"))]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}

#[test]
fn test_cli_fill_writes_output() {
    let (dir, template) = setup();
    let data = dir.path().join("data.json");
    fs::write(&data, r#"{"Name": "Ada", "Agree": "on"}"#).unwrap();
    let out = dir.path().join("filled.pdf");

    let output = run_cli(&[
        "fill",
        path_str(&template),
        "--data",
        path_str(&data),
        "--readonly",
        "-o",
        path_str(&out),
    ]);
    assert!(output.status.success(), "{:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Filled 2 field(s)"));

    let snapshot = FormSnapshot::load(&fs::read(&out).unwrap()).unwrap();
    let name = snapshot.widget("Name").unwrap();
    assert_eq!(name.value, Some("Ada".to_string()));
    assert_eq!(name.flags & 1, 1);
    assert_eq!(snapshot.widget("Agree").unwrap().state, Some("Yes".to_string()));
}

#[test]
fn test_cli_fill_flatten_removes_widgets() {
    let (dir, template) = setup();
    let data = dir.path().join("data.json");
    fs::write(&data, r#"{"Name": "Ada"}"#).unwrap();
    let out = dir.path().join("flat.pdf");

    let output = run_cli(&[
        "fill",
        path_str(&template),
        "-d",
        path_str(&data),
        "--flatten",
        "-o",
        path_str(&out),
    ]);
    assert!(output.status.success(), "{:?}", output);

    let snapshot = FormSnapshot::load(&fs::read(&out).unwrap()).unwrap();
    assert!(snapshot.widgets().is_empty());
    assert_eq!(snapshot.acroform_field_count(), 0);
}

#[test]
fn test_cli_fill_without_output_prints_envelope() {
    let (_dir, template) = setup();
    let output = run_cli(&["fill", path_str(&template)]);
    assert!(output.status.success(), "{:?}", output);

    let envelope: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["report"], "success");
    assert_eq!(envelope["code"], "200");
    let pdf = utils::from_base64(envelope["pdf"].as_str().unwrap()).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn test_cli_fill_request_file_save_mode() {
    let (dir, template) = setup();
    let downloads = dir.path().join("downloads");
    let request = dir.path().join("request.json");
    fs::write(
        &request,
        r#"{"data": {"Name": "Ada"}, "return": {"mode": "file", "filename": "saved.pdf"}}"#,
    )
    .unwrap();

    let output = run_cli(&[
        "fill",
        path_str(&template),
        "--request",
        path_str(&request),
        "--download-dir",
        path_str(&downloads),
    ]);
    assert!(output.status.success(), "{:?}", output);

    let envelope: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["message"], "File saved successfully");
    assert!(downloads.join("saved.pdf").exists());
}

#[test]
fn test_cli_fill_invalid_pdf_reports_code() {
    let dir = utils::create_test_output_dir().unwrap();
    let bogus = dir.path().join("bogus.pdf");
    fs::write(&bogus, b"definitely not a pdf").unwrap();

    let output = run_cli(&["fill", path_str(&bogus)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ATKPDF-04"));
}

#[test]
fn test_cli_fill_rejects_non_object_data() {
    let (dir, template) = setup();
    let data = dir.path().join("data.json");
    fs::write(&data, "[1, 2, 3]").unwrap();

    let output = run_cli(&["fill", path_str(&template), "--data", path_str(&data)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("must contain a JSON object"));
}
