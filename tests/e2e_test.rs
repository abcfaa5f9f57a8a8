//! CLI end-to-end tests. Fixtures contain only language files so no
//! registry lookups are attempted.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sample_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(
        dir.path().join("src/App.java"),
        "import java.util.List;\nimport com.google.gson.Gson;\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("src/util.py"),
        "import os\nimport sys\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_default_output_is_cyclonedx_json() {
    let project = sample_project();

    Command::cargo_bin("srcbom")
        .unwrap()
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"bomFormat\": \"CycloneDX\""))
        .stdout(predicate::str::contains("\"name\": \"Gson\""));
}

#[test]
fn test_spdx_tag_value_output() {
    let project = sample_project();

    Command::cargo_bin("srcbom")
        .unwrap()
        .arg(project.path())
        .args(["--schema", "spdx", "--format", "tag-value"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SPDXVersion: SPDX-2.3"))
        .stdout(predicate::str::contains("PackageName: Gson"));
}

#[test]
fn test_output_directory_writes_named_file() {
    let project = sample_project();
    let out = TempDir::new().unwrap();

    Command::cargo_bin("srcbom")
        .unwrap()
        .arg(project.path())
        .args(["--output", out.path().to_str().unwrap()])
        .assert()
        .success();

    let project_name = project.path().file_name().unwrap().to_string_lossy();
    let expected = out.path().join(format!("{}_CycloneDX.json", project_name));
    assert!(expected.exists());
}

#[test]
fn test_nonexistent_path_fails_with_application_error() {
    Command::cargo_bin("srcbom")
        .unwrap()
        .arg("/nonexistent/project/path")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Invalid project path"));
}

#[test]
fn test_invalid_schema_rejected_by_clap() {
    Command::cargo_bin("srcbom")
        .unwrap()
        .args(["--schema", "unknown"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_summary_flag_reports_counts() {
    let project = sample_project();

    Command::cargo_bin("srcbom")
        .unwrap()
        .arg(project.path())
        .arg("--summary")
        .assert()
        .success()
        .stderr(predicate::str::contains("Parsed 2 files"));
}
