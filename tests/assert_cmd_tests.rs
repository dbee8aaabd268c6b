//! Integration tests for CLI execution using `assert_cmd`.
//!
//! These invoke the compiled binary on staged records and options and verify
//! the written project bundle.

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use test_support::{RecordBuilder, stage_inputs};
use xcbazel::runner::BAZEL_ENV;

fn records() -> Vec<xcbazel::rule_entry::ExtractionRecord> {
    vec![
        RecordBuilder::new("//app:App", "ios_application")
            .dep("//lib:Lib")
            .build(),
        RecordBuilder::new("//lib:Lib", "objc_library")
            .srcs(["lib/lib.m"])
            .build(),
    ]
}

#[test]
fn writes_the_project_bundle() -> Result<()> {
    let (dir, records_path, options_path) = stage_inputs(
        &records(),
        &json!({ "project_name": "Demo", "roots": ["//app:App", "//lib:Lib"] }),
    );
    let mut cmd = Command::cargo_bin("xcbazel").context("locate xcbazel binary")?;
    cmd.arg("--records")
        .arg(&records_path)
        .arg("--options")
        .arg(&options_path)
        .arg("--output")
        .arg(dir.path())
        .env(BAZEL_ENV, "/opt/bazel/bin/bazel")
        .assert()
        .success();

    let bundle = dir.path().join("Demo.xcodeproj");
    let pbxproj = fs::read_to_string(bundle.join("project.pbxproj"))
        .context("read project.pbxproj")?;
    ensure!(
        pbxproj.starts_with("// !$*UTF8*$!"),
        "project file should carry the UTF-8 header"
    );
    ensure!(
        pbxproj.contains("_bazel_clean_"),
        "project file should contain the clean target"
    );
    ensure!(
        pbxproj.contains("/opt/bazel/bin/bazel"),
        "the environment override should reach the clean target"
    );
    ensure!(
        bundle.join(".xcbazel/objects.json").exists(),
        "identifier table should be written"
    );
    let settings = fs::read_to_string(bundle.join(".xcbazel/Scripts/bazel_build_settings.txt"))
        .context("read build settings")?;
    ensure!(
        settings.contains("bazel = /opt/bazel/bin/bazel"),
        "settings should name the overridden binary, got: {settings}"
    );
    Ok(())
}

#[test]
fn unresolved_roots_fail_with_every_label() -> Result<()> {
    let (dir, records_path, options_path) = stage_inputs(
        &records(),
        &json!({ "project_name": "Demo", "roots": ["//gone:A", "//gone:B"] }),
    );
    let mut cmd = Command::cargo_bin("xcbazel").context("locate xcbazel binary")?;
    cmd.arg("--records")
        .arg(&records_path)
        .arg("--options")
        .arg(&options_path)
        .arg("--output")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("//gone:A").and(predicate::str::contains("//gone:B")));
    ensure!(
        !dir.path().join("Demo.xcodeproj").exists(),
        "no bundle should be written on failure"
    );
    Ok(())
}

#[test]
fn missing_records_file_fails() -> Result<()> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let mut cmd = Command::cargo_bin("xcbazel").context("locate xcbazel binary")?;
    cmd.arg("--records")
        .arg(dir.path().join("absent.json"))
        .arg("--output")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("records file not found"));
    Ok(())
}
