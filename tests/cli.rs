//! CLI end-to-end tests
//!
//! Tests for the media-mirror command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Command for the media-mirror binary, isolated from any user config
#[allow(deprecated)]
fn media_mirror_cmd(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("media-mirror").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_no_args_shows_usage() {
    let temp = tempdir().unwrap();
    media_mirror_cmd(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_missing_destination_shows_usage() {
    let temp = tempdir().unwrap();
    media_mirror_cmd(temp.path())
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_rejects_quality_out_of_range_before_touching_disk() {
    let temp = tempdir().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.txt"), b"a").unwrap();

    media_mirror_cmd(temp.path())
        .arg(&src)
        .arg(&dst)
        .arg("150")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quality must be between 1 and 100"));

    assert!(!dst.exists());
}

#[test]
fn test_cli_missing_source_fails() {
    let temp = tempdir().unwrap();
    media_mirror_cmd(temp.path())
        .arg(temp.path().join("does-not-exist"))
        .arg(temp.path().join("dst"))
        .assert()
        .failure();
}

#[test]
fn test_cli_missing_config_file_fails_before_touching_disk() {
    let temp = tempdir().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    fs::create_dir_all(&src).unwrap();

    media_mirror_cmd(temp.path())
        .arg("--config")
        .arg(temp.path().join("missing.json"))
        .arg(&src)
        .arg(&dst)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file does not exist"));

    // A directory is not a config file either
    media_mirror_cmd(temp.path())
        .arg("--config")
        .arg(&src)
        .arg(&src)
        .arg(&dst)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file does not exist"));

    assert!(!dst.exists());
}

#[test]
fn test_cli_mirrors_tree_and_prints_summary() {
    let temp = tempdir().unwrap();
    let src = temp.path().join("src");
    let dst = temp.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("notes.txt"), b"plain text").unwrap();
    image::RgbImage::from_pixel(40, 30, image::Rgb([200, 100, 50]))
        .save_with_format(src.join("pic.png"), image::ImageFormat::Png)
        .unwrap();

    media_mirror_cmd(temp.path())
        .arg(&src)
        .arg(&dst)
        .arg("70")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/2] Copied: notes.txt"))
        .stdout(predicate::str::contains("[2/2] Compressed: pic.png"))
        .stdout(predicate::str::contains("Compressed 1 files. Errors: 0."));

    assert_eq!(fs::read(dst.join("notes.txt")).unwrap(), b"plain text");
    let mirrored = image::open(dst.join("pic.png")).unwrap();
    assert_eq!((mirrored.width(), mirrored.height()), (40, 30));
}

#[test]
fn test_cli_json_output() {
    let temp = tempdir().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(src.join("sub")).unwrap();
    fs::write(src.join("sub/readme.md"), b"# readme").unwrap();

    let output = media_mirror_cmd(temp.path())
        .arg(&src)
        .arg(temp.path().join("dst"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let events: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.first().unwrap()["type"], "start");
    assert_eq!(events.last().unwrap()["type"], "complete");
    assert!(events
        .iter()
        .any(|event| event["type"] == "file_complete" && event["status"] == "copied"));
}
