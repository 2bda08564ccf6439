use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::{tempdir, NamedTempFile};

fn write_config(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp config");
    tmp.write_all(xml.as_bytes()).expect("write config");
    tmp
}

#[test]
fn cli_writes_preview_png() {
    let dir = tempdir().expect("temp dir");
    let output = dir.path().join("globe.png");
    let mut cmd = Command::cargo_bin("globe-shade").expect("binary exists");
    cmd.arg(&output).arg("--size").arg("24").arg("--specular").arg("0.3");
    cmd.assert()
        .success()
        .stdout(contains("Wrote 24x24 preview to"));

    let image = image::open(&output).expect("readable png").to_rgba8();
    assert_eq!(image.dimensions(), (24, 24));
}

#[test]
fn cli_prints_wgsl_for_config() {
    let config = write_config("<shading><model>classic</model><ambient>0.7</ambient></shading>");
    let mut cmd = Command::cargo_bin("globe-shade").expect("binary exists");
    cmd.arg("--print-wgsl").arg("--config").arg(config.path());
    cmd.assert()
        .success()
        .stdout(contains("const AMBIENT: f32 = 0.7;"))
        .stdout(contains("const HAS_RIM: bool = false;"))
        .stdout(contains("fn fs_main"));
}

#[test]
fn cli_reports_bad_config() {
    let config = write_config("<shading><light>1 x 0</light></shading>");
    let dir = tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("globe-shade").expect("binary exists");
    cmd.arg(dir.path().join("never.png"))
        .arg("--config")
        .arg(config.path());
    cmd.assert()
        .failure()
        .stderr(contains("Error:"))
        .stderr(contains("invalid shading config"));
}

#[test]
fn cli_requires_an_output_path() {
    let mut cmd = Command::cargo_bin("globe-shade").expect("binary exists");
    cmd.assert().failure().stderr(contains("Usage: globe-shade"));
}
