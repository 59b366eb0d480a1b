// vim: tw=80
use std::fs;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::Builder;

use super::cellplaced;

#[test]
fn help() {
    cellplaced()
        .arg("-h")
        .assert()
        .success();
}

#[test]
fn missing_config() {
    let dir = Builder::new().prefix("cellplaced").tempdir().unwrap();
    cellplaced()
        .arg("--config")
        .arg(dir.path().join("nonexistent.yaml"))
        .arg("--once")
        .assert()
        .failure();
}

/// Blank disks get labeled and enabled; an empty slot is absent
#[test]
fn once() {
    let dir = Builder::new().prefix("cellplaced").tempdir().unwrap();
    let sda = dir.path().join("sda");
    let sdb = dir.path().join("sdb");
    fs::create_dir(&sda).unwrap();
    let config = dir.path().join("cellplace.yaml");
    fs::write(&config, format!("usage_high_watermark: 1.0\n\
        disks:\n\
        \x20 - {{node_id: 101, disk_index: 0, device: {}}}\n\
        \x20 - {{node_id: 101, disk_index: 1, device: {}}}\n",
        sda.display(), sdb.display())).unwrap();
    cellplaced()
        .arg("--config")
        .arg(&config)
        .arg("--once")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"101:0\s+\S+sda\s+Enabled").unwrap())
        .stdout(predicate::str::is_match(r"101:1\s+\S+sdb\s+Absent").unwrap());
    assert!(sda.join("label").exists());
    // Shut down cleanly
    assert!(sda.join("clean").exists());
}
