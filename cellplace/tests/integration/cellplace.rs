// vim: tw=80
use std::fs;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use tempfile::Builder;

use super::cellplace;

#[rstest]
#[case("check-config")]
#[case("layout")]
#[case("map")]
#[case("mask")]
fn help(#[case] subcommand: &str) {
    cellplace()
        .arg(subcommand)
        .arg("-h")
        .assert()
        .success();
}

mod map {
    use super::*;

    #[test]
    fn dump() {
        cellplace()
            .args(["map", "0"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("map 0  frag0"))
            .stdout(predicate::str::contains("spare"))
            .stdout(predicate::str::contains("row 7"));
    }

    #[test]
    fn out_of_range() {
        cellplace()
            .args(["map", "10000"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("MapIdOutOfRange"));
    }
}

mod layout {
    use super::*;

    #[test]
    fn full_cell() {
        cellplace()
            .args(["layout", "5"])
            .assert()
            .success()
            .stdout(predicate::str::contains("MAP"))
            .stdout(predicate::str::contains(" -").not());
    }

    /// With every disk offline, no fragment has a disk
    #[test]
    fn empty_mask() {
        cellplace()
            .args(["layout", "--mask", "", "5"])
            .assert()
            .success()
            .stdout(predicate::str::is_match(r"(?m)^\s*5\s+6\s+-").unwrap());
    }

    /// An offline disk never appears in a layout
    #[test]
    fn offline() {
        let out = cellplace()
            .args(["layout", "--offline", "101:0,101:1,101:2,101:3"])
            .args((0..20).map(|i| i.to_string()))
            .output()
            .unwrap();
        assert!(out.status.success());
        let stdout = String::from_utf8(out.stdout).unwrap();
        assert!(!stdout.contains(" 101:"));
        for line in stdout.lines() {
            assert_ne!(line.split_whitespace().last(), Some("-"), "{line}");
        }
    }

    #[test]
    fn bad_token() {
        cellplace()
            .args(["layout", "--offline", "999:0", "5"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Parse"));
    }
}

#[test]
fn mask() {
    cellplace()
        .args(["mask", "102:1 101:0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("online"))
        .stdout(predicate::str::is_match(r"8-node\s+true").unwrap())
        .stdout(predicate::str::contains("101:0 102:1"));
}

mod check_config {
    use super::*;

    #[test]
    fn ok() {
        let dir = Builder::new().prefix("cellplace").tempdir().unwrap();
        let path = dir.path().join("cellplace.yaml");
        fs::write(&path, "disks:\n  - {node_id: 103, disk_index: 2, \
                  device: /dev/sdk}\n").unwrap();
        cellplace()
            .arg("check-config")
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("103:2"))
            .stdout(predicate::str::contains("/dev/sdk"));
    }

    #[test]
    fn mismatch() {
        let dir = Builder::new().prefix("cellplace").tempdir().unwrap();
        let path = dir.path().join("cellplace.yaml");
        fs::write(&path, "frags_per_obj: 9\n").unwrap();
        cellplace()
            .arg("check-config")
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("ConfigMismatch"));
    }
}
