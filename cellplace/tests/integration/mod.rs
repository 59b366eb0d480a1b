// vim: tw=80
//! Integration tests: run the binaries

use std::process::Command;

use assert_cmd::prelude::*;

mod cellplace;
mod cellplaced;

pub fn cellplace() -> Command {
    Command::cargo_bin("cellplace").unwrap()
}

pub fn cellplaced() -> Command {
    Command::cargo_bin("cellplaced").unwrap()
}
