// vim: tw=80
//! Functional tests: whole subsystems against real files, without mocks

use std::{path::PathBuf, sync::Arc};

use tempfile::{Builder, TempDir};

use cellplace_core::{
    collaborator::{LoggingStore, StandaloneMembership},
    config::{Config, DiskConfig},
    disk_ops::FileDiskOps,
    monitor::DiskHealthMonitor,
};

macro_rules! t {
    ($e:expr) => (match $e {
        Ok(e) => e,
        Err(e) => panic!("{} failed with {:?}", stringify!($e), e),
    })
}

/// Helper to build a monitor over directory-backed disks
#[derive(Debug)]
struct CellBuilder {
    /// Number of local nodes.  Each gets four disks.
    nodes: u16,
    /// Which disk slots to leave empty, by position in the config
    empty: Vec<usize>,
    error_threshold: u32,
    grace_period_ms: u64,
}

impl Default for CellBuilder {
    fn default() -> Self {
        CellBuilder {
            nodes: 1,
            empty: Vec::new(),
            error_threshold: 3,
            grace_period_ms: 0,
        }
    }
}

/// A monitor together with what it needs to outlive
struct Cell {
    monitor: DiskHealthMonitor,
    membership: Arc<StandaloneMembership>,
    config: Config,
    _tempdir: TempDir,
}

impl Cell {
    /// The directory standing in for the i'th configured disk
    fn device(&self, i: usize) -> PathBuf {
        self.config.disks[i].device.clone()
    }

    /// Build a second monitor over the same disks, as after a reboot
    fn restart(self) -> Cell {
        let membership = Arc::new(StandaloneMembership::default());
        let monitor = t!(DiskHealthMonitor::new(self.config.clone(),
            Arc::new(FileDiskOps), Arc::new(LoggingStore),
            membership.clone()));
        Cell { monitor, membership, ..self }
    }
}

impl CellBuilder {
    fn build(self) -> Cell {
        let tempdir = t!(Builder::new().prefix("cellplace").tempdir());
        let mut disks = Vec::new();
        for node in 0..self.nodes {
            for disk_index in 0..4u8 {
                let i = disks.len();
                let device = tempdir.path().join(format!("sd{}",
                    char::from(b'a' + i as u8)));
                if !self.empty.contains(&i) {
                    t!(std::fs::create_dir(&device));
                }
                disks.push(DiskConfig {
                    node_id: 101 + node,
                    disk_index,
                    device
                });
            }
        }
        let config = Config {
            error_threshold: self.error_threshold,
            grace_period_ms: self.grace_period_ms,
            poll_interval_ms: 60_000,
            join_timeout_ms: 1_000,
            // The host's temporary file system may be nearly full
            usage_high_watermark: 1.0,
            quorum_retry_delay_ms: 10,
            disks,
            ..Default::default()
        };
        let membership = Arc::new(StandaloneMembership::default());
        let monitor = t!(DiskHealthMonitor::new(config.clone(),
            Arc::new(FileDiskOps), Arc::new(LoggingStore),
            membership.clone()));
        Cell { monitor, membership, config, _tempdir: tempdir }
    }
}

mod layout;
mod monitor;
