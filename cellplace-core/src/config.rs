// vim: tw=80
//! Static configuration, read from YAML at startup

use serde_derive::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use crate::{
    disk::Disk,
    placement::{
        MapStrategy,
        DISKS_PER_NODE,
        FRAGS_PER_OBJ,
        NODES_PER_CELL,
    },
    types::*,
};

/// One local disk slot and the device that backs it
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiskConfig {
    pub node_id: u16,
    pub disk_index: u8,
    pub device: PathBuf,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cell_id: u8,
    pub silo_id: u8,
    pub first_node_id: u16,
    pub nodes_per_cell: usize,
    pub disks_per_node: usize,
    pub frags_per_obj: usize,
    pub map_strategy: MapStrategy,
    /// Time between health monitor cycles
    pub poll_interval_ms: u64,
    /// How long a failed disk stays in the published mask
    pub grace_period_ms: u64,
    /// How long shutdown waits for each background task
    pub join_timeout_ms: u64,
    /// Errors after which a disk is disabled
    pub error_threshold: u32,
    /// Fraction of any enabled disk's capacity above which writes are
    /// blocked
    pub usage_high_watermark: f64,
    pub quorum_retries: u32,
    pub quorum_retry_delay_ms: u64,
    /// Kernel message source.  Disk events are not watched if unset.
    pub kmsg_path: Option<PathBuf>,
    pub disks: Vec<DiskConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let topology = Topology::default();
        Config {
            cell_id: topology.cell_id,
            silo_id: topology.silo_id,
            first_node_id: topology.first_node_id,
            nodes_per_cell: NODES_PER_CELL,
            disks_per_node: DISKS_PER_NODE,
            frags_per_obj: FRAGS_PER_OBJ,
            map_strategy: MapStrategy::default(),
            poll_interval_ms: 5_000,
            grace_period_ms: 60_000,
            join_timeout_ms: 5_000,
            error_threshold: 5,
            usage_high_watermark: 0.95,
            quorum_retries: 3,
            quorum_retry_delay_ms: 1_000,
            kmsg_path: None,
            disks: Vec::new(),
        }
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        serde_yaml_ng::from_str(s)
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

impl Config {
    /// Read and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let config = s.parse::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn topology(&self) -> Topology {
        Topology {
            cell_id: self.cell_id,
            silo_id: self.silo_id,
            first_node_id: self.first_node_id,
            nodes_per_cell: self.nodes_per_cell,
            disks_per_node: self.disks_per_node,
            frags_per_obj: self.frags_per_obj,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn quorum_retry_delay(&self) -> Duration {
        Duration::from_millis(self.quorum_retry_delay_ms)
    }

    /// Health records for every configured disk, all initially absent
    pub fn disks(&self) -> Vec<Disk> {
        let topology = self.topology();
        self.disks.iter()
            .map(|dc| {
                let id = DiskId {
                    cell_id: topology.cell_id,
                    silo_id: topology.silo_id,
                    node_id: dc.node_id,
                    disk_index: dc.disk_index,
                };
                Disk::new(id, dc.device.clone())
            }).collect()
    }

    /// Refuse to run with a configuration that can't work.
    ///
    /// In particular, the topology must match the placement table exactly.
    pub fn validate(&self) -> Result<()> {
        let topology = self.topology();
        topology.validate()?;
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "poll_interval_ms must be positive".into()));
        }
        if self.error_threshold == 0 {
            return Err(Error::InvalidConfig(
                "error_threshold must be positive".into()));
        }
        if !(self.usage_high_watermark > 0.0 &&
             self.usage_high_watermark <= 1.0)
        {
            return Err(Error::InvalidConfig(format!(
                "usage_high_watermark {} is outside (0, 1]",
                self.usage_high_watermark)));
        }
        let mut slots = BTreeSet::new();
        let mut devices = BTreeSet::new();
        for disk in self.disks() {
            if topology.index(&disk.id).is_none() {
                return Err(Error::InvalidConfig(format!(
                    "disk {} is not part of the cell", disk.id)));
            }
            if !slots.insert(disk.id) {
                return Err(Error::InvalidConfig(format!(
                    "disk {} is configured twice", disk.id)));
            }
            if !devices.insert(disk.device.clone()) {
                return Err(Error::InvalidConfig(format!(
                    "device {} is used twice", disk.device.display())));
            }
        }
        Ok(())
    }
}

// LCOV_EXCL_STOP
