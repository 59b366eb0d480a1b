// vim: tw=80
//! Common type definitions used throughout cellplace

use nix::errno::Errno;
use serde_derive::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    io,
};
use thiserror::Error;

use crate::placement::{DISKS_PER_NODE, FRAGS_PER_OBJ, NODES_PER_CELL};

/// cellplace's error type.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// The configured topology disagrees with the placement table
    #[error("{what} mismatch: the placement table requires {expected} but {actual} was configured")]
    ConfigMismatch {
        what: &'static str,
        expected: usize,
        actual: usize
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Map id {0} is out of range")]
    MapIdOutOfRange(u32),
    #[error("Map column {0} is out of range")]
    ColumnOutOfRange(usize),
    #[error("Fragment index {0} is out of range")]
    FragmentOutOfRange(usize),
    /// A token of a serialized `DiskMask` could not be parsed
    #[error("Malformed disk token {0:?}")]
    Parse(String),
    #[error("No such disk {0}")]
    NoSuchDisk(DiskId),
    /// The operation requires a disabled disk
    #[error("Disk {0} is enabled")]
    DiskEnabled(DiskId),
    #[error("Disk {0} is absent")]
    DiskAbsent(DiskId),
    #[error("Disk {0} is offline")]
    DiskOffline(DiskId),
    #[error("Disk {0} carries a foreign label")]
    Foreign(DiskId),
    #[error("Invalid disk label")]
    BadLabel,
    #[error("Disk label checksum mismatch")]
    LabelChecksum,
    #[error("Self-test read back different data than was written")]
    Miscompare,
    #[error("New writes are blocked")]
    WritesBlocked,
    /// An external collaborator could not be reached
    #[error("{0} is unavailable")]
    Unavailable(String),
    #[error("The disk health monitor is not running")]
    NotRunning,
    /// An error from the operating system
    #[error("{0}")]
    Sys(Errno),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        let errno = e.raw_os_error()
            .map(Errno::from_raw)
            .unwrap_or(Errno::UnknownErrno);
        Error::Sys(errno)
    }
}

impl From<Errno> for Error {
    fn from(e: Errno) -> Self {
        Error::Sys(e)
    }
}

impl From<bincode::Error> for Error {
    fn from(_: bincode::Error) -> Self {
        Error::BadLabel
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;

/// Static shape of one storage cell.
///
/// Supplied by the hardware profile.  The counts must match the dimensions of
/// the placement table exactly; see [`Topology::validate`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Topology {
    pub cell_id: u8,
    pub silo_id: u8,
    /// Node id of the node at index 0.  Node ids are contiguous.
    pub first_node_id: u16,
    pub nodes_per_cell: usize,
    pub disks_per_node: usize,
    pub frags_per_obj: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Topology {
            cell_id: 0,
            silo_id: 0,
            first_node_id: 101,
            nodes_per_cell: NODES_PER_CELL,
            disks_per_node: DISKS_PER_NODE,
            frags_per_obj: FRAGS_PER_OBJ,
        }
    }
}

impl Topology {
    /// Total number of disk slots in the cell
    pub fn disks(&self) -> usize {
        self.nodes_per_cell * self.disks_per_node
    }

    /// Construct the `DiskId` of a slot from its node index and disk index.
    pub fn disk(&self, node_index: usize, disk_index: usize) -> DiskId {
        debug_assert!(node_index < self.nodes_per_cell);
        debug_assert!(disk_index < self.disks_per_node);
        DiskId {
            cell_id: self.cell_id,
            silo_id: self.silo_id,
            node_id: self.first_node_id + node_index as u16,
            disk_index: disk_index as u8,
        }
    }

    /// Inverse of [`Topology::index`]
    pub fn disk_at(&self, index: usize) -> DiskId {
        self.disk(index / self.disks_per_node, index % self.disks_per_node)
    }

    /// Bit-vector index of a disk: `node_index * disks_per_node + disk_index`
    ///
    /// Returns `None` if the disk does not belong to this cell.
    pub fn index(&self, disk: &DiskId) -> Option<usize> {
        let node = self.node_index(disk.node_id)?;
        let d = usize::from(disk.disk_index);
        if disk.cell_id != self.cell_id || disk.silo_id != self.silo_id ||
            d >= self.disks_per_node
        {
            return None;
        }
        Some(node * self.disks_per_node + d)
    }

    /// Convert a node id into a node index, if it lies within the cell.
    pub fn node_index(&self, node_id: u16) -> Option<usize> {
        let idx = usize::from(node_id.checked_sub(self.first_node_id)?);
        (idx < self.nodes_per_cell).then_some(idx)
    }

    /// Refuse any topology that disagrees with the fixed placement table.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("nodes per cell", NODES_PER_CELL, self.nodes_per_cell),
            ("disks per node", DISKS_PER_NODE, self.disks_per_node),
            ("fragments per object", FRAGS_PER_OBJ, self.frags_per_obj),
        ];
        for (what, expected, actual) in checks {
            if expected != actual {
                return Err(Error::ConfigMismatch{what, expected, actual});
            }
        }
        let last = usize::from(self.first_node_id) + self.nodes_per_cell - 1;
        if last > usize::from(u16::MAX) {
            return Err(Error::InvalidConfig(format!(
                "first_node_id {} leaves no room for {} nodes",
                self.first_node_id, self.nodes_per_cell)));
        }
        Ok(())
    }
}

/// Identifies a physical disk slot.
///
/// Disks are ordered by node id and then disk index, which is also their
/// order as bit-vector indices within one cell.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct DiskId {
    pub cell_id: u8,
    pub silo_id: u8,
    pub node_id: u16,
    pub disk_index: u8,
}

impl Ord for DiskId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.node_id, self.disk_index, self.cell_id, self.silo_id)
            .cmp(&(other.node_id, other.disk_index, other.cell_id,
                   other.silo_id))
    }
}

impl PartialOrd for DiskId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for DiskId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.node_id, self.disk_index)
    }
}

// LCOV_EXCL_STOP
