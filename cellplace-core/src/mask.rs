// vim: tw=80
//! The disk mask: which disk slots of a cell are usable
//!
//! A `DiskMask` holds two parallel bit vectors, one bit per disk slot, indexed
//! by [`Topology::index`].  `enabled` is administrative state: the disk's data
//! partition is usable.  `available` is physical state: the disk is present
//! and not hard-failed.  A disk is *online* when it is both.

use fixedbitset::FixedBitSet;
use std::fmt::{self, Display, Formatter};
use crate::types::*;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DiskMask {
    topology: Topology,
    enabled: FixedBitSet,
    available: FixedBitSet,
}

impl DiskMask {
    /// A mask with every disk offline
    pub fn new(topology: Topology) -> Self {
        let n = topology.disks();
        DiskMask {
            topology,
            enabled: FixedBitSet::with_capacity(n),
            available: FixedBitSet::with_capacity(n),
        }
    }

    /// A mask with every disk online
    pub fn full(topology: Topology) -> Self {
        let mut mask = Self::new(topology);
        mask.enabled.set_range(.., true);
        mask.available.set_range(.., true);
        mask
    }

    fn idx(&self, disk: &DiskId) -> usize {
        self.topology.index(disk)
            .unwrap_or_else(|| panic!("disk {disk} is not part of this cell"))
    }

    fn assert_same_shape(&self, other: &DiskMask) {
        assert_eq!(self.len(), other.len(), "mask dimension mismatch");
    }

    /// Number of disk slots covered by the mask
    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    /// Is every disk offline?
    pub fn none_online(&self) -> bool {
        self.online_count() == 0
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn is_enabled(&self, disk: &DiskId) -> bool {
        self.enabled[self.idx(disk)]
    }

    pub fn is_available(&self, disk: &DiskId) -> bool {
        self.available[self.idx(disk)]
    }

    pub fn is_online(&self, disk: &DiskId) -> bool {
        self.is_online_at(self.idx(disk))
    }

    /// Like [`is_online`](Self::is_online), but by bit-vector index
    pub fn is_online_at(&self, index: usize) -> bool {
        self.enabled[index] && self.available[index]
    }

    pub fn set_enabled(&mut self, disk: &DiskId, value: bool) {
        let i = self.idx(disk);
        self.enabled.set(i, value);
    }

    pub fn set_available(&mut self, disk: &DiskId, value: bool) {
        let i = self.idx(disk);
        self.available.set(i, value);
    }

    /// Mark a disk both enabled and available
    pub fn online(&mut self, disk: &DiskId) {
        self.set_online_at(self.idx(disk), true);
    }

    /// Mark a disk neither enabled nor available
    pub fn offline(&mut self, disk: &DiskId) {
        self.set_online_at(self.idx(disk), false);
    }

    pub fn set_online_at(&mut self, index: usize, value: bool) {
        self.enabled.set(index, value);
        self.available.set(index, value);
    }

    /// Toggle a disk between online and offline
    pub fn flip(&mut self, disk: &DiskId) {
        let i = self.idx(disk);
        let online = self.is_online_at(i);
        self.set_online_at(i, !online);
    }

    /// Intersect both bit vectors with `other`'s
    pub fn and(&mut self, other: &DiskMask) {
        self.assert_same_shape(other);
        self.enabled.intersect_with(&other.enabled);
        self.available.intersect_with(&other.available);
    }

    /// Union both bit vectors with `other`'s
    pub fn or(&mut self, other: &DiskMask) {
        self.assert_same_shape(other);
        self.enabled.union_with(&other.enabled);
        self.available.union_with(&other.available);
    }

    /// Clear every bit that is set in `other`
    pub fn and_not(&mut self, other: &DiskMask) {
        self.assert_same_shape(other);
        self.enabled.difference_with(&other.enabled);
        self.available.difference_with(&other.available);
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled.count_ones(..)
    }

    pub fn available_count(&self) -> usize {
        self.available.count_ones(..)
    }

    pub fn online_count(&self) -> usize {
        self.enabled.intersection(&self.available).count()
    }

    /// Every online disk, in `DiskId` order
    pub fn iter_online(&self) -> impl Iterator<Item=DiskId> + '_ {
        self.enabled.intersection(&self.available)
            .map(|i| self.topology.disk_at(i))
    }

    /// Are only the first half of the cell's nodes populated?
    ///
    /// True when no disk in the upper half of the address space is available.
    /// Layout tolerates more fragments per node in that configuration.
    pub fn is_8_node_configuration(&self) -> bool {
        let half = self.len() / 2;
        self.available.count_ones(half..) == 0
    }

    /// Parse the token form produced by `Display`.
    ///
    /// Each whitespace-separated `nodeId:diskIndex` token marks one disk
    /// online.  All other disks are offline.
    pub fn parse(topology: Topology, s: &str) -> Result<Self> {
        let mut mask = DiskMask::new(topology);
        for token in s.split_whitespace() {
            let bad = || Error::Parse(token.to_owned());
            let (node, disk) = token.split_once(':').ok_or_else(bad)?;
            let node_id = node.parse::<u16>().map_err(|_| bad())?;
            let disk_index = disk.parse::<u8>().map_err(|_| bad())?;
            let id = DiskId {
                cell_id: topology.cell_id,
                silo_id: topology.silo_id,
                node_id,
                disk_index
            };
            let i = topology.index(&id).ok_or_else(bad)?;
            mask.set_online_at(i, true);
        }
        Ok(mask)
    }
}

/// Lists the online disks as whitespace-separated `nodeId:diskIndex` tokens
impl Display for DiskMask {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut first = true;
        for disk in self.iter_online() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{disk}")?;
        }
        Ok(())
    }
}

// LCOV_EXCL_STOP
