// vim: tw=80
//! Interfaces to the services that consume or feed the health monitor

use async_trait::async_trait;
#[cfg(test)] use mockall::automock;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex
};
use tracing::info;

use crate::{
    mask::DiskMask,
    types::*,
};

/// The object store that reads and writes fragments.
///
/// The health monitor tells it whenever a disk enters or leaves service, so
/// that its per-disk I/O handles stay in sync with the published mask.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn open_disk(&self, disk: DiskId) -> Result<()>;
    async fn close_disk(&self, disk: DiskId) -> Result<()>;
}

/// The cluster membership and quorum service
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Membership: Send + Sync + 'static {
    /// Report how many local disks are in service
    async fn set_active_disk_count(&self, count: usize) -> Result<()>;

    /// The disks that other nodes of the cell report as online, if known
    async fn peer_mask(&self) -> Option<DiskMask>;
}

/// An `ObjectStore` that only logs
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingStore;

#[async_trait]
impl ObjectStore for LoggingStore {
    async fn open_disk(&self, disk: DiskId) -> Result<()> {
        info!(%disk, "open disk");
        Ok(())
    }

    async fn close_disk(&self, disk: DiskId) -> Result<()> {
        info!(%disk, "close disk");
        Ok(())
    }
}

/// Membership for a node running on its own.
///
/// It has no peers, and remembers the last count reported to it.
#[derive(Debug, Default)]
pub struct StandaloneMembership {
    active: AtomicUsize,
    peers: Mutex<Option<DiskMask>>,
}

impl StandaloneMembership {
    /// The most recently reported active disk count
    pub fn active_disk_count(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Pretend that other nodes report these disks online
    pub fn set_peer_mask(&self, mask: Option<DiskMask>) {
        *self.peers.lock().unwrap_or_else(|e| e.into_inner()) = mask;
    }
}

#[async_trait]
impl Membership for StandaloneMembership {
    async fn set_active_disk_count(&self, count: usize) -> Result<()> {
        info!(count, "active disk count");
        self.active.store(count, Ordering::Relaxed);
        Ok(())
    }

    async fn peer_mask(&self) -> Option<DiskMask> {
        self.peers.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

// LCOV_EXCL_START
#[cfg(test)]
mod t {
use pretty_assertions::assert_eq;
use super::*;

#[tokio::test]
async fn standalone() {
    let m = StandaloneMembership::default();
    assert_eq!(m.peer_mask().await, None);
    m.set_active_disk_count(12).await.unwrap();
    assert_eq!(m.active_disk_count(), 12);
    let mask = DiskMask::full(Topology::default());
    m.set_peer_mask(Some(mask.clone()));
    assert_eq!(m.peer_mask().await, Some(mask));
}
}
// LCOV_EXCL_STOP
