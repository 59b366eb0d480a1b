// vim: tw=80
//! The published disk mask, and the layout interface built on it
//!
//! The health monitor is the only writer.  Readers never lock: they load the
//! current snapshot once and compute against it, so they never see a mask
//! that is only partly updated.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::debug;

use crate::{
    layout::{Layout, LayoutComputer},
    mask::DiskMask,
    types::*,
};

/// One immutable published state
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub mask: DiskMask,
    /// New objects may not be stored while set
    pub block_writes: bool,
    /// Incremented on every publication
    pub generation: u64,
}

#[derive(Debug)]
pub struct Published {
    inner: ArcSwap<Snapshot>,
}

impl Published {
    /// Start with every disk offline.
    pub fn new(topology: Topology) -> Self {
        let snapshot = Snapshot {
            mask: DiskMask::new(topology),
            block_writes: false,
            generation: 0,
        };
        Published {
            inner: ArcSwap::from_pointee(snapshot)
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.inner.load_full()
    }

    /// Replace the snapshot, unless nothing changed.
    ///
    /// Returns whether a new snapshot was published.
    pub fn publish(&self, mask: DiskMask, block_writes: bool) -> bool {
        let cur = self.inner.load();
        if cur.mask == mask && cur.block_writes == block_writes {
            return false;
        }
        let generation = cur.generation + 1;
        debug!(generation, block_writes, online = %mask, "publishing disk mask");
        self.inner.store(Arc::new(Snapshot { mask, block_writes, generation }));
        true
    }
}

/// The interface through which the object store asks where fragments go.
#[derive(Clone, Debug)]
pub struct LayoutProxy {
    computer: LayoutComputer,
    published: Arc<Published>,
}

impl LayoutProxy {
    pub fn new(computer: LayoutComputer, published: Arc<Published>) -> Self {
        LayoutProxy { computer, published }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.published.load()
    }

    /// Layout for storing a new object.
    ///
    /// Fails while writes are blocked.
    pub fn layout_for_store(&self, map_id: u32) -> Result<Layout> {
        let snap = self.published.load();
        if snap.block_writes {
            return Err(Error::WritesBlocked);
        }
        self.computer.compute_layout(map_id, &snap.mask)
    }

    /// Layout for reading an existing object
    pub fn layout_for_retrieve(&self, map_id: u32) -> Result<Layout> {
        let snap = self.published.load();
        self.computer.compute_layout(map_id, &snap.mask)
    }

    /// Layout for recovering an object's fragments.
    ///
    /// A recovery may need to see the layout as it was under some older mask,
    /// so the caller can supply one.  Otherwise the current mask is used.
    pub fn layout_for_recover(&self, map_id: u32, mask: Option<&DiskMask>)
        -> Result<Layout>
    {
        match mask {
            Some(m) => self.computer.compute_layout(map_id, m),
            None => self.layout_for_retrieve(map_id)
        }
    }

    pub fn fragment_id(&self, map_id: u32, disk: &DiskId)
        -> Result<Option<usize>>
    {
        let snap = self.published.load();
        self.computer.fragment_id(map_id, disk, &snap.mask)
    }

    pub fn disk_for_fragment(&self, map_id: u32, frag: usize)
        -> Result<Option<DiskId>>
    {
        let snap = self.published.load();
        self.computer.disk_for_fragment(map_id, frag, &snap.mask)
    }
}

// LCOV_EXCL_START
#[cfg(test)]
mod t {
use lazy_static::lazy_static;
use pretty_assertions::assert_eq;
use crate::placement::{MapStrategy, PlacementMap};
use super::*;

lazy_static! {
    static ref MAP: Arc<PlacementMap> =
        Arc::new(PlacementMap::new(MapStrategy::Golden));
}

fn proxy() -> (LayoutProxy, Arc<Published>) {
    let published = Arc::new(Published::new(Topology::default()));
    let lc = LayoutComputer::new(MAP.clone());
    (LayoutProxy::new(lc, published.clone()), published)
}

#[test]
fn block_writes() {
    let topo = Topology::default();
    let (proxy, published) = proxy();
    assert!(published.publish(DiskMask::full(topo), true));
    assert_eq!(proxy.layout_for_store(0), Err(Error::WritesBlocked));
    assert!(proxy.layout_for_retrieve(0).unwrap().is_complete());
    assert!(published.publish(DiskMask::full(topo), false));
    assert!(proxy.layout_for_store(0).unwrap().is_complete());
}

#[test]
fn publish_only_on_change() {
    let topo = Topology::default();
    let published = Published::new(topo);
    assert_eq!(published.load().generation, 0);
    assert!(!published.publish(DiskMask::new(topo), false));
    assert_eq!(published.load().generation, 0);
    assert!(published.publish(DiskMask::full(topo), false));
    assert!(!published.publish(DiskMask::full(topo), false));
    assert_eq!(published.load().generation, 1);
}

/// A reader's snapshot isn't affected by later publications
#[test]
fn snapshot_is_immutable() {
    let topo = Topology::default();
    let (proxy, published) = proxy();
    published.publish(DiskMask::full(topo), false);
    let snap = proxy.snapshot();
    published.publish(DiskMask::new(topo), false);
    assert_eq!(snap.mask, DiskMask::full(topo));
    assert_eq!(proxy.snapshot().mask, DiskMask::new(topo));
}

#[test]
fn recover_with_old_mask() {
    let topo = Topology::default();
    let (proxy, published) = proxy();
    let full = DiskMask::full(topo);
    let before = proxy.layout_for_recover(3, Some(&full)).unwrap();
    assert!(before.is_complete());
    // Nothing is published yet, so the current mask has every disk offline
    let now = proxy.layout_for_recover(3, None).unwrap();
    assert_eq!(now.missing().len(), 7);
    published.publish(full, false);
    assert_eq!(proxy.layout_for_recover(3, None).unwrap(), before);
}

#[test]
fn fragment_lookups() {
    let topo = Topology::default();
    let (proxy, published) = proxy();
    published.publish(DiskMask::full(topo), true);
    let layout = proxy.layout_for_retrieve(11).unwrap();
    let disk = layout.slots[4].unwrap();
    assert_eq!(proxy.fragment_id(11, &disk), Ok(Some(4)));
    assert_eq!(proxy.disk_for_fragment(11, 4), Ok(Some(disk)));
    assert_eq!(proxy.disk_for_fragment(11, 7),
               Err(Error::FragmentOutOfRange(7)));
}
}
// LCOV_EXCL_STOP
