// vim: tw=80
//! Turns a map id and a `DiskMask` into a concrete list of disks

use fixedbitset::FixedBitSet;
use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
};
use tracing::error;

use crate::{
    mask::DiskMask,
    placement::*,
    types::*,
};

/// Which disk holds each fragment of an object.
///
/// A slot is `None` if no usable disk could be found for that fragment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Layout {
    pub map_id: u32,
    pub slots: Vec<Option<DiskId>>,
}

impl Layout {
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Indices of the fragments that have no disk
    pub fn missing(&self) -> Vec<usize> {
        self.slots.iter()
            .enumerate()
            .filter_map(|(i, s)| s.is_none().then_some(i))
            .collect()
    }

    /// Which fragment, if any, is stored on `disk`?
    pub fn fragment_of(&self, disk: &DiskId) -> Option<usize> {
        self.slots.iter().position(|s| s.as_ref() == Some(disk))
    }

    /// The disk holding fragment `frag`
    pub fn disk(&self, frag: usize) -> Result<Option<DiskId>> {
        self.slots.get(frag)
            .copied()
            .ok_or(Error::FragmentOutOfRange(frag))
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "map {}:", self.map_id)?;
        for slot in self.slots.iter() {
            match slot {
                Some(d) => write!(f, " {d}")?,
                None => write!(f, " -")?,
            }
        }
        Ok(())
    }
}

/// Computes layouts from the shared placement table.
///
/// Stateless apart from the table, so one instance may be shared freely.
#[derive(Clone, Debug)]
pub struct LayoutComputer {
    map: Arc<PlacementMap>,
}

impl LayoutComputer {
    pub fn new(map: Arc<PlacementMap>) -> Self {
        LayoutComputer { map }
    }

    pub fn placement_map(&self) -> &Arc<PlacementMap> {
        &self.map
    }

    /// Compute the layout of `map_id` given which disks are usable.
    ///
    /// Each fragment column is filled with the first row whose disk is online,
    /// not already in the layout, and on a node that holds fewer than the
    /// current tolerance of fragments.  The tolerance starts at one fragment
    /// per node, or two for an 8-node cell, and rises to
    /// `MAX_FRAGS_PER_NODE`.  A column that can't be filled is left empty.
    pub fn compute_layout(&self, map_id: u32, mask: &DiskMask)
        -> Result<Layout>
    {
        let topology = *mask.topology();
        assert_eq!(mask.len(), NODES_PER_CELL * DISKS_PER_NODE,
            "mask dimension mismatch");
        let start = if mask.is_8_node_configuration() { 2 } else { 1 };
        let mut used = FixedBitSet::with_capacity(mask.len());
        let mut per_node = [0usize; NODES_PER_CELL];
        let mut slots = Vec::with_capacity(FRAGS_PER_OBJ);
        for column in 0..FRAGS_PER_OBJ {
            let mut found = None;
            'search: for tolerance in start..=MAX_FRAGS_PER_NODE {
                for row in 0..MAP_ROWS {
                    let e = self.map.entry(map_id, row, column)?;
                    let i = e.index();
                    if mask.is_online_at(i) && !used.contains(i) &&
                        per_node[usize::from(e.node)] < tolerance
                    {
                        found = Some(e);
                        break 'search;
                    }
                }
            }
            match found {
                Some(e) => {
                    used.insert(e.index());
                    per_node[usize::from(e.node)] += 1;
                    slots.push(Some(topology.disk(usize::from(e.node),
                                                  usize::from(e.disk))));
                }
                None => {
                    error!(map_id, fragment = column, online = %mask,
                        "no usable disk for fragment");
                    slots.push(None);
                }
            }
        }
        Ok(Layout { map_id, slots })
    }

    /// Which fragment of `map_id` would be stored on `disk`, if any?
    pub fn fragment_id(&self, map_id: u32, disk: &DiskId, mask: &DiskMask)
        -> Result<Option<usize>>
    {
        Ok(self.compute_layout(map_id, mask)?.fragment_of(disk))
    }

    /// Which disk would store fragment `frag` of `map_id`?
    pub fn disk_for_fragment(&self, map_id: u32, frag: usize, mask: &DiskMask)
        -> Result<Option<DiskId>>
    {
        if frag >= FRAGS_PER_OBJ {
            return Err(Error::FragmentOutOfRange(frag));
        }
        self.compute_layout(map_id, mask)?.disk(frag)
    }
}

// LCOV_EXCL_STOP
