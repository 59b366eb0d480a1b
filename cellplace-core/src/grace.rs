// vim: tw=80
//! Debounces transient disk failures
//!
//! A disk that drops offline is kept online in the published mask until it
//! has stayed offline for the whole grace period.  Short glitches, like a SATA
//! link renegotiation, therefore never disturb placement.

use std::{
    collections::BTreeMap,
    time::Duration,
};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{
    mask::DiskMask,
    types::*,
};

#[derive(Debug)]
pub struct GracePeriod {
    period: Duration,
    /// When each pending disk was first seen offline
    pending: BTreeMap<DiskId, Instant>,
    first_cycle: bool,
}

impl GracePeriod {
    pub fn new(period: Duration) -> Self {
        GracePeriod {
            period,
            pending: BTreeMap::new(),
            first_cycle: true,
        }
    }

    /// Disks that are offline but still within their grace period
    pub fn pending(&self) -> impl Iterator<Item=(&DiskId, &Instant)> {
        self.pending.iter()
    }

    /// Forget all history, as though the process had just started.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.first_cycle = true;
    }

    /// Compute the mask to publish, given the previously published mask and a
    /// freshly computed raw one.
    ///
    /// No grace applies on the first cycle.  The outcome for each disk depends
    /// only on that disk's own bits and record.
    pub fn smooth(&mut self, prev: &DiskMask, raw: &DiskMask, now: Instant)
        -> DiskMask
    {
        assert_eq!(prev.len(), raw.len(), "mask dimension mismatch");
        let mut out = raw.clone();
        if self.first_cycle {
            self.first_cycle = false;
            self.pending.clear();
            return out;
        }
        let topology = *raw.topology();
        for i in 0..raw.len() {
            let disk = topology.disk_at(i);
            if raw.is_online_at(i) {
                if self.pending.remove(&disk).is_some() {
                    info!(%disk, "disk recovered within its grace period");
                }
                continue;
            }
            if !prev.is_online_at(i) && !self.pending.contains_key(&disk) {
                continue;
            }
            let since = *self.pending.entry(disk).or_insert(now);
            if now.saturating_duration_since(since) >= self.period {
                warn!(%disk, "grace period expired; disk is offline");
                self.pending.remove(&disk);
            } else {
                out.set_online_at(i, true);
            }
        }
        out
    }
}

// LCOV_EXCL_STOP
