// vim: tw=80
//! Reports the local active disk count to cluster membership

use std::{sync::Arc, time::Duration};
use tracing::{debug, error, warn};

use crate::collaborator::Membership;

pub struct QuorumReporter {
    membership: Arc<dyn Membership>,
    /// Additional attempts after the first one fails
    retries: u32,
    retry_delay: Duration,
    last_reported: Option<usize>,
}

impl QuorumReporter {
    pub fn new(membership: Arc<dyn Membership>, retries: u32,
               retry_delay: Duration) -> Self
    {
        QuorumReporter {
            membership,
            retries,
            retry_delay,
            last_reported: None
        }
    }

    /// The last count that membership accepted
    pub fn last_reported(&self) -> Option<usize> {
        self.last_reported
    }

    /// Push `count` to membership, if it changed since the last report.
    ///
    /// Returns whether membership now knows the current count.  Failure isn't
    /// fatal; the next call will try again.
    pub async fn report(&mut self, count: usize) -> bool {
        if self.last_reported == Some(count) {
            return true;
        }
        for attempt in 0..=self.retries {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay).await;
            }
            match self.membership.set_active_disk_count(count).await {
                Ok(()) => {
                    debug!(count, "reported active disk count");
                    self.last_reported = Some(count);
                    return true;
                }
                Err(e) => {
                    warn!(count, attempt, "setting active disk count: {e}");
                }
            }
        }
        error!(count, "failed to report active disk count");
        false
    }
}

// LCOV_EXCL_STOP
