// vim: tw=80
//! Kernel log scraping
//!
//! Turns the kernel's message stream into disk topology change events.
//! Everything that knows about Linux message formats lives here.

use futures::stream::{self, BoxStream, StreamExt};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// A disk topology change, or a disk error, reported by the kernel
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DiskEvent {
    /// A disk appeared.  The payload is the kernel's device name, like "sdb".
    Attached(String),
    /// A disk went away
    Detached(String),
    /// An I/O error.  The payload is the whole message.
    Error(String),
}

/// A boxed stream of `DiskEvent`s
pub type EventStream = BoxStream<'static, DiskEvent>;

lazy_static! {
    static ref LINK: Regex =
        Regex::new(r"\bata(\d+)(?:\.\d+)?: SATA link (up|down)\b").unwrap();
    static ref ATTACHED: Regex = Regex::new(
        r"\bsd (\d+):\d+:\d+:\d+: \[(\w+)\] Attached SCSI (?:removable )?disk"
    ).unwrap();
    static ref DETACHED: Regex = Regex::new(
        r"\bsd (\d+):\d+:\d+:\d+: \[(\w+)\] (?:Synchronizing SCSI cache|Stopping disk)"
    ).unwrap();
    static ref IO_ERROR: Regex =
        Regex::new(r"(?i)\bI/O error\b|\bmedium error\b|\bfailed command\b")
        .unwrap();
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Link {
    Up,
    Down,
}

/// Recognizes disk events in kernel messages.
///
/// Insertion and removal are each announced by a pair of messages: a link
/// state change on an ATA port, then a SCSI message naming the device.  The
/// parser remembers the first half of each port's pair until the second
/// arrives, so pairs from different ports may interleave.
#[derive(Debug, Default)]
pub struct KmsgParser {
    /// Pending link changes, keyed by SCSI host number
    pending: BTreeMap<u32, Link>,
}

impl KmsgParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// libata numbers its ports from 1, and registers one SCSI host per
    /// port, numbered from 0.
    fn host_for_port(port: &str) -> Option<u32> {
        port.parse::<u32>().ok()?.checked_sub(1)
    }

    /// Complete a pair, if `host` has a pending link change of kind `want`.
    fn complete(&mut self, host: &str, want: Link) -> bool {
        let Ok(host) = host.parse::<u32>() else {
            return false;
        };
        if self.pending.get(&host) == Some(&want) {
            self.pending.remove(&host);
            true
        } else {
            false
        }
    }

    /// Feed one line of the kernel log.
    pub fn feed(&mut self, line: &str) -> Option<DiskEvent> {
        if let Some(c) = LINK.captures(line) {
            let link = if &c[2] == "up" { Link::Up } else { Link::Down };
            match Self::host_for_port(&c[1]) {
                Some(host) => {
                    self.pending.insert(host, link);
                }
                None => debug!(line, "link change on an unknown port"),
            }
            None
        } else if let Some(c) = ATTACHED.captures(line) {
            if self.complete(&c[1], Link::Up) {
                Some(DiskEvent::Attached(c[2].to_owned()))
            } else {
                debug!(line, "attach message without a link up");
                None
            }
        } else if let Some(c) = DETACHED.captures(line) {
            if self.complete(&c[1], Link::Down) {
                Some(DiskEvent::Detached(c[2].to_owned()))
            } else {
                // Also printed during an orderly shutdown
                debug!(line, "detach message without a link down");
                None
            }
        } else if IO_ERROR.is_match(line) {
            Some(DiskEvent::Error(line.to_owned()))
        } else {
            None
        }
    }
}

/// Turn a line-oriented kernel message source into a stream of `DiskEvent`s.
///
/// The stream ends when the source does, or when it fails.
pub fn kmsg_events<R>(reader: R) -> EventStream
    where R: AsyncBufRead + Send + Unpin + 'static
{
    let lines = reader.lines();
    stream::unfold((lines, KmsgParser::new()), |(mut lines, mut parser)| {
        async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(ev) = parser.feed(&line) {
                            return Some((ev, (lines, parser)));
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        warn!("reading kernel messages: {e}");
                        return None;
                    }
                }
            }
        }
    }).boxed()
}

// LCOV_EXCL_STOP
