// vim: tw=80
//! Per-disk health records

use serde_derive::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    label::DiskLabel,
    mask::DiskMask,
    types::*,
};

/// Coarse state of one disk slot.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum DiskStatus {
    /// Nothing is plugged into the slot
    Absent,
    /// Present, but unusable because of a hard failure
    Offline,
    /// Present and healthy, but administratively disabled
    Disabled,
    /// Carries a label belonging to some other slot
    Foreign,
    /// Mounted and in service
    Enabled,
}

impl DiskStatus {
    /// Is the disk physically present and not hard-failed?
    pub fn is_available(self) -> bool {
        !matches!(self, DiskStatus::Absent | DiskStatus::Offline)
    }

    pub fn is_enabled(self) -> bool {
        self == DiskStatus::Enabled
    }
}

impl fmt::Display for DiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Absent => "Absent".fmt(f),
            Self::Offline => "Offline".fmt(f),
            Self::Disabled => "Disabled".fmt(f),
            Self::Foreign => "Foreign".fmt(f),
            Self::Enabled => "Enabled".fmt(f),
        }
    }
}

/// A snapshot of a disk's health sensors
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct SmartInfo {
    pub bad_sectors: u64,
    pub pending_sectors: u64,
    /// Degrees Celsius
    pub temperature: i16,
}

/// Everything the health monitor knows about one disk slot
#[derive(Clone, Debug, PartialEq)]
pub struct Disk {
    pub id: DiskId,
    /// Where the disk's device lives
    pub device: PathBuf,
    pub status: DiskStatus,
    /// Errors reported since the disk was last enabled
    pub errors: u32,
    /// Result of the most recent self-test, if any has run
    pub last_self_test: Option<bool>,
    pub smart: SmartInfo,
    /// Fraction of the data partition in use, `0.0..=1.0`
    pub usage: f64,
    pub label: Option<DiskLabel>,
}

impl Disk {
    pub fn new(id: DiskId, device: PathBuf) -> Self {
        Disk {
            id,
            device,
            status: DiskStatus::Absent,
            errors: 0,
            last_self_test: None,
            smart: SmartInfo::default(),
            usage: 0.0,
            label: None,
        }
    }

    /// Last path component of the device, used to correlate kernel messages
    pub fn device_name(&self) -> Option<&str> {
        self.device.file_name().and_then(|n| n.to_str())
    }
}

/// All of the local disks, keyed by slot
#[derive(Clone, Debug, Default)]
pub struct DiskArray {
    disks: BTreeMap<DiskId, Disk>,
}

impl DiskArray {
    pub fn new<I: IntoIterator<Item=Disk>>(disks: I) -> Self {
        DiskArray {
            disks: disks.into_iter().map(|d| (d.id, d)).collect()
        }
    }

    pub fn get(&self, id: &DiskId) -> Result<&Disk> {
        self.disks.get(id).ok_or(Error::NoSuchDisk(*id))
    }

    pub fn get_mut(&mut self, id: &DiskId) -> Result<&mut Disk> {
        self.disks.get_mut(id).ok_or(Error::NoSuchDisk(*id))
    }

    pub fn iter(&self) -> impl Iterator<Item=&Disk> {
        self.disks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item=&mut Disk> {
        self.disks.values_mut()
    }

    pub fn len(&self) -> usize {
        self.disks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.iter().filter(|d| d.status.is_enabled()).count()
    }

    /// Find the disk whose device name matches a kernel device name exactly
    pub fn by_device_name(&self, name: &str) -> Option<DiskId> {
        self.iter()
            .find(|d| d.device_name() == Some(name))
            .map(|d| d.id)
    }

    /// Find the disk whose device name appears within a kernel message.
    ///
    /// When several names match, the longest wins, so "sdb1" beats "sdb".
    pub fn by_message(&self, line: &str) -> Option<DiskId> {
        self.iter()
            .filter_map(|d| d.device_name().map(|n| (n, d.id)))
            .filter(|(n, _)| !n.is_empty() && line.contains(n))
            .max_by_key(|(n, _)| n.len())
            .map(|(_, id)| id)
    }

    pub fn by_device(&self, device: &Path) -> Option<DiskId> {
        self.iter().find(|d| d.device == device).map(|d| d.id)
    }

    /// The raw mask as seen by this node alone
    pub fn local_mask(&self, topology: Topology) -> DiskMask {
        let mut mask = DiskMask::new(topology);
        for disk in self.iter() {
            mask.set_enabled(&disk.id, disk.status.is_enabled());
            mask.set_available(&disk.id, disk.status.is_available());
        }
        mask
    }
}

// LCOV_EXCL_START
#[cfg(test)]
mod t {
use pretty_assertions::assert_eq;
use rstest::rstest;
use super::*;

fn array() -> DiskArray {
    let topo = Topology::default();
    let names = ["sda", "sdb", "sdc", "sdd"];
    DiskArray::new(names.iter().enumerate().map(|(i, name)| {
        Disk::new(topo.disk(0, i), Path::new("/dev").join(name))
    }))
}

#[rstest]
#[case(DiskStatus::Absent, false, false)]
#[case(DiskStatus::Offline, false, false)]
#[case(DiskStatus::Disabled, true, false)]
#[case(DiskStatus::Foreign, true, false)]
#[case(DiskStatus::Enabled, true, true)]
fn status(#[case] s: DiskStatus, #[case] available: bool,
          #[case] enabled: bool)
{
    assert_eq!(s.is_available(), available);
    assert_eq!(s.is_enabled(), enabled);
}

#[test]
fn by_message() {
    let topo = Topology::default();
    let sdb1 = Disk::new(topo.disk(1, 0), PathBuf::from("/dev/sdb1"));
    let da = DiskArray::new(array().iter().cloned().chain(Some(sdb1)));
    assert_eq!(da.by_message("end_request: I/O error, dev sdc, sector 99"),
               Some(topo.disk(0, 2)));
    assert_eq!(da.by_message("Buffer I/O error on dev sdb1, logical block 5"),
               Some(topo.disk(1, 0)));
    assert_eq!(da.by_message("usb 1-1: new high-speed USB device"), None);
}

#[test]
fn by_device_name() {
    let da = array();
    assert_eq!(da.by_device_name("sdd"), Some(Topology::default().disk(0, 3)));
    assert_eq!(da.by_device_name("sde"), None);
    assert_eq!(da.by_device(Path::new("/dev/sda")),
               Some(Topology::default().disk(0, 0)));
}

#[test]
fn get_missing() {
    let da = array();
    let id = Topology::default().disk(5, 0);
    assert_eq!(da.get(&id), Err(Error::NoSuchDisk(id)));
}

#[test]
fn local_mask() {
    let topo = Topology::default();
    let mut da = array();
    da.get_mut(&topo.disk(0, 0)).unwrap().status = DiskStatus::Enabled;
    da.get_mut(&topo.disk(0, 1)).unwrap().status = DiskStatus::Disabled;
    da.get_mut(&topo.disk(0, 2)).unwrap().status = DiskStatus::Offline;
    let mask = da.local_mask(topo);
    assert!(mask.is_online(&topo.disk(0, 0)));
    assert!(mask.is_available(&topo.disk(0, 1)));
    assert!(!mask.is_enabled(&topo.disk(0, 1)));
    assert!(!mask.is_available(&topo.disk(0, 2)));
    assert_eq!(mask.online_count(), 1);
    assert_eq!(da.enabled_count(), 1);
}
}
// LCOV_EXCL_STOP
