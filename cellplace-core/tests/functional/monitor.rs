// vim: tw=80
//! The disk health monitor driving directory-backed disks

use std::{fs, time::Duration};

use cellplace_core::{
    disk::DiskStatus,
    kmsg::kmsg_events,
    types::*,
};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncWriteExt, BufReader};

use super::{Cell, CellBuilder};

fn id(cell: &Cell, i: usize) -> DiskId {
    cell.config.topology().disk(i / 4, i % 4)
}

async fn status(cell: &Cell, i: usize) -> DiskStatus {
    t!(cell.monitor.disk(id(cell, i)).await).status
}

/// Wait for the background tasks to bring a disk to `want`
async fn wait_for(cell: &Cell, i: usize, want: DiskStatus) {
    for _ in 0..500 {
        if status(cell, i).await == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("disk {i} never became {want}");
}

mod lifecycle {
    use pretty_assertions::assert_eq;
    use super::*;

    #[tokio::test]
    async fn blank_disks_are_labeled() {
        let cell = CellBuilder {
            empty: vec![3],
            ..Default::default()
        }.build();
        t!(cell.monitor.start(None).await);
        for i in 0..3 {
            assert_eq!(status(&cell, i).await, DiskStatus::Enabled);
            assert!(cell.device(i).join("label").exists());
            assert!(cell.device(i).join("data").is_dir());
        }
        assert_eq!(status(&cell, 3).await, DiskStatus::Absent);
        assert_eq!(cell.membership.active_disk_count(), 3);
        assert_eq!(cell.monitor.published().load().mask.online_count(), 3);

        cell.monitor.shutdown().await;
        for i in 0..3 {
            assert!(cell.device(i).join("clean").exists());
        }
    }

    /// After a clean shutdown, disks come back with their data intact
    #[tokio::test]
    async fn restart_keeps_data() {
        let cell = CellBuilder::default().build();
        t!(cell.monitor.start(None).await);
        let sentinel = cell.device(1).join("data").join("fragment");
        t!(fs::write(&sentinel, b"payload"));
        cell.monitor.shutdown().await;

        let cell = cell.restart();
        t!(cell.monitor.start(None).await);
        assert_eq!(status(&cell, 1).await, DiskStatus::Enabled);
        assert_eq!(t!(fs::read(&sentinel)), b"payload");
        cell.monitor.shutdown().await;
    }

    #[tokio::test]
    async fn self_test() {
        let cell = CellBuilder::default().build();
        t!(cell.monitor.start(None).await);
        cell.monitor.self_test().await;
        for disk in cell.monitor.disks().await {
            assert_eq!(disk.last_self_test, Some(true));
            assert_eq!(disk.errors, 0);
        }
        cell.monitor.shutdown().await;
    }
}

mod errors {
    use pretty_assertions::assert_eq;
    use super::*;

    /// A disk disabled for errors stays disabled across a restart
    #[tokio::test]
    async fn threshold_persists() {
        let cell = CellBuilder::default().build();
        t!(cell.monitor.start(None).await);
        let line = "blk_update_request: I/O error, dev sdb, sector 4096";
        let sdb = id(&cell, 1);
        assert_eq!(cell.monitor.device_error(line).await, Some((sdb, false)));
        assert_eq!(cell.monitor.device_error(line).await, Some((sdb, false)));
        assert_eq!(cell.monitor.device_error(line).await, Some((sdb, true)));
        assert_eq!(status(&cell, 1).await, DiskStatus::Disabled);
        cell.monitor.refresh().await;
        assert!(!cell.monitor.published().load().mask.is_online(&sdb));
        cell.monitor.shutdown().await;

        let cell = cell.restart();
        t!(cell.monitor.start(None).await);
        assert_eq!(status(&cell, 1).await, DiskStatus::Disabled);
        assert_eq!(status(&cell, 0).await, DiskStatus::Enabled);
        cell.monitor.shutdown().await;
    }
}

mod admin {
    use pretty_assertions::assert_eq;
    use super::*;

    /// A disk moved from another slot is foreign until relabeled
    #[tokio::test]
    async fn foreign_disk() {
        let cell = CellBuilder::default().build();
        t!(cell.monitor.start(None).await);
        cell.monitor.shutdown().await;
        t!(fs::copy(cell.device(0).join("label"),
                    cell.device(1).join("label")));

        let cell = cell.restart();
        t!(cell.monitor.start(None).await);
        let sdb = id(&cell, 1);
        assert_eq!(status(&cell, 1).await, DiskStatus::Foreign);
        assert_eq!(cell.monitor.enable(sdb).await, Err(Error::Foreign(sdb)));
        t!(cell.monitor.relabel(sdb).await);
        assert_eq!(status(&cell, 1).await, DiskStatus::Disabled);
        t!(cell.monitor.enable(sdb).await);
        assert_eq!(status(&cell, 1).await, DiskStatus::Enabled);
        cell.monitor.shutdown().await;
    }

    #[tokio::test]
    async fn wipe() {
        let cell = CellBuilder::default().build();
        t!(cell.monitor.start(None).await);
        let sdc = id(&cell, 2);
        let sentinel = cell.device(2).join("data").join("fragment");
        t!(fs::write(&sentinel, b"payload"));
        assert_eq!(cell.monitor.wipe(sdc).await, Err(Error::DiskEnabled(sdc)));
        t!(cell.monitor.disable(sdc).await);
        t!(cell.monitor.wipe(sdc).await);
        assert!(!sentinel.exists());
        assert_eq!(status(&cell, 2).await, DiskStatus::Disabled);
        t!(cell.monitor.enable(sdc).await);
        assert_eq!(status(&cell, 2).await, DiskStatus::Enabled);
        cell.monitor.shutdown().await;
    }

    /// A full wipe starts the disk over from a blank label
    #[tokio::test]
    async fn full_wipe() {
        let cell = CellBuilder::default().build();
        t!(cell.monitor.start(None).await);
        let sdc = id(&cell, 2);
        let sentinel = cell.device(2).join("data").join("fragment");
        t!(fs::write(&sentinel, b"payload"));
        t!(cell.monitor.disable(sdc).await);
        let old_uuid = t!(cell.monitor.disk(sdc).await).label.unwrap().uuid;

        let jh = t!(cell.monitor.full_wipe(sdc).await);
        t!(jh.await);
        let disk = t!(cell.monitor.disk(sdc).await);
        assert_eq!(disk.status, DiskStatus::Enabled);
        assert_ne!(disk.label.unwrap().uuid, old_uuid);
        assert!(!sentinel.exists());
        assert!(cell.monitor.is_running().await);
        cell.monitor.shutdown().await;
    }

    #[tokio::test]
    async fn pull_push() {
        let cell = CellBuilder::default().build();
        t!(cell.monitor.start(None).await);
        let sdd = id(&cell, 3);
        t!(cell.monitor.pull(sdd).await);
        assert_eq!(status(&cell, 3).await, DiskStatus::Absent);
        cell.monitor.refresh().await;
        assert_eq!(cell.membership.active_disk_count(), 4);
        assert!(cell.monitor.report_quorum().await);
        assert_eq!(cell.membership.active_disk_count(), 3);
        t!(cell.monitor.push(sdd).await);
        assert_eq!(status(&cell, 3).await, DiskStatus::Enabled);
        cell.monitor.shutdown().await;
    }
}

/// Kernel messages drive insertion and removal
#[tokio::test]
async fn kernel_events() {
    let cell = CellBuilder::default().build();
    let (mut w, r) = tokio::io::duplex(4096);
    t!(cell.monitor.start(Some(kmsg_events(BufReader::new(r)))).await);

    let removal = "ata2: SATA link down (SStatus 0 SControl 300)\n\
        sd 1:0:0:0: [sdb] Synchronizing SCSI cache\n";
    t!(w.write_all(removal.as_bytes()).await);
    wait_for(&cell, 1, DiskStatus::Absent).await;

    let insertion = "ata2: SATA link up 6.0 Gbps (SStatus 133 SControl 300)\n\
        sd 1:0:0:0: [sdb] Attached SCSI disk\n";
    t!(w.write_all(insertion.as_bytes()).await);
    wait_for(&cell, 1, DiskStatus::Enabled).await;

    cell.monitor.shutdown().await;
}
