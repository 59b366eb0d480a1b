// vim: tw=80
//! OS-level operations on a disk: labels, filesystems and self-tests

use async_trait::async_trait;
#[cfg(test)] use mockall::automock;
use nix::sys::statvfs::statvfs;
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::{fs, task};

use crate::{
    disk::SmartInfo,
    types::*,
};

/// Everything the health monitor needs to do to a physical disk.
///
/// Each method takes the disk's device path.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DiskOps: Send + Sync + 'static {
    /// Is there a disk in the slot?
    async fn probe(&self, device: &Path) -> bool;

    /// Read the raw label.  `Ok(None)` means that the disk is blank.
    async fn read_label(&self, device: &Path) -> Result<Option<Vec<u8>>>;

    async fn write_label(&self, device: &Path, label: &[u8]) -> Result<()>;

    /// Destroy the label, leaving the disk blank
    async fn destroy_label(&self, device: &Path) -> Result<()>;

    /// Create a new, empty filesystem on the data partition
    async fn mkfs(&self, device: &Path) -> Result<()>;

    /// Mount the data partition, checking it first if `fsck` is set.
    async fn mount(&self, device: &Path, fsck: bool) -> Result<()>;

    async fn unmount(&self, device: &Path) -> Result<()>;

    /// Was the data partition cleanly unmounted last time?
    async fn is_clean(&self, device: &Path) -> bool;

    /// Record whether the data partition is cleanly unmounted
    async fn set_clean(&self, device: &Path, clean: bool) -> Result<()>;

    /// Write `buf` to a scratch area and read it back.
    async fn self_test(&self, device: &Path, buf: &[u8]) -> Result<()>;

    async fn smart(&self, device: &Path) -> Result<SmartInfo>;

    /// Fraction of the data partition in use
    async fn usage(&self, device: &Path) -> Result<f64>;
}

const LABEL_FILE: &str = "label";
const CLEAN_FILE: &str = "clean";
const DATA_DIR: &str = "data";
const MOUNTED_FILE: &str = "mounted";
const SELF_TEST_FILE: &str = "selftest";
const SMART_FILE: &str = "smart.yaml";

/// `DiskOps` backed by an ordinary directory per disk.
///
/// The directory holds the label, the clean-unmount marker, a `data`
/// directory standing in for the data partition, and optionally a
/// `smart.yaml` with sensor readings.  A missing directory is an empty slot.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileDiskOps;

impl FileDiskOps {
    fn file(device: &Path, name: &str) -> PathBuf {
        device.join(name)
    }

    async fn remove_if_exists(path: PathBuf) -> Result<()> {
        match fs::remove_file(&path).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            r => r.map_err(Error::from)
        }
    }

    async fn exists(path: PathBuf) -> bool {
        fs::metadata(path).await.is_ok()
    }
}

#[async_trait]
impl DiskOps for FileDiskOps {
    async fn probe(&self, device: &Path) -> bool {
        fs::metadata(device).await
            .map(|md| md.is_dir())
            .unwrap_or(false)
    }

    async fn read_label(&self, device: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(Self::file(device, LABEL_FILE)).await {
            Ok(buf) => Ok(Some(buf)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into())
        }
    }

    async fn write_label(&self, device: &Path, label: &[u8]) -> Result<()> {
        fs::write(Self::file(device, LABEL_FILE), label).await?;
        Ok(())
    }

    async fn destroy_label(&self, device: &Path) -> Result<()> {
        Self::remove_if_exists(Self::file(device, LABEL_FILE)).await
    }

    async fn mkfs(&self, device: &Path) -> Result<()> {
        let data = Self::file(device, DATA_DIR);
        match fs::remove_dir_all(&data).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(e.into());
            }
            _ => ()
        }
        fs::create_dir(&data).await?;
        Ok(())
    }

    async fn mount(&self, device: &Path, fsck: bool) -> Result<()> {
        let md = fs::metadata(Self::file(device, DATA_DIR)).await?;
        if fsck && !md.is_dir() {
            return Err(Error::Sys(nix::errno::Errno::EIO));
        }
        fs::write(Self::file(device, MOUNTED_FILE), b"").await?;
        Ok(())
    }

    async fn unmount(&self, device: &Path) -> Result<()> {
        Self::remove_if_exists(Self::file(device, MOUNTED_FILE)).await
    }

    async fn is_clean(&self, device: &Path) -> bool {
        Self::exists(Self::file(device, CLEAN_FILE)).await
    }

    async fn set_clean(&self, device: &Path, clean: bool) -> Result<()> {
        let path = Self::file(device, CLEAN_FILE);
        if clean {
            fs::write(path, b"").await?;
            Ok(())
        } else {
            Self::remove_if_exists(path).await
        }
    }

    async fn self_test(&self, device: &Path, buf: &[u8]) -> Result<()> {
        let path = Self::file(device, SELF_TEST_FILE);
        fs::write(&path, buf).await?;
        let readback = fs::read(&path).await?;
        fs::remove_file(&path).await?;
        if readback != buf {
            return Err(Error::Miscompare);
        }
        Ok(())
    }

    async fn smart(&self, device: &Path) -> Result<SmartInfo> {
        match fs::read(Self::file(device, SMART_FILE)).await {
            Ok(buf) => serde_yaml_ng::from_slice(&buf)
                .map_err(|e| Error::InvalidConfig(e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Ok(SmartInfo::default())
            },
            Err(e) => Err(e.into())
        }
    }

    async fn usage(&self, device: &Path) -> Result<f64> {
        let path = device.to_owned();
        let sv = task::spawn_blocking(move || statvfs(&path))
            .await
            .map_err(|e| Error::Unavailable(e.to_string()))??;
        let blocks = sv.blocks() as f64;
        if blocks == 0.0 {
            return Ok(0.0);
        }
        Ok(1.0 - sv.blocks_available() as f64 / blocks)
    }
}

// LCOV_EXCL_STOP
