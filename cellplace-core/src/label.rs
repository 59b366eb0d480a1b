// vim: tw=80
//! On-disk labels

use byteorder::{BigEndian, ByteOrder};
use metrohash::MetroHash64;
use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use std::{hash::{Hash, Hasher}, io::{self, Seek, SeekFrom}};
use uuid::Uuid;

use crate::types::*;

/*
 * On-disk Label Format:
 *
 * Magic:       16 bytes
 * Checksum:    8 bytes     MetroHash64.  Covers all of Length and Contents.
 * Length:      8 bytes     Length of Contents in bytes
 * Contents:    variable    bincode-encoded DiskLabel
 */
/// The label magic is "cellplace disk\0\0"
const MAGIC: &[u8; MAGIC_LEN] = b"cellplace disk\0\0";
const MAGIC_LEN: usize = 16;
const CHECKSUM_LEN: usize = 8;
const LENGTH_LEN: usize = 8;
const HEADER_LEN: usize = MAGIC_LEN + CHECKSUM_LEN + LENGTH_LEN;

/// Reads structs back out of a label, in order
pub struct LabelReader {
    cursor: io::Cursor<Vec<u8>>
}

impl LabelReader {
    /// Read the next `T`
    pub fn deserialize<T>(&mut self) -> bincode::Result<T>
        where T: DeserializeOwned
    {
        bincode::deserialize_from(&mut self.cursor)
    }

    /// Check a raw label's magic, length and checksum, and position the
    /// reader at the start of its contents.
    pub fn new(buffer: Vec<u8>) -> Result<Self> {
        if buffer.len() < HEADER_LEN {
            return Err(Error::BadLabel);
        }
        if MAGIC[..] != buffer[0..MAGIC_LEN] {
            return Err(Error::BadLabel);
        }

        let checksum = BigEndian::read_u64(
            &buffer[MAGIC_LEN..MAGIC_LEN + CHECKSUM_LEN]);
        let length_start = MAGIC_LEN + CHECKSUM_LEN;
        let contents_len = BigEndian::read_u64(
            &buffer[length_start .. HEADER_LEN]);
        let contents_end = usize::try_from(contents_len).ok()
            .and_then(|l| l.checked_add(HEADER_LEN))
            .filter(|&end| end <= buffer.len())
            .ok_or(Error::BadLabel)?;
        let mut hasher = MetroHash64::new();
        contents_len.to_be().hash(&mut hasher);
        hasher.write(&buffer[HEADER_LEN..contents_end]);
        if checksum != hasher.finish() {
            return Err(Error::LabelChecksum);
        }

        let mut cursor = io::Cursor::new(buffer);
        cursor.seek(SeekFrom::Start(HEADER_LEN as u64))?;
        Ok(LabelReader { cursor })
    }
}

/// Accumulates structs to be encoded into a label
#[derive(Clone, Debug, Default)]
pub struct LabelWriter {
    buffers: Vec<Vec<u8>>,
}

impl LabelWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `T`.
    ///
    /// The order is LIFO: whatever is serialized last is read back first.
    pub fn serialize<T: serde::Serialize>(&mut self, t: &T) -> bincode::Result<()> {
        bincode::serialize(t).map(|v| self.buffers.push(v))
    }

    /// Consume the `LabelWriter` and return the complete label, header
    /// included.
    pub fn into_bytes(self) -> Vec<u8> {
        let contents = self.buffers.into_iter().rev().collect::<Vec<_>>();
        let contents_len: usize = contents.iter().map(Vec::len).sum();
        let mut hasher = MetroHash64::new();
        (contents_len as u64).to_be().hash(&mut hasher);
        for buf in contents.iter() {
            hasher.write(buf);
        }
        let mut label = vec![0u8; HEADER_LEN];
        label[..MAGIC_LEN].copy_from_slice(&MAGIC[..]);
        BigEndian::write_u64(&mut label[MAGIC_LEN..], hasher.finish());
        let length_start = MAGIC_LEN + CHECKSUM_LEN;
        BigEndian::write_u64(&mut label[length_start..], contents_len as u64);
        label.reserve(contents_len);
        for buf in contents {
            label.extend(buf);
        }
        label
    }
}

/// Persistent identity and state of one disk
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DiskLabel {
    pub uuid: Uuid,
    pub cell_id: u8,
    pub silo_id: u8,
    pub node_id: u16,
    pub disk_index: u8,
    /// The disk was administratively disabled, and must stay disabled across
    /// reboots.
    pub disabled: bool,
}

impl DiskLabel {
    /// A fresh label claiming `disk`'s slot
    pub fn new(disk: DiskId) -> Self {
        DiskLabel {
            uuid: Uuid::new_v4(),
            cell_id: disk.cell_id,
            silo_id: disk.silo_id,
            node_id: disk.node_id,
            disk_index: disk.disk_index,
            disabled: false,
        }
    }

    /// The slot that this label claims
    pub fn disk_id(&self) -> DiskId {
        DiskId {
            cell_id: self.cell_id,
            silo_id: self.silo_id,
            node_id: self.node_id,
            disk_index: self.disk_index
        }
    }

    /// Was this label written for `disk`'s slot?  If not, the disk is foreign.
    pub fn matches(&self, disk: &DiskId) -> bool {
        self.disk_id() == *disk
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut lw = LabelWriter::new();
        lw.serialize(self)?;
        Ok(lw.into_bytes())
    }

    pub fn decode(buf: Vec<u8>) -> Result<Self> {
        let mut lr = LabelReader::new(buf)?;
        Ok(lr.deserialize()?)
    }
}

// LCOV_EXCL_STOP
