// vim: tw=80
//! Placement and fault-tolerance core of a cellplace storage cell.
//!
//! Decides which disks of a cell hold each fragment of an object, and tracks
//! which of those disks are healthy enough to use.

// I don't find this lint very helpful
#![allow(clippy::type_complexity)]

// I use a common pattern to substitute mock objects for real ones in test
// builds.  Silence clippy's complaints.
#![allow(clippy::module_inception)]

pub mod collaborator;
pub mod config;
pub mod disk;
pub mod disk_ops;
pub mod grace;
pub mod kmsg;
pub mod label;
pub mod layout;
pub mod mask;
pub mod monitor;
pub mod permute;
pub mod placement;
pub mod published;
pub mod quorum;
pub mod types;

pub use crate::types::*;
