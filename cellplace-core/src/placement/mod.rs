// vim: tw=80
//! The placement map table
//!
//! For every map id, a grid of `MAP_ROWS` x `MAP_COLUMNS` candidate
//! `(node, disk)` slots.  Column `c < FRAGS_PER_OBJ` lists, in preference
//! order, the slots that may hold fragment `c` of an object stored with that
//! map id.  The last column is a spare column.  The table is built once and is
//! read-only afterwards.

use enum_dispatch::enum_dispatch;
use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Write},
    str::FromStr,
};
use crate::types::*;

mod golden;
mod seeded;

pub use self::golden::GoldenSeed;
pub use self::seeded::Seeded;

/// Node slots per cell
pub const NODES_PER_CELL: usize = 16;
/// Disk slots per node
pub const DISKS_PER_NODE: usize = 4;
/// Fragment columns in each layout
pub const FRAGS_PER_OBJ: usize = 7;
/// Candidate rows searched for each fragment column
pub const MAP_ROWS: usize = 8;
/// Columns of one generated block, including the spare column
pub const MAP_COLUMNS: usize = 8;
/// Rows beyond `MAP_ROWS` fold onto this column
pub const SPARE_COLUMN: usize = MAP_COLUMNS - 1;
/// Number of distinct map ids
pub const NUM_MAP_IDS: u32 = 10_000;
/// Highest per-node fragment tolerance tried by layout
pub const MAX_FRAGS_PER_NODE: usize = 3;
/// Number of maps generated between changes of the row shuffle
pub const ROW_SHUFFLE_PERIOD: u32 = 112;
/// Number of maps generated between changes of the column shuffle
pub const COLUMN_SHUFFLE_PERIOD: u32 = 896;

const CELLS_PER_MAP: usize = MAP_ROWS * MAP_COLUMNS;

/// One candidate slot: a node index and a disk index within that node.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MapEntry {
    pub node: u8,
    pub disk: u8,
}

impl MapEntry {
    pub const fn new(node: u8, disk: u8) -> Self {
        MapEntry { node, disk }
    }

    /// Encode into a single byte, node in the high bits.
    pub fn pack(self) -> u8 {
        debug_assert!(usize::from(self.node) < NODES_PER_CELL);
        debug_assert!(usize::from(self.disk) < DISKS_PER_NODE);
        (self.node << 2) | self.disk
    }

    pub fn unpack(b: u8) -> Self {
        MapEntry { node: b >> 2, disk: b & 0b11 }
    }

    /// Bit-vector index of this slot within a `DiskMask`
    pub fn index(self) -> usize {
        usize::from(self.node) * DISKS_PER_NODE + usize::from(self.disk)
    }
}

impl fmt::Display for MapEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(&format!("{:02}:{}", self.node, self.disk))
    }
}

/// One map's worth of entries, indexed `[row][column]`
pub type Block = [[MapEntry; MAP_COLUMNS]; MAP_ROWS];

/// Something that can generate the block for a given map id.
///
/// Implementations must be deterministic: the same map id always yields the
/// same block.
#[enum_dispatch]
pub trait MapGenerator {
    fn block(&self, map_id: u32) -> Block;
}

#[enum_dispatch(MapGenerator)]
#[derive(Clone, Debug)]
pub enum GeneratorImpl {
    GoldenSeed,
    Seeded,
}

/// Selects which `MapGenerator` builds the table
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStrategy {
    #[default]
    Golden,
    Seeded,
}

impl MapStrategy {
    fn generator(self) -> GeneratorImpl {
        match self {
            MapStrategy::Golden => GoldenSeed::default().into(),
            MapStrategy::Seeded => Seeded.into(),
        }
    }
}

impl FromStr for MapStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "golden" => Ok(MapStrategy::Golden),
            "seeded" => Ok(MapStrategy::Seeded),
            _ => Err(Error::InvalidConfig(format!("unknown map strategy {s:?}")))
        }
    }
}

/// The complete placement table for every map id.
pub struct PlacementMap {
    strategy: MapStrategy,
    /// Packed `MapEntry`s, `CELLS_PER_MAP` per map, row-major
    table: Box<[u8]>,
}

impl PlacementMap {
    pub fn new(strategy: MapStrategy) -> Self {
        let generator = strategy.generator();
        let mut table = Vec::with_capacity(NUM_MAP_IDS as usize *
                                           CELLS_PER_MAP);
        for map_id in 0..NUM_MAP_IDS {
            let block = generator.block(map_id);
            table.extend(block.iter().flatten().map(|e| e.pack()));
        }
        tracing::debug!(?strategy, bytes = table.len(), "built placement map");
        PlacementMap { strategy, table: table.into_boxed_slice() }
    }

    fn check_map_id(map_id: u32) -> Result<()> {
        if map_id >= NUM_MAP_IDS {
            Err(Error::MapIdOutOfRange(map_id))
        } else {
            Ok(())
        }
    }

    /// Look up the candidate slot at `(row, column)` of `map_id`.
    ///
    /// Rows at or beyond `MAP_ROWS` are spare rows; they fold onto the spare
    /// column.
    pub fn entry(&self, map_id: u32, row: usize, column: usize)
        -> Result<MapEntry>
    {
        Self::check_map_id(map_id)?;
        if column >= FRAGS_PER_OBJ {
            return Err(Error::ColumnOutOfRange(column));
        }
        let (row, column) = if row >= MAP_ROWS {
            ((row - MAP_ROWS) % MAP_ROWS, SPARE_COLUMN)
        } else {
            (row, column)
        };
        Ok(self.raw(map_id, row, column))
    }

    fn raw(&self, map_id: u32, row: usize, column: usize) -> MapEntry {
        let i = map_id as usize * CELLS_PER_MAP + row * MAP_COLUMNS + column;
        MapEntry::unpack(self.table[i])
    }

    /// The whole grid of one map, including the spare column
    pub fn block(&self, map_id: u32) -> Result<Block> {
        Self::check_map_id(map_id)?;
        let mut block = Block::default();
        for (r, row) in block.iter_mut().enumerate() {
            for (c, e) in row.iter_mut().enumerate() {
                *e = self.raw(map_id, r, c);
            }
        }
        Ok(block)
    }

    /// Render one map as text, one row per line.
    pub fn dump(&self, map_id: u32) -> Result<String> {
        let block = self.block(map_id)?;
        let mut s = String::new();
        let _ = write!(s, "map {map_id}");
        for c in 0..MAP_COLUMNS {
            if c == SPARE_COLUMN {
                let _ = write!(s, "  spare");
            } else {
                let _ = write!(s, "  frag{c}");
            }
        }
        s.push('\n');
        for (r, row) in block.iter().enumerate() {
            let _ = write!(s, "row {r:<4}");
            for e in row.iter() {
                let _ = write!(s, "  {e:>5}");
            }
            s.push('\n');
        }
        Ok(s)
    }

    pub fn strategy(&self) -> MapStrategy {
        self.strategy
    }
}

impl Default for PlacementMap {
    fn default() -> Self {
        PlacementMap::new(MapStrategy::default())
    }
}

impl fmt::Debug for PlacementMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PlacementMap")
            .field("strategy", &self.strategy)
            .finish()
    }
}

// LCOV_EXCL_STOP
