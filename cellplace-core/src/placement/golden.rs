// vim: tw=80
//! The golden-seed map generator
//!
//! The seed library is the five parallel classes of the affine plane AG(2,4).
//! Node `n` is the point `(n / 4, n % 4)` over GF(4).  Each seed is a 4x4 grid
//! whose columns are the four parallel lines of one class, so across the whole
//! library every pair of distinct nodes shares exactly one seed column.  That
//! spreads the recovery reads for a failed node evenly over all of its
//! partners.

use crate::permute::{arrangement, compose, rotation, row_shuffle};
use super::*;

const SEED_ROWS: usize = 4;
const SEED_COLUMNS: usize = 4;
const NSEEDS: usize = 5;

/// The seed library.  `SEEDS[s][c]` is column `c` of seed `s`.
pub(super) const SEEDS: [[[u8; SEED_ROWS]; SEED_COLUMNS]; NSEEDS] = [
    [[0, 1, 2, 3], [4, 5, 6, 7], [8, 9, 10, 11], [12, 13, 14, 15]],
    [[0, 4, 8, 12], [1, 5, 9, 13], [2, 6, 10, 14], [3, 7, 11, 15]],
    [[0, 5, 10, 15], [1, 4, 11, 14], [2, 7, 8, 13], [3, 6, 9, 12]],
    [[0, 6, 11, 13], [1, 7, 10, 12], [2, 4, 9, 15], [3, 5, 8, 14]],
    [[0, 7, 9, 14], [1, 6, 8, 15], [2, 5, 11, 12], [3, 4, 10, 13]],
];

/// Per-node disk offsets.  A different row is used every 4 maps so that
/// disk 0 of each node isn't always the first choice.
const DISK_ROTATIONS: [[u8; NODES_PER_CELL]; DISKS_PER_NODE] = [
    [0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3],
    [0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3],
    [0, 1, 2, 3, 1, 2, 3, 0, 2, 3, 0, 1, 3, 0, 1, 2],
    [0, 1, 2, 3, 3, 0, 1, 2, 2, 3, 0, 1, 1, 2, 3, 0],
];

/// A seed doubled to `MAP_ROWS` x `MAP_COLUMNS` nodes, indexed `[row][col]`
type Doubled = [[u8; MAP_COLUMNS]; MAP_ROWS];

/// Double a seed into an 8x8 block of nodes.
///
/// The top-left and bottom-right quadrants are the seed itself.  The other two
/// are the seed mirrored vertically, with its columns offset by 2.  That keeps
/// every row and every column free of repeated nodes.
fn double(seed: &[[u8; SEED_ROWS]; SEED_COLUMNS]) -> Doubled {
    let mut out = [[0; MAP_COLUMNS]; MAP_ROWS];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, node) in row.iter_mut().enumerate() {
            let (rr, cc) = (r % SEED_ROWS, c % SEED_COLUMNS);
            *node = if quadrant(r, c) % 3 == 0 {
                seed[cc][rr]
            } else {
                seed[(cc + 2) % SEED_COLUMNS][SEED_ROWS - 1 - rr]
            };
        }
    }
    out
}

/// Quadrant of a doubled block: 0 TL, 1 TR, 2 BL, 3 BR
fn quadrant(r: usize, c: usize) -> usize {
    2 * (r / SEED_ROWS) + c / SEED_COLUMNS
}

/// Builds maps from the golden seed library.
#[derive(Clone, Debug)]
pub struct GoldenSeed {
    doubled: [Doubled; NSEEDS],
}

impl Default for GoldenSeed {
    fn default() -> Self {
        GoldenSeed {
            doubled: SEEDS.map(|s| double(&s))
        }
    }
}

impl MapGenerator for GoldenSeed {
    fn block(&self, map_id: u32) -> Block {
        let nodes = &self.doubled[map_id as usize % NSEEDS];
        let rotations = &DISK_ROTATIONS[(map_id as usize / 4) % DISKS_PER_NODE];
        let rows = row_shuffle(MAP_ROWS, (map_id / ROW_SHUFFLE_PERIOD) as usize);
        let cols = compose(
            &rotation(MAP_COLUMNS, (map_id as usize / NSEEDS) % FRAGS_PER_OBJ),
            &arrangement(MAP_COLUMNS, u64::from(map_id / COLUMN_SHUFFLE_PERIOD))
        );
        let mut block = Block::default();
        for (r, row) in block.iter_mut().enumerate() {
            for (c, e) in row.iter_mut().enumerate() {
                let (sr, sc) = (rows[r], cols[c]);
                let node = nodes[sr][sc];
                let q = quadrant(sr, sc) as u8;
                let disk = (q + rotations[usize::from(node)]) %
                    DISKS_PER_NODE as u8;
                *e = MapEntry::new(node, disk);
            }
        }
        block
    }
}

// LCOV_EXCL_STOP
