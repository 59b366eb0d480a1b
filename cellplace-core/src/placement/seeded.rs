// vim: tw=80
//! A seed-driven map generator
//!
//! Each map id seeds a PRNG that shuffles the nodes.  Cells are then assigned
//! by walking the shuffled nodes with a stride of `FRAGS_PER_OBJ`, which is
//! coprime with `NODES_PER_CELL`, so every row and every column touches
//! distinct nodes.

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_xorshift::XorShiftRng;
use super::*;

/// Shuffled node position used by each row of the spare column.
///
/// The fragment columns leave exactly one free disk on each of the positions
/// 8 to 15.  Each row gets one that its fragment columns don't already touch.
const SPARE_NODES: [u8; MAP_ROWS] = [12, 15, 10, 14, 9, 11, 8, 13];

/// Builds each map from a node permutation seeded by the map id.
#[derive(Clone, Copy, Debug, Default)]
pub struct Seeded;

impl MapGenerator for Seeded {
    fn block(&self, map_id: u32) -> Block {
        let mut rng = XorShiftRng::seed_from_u64(u64::from(map_id));
        let mut nodes: Vec<u8> = (0..NODES_PER_CELL as u8).collect();
        nodes.shuffle(&mut rng);
        let delta = rng.gen_range(0..DISKS_PER_NODE);
        let mut block = Block::default();
        for (r, row) in block.iter_mut().enumerate() {
            for (c, e) in row.iter_mut().enumerate() {
                let k = if c == SPARE_COLUMN {
                    (DISKS_PER_NODE - 1) * NODES_PER_CELL +
                        usize::from(SPARE_NODES[r])
                } else {
                    c + FRAGS_PER_OBJ * r
                };
                let node = nodes[k % NODES_PER_CELL];
                let disk = ((k / NODES_PER_CELL + delta) % DISKS_PER_NODE) as u8;
                *e = MapEntry::new(node, disk);
            }
        }
        block
    }
}

// LCOV_EXCL_STOP
