// vim: tw=80
//! Small deterministic permutation generators used to build placement maps.
//!
//! A permutation `p` of length `n` is stored as a `Vec<usize>` where `p[i]` is
//! the source index that lands in position `i`.

use std::iter::FusedIterator;

/// Cyclic rotation of `0..n` by `k` places.
pub fn rotation(n: usize, k: usize) -> Vec<usize> {
    assert!(n > 0, "empty permutation");
    (0..n).map(|i| (i + k) % n).collect()
}

/// A perfect out-shuffle of `0..n`.
///
/// The first half is interleaved with the second half, with the top card
/// staying on top.
pub fn riffle(n: usize) -> Vec<usize> {
    assert!(n > 0, "empty permutation");
    let half = n.div_ceil(2);
    (0..n).map(|i| {
        if i % 2 == 0 {
            i / 2
        } else {
            half + i / 2
        }
    }).collect()
}

/// Apply `b` and then `a`.  `compose(a, b)[i] == b[a[i]]`.
pub fn compose(a: &[usize], b: &[usize]) -> Vec<usize> {
    assert_eq!(a.len(), b.len(), "permutation lengths differ");
    a.iter().map(|&i| b[i]).collect()
}

/// The inverse permutation
pub fn invert(p: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; p.len()];
    for (i, &x) in p.iter().enumerate() {
        inv[x] = i;
    }
    inv
}

fn factorial(n: usize) -> u64 {
    (1..=n as u64).product()
}

/// The `k`-th (mod `n!`) lexicographic permutation of `0..n`.
///
/// Computed directly with the factorial number system, so it doesn't need to
/// enumerate the preceding permutations.
pub fn arrangement(n: usize, k: u64) -> Vec<usize> {
    assert!(n > 0, "empty permutation");
    assert!(n <= 20, "{n}! overflows u64");
    let mut k = k % factorial(n);
    let mut pool: Vec<usize> = (0..n).collect();
    let mut p = Vec::with_capacity(n);
    for i in (0..n).rev() {
        let f = factorial(i);
        let digit = (k / f) as usize;
        k %= f;
        p.push(pool.remove(digit));
    }
    p
}

/// The row shuffle used for the `k`-th generation of maps: `riffle` applied
/// `k` times, then rotated by `k`.
pub fn row_shuffle(n: usize, k: usize) -> Vec<usize> {
    let r = riffle(n);
    let mut p: Vec<usize> = (0..n).collect();
    for _ in 0..k {
        p = compose(&p, &r);
    }
    compose(&rotation(n, k), &p)
}

/// Iterates over every permutation of `0..n` in lexicographic order.
#[derive(Clone, Debug)]
pub struct Arrangements {
    next: Option<Vec<usize>>
}

impl Arrangements {
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "empty permutation");
        Arrangements { next: Some((0..n).collect()) }
    }
}

impl Iterator for Arrangements {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let cur = self.next.take()?;
        let mut succ = cur.clone();
        // Find the longest non-increasing suffix
        let pivot = (1..succ.len()).rev().find(|&i| succ[i - 1] < succ[i]);
        if let Some(i) = pivot {
            let j = (i..succ.len()).rev()
                .find(|&j| succ[j] > succ[i - 1])
                .unwrap_or(i);
            succ.swap(i - 1, j);
            succ[i..].reverse();
            self.next = Some(succ);
        }
        Some(cur)
    }
}

impl FusedIterator for Arrangements {}

// LCOV_EXCL_STOP
