use std::str::FromStr;
use std::time::Instant;

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How the rotations of a text are put in lexicographic order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum SortStrategy {
    /// Compare whole rotations against each other. `O(n^2 log n)` in the worst
    /// case; kept as the reference ordering.
    Naive,
    /// Cyclic prefix doubling in `O(n log^2 n)`.
    #[default]
    PrefixDoubling,
}

impl SortStrategy {
    /// Sorts the rotations of `text`, which must end in a unique smallest symbol.
    pub fn sort(self, text: &[u8]) -> Result<Vec<u64>> {
        let start = Instant::now();
        let table = match self {
            SortStrategy::Naive => naive(text)?,
            SortStrategy::PrefixDoubling => prefix_doubling(text)?,
        };
        log::debug!(
            "sorted {} rotations ({:?}) in {:?}",
            text.len(),
            self,
            start.elapsed()
        );
        Ok(table)
    }
}

impl FromStr for SortStrategy {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "naive" => Ok(Self::Naive),
            "doubling" | "prefix-doubling" => Ok(Self::PrefixDoubling),
            _ => Err("Invalid sort strategy"),
        }
    }
}

/// The cyclic shift of `text` starting at `i`, without materializing it.
#[inline]
fn rotation(text: &[u8], i: usize) -> impl Iterator<Item = &u8> {
    text[i..].iter().chain(&text[..i])
}

/// Sorts rotation start offsets by comparing full rotations.
///
/// Rayon's implementation falls back to a sequential algorithm for
/// sufficiently small inputs, so there's no parallelism overhead to worry
/// about here.
pub fn naive(text: &[u8]) -> Result<Vec<u64>> {
    let mut table = identity(text.len())?;
    table.par_sort_unstable_by(|&a, &b| {
        rotation(text, a as usize).cmp(rotation(text, b as usize))
    });
    Ok(table)
}

/// `0..n` as a table of offsets, reporting allocation failure instead of aborting.
fn identity(n: usize) -> Result<Vec<u64>> {
    let mut table = Vec::new();
    table.try_reserve_exact(n)?;
    table.extend(0..n as u64);
    Ok(table)
}

/// Sorts rotation start offsets by prefix doubling.
///
/// After the round for step `k`, `rank[i]` orders the rotations by their
/// first `2k` symbols. Once every rank is distinct the order is final, which
/// happens by the time `2k` reaches the length of the sentinel-terminated text.
pub fn prefix_doubling(text: &[u8]) -> Result<Vec<u64>> {
    let n = text.len();
    let mut table = identity(n)?;
    if n <= 1 {
        return Ok(table);
    }
    debug_assert!(
        text[..n - 1].iter().all(|&c| c > text[n - 1]),
        "text must end in a unique smallest symbol"
    );

    let mut rank = Vec::new();
    rank.try_reserve_exact(n)?;
    rank.extend(text.iter().map(|&c| c as u64));
    let mut next = Vec::new();
    next.try_reserve_exact(n)?;
    next.resize(n, 0u64);
    let mut k = 1;

    while k < n {
        let key = |i: u64| {
            let i = i as usize;
            (rank[i], rank[(i + k) % n])
        };
        table.par_sort_unstable_by_key(|&i| key(i));

        next[table[0] as usize] = 0;
        for pair in table.windows(2) {
            let bump = u64::from(key(pair[0]) != key(pair[1]));
            next[pair[1] as usize] = next[pair[0] as usize] + bump;
        }
        std::mem::swap(&mut rank, &mut next);

        let distinct = rank[table[n - 1] as usize] + 1;
        log::debug!("prefix doubling k={}: {} distinct ranks", k, distinct);
        if distinct as usize == n {
            break;
        }

        k *= 2;
    }

    Ok(table)
}

/// Checks that `table` lists the rotations of `text` in strictly increasing
/// order. This is always true for a table built from a sentinel-terminated text.
pub fn is_sorted(text: &[u8], table: &[u64]) -> bool {
    table.len() == text.len()
        && table.par_windows(2).all(|pair| {
            rotation(text, pair[0] as usize).lt(rotation(text, pair[1] as usize))
        })
}
