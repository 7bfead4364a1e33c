//! Rank tables for backward search.
//!
//! `CountTable` answers "how many symbols in the transformed string are
//! smaller than `c`", `OccurrenceTable` answers "how many `c` are in its
//! first `k` positions". Both are dense arrays indexed by alphabet rank.

use std::time::Instant;

use anyhow::{anyhow, Result};
use rayon::prelude::*;

use crate::alphabet::Alphabet;
use crate::transform::Bwt;
use crate::util::par_bincount;

/// Cumulative smaller-symbol counts. `C[r]` is the number of positions whose
/// symbol has rank below `r`; the extra last entry is the total length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountTable {
    cumulative: Vec<u64>,
}

impl CountTable {
    pub fn from_frequencies(frequencies: &[u64]) -> Self {
        let mut cumulative = Vec::with_capacity(frequencies.len() + 1);
        let mut total = 0;
        for &freq in frequencies {
            cumulative.push(total);
            total += freq;
        }
        cumulative.push(total);
        CountTable { cumulative }
    }

    /// Number of symbols strictly smaller than the symbol of rank `rank`.
    #[inline]
    pub fn get(&self, rank: usize) -> u64 {
        self.cumulative[rank]
    }

    /// Number of occurrences of the symbol of rank `rank`.
    #[inline]
    pub fn frequency(&self, rank: usize) -> u64 {
        self.cumulative[rank + 1] - self.cumulative[rank]
    }

    /// Number of ranks covered.
    pub fn sigma(&self) -> usize {
        self.cumulative.len() - 1
    }

    /// Length of the transformed string.
    pub fn total(&self) -> u64 {
        self.cumulative[self.sigma()]
    }
}

/// Full prefix-count table, one row of `n + 1` running counts per rank.
///
/// Trades `O(sigma * n)` memory for `O(1)` lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccurrenceTable {
    /// Row-major, `sigma` rows of `width` entries.
    data: Vec<u64>,
    width: usize,
}

impl OccurrenceTable {
    /// Builds the table from a rank-encoded transformed string.
    pub fn build(ranks: &[u8], sigma: usize) -> Result<Self> {
        let width = ranks.len() + 1;
        let size = sigma
            .checked_mul(width)
            .ok_or_else(|| anyhow!("occurrence table of {} x {} overflows", sigma, width))?;

        let mut data = Vec::new();
        data.try_reserve_exact(size)?;
        data.resize(size, 0);

        data.par_chunks_mut(width)
            .enumerate()
            .for_each(|(rank, row)| {
                let rank = rank as u8;
                let mut count = 0;
                for (k, &r) in ranks.iter().enumerate() {
                    if r == rank {
                        count += 1;
                    }
                    row[k + 1] = count;
                }
            });

        Ok(OccurrenceTable { data, width })
    }

    /// Occurrences of the symbol of rank `rank` in the first `k` positions.
    #[inline]
    pub fn get(&self, rank: usize, k: usize) -> u64 {
        self.data[rank * self.width + k]
    }

    /// The running counts for one rank, `n + 1` entries starting at 0.
    pub fn row(&self, rank: usize) -> &[u64] {
        &self.data[rank * self.width..(rank + 1) * self.width]
    }

    pub fn sigma(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    /// Length of the transformed string the table was built over.
    pub fn text_len(&self) -> usize {
        self.width.saturating_sub(1)
    }
}

/// Builds both rank tables over `bwt`. Runs once per index.
pub fn build_tables(bwt: &Bwt, alphabet: &Alphabet) -> Result<(CountTable, OccurrenceTable)> {
    let start = Instant::now();
    let ranks = alphabet.encode(bwt);
    let sigma = alphabet.len();

    let counts = CountTable::from_frequencies(&par_bincount(&ranks, sigma));
    let occ = OccurrenceTable::build(&ranks, sigma)?;

    log::info!(
        "built rank tables for {} symbols, sigma {}, in {:?}",
        ranks.len(),
        sigma,
        start.elapsed()
    );
    Ok((counts, occ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform;

    #[test]
    fn count_table_is_cumulative() {
        let bwt = transform(b"ACGTACGTACGT").unwrap();
        let alphabet = Alphabet::from_text(&bwt);
        let (counts, _) = build_tables(&bwt, &alphabet).unwrap();

        // ranks: $ A C G T
        assert_eq!(counts.sigma(), 5);
        assert_eq!(
            (0..5).map(|r| counts.get(r)).collect::<Vec<_>>(),
            vec![0, 1, 4, 7, 10]
        );
        assert_eq!(counts.frequency(0), 1);
        assert_eq!(counts.frequency(4), 3);
        assert_eq!(counts.total(), 13);
    }

    #[test]
    fn occurrence_rows_follow_recurrence() {
        let bwt = transform(b"mississippi").unwrap();
        let alphabet = Alphabet::from_text(&bwt);
        let (_, occ) = build_tables(&bwt, &alphabet).unwrap();

        assert_eq!(occ.sigma(), alphabet.len());
        assert_eq!(occ.text_len(), bwt.len());
        for rank in 0..alphabet.len() {
            let symbol = alphabet.symbol(rank);
            let row = occ.row(rank);
            assert_eq!(row[0], 0);
            for k in 0..bwt.len() {
                let step = u64::from(bwt[k] == symbol);
                assert_eq!(row[k + 1], row[k] + step);
            }
        }
    }

    #[test]
    fn sentinel_only() {
        let bwt = transform(b"").unwrap();
        let alphabet = Alphabet::from_text(&bwt);
        let (counts, occ) = build_tables(&bwt, &alphabet).unwrap();
        assert_eq!(counts.total(), 1);
        assert_eq!(occ.row(0), &[0, 1]);
    }
}
