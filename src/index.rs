use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use bincode::{deserialize, serialize};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::rank_tables::{build_tables, CountTable, OccurrenceTable};
use crate::suffix_order::SortStrategy;
use crate::transform::{invert, transform_parts, Bwt};

/// Options for building an index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildOptions {
    pub strategy: SortStrategy,
}

/// Inclusive range of sorted-rotation rows whose suffixes start with the part
/// of the pattern consumed so far. `top > bottom` means no match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchRange {
    pub top: usize,
    pub bottom: usize,
}

impl SearchRange {
    /// The canonical "not found" range.
    pub const EMPTY: SearchRange = SearchRange { top: 1, bottom: 0 };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top > self.bottom
    }

    /// Number of rows in the range.
    #[inline]
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.bottom - self.top + 1
        }
    }
}

/// The result of a combined count and locate query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub pattern: String,
    pub count: usize,
    pub positions: Vec<u64>,
}

/// An FM-index over a single text.
///
/// Built once, queried any number of times. All query methods take `&self`
/// and the index is `Sync`, so it can be shared across threads freely.
#[derive(Clone, PartialEq, Eq)]
pub struct FmIndex {
    alphabet: Alphabet,
    bwt: Bwt,
    counts: CountTable,
    occ: OccurrenceTable,
    /// Row -> starting offset of the rotation in that row. Computed once
    /// during construction and reused by every `locate`.
    suffix_order: Vec<u64>,
}

impl FmIndex {
    /// Builds an index over `text` with the default options.
    ///
    /// # Example
    ///
    /// ```
    /// use fmindex::FmIndex;
    ///
    /// let index = FmIndex::build(b"ACGTACGTACGT").unwrap();
    /// assert_eq!(index.count(b"ACG"), 3);
    /// assert_eq!(index.locate(b"CGT"), vec![1, 5, 9]);
    /// assert_eq!(index.count(b"XYZ"), 0);
    /// ```
    pub fn build(text: &[u8]) -> Result<Self> {
        Self::build_with(text, &BuildOptions::default())
    }

    /// Builds an index over `text`.
    ///
    /// Fails if `text` contains the sentinel anywhere but its last byte, or if
    /// the tables cannot be allocated. No partial index is ever returned.
    pub fn build_with(text: &[u8], options: &BuildOptions) -> Result<Self> {
        let start = Instant::now();
        let parts = transform_parts(text, options.strategy)?;
        let (counts, occ) = build_tables(&parts.bwt, &parts.alphabet)?;

        log::info!("index over {} symbols ready in {:?}", parts.bwt.len(), start.elapsed());
        Ok(FmIndex {
            alphabet: parts.alphabet,
            bwt: parts.bwt,
            counts,
            occ,
            suffix_order: parts.suffix_order,
        })
    }

    /// Number of rows, i.e. the text length including the sentinel.
    #[inline]
    pub fn len(&self) -> usize {
        self.bwt.len()
    }

    /// Never true for a built index: the sentinel is always indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the indexed text, sentinel excluded.
    pub fn text_len(&self) -> usize {
        self.len() - 1
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn bwt(&self) -> &Bwt {
        &self.bwt
    }

    pub fn count_table(&self) -> &CountTable {
        &self.counts
    }

    pub fn occurrence_table(&self) -> &OccurrenceTable {
        &self.occ
    }

    pub fn suffix_order(&self) -> &[u64] {
        &self.suffix_order
    }

    /// One LF step: narrows `range` to the rows whose rotations start with
    /// `symbol` followed by what `range` already matched.
    #[inline]
    fn extend(&self, range: SearchRange, symbol: u8) -> SearchRange {
        let rank = match self.alphabet.rank(symbol) {
            Some(rank) => rank,
            None => return SearchRange::EMPTY,
        };
        let c = self.counts.get(rank);
        let top = c + self.occ.get(rank, range.top);
        let end = c + self.occ.get(rank, range.bottom + 1);

        // `end` is one past the new bottom; it equals `top` when nothing matched.
        if end <= top {
            SearchRange::EMPTY
        } else {
            SearchRange {
                top: top as usize,
                bottom: end as usize - 1,
            }
        }
    }

    /// Backward search: the rows of all rotations starting with `pattern`.
    ///
    /// The empty pattern matches every row.
    pub fn search_range(&self, pattern: &[u8]) -> SearchRange {
        let mut range = SearchRange {
            top: 0,
            bottom: self.len() - 1,
        };
        for &symbol in pattern.iter().rev() {
            range = self.extend(range, symbol);
            if range.is_empty() {
                return SearchRange::EMPTY;
            }
        }
        range
    }

    /// The search range before any symbol is consumed and after each symbol,
    /// right to left. Stops after the first empty range.
    pub fn trace(&self, pattern: &[u8]) -> Vec<SearchRange> {
        let mut range = SearchRange {
            top: 0,
            bottom: self.len() - 1,
        };
        let mut steps = Vec::with_capacity(pattern.len() + 1);
        steps.push(range);
        for &symbol in pattern.iter().rev() {
            range = self.extend(range, symbol);
            steps.push(range);
            if range.is_empty() {
                break;
            }
        }
        steps
    }

    /// Number of occurrences of `pattern` in the text, in `O(pattern.len())`.
    ///
    /// The empty pattern occurs at every offset `0..=text_len()`.
    pub fn count(&self, pattern: &[u8]) -> usize {
        self.search_range(pattern).len()
    }

    /// Returns true iff `pattern` occurs in the text.
    pub fn contains(&self, pattern: &[u8]) -> bool {
        !self.search_range(pattern).is_empty()
    }

    /// Strictly ascending start offsets of every occurrence of `pattern`.
    pub fn locate(&self, pattern: &[u8]) -> Vec<u64> {
        self.positions(self.search_range(pattern))
    }

    /// Text offsets of the rows in `range`, ascending.
    fn positions(&self, range: SearchRange) -> Vec<u64> {
        if range.is_empty() {
            return Vec::new();
        }
        let mut positions = self.suffix_order[range.top..=range.bottom].to_vec();
        positions.sort_unstable();
        positions
    }

    /// Count and locate in one call. Positions are only resolved when the
    /// pattern occurs.
    pub fn search(&self, pattern: &[u8]) -> SearchHit {
        let range = self.search_range(pattern);
        SearchHit {
            pattern: String::from_utf8_lossy(pattern).into_owned(),
            count: range.len(),
            positions: self.positions(range),
        }
    }

    /// Counts every query in parallel.
    pub fn batch_count(&self, queries: &[Vec<u8>]) -> Vec<usize> {
        queries
            .into_par_iter()
            .map(|query| self.count(query))
            .collect()
    }

    /// Locates every query in parallel.
    pub fn batch_locate(&self, queries: &[Vec<u8>]) -> Vec<Vec<u64>> {
        queries
            .into_par_iter()
            .map(|query| self.locate(query))
            .collect()
    }

    /// The indexed text, recovered from the transformed string alone.
    pub fn reconstruct(&self) -> Vec<u8> {
        let mut text = invert(&self.bwt);
        text.pop();
        text
    }

    /// Writes the transformed string and suffix order. The rank tables are
    /// derived data and are rebuilt on load.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = serialize(&StoredIndexRef {
            bwt: &self.bwt,
            suffix_order: &self.suffix_order,
        })?;
        fs::write(path, bytes).with_context(|| format!("writing index to {}", path.display()))?;
        log::info!("saved index to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("reading index from {}", path.display()))?;
        let stored: StoredIndex = deserialize(&bytes)
            .with_context(|| format!("decoding index from {}", path.display()))?;
        let index = Self::from_parts(Bwt::from_bytes(stored.bwt)?, stored.suffix_order)
            .with_context(|| format!("malformed index in {}", path.display()))?;
        log::info!("loaded index over {} symbols from {}", index.len(), path.display());
        Ok(index)
    }

    /// Reassembles an index from a transformed string and its suffix order,
    /// rebuilding the rank tables.
    ///
    /// Fails unless `suffix_order` is a permutation of the rows that agrees
    /// with `bwt` under LF-mapping: the row reached from `row` by one LF step
    /// must start one text offset earlier.
    pub fn from_parts(bwt: Bwt, suffix_order: Vec<u64>) -> Result<Self> {
        let n = bwt.len();
        if suffix_order.len() != n {
            bail!("suffix order has {} rows, transform has {}", suffix_order.len(), n);
        }
        if suffix_order[0] as usize != n - 1 {
            bail!("row 0 must hold the sentinel rotation");
        }
        let mut seen = vec![false; n];
        for &start in &suffix_order {
            match seen.get_mut(start as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => bail!("suffix order is not a permutation of 0..{}", n),
            }
        }

        let alphabet = Alphabet::from_text(&bwt);
        let (counts, occ) = build_tables(&bwt, &alphabet)?;
        for (row, &symbol) in bwt.iter().enumerate() {
            let rank = alphabet.rank(symbol).unwrap_or_default();
            let lf = (counts.get(rank) + occ.get(rank, row)) as usize;
            let prev = (suffix_order[row] as usize + n - 1) % n;
            if suffix_order[lf] as usize != prev {
                bail!("suffix order disagrees with transform at row {}", row);
            }
        }

        Ok(FmIndex {
            alphabet,
            bwt,
            counts,
            occ,
            suffix_order,
        })
    }
}

/// On-disk layout written by `save`.
#[derive(Serialize)]
struct StoredIndexRef<'a> {
    bwt: &'a Bwt,
    suffix_order: &'a [u64],
}

/// On-disk layout read by `load`, validated before use.
#[derive(Deserialize)]
struct StoredIndex {
    bwt: Vec<u8>,
    suffix_order: Vec<u64>,
}

impl fmt::Debug for FmIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\n-----------------------------------------")?;
        writeln!(f, "FM INDEX ({} rows, {} symbols)", self.len(), self.alphabet.len())?;
        for (row, &start) in self.suffix_order.iter().enumerate() {
            writeln!(f, "row[{}] {} {}", row, start, self.bwt[row] as char)?;
        }
        writeln!(f, "-----------------------------------------")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(text: &str) -> FmIndex {
        FmIndex::build(text.as_bytes()).unwrap()
    }

    #[test]
    fn acgt_scenario() {
        let fm = index("ACGTACGTACGT");
        assert_eq!(fm.count(b"ACG"), 3);
        assert_eq!(fm.locate(b"ACG"), vec![0, 4, 8]);
        assert_eq!(fm.count(b"CGT"), 3);
        assert_eq!(fm.locate(b"CGT"), vec![1, 5, 9]);
        assert_eq!(fm.count(b"TAC"), 2);
        assert_eq!(fm.count(b"XYZ"), 0);
        assert!(fm.locate(b"XYZ").is_empty());
    }

    #[test]
    fn overlapping_occurrences() {
        let fm = index("AAAA");
        assert_eq!(fm.count(b"AA"), 3);
        assert_eq!(fm.locate(b"AA"), vec![0, 1, 2]);
    }

    #[test]
    fn empty_pattern_matches_every_offset() {
        let fm = index("hello");
        assert_eq!(fm.count(b""), 6);
        assert_eq!(fm.locate(b""), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn sentinel_only_index() {
        let fm = index("");
        assert_eq!(fm.len(), 1);
        assert_eq!(fm.text_len(), 0);
        assert_eq!(fm.count(b""), 1);
        assert_eq!(fm.count(b"A"), 0);
        assert!(fm.locate(b"A").is_empty());
        assert_eq!(fm.reconstruct(), b"");
    }

    #[test]
    fn absent_symbol_stops_early() {
        let fm = index("ACGTACGTACGT");
        // 'N' is consumed first and is not in the alphabet
        assert_eq!(fm.trace(b"ACN").len(), 2);
        assert!(fm.trace(b"ACN")[1].is_empty());
    }

    #[test]
    fn trace_is_monotone() {
        let fm = index("mississippi");
        let steps = fm.trace(b"ssi");
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].len(), 12);
        for pair in steps.windows(2) {
            assert!(pair[1].len() <= pair[0].len());
        }
        assert_eq!(steps[3].len(), 2);
    }

    #[test]
    fn sentinel_in_pattern() {
        let fm = index("ACGT");
        assert_eq!(fm.count(b"T$"), 1);
        assert_eq!(fm.locate(b"$"), vec![4]);
    }

    #[test]
    fn search_hit() {
        let fm = index("ACGTACGTACGT");
        let hit = fm.search(b"CGT");
        assert_eq!(hit.count, 3);
        assert_eq!(hit.positions, vec![1, 5, 9]);
        assert_eq!(hit.pattern, "CGT");
        assert!(fm.search(b"GGG").positions.is_empty());
    }

    #[test]
    fn batch_matches_sequential() {
        let fm = index("the quick brown fox jumps over the lazy dog");
        let queries: Vec<Vec<u8>> = ["the", "o", "fox", "cat", ""]
            .iter()
            .map(|q| q.as_bytes().to_vec())
            .collect();
        let counts = fm.batch_count(&queries);
        let positions = fm.batch_locate(&queries);
        for (i, query) in queries.iter().enumerate() {
            assert_eq!(counts[i], fm.count(query));
            assert_eq!(positions[i], fm.locate(query));
        }
    }

    #[test]
    fn strategies_build_same_index() {
        let text = b"tgtgtgtgcaccg";
        let options = BuildOptions {
            strategy: SortStrategy::Naive,
        };
        let naive = FmIndex::build_with(text, &options).unwrap();
        let doubling = FmIndex::build(text).unwrap();
        assert_eq!(naive, doubling);
    }

    #[test]
    fn reconstruct_text() {
        let fm = index("GATTACA");
        assert_eq!(fm.reconstruct(), b"GATTACA");
    }

    #[test]
    fn from_parts_round_trip() {
        let fm = index("ACGTACGTACGT");
        let rebuilt = FmIndex::from_parts(fm.bwt().clone(), fm.suffix_order().to_vec()).unwrap();
        assert_eq!(rebuilt, fm);
    }

    #[test]
    fn from_parts_rejects_inconsistent_order() {
        let fm = index("ACGTACGTACGT");
        let bwt = fm.bwt().clone();

        let mut swapped = fm.suffix_order().to_vec();
        swapped.swap(1, 2);
        assert!(FmIndex::from_parts(bwt.clone(), swapped).is_err());

        let mut duplicated = fm.suffix_order().to_vec();
        duplicated[5] = duplicated[6];
        assert!(FmIndex::from_parts(bwt.clone(), duplicated).is_err());

        let mut out_of_range = fm.suffix_order().to_vec();
        out_of_range[3] = 13;
        assert!(FmIndex::from_parts(bwt.clone(), out_of_range).is_err());

        let short = fm.suffix_order()[..12].to_vec();
        assert!(FmIndex::from_parts(bwt, short).is_err());
    }

    #[test]
    fn from_parts_rejects_mismatched_transform() {
        let fm = index("ACGTACGTACGT");
        // same symbol counts and one sentinel, but not the transform of this order
        let bwt = Bwt::from_bytes(b"TTT$AAACCCGGG".iter().rev().copied().collect()).unwrap();
        assert!(FmIndex::from_parts(bwt, fm.suffix_order().to_vec()).is_err());
    }
}
