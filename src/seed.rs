use serde::{Deserialize, Serialize};

use crate::index::FmIndex;

/// An exact match between a window of a query and the indexed text, to be
/// extended by a downstream aligner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Seed {
    pub query_pos: usize,
    pub text_pos: u64,
    pub len: usize,
}

/// Locates every `k`-length window of `query` in the index.
///
/// Seeds come out ordered by query position, then text position. No seeds
/// are produced when `k` is 0 or longer than the query.
pub fn find_seeds(index: &FmIndex, query: &[u8], k: usize) -> Vec<Seed> {
    if k == 0 || k > query.len() {
        return Vec::new();
    }
    query
        .windows(k)
        .enumerate()
        .flat_map(|(query_pos, kmer)| {
            index.locate(kmer).into_iter().map(move |text_pos| Seed {
                query_pos,
                text_pos,
                len: k,
            })
        })
        .collect()
}
