use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// Essentially np.bincount(data, minlength=bins) in parallel, for rank-encoded symbols.
pub fn par_bincount(data: &[u8], bins: usize) -> Vec<u64> {
    let counts: Vec<AtomicU64> = (0..bins).map(|_| AtomicU64::new(0)).collect();

    // Increment the counters in parallel
    data.par_iter().for_each(|&x| {
        counts[x as usize].fetch_add(1, Ordering::Relaxed);
    });
    counts.into_iter().map(|c| c.into_inner()).collect()
}

/// Every start offset at which `needle` occurs in `haystack`, overlapping
/// matches included. The empty needle matches at every offset `0..=len`.
pub fn naive_positions(haystack: &[u8], needle: &[u8]) -> Vec<u64> {
    if needle.len() > haystack.len() {
        return Vec::new();
    }
    (0..=haystack.len() - needle.len())
        .filter(|&i| &haystack[i..i + needle.len()] == needle)
        .map(|i| i as u64)
        .collect()
}
