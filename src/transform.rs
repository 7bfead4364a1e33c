//! Burrows-Wheeler transform and its inverse.
//!
//! The transform sorts every rotation of the sentinel-terminated text and
//! keeps the last column. It is reversible from the last column alone.

use std::fmt;
use std::ops::Deref;
use std::time::Instant;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::alphabet::{Alphabet, SENTINEL};
use crate::suffix_order::SortStrategy;

/// A transformed string: the last symbol of each rotation, in sorted
/// rotation order. Always holds exactly one sentinel.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Bwt(Vec<u8>);

impl Bwt {
    /// Wraps an externally produced transformed string after checking that it
    /// is non-empty and holds exactly one sentinel.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let sentinels = bytes.iter().filter(|&&b| b == SENTINEL).count();
        if sentinels != 1 {
            bail!(
                "transformed string must contain exactly one '{}' sentinel, found {}",
                SENTINEL as char,
                sentinels
            );
        }
        Ok(Bwt(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Bwt {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Bwt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Bwt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Bwt({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Everything the forward transform computes. The index keeps all of it; the
/// free `transform` function only hands back the transformed string.
pub(crate) struct Transformed {
    pub alphabet: Alphabet,
    pub bwt: Bwt,
    pub suffix_order: Vec<u64>,
}

/// Returns `text` with the sentinel appended, unless it already ends with one.
/// A sentinel anywhere else would break the uniqueness of rotations.
pub(crate) fn terminate(text: &[u8]) -> Result<Vec<u8>> {
    let body = match text.split_last() {
        Some((&SENTINEL, body)) => body,
        _ => text,
    };
    if let Some(pos) = body.iter().position(|&b| b == SENTINEL) {
        bail!(
            "text contains the sentinel '{}' at offset {}",
            SENTINEL as char,
            pos
        );
    }

    let mut terminated = Vec::new();
    terminated.try_reserve_exact(body.len() + 1)?;
    terminated.extend_from_slice(body);
    terminated.push(SENTINEL);
    Ok(terminated)
}

pub(crate) fn transform_parts(text: &[u8], strategy: SortStrategy) -> Result<Transformed> {
    let start = Instant::now();
    let text = terminate(text)?;
    let n = text.len();

    let alphabet = Alphabet::from_text(&text);
    let suffix_order = strategy.sort(&alphabet.encode(&text))?;
    debug_assert_eq!(suffix_order[0] as usize, n - 1);

    let mut bwt = Vec::new();
    bwt.try_reserve_exact(n)?;
    bwt.extend(
        suffix_order
            .iter()
            .map(|&i| text[(i as usize + n - 1) % n]),
    );

    log::info!(
        "transformed {} symbols over {} ranks in {:?}",
        n,
        alphabet.len(),
        start.elapsed()
    );
    Ok(Transformed {
        alphabet,
        bwt: Bwt(bwt),
        suffix_order,
    })
}

/// Burrows-Wheeler transform of `text` using the default sort strategy.
///
/// The sentinel is appended first unless `text` already ends with it.
///
/// ```
/// use fmindex::transform;
///
/// let bwt = transform(b"banana").unwrap();
/// assert_eq!(bwt.as_bytes(), b"annb$aa");
/// ```
pub fn transform(text: &[u8]) -> Result<Bwt> {
    transform_with(text, SortStrategy::default())
}

pub fn transform_with(text: &[u8], strategy: SortStrategy) -> Result<Bwt> {
    Ok(transform_parts(text, strategy)?.bwt)
}

/// Reconstructs the sentinel-terminated text from its transform.
///
/// A stable sort of the last column by symbol yields the first column; the
/// sorted pairs link each row to the row of the next text symbol. Walking
/// those links from row 0, which starts with the sentinel, spells out the
/// sentinel followed by the text.
pub fn invert(bwt: &Bwt) -> Vec<u8> {
    let n = bwt.len();
    let alphabet = Alphabet::from_text(bwt);
    let ranks = alphabet.encode(bwt);

    // first column: order[k] is the last-column row holding the k-th smallest symbol
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| ranks[i]);

    let mut text = Vec::with_capacity(n);
    let mut row = 0;
    for _ in 0..n {
        row = order[row];
        text.push(bwt[row]);
    }
    text.rotate_left(1);
    text
}
