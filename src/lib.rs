//! Burrows-Wheeler transform and FM-index for exact pattern search.
//!
//! Counting the occurrences of a pattern takes time proportional to the
//! pattern length, independent of the text length. Locating them costs one
//! extra lookup per occurrence.

pub mod alphabet;
pub mod index;
pub mod loader;
pub mod rank_tables;
pub mod seed;
pub mod suffix_order;
pub mod transform;
pub mod util;

pub use alphabet::{Alphabet, SENTINEL};
pub use index::{BuildOptions, FmIndex, SearchHit, SearchRange};
pub use loader::{load_sequence, SequenceFormat};
pub use seed::{find_seeds, Seed};
pub use suffix_order::SortStrategy;
pub use transform::{invert, transform, transform_with, Bwt};
