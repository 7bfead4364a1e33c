/// Terminator appended to every indexed text. It always takes rank 0, so it
/// sorts before every other symbol no matter its byte value.
pub const SENTINEL: u8 = b'$';

const ABSENT: u16 = u16::MAX;

/// Dense symbol ranks for the bytes occurring in an indexed text.
///
/// Rank 0 is the sentinel; the remaining symbols follow in ascending byte
/// order. Every per-symbol table in the index is a plain array indexed by
/// these ranks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
    /// byte -> rank, `ABSENT` for bytes that never occur. Always 256 entries.
    ranks: Vec<u16>,
    /// rank -> byte
    symbols: Vec<u8>,
}

impl Alphabet {
    /// Collects the alphabet of `text`. The sentinel is always included,
    /// whether or not `text` contains it.
    pub fn from_text(text: &[u8]) -> Self {
        let mut seen = [false; 256];
        for &b in text {
            seen[b as usize] = true;
        }
        seen[SENTINEL as usize] = true;

        let mut symbols = vec![SENTINEL];
        symbols.extend((0..=u8::MAX).filter(|&b| b != SENTINEL && seen[b as usize]));

        let mut ranks = vec![ABSENT; 256];
        for (rank, &b) in symbols.iter().enumerate() {
            ranks[b as usize] = rank as u16;
        }

        Alphabet { ranks, symbols }
    }

    /// Number of symbols, sentinel included.
    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Never true: the sentinel is always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Rank of `symbol`, or `None` if it does not occur in the indexed text.
    #[inline]
    pub fn rank(&self, symbol: u8) -> Option<usize> {
        match self.ranks[symbol as usize] {
            ABSENT => None,
            r => Some(r as usize),
        }
    }

    #[inline]
    pub fn symbol(&self, rank: usize) -> u8 {
        self.symbols[rank]
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Maps every byte of `text` to its rank. All bytes must be in the alphabet.
    pub(crate) fn encode(&self, text: &[u8]) -> Vec<u8> {
        text.iter()
            .map(|&b| self.ranks[b as usize] as u8)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_ranks_first() {
        // '!' has a smaller byte value than '$' but must still rank after it.
        let alphabet = Alphabet::from_text(b"a!b");
        assert_eq!(alphabet.symbols(), b"$!ab");
        assert_eq!(alphabet.rank(SENTINEL), Some(0));
        assert_eq!(alphabet.rank(b'!'), Some(1));
        assert_eq!(alphabet.rank(b'b'), Some(3));
    }

    #[test]
    fn absent_symbols() {
        let alphabet = Alphabet::from_text(b"ACGT");
        assert_eq!(alphabet.len(), 5);
        assert_eq!(alphabet.rank(b'X'), None);
        assert_eq!(alphabet.rank(b'a'), None);
    }

    #[test]
    fn sentinel_only() {
        let alphabet = Alphabet::from_text(b"");
        assert_eq!(alphabet.symbols(), b"$");
        assert_eq!(alphabet.rank(SENTINEL), Some(0));
    }

    #[test]
    fn encode_uses_ranks() {
        let alphabet = Alphabet::from_text(b"GATTACA$");
        assert_eq!(alphabet.encode(b"GATTACA$"), vec![3, 1, 4, 4, 1, 2, 1, 0]);
    }
}
