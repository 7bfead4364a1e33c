use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

/// File formats supported for flat sequence input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceFormat {
    Plain,
    Gzip,
}

impl SequenceFormat {
    /// Gzip for a `.gz` extension, plain otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("gz") => Self::Gzip,
            _ => Self::Plain,
        }
    }
}

impl FromStr for SequenceFormat {
    type Err = &'static str;

    fn from_str(fmt: &str) -> Result<Self, Self::Err> {
        match fmt {
            "plain" => Ok(Self::Plain),
            "gzip" => Ok(Self::Gzip),
            _ => Err("Invalid format"),
        }
    }
}

/// Reads every byte of `reader`, dropping ASCII whitespace so that
/// line-wrapped sequence files come back as one contiguous sequence.
pub fn read_sequence<R: Read>(reader: R) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    BufReader::new(reader).read_to_end(&mut raw)?;
    raw.retain(|b| !b.is_ascii_whitespace());
    Ok(raw)
}

/// Loads a flat sequence file. `format` defaults to detection by extension.
pub fn load_sequence<P: AsRef<Path>>(path: P, format: Option<SequenceFormat>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let format = format.unwrap_or_else(|| SequenceFormat::from_path(path));
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    let sequence = match format {
        SequenceFormat::Plain => read_sequence(file),
        SequenceFormat::Gzip => read_sequence(GzDecoder::new(file)),
    }
    .with_context(|| format!("reading {}", path.display()))?;

    log::debug!("loaded {} symbols from {}", sequence.len(), path.display());
    Ok(sequence)
}
