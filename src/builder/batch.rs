use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tracing::debug;

use super::{record_writer::RecordWriter, RecordSink};
use crate::{error::Result, format::DEFAULT_BLOCK_SIZE};

/// Batch encoder for diskmap files.
///
/// Entries may be added in any order and the same key may be added more than
/// once; the last value added for a key wins. Nothing touches the disk until
/// [`Builder::write_to`] or [`Builder::write_to_file`], which sort the working
/// set and write the whole file in one pass.
pub struct Builder {
    entries: HashMap<String, Vec<u8>>,
    block_size: usize,
}

impl Builder {
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Creates a builder that writes one index entry every `block_size` records.
    ///
    /// A block size of zero is reported as [`crate::Error::InvalidBlockSize`]
    /// when the file is written.
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            block_size,
        }
    }

    /// Stores `value` for `key`, replacing any earlier value.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Number of distinct keys added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the sorted entries, sentinel, footer and trailer to `output`.
    /// Returns the total number of bytes written.
    pub fn write_to<W: Write>(&self, output: W) -> Result<u64> {
        let mut writer = RecordWriter::new(output, self.block_size)?;

        for (key, value) in self.sorted_entries() {
            writer.push(key, value)?;
        }

        writer.finish()
    }

    /// Creates (or truncates) the file at `path` and writes the map to it.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let path = path.as_ref();
        let file = File::create(path)?;

        let written = self.write_to(BufWriter::new(file))?;
        debug!(path = %path.display(), bytes = written, "wrote diskmap");

        Ok(written)
    }

    fn sorted_entries(&self) -> Vec<(&str, &[u8])> {
        let mut sorted: Vec<_> = self
            .entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_slice()))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
        sorted
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for Builder {
    fn add_record(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.add(key, value);
        Ok(())
    }
}
