use std::io::Write;

use tracing::debug;

use crate::{
    error::{Error, Result},
    format::{write_footer, write_record, Footer, IndexEntry, FORMAT_VERSION, SENTINEL_KEY},
};

/// Encodes sorted records into `out`, keeping track of the running byte offset
/// and the sparse index. Both builders funnel their records through this type,
/// so files produced by either of them share one layout.
pub(crate) struct RecordWriter<W: Write> {
    out: W,
    offset: u64,
    count: usize,
    block_size: usize,
    index: Vec<IndexEntry>,
}

impl<W: Write> RecordWriter<W> {
    pub(crate) fn new(out: W, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::InvalidBlockSize);
        }

        Ok(Self {
            out,
            offset: 0,
            count: 0,
            block_size,
            index: Vec::new(),
        })
    }

    /// Writes one record, starting a new block every `block_size` records.
    ///
    /// The index and counters only change once the record is written. Bytes
    /// of a partially written record may still be in `out`, so callers must
    /// stop using the writer after an error.
    pub(crate) fn push(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let offset = self.offset;
        self.offset += write_record(&mut self.out, key.as_bytes(), value)?;

        if self.count % self.block_size == 0 {
            self.index.push(IndexEntry {
                key: key.to_owned(),
                offset,
            });
        }
        self.count += 1;

        Ok(())
    }

    /// Appends the sentinel, footer and trailer, flushes, and returns the
    /// total number of bytes written.
    pub(crate) fn finish(mut self) -> Result<u64> {
        self.offset += write_record(
            &mut self.out,
            SENTINEL_KEY.as_bytes(),
            SENTINEL_KEY.as_bytes(),
        )?;

        let footer = Footer {
            version: FORMAT_VERSION,
            index: self.index,
            block_size: self.block_size,
            count: self.count,
        };
        let total = self.offset + write_footer(&mut self.out, &footer, self.offset)?;
        self.out.flush()?;

        debug!(
            count = footer.count,
            block_size = footer.block_size,
            index_len = footer.index.len(),
            bytes = total,
            "sealed diskmap"
        );

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder_tests::FailingWriter;

    #[test]
    fn test_failed_push_leaves_index_untouched() {
        let mut writer = RecordWriter::new(FailingWriter::failing_at(0), 1).unwrap();

        let err = writer.push("a", b"1").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(writer.index.is_empty());
        assert_eq!(writer.count, 0);
        assert_eq!(writer.offset, 0);
    }
}
