use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tracing::{debug, warn};

use super::{record_writer::RecordWriter, RecordSink};
use crate::{
    error::{Error, Result},
    format::DEFAULT_BLOCK_SIZE,
};

/// Incremental encoder for diskmap files.
///
/// Every accepted [`StreamBuilder::add`] writes its record immediately, so the
/// dataset is never held in memory. In exchange keys must arrive in ascending
/// order. Equal keys are accepted and written as separate records.
pub struct StreamBuilder<W: Write = BufWriter<File>> {
    // None once the writer has been closed or has failed.
    writer: Option<RecordWriter<W>>,
    last_key: Option<String>,
    count: usize,
    failed: bool,
}

impl StreamBuilder<BufWriter<File>> {
    /// Creates (or truncates) the file at `path` and streams records into it.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_block_size(path, DEFAULT_BLOCK_SIZE)
    }

    pub fn create_with_block_size<P: AsRef<Path>>(path: P, block_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        debug!(path = %path.display(), block_size, "streaming diskmap");

        Self::with_block_size(BufWriter::new(file), block_size)
    }
}

impl<W: Write> StreamBuilder<W> {
    pub fn new(output: W) -> Result<Self> {
        Self::with_block_size(output, DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(output: W, block_size: usize) -> Result<Self> {
        Ok(Self {
            writer: Some(RecordWriter::new(output, block_size)?),
            last_key: None,
            count: 0,
            failed: false,
        })
    }

    /// Writes one record.
    ///
    /// Fails with [`Error::OutOfOrder`] if `key` sorts before the previous key
    /// and with [`Error::Closed`] after [`StreamBuilder::close`]. A rejected
    /// call leaves everything written so far untouched.
    ///
    /// An I/O error leaves the output incomplete: it is returned once, and
    /// every later `add` or `close` fails with [`Error::WriterFailed`].
    pub fn add(&mut self, key: &str, value: &[u8]) -> Result<()> {
        if self.failed {
            return Err(Error::WriterFailed);
        }
        let writer = self.writer.as_mut().ok_or(Error::Closed)?;

        if let Some(previous) = &self.last_key {
            if key < previous.as_str() {
                return Err(Error::OutOfOrder {
                    previous: previous.clone(),
                    key: key.to_owned(),
                });
            }
        }

        if let Err(e) = writer.push(key, value) {
            self.poison();
            return Err(e);
        }
        self.count += 1;

        match &mut self.last_key {
            Some(last) => {
                last.clear();
                last.push_str(key);
            }
            None => self.last_key = Some(key.to_owned()),
        }

        Ok(())
    }

    /// Number of records written so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends the sentinel, footer and trailer and flushes the output.
    /// Returns the total number of bytes written.
    pub fn close(&mut self) -> Result<u64> {
        if self.failed {
            return Err(Error::WriterFailed);
        }
        let writer = self.writer.take().ok_or(Error::Closed)?;
        writer.finish().inspect_err(|_| self.failed = true)
    }

    fn poison(&mut self) {
        warn!(records = self.count, "diskmap writer failed, output is incomplete");
        self.writer = None;
        self.failed = true;
    }
}

impl<W: Write> RecordSink for StreamBuilder<W> {
    fn add_record(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.add(key, &value)
    }
}
