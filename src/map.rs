use std::{
    fs::File,
    io::{BufReader, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, trace, warn};

use crate::{
    counters::LookupCounters,
    error::{Error, Result},
    format::{read_footer, read_record, Footer, SENTINEL_KEY},
};

/// Point lookups by key. Implemented by [`Map`] and by [`crate::MockGetter`].
pub trait Getter {
    /// Returns the value stored for `key`, or [`Error::NotFound`].
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Number of records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read handle on a sealed diskmap file.
///
/// Only the footer (sparse index, block size and record count) is kept in
/// memory. Every lookup opens its own file handle, so a `Map` can be shared
/// between threads and queried concurrently without locking.
#[derive(Debug)]
pub struct Map {
    path: PathBuf,
    footer: Footer,
    counters: Option<Arc<LookupCounters>>,
}

impl Map {
    /// Opens the file at `path` and loads its footer.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be opened or read, and
    /// [`Error::CorruptFormat`] if the trailer or footer cannot be decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;

        let footer = read_footer(&mut file).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "rejected diskmap");
        })?;

        debug!(
            path = %path.display(),
            count = footer.count,
            block_size = footer.block_size,
            index_len = footer.index.len(),
            "opened diskmap"
        );

        Ok(Self {
            path,
            footer,
            counters: None,
        })
    }

    /// Opens the file at `path` and records every lookup in `counters`.
    pub fn open_with_counters<P: AsRef<Path>>(
        path: P,
        counters: Arc<LookupCounters>,
    ) -> Result<Self> {
        let mut map = Self::open(path)?;
        map.counters = Some(counters);
        Ok(map)
    }

    /// Returns a copy of the value stored for `key`, or [`Error::NotFound`].
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        let found = self.find(key);

        if let Some(counters) = &self.counters {
            match &found {
                Ok(_) => counters.hit(),
                Err(Error::NotFound) => counters.miss(),
                Err(_) => {}
            }
        }

        found
    }

    /// Number of records, excluding the sentinel.
    pub fn len(&self) -> usize {
        self.footer.count
    }

    pub fn is_empty(&self) -> bool {
        self.footer.count == 0
    }

    pub fn block_size(&self) -> usize {
        self.footer.block_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    /// Scans the whole file and returns every key in file order.
    ///
    /// Meant for debugging and tests; lookups should go through [`Map::get`].
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut keys = Vec::with_capacity(self.footer.count);

        for _ in 0..self.footer.count {
            let record = read_record(&mut reader)?;
            let key = String::from_utf8(record.key)
                .map_err(|_| Error::corrupt("record key is not valid UTF-8"))?;
            keys.push(key);
        }

        let sentinel = read_record(&mut reader)?;
        if sentinel.key != SENTINEL_KEY.as_bytes() {
            return Err(Error::corrupt(format!(
                "expected the end marker after {} records",
                self.footer.count
            )));
        }

        Ok(keys)
    }

    fn find(&self, key: &str) -> Result<Vec<u8>> {
        let index = &self.footer.index;

        // Last block whose first key is <= key.
        let block = match index.partition_point(|entry| entry.key.as_str() <= key) {
            0 => {
                trace!(key, "key sorts before the first block");
                return Err(Error::NotFound);
            }
            n => n - 1,
        };

        let mut reader = BufReader::new(File::open(&self.path)?);
        reader.seek(SeekFrom::Start(index[block].offset))?;

        // Records past the last real one belong to the sentinel, which ends the scan.
        for _ in 0..self.footer.records_in_block(block) {
            let record = read_record(&mut reader)?;
            match record.key.as_slice().cmp(key.as_bytes()) {
                std::cmp::Ordering::Equal => {
                    trace!(key, block, "found key");
                    return Ok(record.value);
                }
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {}
            }
        }

        trace!(key, block, "key not in block");
        Err(Error::NotFound)
    }
}

impl Getter for Map {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        Map::get(self, key)
    }

    fn len(&self) -> usize {
        Map::len(self)
    }
}
