//! Immutable, sorted, on-disk key-value maps.
//!
//! A diskmap is a single write-once file that serves point lookups without
//! loading the dataset into memory. Records are stored sorted by key; a sparse
//! index holding every `block_size`-th key lives in the footer, and it is the
//! only part of the file a reader keeps in memory.
//!
//! # Modules
//!
//! - `builder`: [`Builder`] sorts an arbitrary-order working set and writes it
//!   in one pass; [`StreamBuilder`] writes pre-sorted records as they arrive.
//! - `map`: [`Map`] opens a sealed file and answers lookups; [`Getter`] is the
//!   lookup contract shared with [`MockGetter`].
//! - `codec`: [`Json`] and [`Raw`] convert values to and from record bytes.
//! - `format`: the record framing, footer and trailer layout.
//!
//! # Examples
//!
//! ```rust
//! use diskmap::{Builder, Map};
//!
//! # fn main() -> diskmap::Result<()> {
//! let dir = std::env::temp_dir().join(format!("diskmap-doc-{}", std::process::id()));
//! std::fs::create_dir_all(&dir)?;
//! let path = dir.join("fruits.diskmap");
//!
//! let mut builder = Builder::new();
//! builder.add("banana", "yellow");
//! builder.add("apple", "red");
//! builder.write_to_file(&path)?;
//!
//! let map = Map::open(&path)?;
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("apple")?, b"red");
//! assert!(map.get("cherry").unwrap_err().is_not_found());
//!
//! # std::fs::remove_dir_all(&dir)?;
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod codec;
mod counters;
mod error;
pub mod format;
mod map;
mod mock;

pub use builder::{Builder, RecordSink, StreamBuilder};
pub use codec::{Codec, Json, Raw};
pub use counters::LookupCounters;
pub use error::{Error, Result};
pub use format::DEFAULT_BLOCK_SIZE;
pub use map::{Getter, Map};
pub use mock::MockGetter;
