//! Conversions between in-memory values and the bytes stored in a record.
//!
//! The store never looks inside a value. A [`Codec`] turns values into bytes
//! on the way in and back on the way out:
//!
//! ```no_run
//! use diskmap::{Builder, Codec, Json, Map};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Doc {
//!     summary: String,
//! }
//!
//! # fn main() -> diskmap::Result<()> {
//! let mut builder = Builder::new();
//! Json.add(&mut builder, "os.path", &Doc { summary: "path helpers".into() })?;
//! builder.write_to_file("docs.diskmap")?;
//!
//! let map = Map::open("docs.diskmap")?;
//! let doc: Doc = Json.get(&map, "os.path")?;
//! # Ok(())
//! # }
//! ```

use serde::{de::DeserializeOwned, Serialize};

use crate::{builder::RecordSink, error::Result, map::Getter};

pub trait Codec<T> {
    fn marshal(&self, value: &T) -> Result<Vec<u8>>;

    fn unmarshal(&self, bytes: &[u8]) -> Result<T>;

    /// Looks up `key` and decodes its value. [`crate::Error::NotFound`] is passed through.
    fn get<G: Getter + ?Sized>(&self, getter: &G, key: &str) -> Result<T> {
        let bytes = getter.get(key)?;
        self.unmarshal(&bytes)
    }

    /// Encodes `value` and adds it to `sink` under `key`.
    fn add<S: RecordSink + ?Sized>(&self, sink: &mut S, key: &str, value: &T) -> Result<()> {
        let bytes = self.marshal(value)?;
        sink.add_record(key, bytes)
    }
}

/// Structured codec for any serde value, stored as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct Json;

impl<T: Serialize + DeserializeOwned> Codec<T> for Json {
    fn marshal(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Passthrough codec for byte buffers and strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct Raw;

impl Codec<Vec<u8>> for Raw {
    fn marshal(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

impl Codec<String> for Raw {
    fn marshal(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}
