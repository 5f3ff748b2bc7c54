//! On-disk layout of a diskmap file.
//!
//! ```text
//! file    := record* sentinel footer trailer
//! record  := varint(frame_len) frame
//! frame   := varint(key_len) key value
//! footer  := JSON { version, index: [{ key, offset }], block_size, count }
//! trailer := footer offset as a big-endian i64
//! ```
//!
//! Every varint is zig-zag encoded LEB128, so it occupies between 1 and 10 bytes.

use std::io::{self, Read, Seek, SeekFrom, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Key and value of the record that terminates the record section.
pub const SENTINEL_KEY: &str = "_diskmap_end";

/// Current footer version.
pub const FORMAT_VERSION: u32 = 1;

/// Number of records between two sparse index entries unless configured otherwise.
pub const DEFAULT_BLOCK_SIZE: usize = 5;

/// Size of the footer offset trailer at the end of the file.
pub const TRAILER_BYTES: u64 = 8;

const MAX_VARINT_BYTES: usize = 10;

/// One entry of the sparse index: the key of the first record of a block and
/// the byte offset where that record starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    pub offset: u64,
}

/// Trailing metadata of a sealed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    pub version: u32,
    pub index: Vec<IndexEntry>,
    pub block_size: usize,
    pub count: usize,
}

/// A decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub(crate) key: Vec<u8>,
    pub(crate) value: Vec<u8>,
}

impl Footer {
    /// Number of real records in block `block`; the record after the last one is the sentinel.
    pub(crate) fn records_in_block(&self, block: usize) -> usize {
        let start = block * self.block_size;
        self.count.saturating_sub(start).min(self.block_size)
    }

    fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported footer version {}",
                self.version
            )));
        }
        if self.block_size == 0 {
            return Err(Error::corrupt("footer block size is zero"));
        }
        let expected = self.count.div_ceil(self.block_size);
        if self.index.len() != expected {
            return Err(Error::corrupt(format!(
                "index has {} entries, expected {} for {} records",
                self.index.len(),
                expected,
                self.count
            )));
        }
        Ok(())
    }
}

/// Appends the zig-zag varint encoding of `value` to `buf`.
pub(crate) fn put_varint(buf: &mut Vec<u8>, value: i64) {
    let mut zigzag = ((value << 1) ^ (value >> 63)) as u64;
    while zigzag >= 0x80 {
        buf.push((zigzag as u8) | 0x80);
        zigzag >>= 7;
    }
    buf.push(zigzag as u8);
}

/// Reads one zig-zag varint from `r`.
pub(crate) fn read_varint<R: Read>(r: &mut R) -> Result<i64> {
    let mut zigzag: u64 = 0;
    let mut byte = [0u8; 1];

    for i in 0..MAX_VARINT_BYTES {
        read_exact_or_corrupt(r, &mut byte)?;
        zigzag |= u64::from(byte[0] & 0x7f) << (7 * i);
        if byte[0] < 0x80 {
            return Ok(((zigzag >> 1) as i64) ^ -((zigzag & 1) as i64));
        }
    }

    Err(Error::corrupt("varint overflows 64 bits"))
}

/// Encodes one record and writes it to `w`, returning the number of bytes written.
pub(crate) fn write_record<W: Write>(w: &mut W, key: &[u8], value: &[u8]) -> io::Result<u64> {
    let mut frame = Vec::with_capacity(MAX_VARINT_BYTES + key.len() + value.len());
    put_varint(&mut frame, key.len() as i64);
    frame.extend_from_slice(key);
    frame.extend_from_slice(value);

    let mut header = Vec::with_capacity(MAX_VARINT_BYTES);
    put_varint(&mut header, frame.len() as i64);

    w.write_all(&header)?;
    w.write_all(&frame)?;

    Ok((header.len() + frame.len()) as u64)
}

/// Decodes the record starting at the current position of `r`.
pub(crate) fn read_record<R: Read>(r: &mut R) -> Result<Record> {
    let frame_len = read_varint(r)?;
    if frame_len < 0 {
        return Err(Error::corrupt(format!("negative frame length {frame_len}")));
    }

    let mut frame = Vec::new();
    r.by_ref().take(frame_len as u64).read_to_end(&mut frame)?;
    if frame.len() as u64 != frame_len as u64 {
        return Err(Error::corrupt("truncated record"));
    }

    let mut cursor = io::Cursor::new(frame.as_slice());
    let key_len = read_varint(&mut cursor)?;
    let key_start = cursor.position() as usize;
    if key_len < 0 || key_start + key_len as usize > frame.len() {
        return Err(Error::corrupt(format!(
            "key length {key_len} does not fit in a frame of {} bytes",
            frame.len()
        )));
    }
    let key_end = key_start + key_len as usize;

    Ok(Record {
        key: frame[key_start..key_end].to_vec(),
        value: frame[key_end..].to_vec(),
    })
}

/// Writes `footer` followed by the trailer pointing at `footer_offset`.
/// Returns the number of bytes written.
pub(crate) fn write_footer<W: Write>(w: &mut W, footer: &Footer, footer_offset: u64) -> Result<u64> {
    let encoded = serde_json::to_vec(footer)?;
    w.write_all(&encoded)?;
    w.write_all(&(footer_offset as i64).to_be_bytes())?;

    Ok(encoded.len() as u64 + TRAILER_BYTES)
}

/// Locates the footer through the trailer and decodes it.
pub(crate) fn read_footer<R: Read + Seek>(r: &mut R) -> Result<Footer> {
    let file_len = r.seek(SeekFrom::End(0))?;
    if file_len < TRAILER_BYTES {
        return Err(Error::corrupt(format!(
            "file is {file_len} bytes, too small to hold a trailer"
        )));
    }

    r.seek(SeekFrom::Start(file_len - TRAILER_BYTES))?;
    let mut trailer = [0u8; TRAILER_BYTES as usize];
    read_exact_or_corrupt(r, &mut trailer)?;

    let footer_end = file_len - TRAILER_BYTES;
    let footer_offset = i64::from_be_bytes(trailer);
    if footer_offset < 0 || footer_offset as u64 > footer_end {
        return Err(Error::corrupt(format!(
            "footer offset {footer_offset} is outside the file"
        )));
    }

    r.seek(SeekFrom::Start(footer_offset as u64))?;
    let mut encoded = vec![0u8; (footer_end - footer_offset as u64) as usize];
    read_exact_or_corrupt(r, &mut encoded)?;

    let footer: Footer = serde_json::from_slice(&encoded)
        .map_err(|e| Error::corrupt(format!("cannot decode footer: {e}")))?;
    footer.validate()?;

    Ok(footer)
}

fn read_exact_or_corrupt<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::corrupt("unexpected end of file"),
        _ => Error::Io(e),
    })
}
