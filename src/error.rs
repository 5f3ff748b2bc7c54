use miette::Diagnostic;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while writing, opening or reading a diskmap.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    /// The requested key is not in the map. This is an expected outcome of a lookup.
    #[error("key not found")]
    #[diagnostic(code(diskmap::not_found))]
    NotFound,

    /// A streamed key sorted before the key added just before it.
    #[error("key {key:?} added after {previous:?}; keys must be added in ascending order")]
    #[diagnostic(
        code(diskmap::out_of_order),
        help("sort the input, or use the batch builder which sorts for you")
    )]
    OutOfOrder { previous: String, key: String },

    /// The stream writer was used after `close`.
    #[error("writer is already closed")]
    #[diagnostic(code(diskmap::closed))]
    Closed,

    /// A writer was configured with a block size of zero.
    #[error("block size must be greater than zero")]
    #[diagnostic(code(diskmap::invalid_block_size))]
    InvalidBlockSize,

    /// An earlier write failed, so the output is incomplete and cannot be sealed.
    #[error("writer failed earlier; the output is incomplete")]
    #[diagnostic(
        code(diskmap::writer_failed),
        help("discard the partial output and rebuild the map")
    )]
    WriterFailed,

    /// Reading or writing the underlying file failed.
    #[error("I/O error: {0}")]
    #[diagnostic(code(diskmap::io))]
    Io(#[from] std::io::Error),

    /// The file does not follow the diskmap layout.
    #[error("corrupt diskmap: {0}")]
    #[diagnostic(code(diskmap::corrupt_format))]
    CorruptFormat(String),

    /// The JSON codec could not encode or decode a value.
    #[error("failed to encode or decode value: {0}")]
    #[diagnostic(code(diskmap::codec))]
    Codec(#[from] serde_json::Error),

    /// A value read back as a `String` was not UTF-8.
    #[error("value is not valid UTF-8: {0}")]
    #[diagnostic(code(diskmap::utf8))]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    /// True for `add` calls that arrive out of key order or after the writer was closed.
    pub fn is_ordering_violation(&self) -> bool {
        matches!(self, Error::OutOfOrder { .. } | Error::Closed)
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptFormat(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(err: &Error) -> String {
        err.code().map(|c| c.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_codec_errors_have_distinct_codes() {
        let json = Error::from(serde_json::from_slice::<u32>(b"nope").unwrap_err());
        let utf8 = Error::from(String::from_utf8(vec![0xff]).unwrap_err());

        assert_eq!(code(&json), "diskmap::codec");
        assert_eq!(code(&utf8), "diskmap::utf8");
    }

    #[test]
    fn test_writer_failed_is_not_an_ordering_violation() {
        assert!(!Error::WriterFailed.is_ordering_violation());
        assert!(Error::Closed.is_ordering_violation());
        assert_eq!(code(&Error::WriterFailed), "diskmap::writer_failed");
    }
}
