mod batch;
mod record_writer;
mod stream;

pub use batch::Builder;
pub use stream::StreamBuilder;

use crate::error::Result;

/// Anything that accepts encoded records: the batch [`Builder`] and the
/// [`StreamBuilder`]. Lets codecs write values without caring which one is used.
pub trait RecordSink {
    fn add_record(&mut self, key: &str, value: Vec<u8>) -> Result<()>;
}
