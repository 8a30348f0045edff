//! The JSON reader and writer used by compiled codecs.

mod reader;
mod writer;

pub use reader::{JsonReader, MAX_DEPTH};
pub use writer::JsonWriter;
