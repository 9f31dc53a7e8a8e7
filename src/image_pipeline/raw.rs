//! RAW decoding module
//!
//! The File Converter only sees the `RawDecoder` trait; `RawLoaderDecoder` is the
//! production implementation backed by rawloader and the bayer demosaicer.

mod reader;
mod rawloader_reader;
mod postprocess;
pub mod types;

pub use reader::RawDecoder;
pub use rawloader_reader::RawLoaderDecoder;
pub use types::{ColorSpace, DecodeOptions, DecodedImage, WhiteBalance};
