use std::path::Path;

use crate::image_pipeline::raw::types::{DecodeOptions, DecodedImage};

/// Turns a raw sensor file into an interleaved RGB buffer.
pub trait RawDecoder {
    fn decode(&self, path: &Path, options: &DecodeOptions) -> anyhow::Result<DecodedImage>;
}
