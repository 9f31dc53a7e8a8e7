use std::path::Path;

use crate::image_pipeline::common::error::Result;

/// Converts exactly one input file to exactly one output file.
pub trait FileConverter {
    fn convert_file(&self, input: &Path, output: &Path) -> Result<()>;
}
