use std::path::Path;

use crate::image_pipeline::exr::buffer::LinearImageBuffer;

/// Writes a set of named float planes to a container file.
pub trait FloatImageEncoder {
    fn write_exr(&self, path: &Path, image: LinearImageBuffer) -> anyhow::Result<()>;
}
