use std::path::Path;

use ::exr::compression::Compression;
use ::exr::image::{AnyChannel, AnyChannels, Blocks, Encoding, FlatSamples, Image, Layer};
use ::exr::meta::attribute::LineOrder;
use ::exr::prelude::{LayerAttributes, WritableImage};
use anyhow::anyhow;
use smallvec::SmallVec;
use tracing::debug;

use crate::image_pipeline::exr::buffer::LinearImageBuffer;
use crate::image_pipeline::exr::types::ExrCompression;
use crate::image_pipeline::exr::writer::FloatImageEncoder;

/// Writes scan-line OpenEXR files with one 32-bit float channel per plane.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExrFileWriter {
    compression: ExrCompression,
}

impl ExrFileWriter {
    pub fn new(compression: ExrCompression) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> ExrCompression {
        self.compression
    }

    fn encoding(&self) -> Encoding {
        let compression = match self.compression {
            ExrCompression::None => Compression::Uncompressed,
            ExrCompression::Rle => Compression::RLE,
            ExrCompression::Zip1 => Compression::ZIP1,
            ExrCompression::Zip16 => Compression::ZIP16,
            ExrCompression::Piz => Compression::PIZ,
        };

        Encoding {
            compression,
            blocks: Blocks::ScanLines,
            line_order: LineOrder::Increasing,
        }
    }
}

impl FloatImageEncoder for ExrFileWriter {
    fn write_exr(&self, path: &Path, image: LinearImageBuffer) -> anyhow::Result<()> {
        let (width, height) = (image.width(), image.height());
        debug!(
            "Encoding EXR image: {}x{}, {} channels, {:?}",
            width,
            height,
            image.planes().len(),
            self.compression
        );

        let channels: SmallVec<[AnyChannel<FlatSamples>; 4]> = image
            .into_planes()
            .into_iter()
            .map(|plane| AnyChannel::new(plane.name.as_str(), FlatSamples::F32(plane.samples)))
            .collect();

        let layer = Layer::new(
            (width, height),
            LayerAttributes::default(),
            self.encoding(),
            AnyChannels::sort(channels),
        );

        Image::from_layer(layer)
            .write()
            .to_file(path)
            .map_err(|e| anyhow!(e.to_string()))?;

        debug!("EXR encoding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::exr::buffer::ImagePlane;

    fn gradient(width: usize, height: usize) -> LinearImageBuffer {
        let n = width * height;
        let planes = ["R", "G", "B"]
            .iter()
            .enumerate()
            .map(|(c, name)| ImagePlane {
                name: name.to_string(),
                samples: (0..n).map(|i| (i + c) as f32 / n as f32).collect(),
            })
            .collect();
        LinearImageBuffer::new(width, height, planes).unwrap()
    }

    #[test]
    fn test_writes_a_readable_exr_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient.exr");

        ExrFileWriter::default().write_exr(&path, gradient(8, 4)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // OpenEXR magic number
        assert_eq!(&bytes[..4], &[0x76, 0x2f, 0x31, 0x01]);
    }

    #[test]
    fn test_written_file_holds_float_planes_in_row_major_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient.exr");
        let source = gradient(8, 4);

        ExrFileWriter::default().write_exr(&path, source.clone()).unwrap();

        let image = ::exr::prelude::read_all_flat_layers_from_file(&path).unwrap();
        assert_eq!(image.layer_data.len(), 1);
        let layer = &image.layer_data[0];
        assert_eq!((layer.size.width(), layer.size.height()), (8, 4));

        let mut names: Vec<String> = layer.channel_data.list.iter().map(|c| c.name.to_string()).collect();
        names.sort();
        assert_eq!(names, ["B", "G", "R"]);

        for plane in source.planes() {
            let channel = layer
                .channel_data
                .list
                .iter()
                .find(|c| c.name.to_string() == plane.name)
                .unwrap();
            match &channel.sample_data {
                FlatSamples::F32(samples) => assert_eq!(samples, &plane.samples),
                other => panic!("channel {} is not f32: {:?}", plane.name, other),
            }
        }
    }

    #[test]
    fn test_identical_input_gives_identical_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.exr");
        let second = dir.path().join("b.exr");
        let writer = ExrFileWriter::new(ExrCompression::Zip16);

        writer.write_exr(&first, gradient(16, 16)).unwrap();
        writer.write_exr(&second, gradient(16, 16)).unwrap();

        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.exr");
        assert!(ExrFileWriter::default().write_exr(&path, gradient(2, 2)).is_err());
    }
}
