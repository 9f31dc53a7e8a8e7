//! Planar float image handed from the converter to the encoder.

use anyhow::{Result, bail};

use crate::image_pipeline::raw::DecodedImage;

/// Channel names for the planes produced from an RGB decode, in order.
pub const RGB_CHANNELS: [&str; 3] = ["R", "G", "B"];

/// One named channel: `width * height` packed f32 samples, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlane {
    pub name: String,
    pub samples: Vec<f32>,
}

/// Linear float image stored as independent planes.
///
/// All planes share the image dimensions and channel names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearImageBuffer {
    width: usize,
    height: usize,
    planes: Vec<ImagePlane>,
}

impl LinearImageBuffer {
    pub fn new(width: usize, height: usize, planes: Vec<ImagePlane>) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("invalid image dimensions: width={}, height={}", width, height);
        }
        if planes.is_empty() {
            bail!("image has no channels");
        }

        let expected = width * height;
        for (i, plane) in planes.iter().enumerate() {
            if plane.samples.len() != expected {
                bail!(
                    "channel {} has {} samples, expected {}",
                    plane.name,
                    plane.samples.len(),
                    expected
                );
            }
            if planes[..i].iter().any(|p| p.name == plane.name) {
                bail!("duplicate channel name {}", plane.name);
            }
        }

        Ok(Self {
            width,
            height,
            planes,
        })
    }

    /// Splits an interleaved RGB decode into R, G and B planes.
    ///
    /// Every sample is divided by 65535 whatever depth the decoder reported.
    pub fn from_rgb16(image: &DecodedImage) -> Result<Self> {
        let pixels = image.width * image.height;
        if image.data.len() != pixels * 3 {
            bail!(
                "decoded buffer has {} samples, expected {} for {}x{} RGB",
                image.data.len(),
                pixels * 3,
                image.width,
                image.height
            );
        }

        let max = u16::MAX as f32;
        let mut r = Vec::with_capacity(pixels);
        let mut g = Vec::with_capacity(pixels);
        let mut b = Vec::with_capacity(pixels);
        for px in image.data.chunks_exact(3) {
            r.push(px[0] as f32 / max);
            g.push(px[1] as f32 / max);
            b.push(px[2] as f32 / max);
        }

        let planes = RGB_CHANNELS
            .iter()
            .zip([r, g, b])
            .map(|(name, samples)| ImagePlane {
                name: name.to_string(),
                samples,
            })
            .collect();

        Self::new(image.width, image.height, planes)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn planes(&self) -> &[ImagePlane] {
        &self.planes
    }

    pub fn plane(&self, name: &str) -> Option<&ImagePlane> {
        self.planes.iter().find(|p| p.name == name)
    }

    pub fn into_planes(self) -> Vec<ImagePlane> {
        self.planes
    }
}
