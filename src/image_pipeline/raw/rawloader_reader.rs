//! RAW decoder implementation using the rawloader library.
//!
//! rawloader only unpacks sensor data; levels, white balance and demosaicing are
//! applied here so the output matches a linear, unbrightened 16-bit development.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, anyhow, bail};
use rawloader::RawImageData as RawloaderImageData;
use tracing::debug;

use crate::image_pipeline::raw::postprocess::{self, Crop, SensorLevels};
use crate::image_pipeline::raw::reader::RawDecoder;
use crate::image_pipeline::raw::types::{DecodeOptions, DecodedImage};

/// RAW decoder backed by rawloader and the bayer demosaicer.
///
/// Panasonic RW2 is the format this crate targets, but any Bayer-pattern
/// format rawloader understands decodes the same way.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawLoaderDecoder;

/// Colors of the 2x2 CFA tile whose top-left pixel is (`top`, `left`).
fn cfa_tile(cfa: &rawloader::CFA, top: usize, left: usize) -> anyhow::Result<[[usize; 2]; 2]> {
    if cfa.name.is_empty() {
        bail!("sensor has no CFA pattern");
    }
    Ok([
        [cfa.color_at(top, left), cfa.color_at(top, left + 1)],
        [cfa.color_at(top + 1, left), cfa.color_at(top + 1, left + 1)],
    ])
}

impl RawLoaderDecoder {
    /// Decodes an in-memory RAW file.
    pub fn decode_bytes(&self, data: &[u8], options: &DecodeOptions) -> anyhow::Result<DecodedImage> {
        postprocess::validate_options(options)?;

        debug!("Decoding RAW image, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data)).map_err(|e| anyhow!(e.to_string()))?;

        let width = decoded.width;
        let height = decoded.height;
        let cpp = decoded.cpp;
        debug!(width, height, cpp, make = %decoded.make, model = %decoded.model, "Unpacked sensor data");

        // Float data is normalized 0.0-1.0, scale it to the u16 range
        let samples: Vec<u16> = match decoded.data {
            RawloaderImageData::Integer(values) => values,
            RawloaderImageData::Float(values) => {
                values.iter().map(|&v| (v * u16::MAX as f32) as u16).collect()
            }
        };

        if samples.len() < width * height * cpp {
            bail!(
                "sensor data too short: {} samples for {}x{}x{}",
                samples.len(),
                width,
                height,
                cpp
            );
        }

        let mut crop = Crop::from_rawloader(decoded.crops);
        let (out_width, out_height) = match crop.apply(width, height) {
            Some(dims) => dims,
            None => {
                crop = Crop::default();
                crop.apply(width, height)
                    .ok_or_else(|| anyhow!("invalid image dimensions: {}x{}", width, height))?
            }
        };

        let levels = SensorLevels {
            black: decoded.blacklevels,
            white: decoded.whitelevels,
            multipliers: postprocess::wb_multipliers(options.white_balance, decoded.wb_coeffs),
        };
        debug!(?levels, ?crop, "Sensor levels");

        let rgb = match cpp {
            1 => {
                let tile = cfa_tile(&decoded.cfa, crop.top, crop.left)?;
                let pattern = postprocess::bayer_pattern(tile)
                    .with_context(|| format!("CFA {}", decoded.cfa.name))?;
                let mosaic = postprocess::normalize_mosaic(
                    &samples, width, crop, out_width, out_height, &levels, tile,
                );
                debug!("Demosaicing {}x{} ({})", out_width, out_height, decoded.cfa.name);
                postprocess::demosaic(&mosaic, out_width, out_height, pattern)?
            }
            3 => postprocess::normalize_rgb(&samples, width, crop, out_width, out_height, &levels),
            other => bail!("unsupported components per pixel: {}", other),
        };

        let data = postprocess::finish_rgb(rgb, options);

        Ok(DecodedImage {
            width: out_width,
            height: out_height,
            data,
            bits_per_sample: options.output_bits as u32,
        })
    }
}

impl RawDecoder for RawLoaderDecoder {
    fn decode(&self, path: &Path, options: &DecodeOptions) -> anyhow::Result<DecodedImage> {
        let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        self.decode_bytes(&data, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_input_fails_to_decode() {
        let result = RawLoaderDecoder.decode_bytes(b"definitely not a raw file", &DecodeOptions::linear16());
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_bit_depth_fails_before_decoding() {
        let options = DecodeOptions {
            output_bits: 10,
            ..DecodeOptions::linear16()
        };
        let err = RawLoaderDecoder.decode_bytes(b"", &options).unwrap_err();
        assert!(err.to_string().contains("bit depth"));
    }

    #[test]
    fn test_empty_cfa_is_an_error() {
        let err = cfa_tile(&rawloader::CFA::new(""), 0, 0).unwrap_err();
        assert!(err.to_string().contains("no CFA pattern"));
    }

    #[test]
    fn test_cfa_tile_follows_crop_origin() {
        let cfa = rawloader::CFA::new("RGGB");
        assert_eq!(cfa_tile(&cfa, 0, 0).unwrap(), [[0, 1], [1, 2]]);
        assert_eq!(cfa_tile(&cfa, 1, 1).unwrap(), [[2, 1], [1, 0]]);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = RawLoaderDecoder
            .decode(Path::new("/nonexistent/dir/P1000001.RW2"), &DecodeOptions::linear16())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("P1000001.RW2"));
    }
}
