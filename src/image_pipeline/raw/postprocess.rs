//! Sensor data post-processing shared by the RAW decoders.
//!
//! Order of operations: crop + black level + white level + white balance on the
//! mosaic, demosaic, then auto-brightness, transfer curve and requantization on RGB.

use std::io::Cursor;

use anyhow::{Result, anyhow, bail};
use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};

use crate::image_pipeline::raw::types::{DecodeOptions, WhiteBalance, max_for_bits};

/// Fraction of samples allowed to clip when auto-brightening.
const AUTO_BRIGHT_CLIP_FRACTION: f64 = 0.01;

/// Active sensor area, as offsets from each edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Crop {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

impl Crop {
    /// rawloader order: [top, right, bottom, left]
    pub fn from_rawloader(crops: [usize; 4]) -> Self {
        Self {
            top: crops[0],
            right: crops[1],
            bottom: crops[2],
            left: crops[3],
        }
    }

    /// Cropped dimensions, or `None` when the crop would leave nothing.
    pub fn apply(&self, width: usize, height: usize) -> Option<(usize, usize)> {
        let w = width.checked_sub(self.left + self.right)?;
        let h = height.checked_sub(self.top + self.bottom)?;
        (w > 0 && h > 0).then_some((w, h))
    }
}

/// Per-color black/white levels and white balance multipliers.
///
/// Color indices follow rawloader: 0 = R, 1 = G, 2 = B, 3 = second green.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SensorLevels {
    pub black: [u16; 4],
    pub white: [u16; 4],
    pub multipliers: [f32; 4],
}

impl SensorLevels {
    /// Maps a raw sensor value to the full 16-bit range.
    pub fn scale(&self, value: u16, color: usize) -> u16 {
        let color = color.min(3);
        let black = self.black[color] as f32;
        let range = (self.white[color] as f32 - black).max(1.0);
        let normalized = ((value as f32 - black).max(0.0) / range) * self.multipliers[color];
        (normalized.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
    }
}

/// White balance multipliers normalized so green is 1.0.
pub(crate) fn wb_multipliers(mode: WhiteBalance, camera_coeffs: [f32; 4]) -> [f32; 4] {
    let rgb = match mode {
        WhiteBalance::None => return [1.0; 4],
        WhiteBalance::Camera => [camera_coeffs[0], camera_coeffs[1], camera_coeffs[2]],
        WhiteBalance::Custom(rgb) => rgb,
    };

    let usable = |v: f32| v.is_finite() && v > 0.0;
    if !rgb.iter().all(|&v| usable(v)) {
        return [1.0; 4];
    }

    let green = rgb[1];
    [rgb[0] / green, 1.0, rgb[2] / green, 1.0]
}

/// Picks the bayer crate's pattern from the 2x2 tile at the crop origin.
pub(crate) fn bayer_pattern(tile: [[usize; 2]; 2]) -> Result<CFA> {
    let as_rgb = |c: usize| if c == 3 { 1 } else { c };
    let tile = [
        [as_rgb(tile[0][0]), as_rgb(tile[0][1])],
        [as_rgb(tile[1][0]), as_rgb(tile[1][1])],
    ];

    match tile {
        [[0, 1], [1, 2]] => Ok(CFA::RGGB),
        [[2, 1], [1, 0]] => Ok(CFA::BGGR),
        [[1, 0], [2, 1]] => Ok(CFA::GRBG),
        [[1, 2], [0, 1]] => Ok(CFA::GBRG),
        other => bail!("unsupported CFA layout {:?}", other),
    }
}

/// Crops a single-channel mosaic and applies levels per CFA color.
pub(crate) fn normalize_mosaic(
    samples: &[u16],
    width: usize,
    crop: Crop,
    out_width: usize,
    out_height: usize,
    levels: &SensorLevels,
    tile: [[usize; 2]; 2],
) -> Vec<u16> {
    let mut out = Vec::with_capacity(out_width * out_height);
    for row in 0..out_height {
        let src = &samples[(row + crop.top) * width + crop.left..][..out_width];
        for (col, &value) in src.iter().enumerate() {
            out.push(levels.scale(value, tile[row % 2][col % 2]));
        }
    }
    out
}

/// Crops an already-RGB frame and applies levels per channel.
pub(crate) fn normalize_rgb(
    samples: &[u16],
    width: usize,
    crop: Crop,
    out_width: usize,
    out_height: usize,
    levels: &SensorLevels,
) -> Vec<u16> {
    let mut out = Vec::with_capacity(out_width * out_height * 3);
    for row in 0..out_height {
        let start = ((row + crop.top) * width + crop.left) * 3;
        for pixel in samples[start..start + out_width * 3].chunks_exact(3) {
            for (channel, &value) in pixel.iter().enumerate() {
                out.push(levels.scale(value, channel));
            }
        }
    }
    out
}

/// Bilinear demosaic of a 16-bit mosaic into interleaved RGB.
pub(crate) fn demosaic(mosaic: &[u16], width: usize, height: usize, cfa: CFA) -> Result<Vec<u16>> {
    let bayer_bytes: Vec<u8> = mosaic.iter().flat_map(|&v| v.to_le_bytes()).collect();
    let mut output_buf = vec![0u8; width * height * 3 * 2];

    {
        let mut output_raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut output_buf);
        bayer::run_demosaic(
            &mut Cursor::new(&bayer_bytes[..]),
            BayerDepth::Depth16LE,
            cfa,
            Demosaic::Linear,
            &mut output_raster,
        )
        .map_err(|e| anyhow!("demosaic failed: {:?}", e))?;
    }

    // Raster rows hold native-endian u16.
    Ok(output_buf
        .chunks_exact(2)
        .map(|b| u16::from_ne_bytes([b[0], b[1]]))
        .collect())
}

/// Gain that puts the white point where `AUTO_BRIGHT_CLIP_FRACTION` of samples clip.
pub(crate) fn auto_bright_gain(rgb: &[u16]) -> f32 {
    if rgb.is_empty() {
        return 1.0;
    }

    let mut histogram = vec![0usize; u16::MAX as usize + 1];
    for &v in rgb {
        histogram[v as usize] += 1;
    }

    let allowed = (rgb.len() as f64 * AUTO_BRIGHT_CLIP_FRACTION) as usize;
    let mut above = 0usize;
    let mut white_point = u16::MAX as usize;
    while white_point > 0 {
        above += histogram[white_point];
        if above > allowed {
            break;
        }
        white_point -= 1;
    }

    if white_point == 0 {
        1.0
    } else {
        u16::MAX as f32 / white_point as f32
    }
}

pub(crate) fn validate_options(options: &DecodeOptions) -> Result<()> {
    if options.output_bits != 8 && options.output_bits != 16 {
        bail!("unsupported output bit depth {}", options.output_bits);
    }
    if !options.transfer_exponent.is_finite() || options.transfer_exponent <= 0.0 {
        bail!("invalid transfer exponent {}", options.transfer_exponent);
    }
    Ok(())
}

/// Applies brightness, transfer curve and output bit depth to full-range RGB.
pub(crate) fn finish_rgb(rgb: Vec<u16>, options: &DecodeOptions) -> Vec<u16> {
    if options.is_linear() && !options.auto_bright && options.output_bits == 16 {
        return rgb;
    }

    let gain = if options.auto_bright {
        auto_bright_gain(&rgb)
    } else {
        1.0
    };
    let inverse_exponent = 1.0 / options.transfer_exponent;
    let linear = options.is_linear();
    let out_max = max_for_bits(options.output_bits as u32) as f32;

    rgb.into_iter()
        .map(|v| {
            let mut x = (v as f32 / u16::MAX as f32 * gain).min(1.0);
            if !linear {
                x = x.powf(inverse_exponent);
            }
            (x * out_max).round() as u16
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_levels() -> SensorLevels {
        SensorLevels {
            black: [0; 4],
            white: [u16::MAX; 4],
            multipliers: [1.0; 4],
        }
    }

    #[test]
    fn test_scale_subtracts_black_and_stretches_to_white() {
        let levels = SensorLevels {
            black: [512; 4],
            white: [4095; 4],
            multipliers: [1.0; 4],
        };
        assert_eq!(levels.scale(512, 0), 0);
        assert_eq!(levels.scale(100, 1), 0);
        assert_eq!(levels.scale(4095, 2), u16::MAX);
        assert_eq!(levels.scale(8000, 3), u16::MAX);
    }

    #[test]
    fn test_scale_applies_multiplier_and_clips() {
        let levels = SensorLevels {
            black: [0; 4],
            white: [1000; 4],
            multipliers: [2.0, 1.0, 1.0, 1.0],
        };
        assert_eq!(levels.scale(250, 0), (0.5f32 * 65535.0).round() as u16);
        assert_eq!(levels.scale(800, 0), u16::MAX);
        assert_eq!(levels.scale(250, 1), (0.25f32 * 65535.0).round() as u16);
    }

    #[test]
    fn test_camera_white_balance_is_normalized_to_green() {
        let m = wb_multipliers(WhiteBalance::Camera, [2.0, 1.0, 1.5, f32::NAN]);
        assert_eq!(m, [2.0, 1.0, 1.5, 1.0]);

        let m = wb_multipliers(WhiteBalance::Custom([4.0, 2.0, 3.0]), [0.0; 4]);
        assert_eq!(m, [2.0, 1.0, 1.5, 1.0]);
    }

    #[test]
    fn test_unusable_camera_white_balance_falls_back_to_unity() {
        let m = wb_multipliers(WhiteBalance::Camera, [f32::NAN, 1.0, 1.0, 1.0]);
        assert_eq!(m, [1.0; 4]);
        assert_eq!(wb_multipliers(WhiteBalance::None, [2.0, 1.0, 2.0, 1.0]), [1.0; 4]);
    }

    #[test]
    fn test_bayer_patterns_are_recognized() {
        assert!(matches!(bayer_pattern([[0, 1], [1, 2]]), Ok(CFA::RGGB)));
        assert!(matches!(bayer_pattern([[2, 3], [1, 0]]), Ok(CFA::BGGR)));
        assert!(matches!(bayer_pattern([[1, 0], [2, 3]]), Ok(CFA::GRBG)));
        assert!(matches!(bayer_pattern([[1, 2], [0, 1]]), Ok(CFA::GBRG)));
        assert!(bayer_pattern([[0, 0], [1, 2]]).is_err());
    }

    #[test]
    fn test_crop_rejects_empty_area() {
        let crop = Crop::from_rawloader([1, 2, 3, 4]);
        assert_eq!(crop.apply(10, 10), Some((4, 6)));
        assert_eq!(crop.apply(6, 10), None);
        assert_eq!(Crop::default().apply(0, 5), None);
    }

    #[test]
    fn test_normalize_mosaic_crops_and_follows_tile() {
        // 4x3 frame, crop one column from the left and one row from the top
        let samples: Vec<u16> = (0..12).collect();
        let crop = Crop {
            top: 1,
            left: 1,
            ..Crop::default()
        };
        let levels = SensorLevels {
            multipliers: [1.0, 1.0, 0.0, 1.0],
            ..flat_levels()
        };
        // tile: row 0 = [G, B], row 1 = [R, G]
        let out = normalize_mosaic(&samples, 4, crop, 3, 2, &levels, [[1, 2], [0, 1]]);
        assert_eq!(out.len(), 6);
        assert_eq!(out[0], 5);
        assert_eq!(out[1], 0);
        assert_eq!(out[2], 7);
        assert_eq!(out[3], 9);
    }

    #[test]
    fn test_normalize_rgb_keeps_channel_order() {
        let samples: Vec<u16> = vec![1, 2, 3, 4, 5, 6];
        let out = normalize_rgb(&samples, 2, Crop::default(), 2, 1, &flat_levels());
        assert_eq!(out, samples);
    }

    #[test]
    fn test_auto_bright_gain_targets_top_percentile() {
        let mut rgb = vec![1000u16; 990];
        rgb.extend(std::iter::repeat_n(30000u16, 10));
        let gain = auto_bright_gain(&rgb);
        assert!((gain - 65535.0 / 1000.0).abs() < 1e-3);

        assert_eq!(auto_bright_gain(&[0, 0, 0]), 1.0);
    }

    #[test]
    fn test_finish_rgb_is_identity_for_linear16() {
        let rgb = vec![0, 1, 32768, 65535];
        assert_eq!(finish_rgb(rgb.clone(), &DecodeOptions::linear16()), rgb);
    }

    #[test]
    fn test_finish_rgb_requantizes_and_applies_exponent() {
        let options = DecodeOptions {
            output_bits: 8,
            ..DecodeOptions::linear16()
        };
        assert_eq!(finish_rgb(vec![0, 65535], &options), vec![0, 255]);

        let options = DecodeOptions {
            transfer_exponent: 2.0,
            ..DecodeOptions::linear16()
        };
        let out = finish_rgb(vec![16384], &options);
        assert_eq!(out[0], (0.25f32.sqrt() * 65535.0).round() as u16);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let mut options = DecodeOptions::linear16();
        options.output_bits = 12;
        assert!(validate_options(&options).is_err());

        let mut options = DecodeOptions::linear16();
        options.transfer_exponent = 0.0;
        assert!(validate_options(&options).is_err());

        assert!(validate_options(&DecodeOptions::linear16()).is_ok());
    }
}
