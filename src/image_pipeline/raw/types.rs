//! RAW decoding types

/// Interleaved RGB image produced by a `RawDecoder`
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB samples interleaved [R, G, B, R, G, B, ...], row-major
    pub data: Vec<u16>,
    /// Bits per sample of `data` (8 or 16)
    pub bits_per_sample: u32,
}

pub(crate) fn max_for_bits(bits: u32) -> u16 {
    if bits >= 16 {
        u16::MAX
    } else {
        ((1u32 << bits) - 1) as u16
    }
}

/// Output color space requested from the decoder.
///
/// Only the camera's native space is supported; no color matrix is ever applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    Raw,
}

/// White balance applied before demosaicing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WhiteBalance {
    /// As-shot multipliers stored in the file, normalized to green
    #[default]
    Camera,
    /// Sensor values are left unbalanced
    None,
    /// Custom multipliers [r, g, b]
    Custom([f32; 3]),
}

/// Processing options handed to a `RawDecoder`
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    /// Exponent of the output transfer curve; 1.0 keeps the data linear
    pub transfer_exponent: f32,
    /// Stretch the histogram so 1% of samples clip
    pub auto_bright: bool,
    /// Bits per output sample, 8 or 16
    pub output_bits: u8,
    pub color_space: ColorSpace,
    pub white_balance: WhiteBalance,
}

impl DecodeOptions {
    /// Linear, unbrightened, 16-bit output in the sensor's own color space.
    pub fn linear16() -> Self {
        Self {
            transfer_exponent: 1.0,
            auto_bright: false,
            output_bits: 16,
            color_space: ColorSpace::Raw,
            white_balance: WhiteBalance::Camera,
        }
    }

    pub fn is_linear(&self) -> bool {
        (self.transfer_exponent - 1.0).abs() < f32::EPSILON
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::linear16()
    }
}
