//! Image processing pipeline module
//!
//! This module converts one RW2 file into one OpenEXR file, with separate
//! modules for RAW decoding, EXR writing, and conversion orchestration.

pub mod raw;
pub mod exr;
pub mod conversions;
pub mod common;

pub use common::{
    ConversionError,
    Result,
};

pub use raw::{
    ColorSpace,
    DecodeOptions,
    DecodedImage,
    RawDecoder,
    RawLoaderDecoder,
    WhiteBalance,
};

pub use self::exr::{
    ConversionConfig,
    ConversionConfigBuilder,
    ExrCompression,
    ExrFileWriter,
    FailurePolicy,
    FloatImageEncoder,
    ImagePlane,
    LinearImageBuffer,
};

pub use conversions::{
    FileConverter,
    Rw2ToExrPipeline,
};
