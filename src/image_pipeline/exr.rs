//! OpenEXR writing module
//!
//! This module provides the linear float buffer handed to encoders and an
//! OpenEXR writer with selectable compression.

mod writer;
mod standard_exr_writer;
pub mod buffer;
pub mod types;

pub use writer::FloatImageEncoder;
pub use standard_exr_writer::ExrFileWriter;
pub use buffer::{ImagePlane, LinearImageBuffer};
pub use types::{ConversionConfig, ConversionConfigBuilder, ExrCompression, FailurePolicy};
