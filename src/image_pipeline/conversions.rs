//! Pipeline conversions module
//!
//! This module contains the single-file conversion logic driven by the job runner.

mod converter;
mod rw2_to_exr;


pub use converter::FileConverter;
pub use rw2_to_exr::Rw2ToExrPipeline;
