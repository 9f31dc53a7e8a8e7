//! Shared error types for the conversion pipeline.

pub mod error;

pub use error::{ConversionError, Result};
