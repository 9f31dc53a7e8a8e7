//! Conversion job engine
//!
//! Resolves a single file or a directory of RW2 files into conversion units,
//! drives a `FileConverter` over them on a worker thread and reports progress
//! through an ordered event stream ending in exactly one completion event.

mod control;
mod handle;
mod resolve;
mod runner;
pub mod types;


pub use control::{CancellationFlag, SharedJobState};
pub use handle::{JobHandle, start, start_with_config};
pub use resolve::{discover_raw_files, is_raw_file, resolve_single_output, resolve_units};
pub use runner::JobRunner;
pub use types::{
    CONTAINER_EXTENSION, CompletionEvent, ConversionMode, ConversionTarget, JobEvent, JobState,
    ProgressEvent, RAW_EXTENSION, ResolvedUnit, SUCCESS_MESSAGE,
};
