//! Job targets and the events a running job emits

use std::fmt;
use std::path::PathBuf;

use crate::image_pipeline::ConversionError;

/// Extension of the raw inputs, matched case-insensitively.
pub const RAW_EXTENSION: &str = "rw2";

/// Extension given to every output file.
pub const CONTAINER_EXTENSION: &str = "exr";

pub const SUCCESS_MESSAGE: &str = "Conversion completed successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMode {
    /// `path` is one raw file
    #[default]
    Single,
    /// `path` is a directory of raw files
    Batch,
}

/// What a job converts and where the results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTarget {
    pub path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub mode: ConversionMode,
}

impl ConversionTarget {
    pub fn new(path: impl Into<PathBuf>, output_path: Option<PathBuf>, mode: ConversionMode) -> Self {
        Self {
            path: path.into(),
            // An empty output means "next to the input"
            output_path: output_path.filter(|p| !p.as_os_str().is_empty()),
            mode,
        }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self::new(path, None, ConversionMode::Single)
    }

    pub fn batch(path: impl Into<PathBuf>) -> Self {
        Self::new(path, None, ConversionMode::Batch)
    }

    pub fn with_output(mut self, output_path: impl Into<PathBuf>) -> Self {
        let output_path = output_path.into();
        self.output_path = (!output_path.as_os_str().is_empty()).then_some(output_path);
        self
    }
}

/// One concrete input to output mapping within a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 0..=100
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub succeeded: bool,
    pub message: String,
}

impl CompletionEvent {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(error: impl fmt::Display) -> Self {
        Self {
            succeeded: false,
            message: format!("Error: {}", error),
        }
    }
}

impl From<&ConversionError> for CompletionEvent {
    fn from(error: &ConversionError) -> Self {
        Self::failure(error)
    }
}

/// Everything a job delivers to its subscriber, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Progress(ProgressEvent),
    Completed(CompletionEvent),
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Completed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JobState {
    Idle = 0,
    Running = 1,
    Cancelling = 2,
    Finished = 3,
}

impl JobState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => JobState::Idle,
            1 => JobState::Running,
            2 => JobState::Cancelling,
            _ => JobState::Finished,
        }
    }
}
