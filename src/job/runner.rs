use std::path::Path;

use tracing::{error, info, info_span, warn};

use crate::image_pipeline::{ConversionError, FailurePolicy, FileConverter, Result};
use crate::job::control::CancellationFlag;
use crate::job::resolve::resolve_units;
use crate::job::types::{CompletionEvent, ConversionMode, ConversionTarget, ProgressEvent, ResolvedUnit};

/// Drives a `FileConverter` over every unit of a job, strictly one at a time.
pub struct JobRunner<C: FileConverter> {
    converter: C,
    failure_policy: FailurePolicy,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// floor((index + 1) / total * 100)
fn batch_percent(index: usize, total: usize) -> u8 {
    ((index + 1) * 100 / total.max(1)).min(100) as u8
}

impl<C: FileConverter> JobRunner<C> {
    pub fn new(converter: C) -> Self {
        Self::with_policy(converter, FailurePolicy::default())
    }

    pub fn with_policy(converter: C, failure_policy: FailurePolicy) -> Self {
        Self {
            converter,
            failure_policy,
        }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Runs the whole job on the calling thread.
    ///
    /// Progress goes to `on_progress` in emission order; the returned event is
    /// the job's single terminal result.
    pub fn run(
        &self,
        target: &ConversionTarget,
        cancel: &CancellationFlag,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> CompletionEvent {
        let _span = info_span!("job", mode = ?target.mode, path = %target.path.display()).entered();

        let outcome = match resolve_units(target) {
            Ok(units) => match target.mode {
                ConversionMode::Single => self.run_single(&units[0], on_progress),
                ConversionMode::Batch => self.run_batch(&units, cancel, on_progress),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                info!("Job finished");
                CompletionEvent::success()
            }
            Err(e) => {
                error!("Job failed: {}", e);
                CompletionEvent::from(&e)
            }
        }
    }

    fn run_single(&self, unit: &ResolvedUnit, on_progress: &mut dyn FnMut(ProgressEvent)) -> Result<()> {
        on_progress(ProgressEvent::new(
            0,
            format!("Converting {}...", display_name(&unit.input_file)),
        ));

        match self.converter.convert_file(&unit.input_file, &unit.output_file) {
            Ok(()) => {
                on_progress(ProgressEvent::new(
                    100,
                    format!("Successfully converted to {}", unit.output_file.display()),
                ));
                Ok(())
            }
            Err(e) => {
                on_progress(ProgressEvent::new(0, format!("Error: {}", e)));
                Err(e)
            }
        }
    }

    fn run_batch(
        &self,
        units: &[ResolvedUnit],
        cancel: &CancellationFlag,
        on_progress: &mut dyn FnMut(ProgressEvent),
    ) -> Result<()> {
        let total = units.len();
        let mut failures: Vec<ConversionError> = Vec::new();

        for (i, unit) in units.iter().enumerate() {
            if cancel.is_canceled() {
                info!(completed = i, total, "Batch cancelled");
                break;
            }

            let name = display_name(&unit.input_file);
            on_progress(ProgressEvent::new(
                batch_percent(i, total),
                format!("Converting {}/{}: {}", i + 1, total, name),
            ));

            if let Err(e) = self.converter.convert_file(&unit.input_file, &unit.output_file) {
                match self.failure_policy {
                    FailurePolicy::FailFast => return Err(e),
                    FailurePolicy::ContinueOnError => {
                        warn!(file = %name, "Skipping after failure: {}", e);
                        failures.push(e);
                    }
                }
            }
        }

        if failures.is_empty() {
            return Ok(());
        }

        Err(ConversionError::BatchFailed {
            failed: failures.len(),
            total,
            summary: failures
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_percent_floors() {
        assert_eq!(batch_percent(0, 3), 33);
        assert_eq!(batch_percent(1, 3), 66);
        assert_eq!(batch_percent(2, 3), 100);
        assert_eq!(batch_percent(28, 100), 29);
        assert_eq!(batch_percent(0, 1), 100);
    }

    #[test]
    fn test_display_name_prefers_file_name() {
        assert_eq!(display_name(Path::new("/a/b/P1000001.RW2")), "P1000001.RW2");
        assert_eq!(display_name(Path::new("/")), "/");
    }
}
