use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use crate::image_pipeline::{ConversionConfig, FileConverter, Result, Rw2ToExrPipeline};
use crate::job::control::{CancellationFlag, SharedJobState};
use crate::job::runner::JobRunner;
use crate::job::types::{
    CompletionEvent, ConversionMode, ConversionTarget, JobEvent, JobState, ProgressEvent,
};

/// A job running on its own worker thread.
///
/// Events arrive in emission order; the stream always ends with exactly one
/// `JobEvent::Completed`, after which `recv` returns `None`.
pub struct JobHandle {
    event_rx: mpsc::Receiver<JobEvent>,
    cancel: CancellationFlag,
    state: SharedJobState,
    worker: Option<JoinHandle<()>>,
    completed: bool,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl JobHandle {
    /// Spawns the worker thread and starts converting `target`.
    pub fn start<C>(target: ConversionTarget, runner: JobRunner<C>) -> Result<Self>
    where
        C: FileConverter + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel();
        let cancel = CancellationFlag::new();
        let state = SharedJobState::default();

        let worker = {
            let cancel = cancel.clone();
            let state = state.clone();
            thread::Builder::new()
                .name("rw2exr-job".to_string())
                .spawn(move || {
                    state.begin();

                    let progress_tx = event_tx.clone();
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        runner.run(&target, &cancel, &mut |event: ProgressEvent| {
                            let _ = progress_tx.send(JobEvent::Progress(event));
                        })
                    }));

                    let completion = outcome.unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        error!("Conversion worker panicked: {}", message);
                        CompletionEvent::failure(format!("conversion worker panicked: {}", message))
                    });

                    state.finish();
                    debug!(succeeded = completion.succeeded, "Delivering completion");
                    let _ = event_tx.send(JobEvent::Completed(completion));
                })?
        };

        Ok(Self {
            event_rx,
            cancel,
            state,
            worker: Some(worker),
            completed: false,
        })
    }

    /// Asks the job to stop before its next file. No-op once finished.
    pub fn request_cancel(&self) {
        if self.state.begin_cancel() {
            debug!("Cancellation requested");
            self.cancel.cancel();
        }
    }

    pub fn state(&self) -> JobState {
        self.state.get()
    }

    pub fn is_finished(&self) -> bool {
        self.state() == JobState::Finished
    }

    /// Blocks for the next event; `None` after the completion event.
    pub fn recv(&mut self) -> Option<JobEvent> {
        if self.completed {
            return None;
        }
        let event = match self.event_rx.recv() {
            Ok(event) => event,
            Err(_) => self.lost_worker(),
        };
        self.completed = event.is_terminal();
        Some(event)
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<JobEvent> {
        if self.completed {
            return None;
        }
        let event = match self.event_rx.try_recv() {
            Ok(event) => event,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => self.lost_worker(),
        };
        self.completed = event.is_terminal();
        Some(event)
    }

    /// Blocking iterator over the remaining events, completion included.
    pub fn events(&mut self) -> impl Iterator<Item = JobEvent> + '_ {
        std::iter::from_fn(move || self.recv())
    }

    /// Drains the stream and joins the worker.
    pub fn wait(mut self) -> CompletionEvent {
        let mut completion = None;
        while let Some(event) = self.recv() {
            if let JobEvent::Completed(done) = event {
                completion = Some(done);
            }
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        completion.unwrap_or_else(|| CompletionEvent::failure("job result was already consumed"))
    }

    fn lost_worker(&self) -> JobEvent {
        error!("Conversion worker exited without a completion event");
        JobEvent::Completed(CompletionEvent::failure(
            "conversion worker exited without reporting completion",
        ))
    }
}

/// Starts a job with the default RW2 to EXR converter.
///
/// An empty `output_path` is treated the same as none.
pub fn start(input_path: &str, output_path: Option<&str>, mode: ConversionMode) -> Result<JobHandle> {
    start_with_config(input_path, output_path, mode, ConversionConfig::default())
}

pub fn start_with_config(
    input_path: &str,
    output_path: Option<&str>,
    mode: ConversionMode,
    config: ConversionConfig,
) -> Result<JobHandle> {
    let target = ConversionTarget::new(input_path, output_path.map(PathBuf::from), mode);
    let policy = config.failure_policy;
    let runner = JobRunner::with_policy(Rw2ToExrPipeline::new(config), policy);
    JobHandle::start(target, runner)
}
