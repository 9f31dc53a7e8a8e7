use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU8, Ordering},
};

use crate::job::types::JobState;

/// Cooperative cancellation request shared between a job and its driver.
///
/// The runner only looks at it between files, so relaxed ordering is enough.
#[derive(Clone, Default, Debug)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Lifecycle of a job, readable from any thread.
#[derive(Clone, Debug)]
pub struct SharedJobState(Arc<AtomicU8>);

impl Default for SharedJobState {
    fn default() -> Self {
        Self(Arc::new(AtomicU8::new(JobState::Idle as u8)))
    }
}

impl SharedJobState {
    pub fn get(&self) -> JobState {
        JobState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Idle -> Running. A cancel that arrived before the worker started wins.
    pub(crate) fn begin(&self) {
        let _ = self.transition(JobState::Idle, JobState::Running);
    }

    /// Idle/Running -> Cancelling. Returns false once the job has finished.
    pub(crate) fn begin_cancel(&self) -> bool {
        self.transition(JobState::Running, JobState::Cancelling)
            || self.transition(JobState::Idle, JobState::Cancelling)
            || self.get() == JobState::Cancelling
    }

    pub(crate) fn finish(&self) {
        self.0.store(JobState::Finished as u8, Ordering::Release);
    }

    fn transition(&self, from: JobState, to: JobState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
