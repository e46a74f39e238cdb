use std::sync::{Arc, Condvar, Mutex};

use watchpost_types::{CheckResult, WatchpostError};

/// What a job produces: the check's normalized results, or the taxonomy
/// error the engine renders as an UNKNOWN result. Shared via `Arc` rather
/// than cloned so dedup doesn't require `CheckResult: Clone`.
pub type JobOutcome = Result<Vec<CheckResult>, WatchpostError>;

/// The work a pool thread or the event loop actually runs. Type-erased down
/// to a plain closure; the domain-specific outcome is threaded through the
/// closure's captured [`JobState`], not the return type.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared completion slot for one in-flight (or completed) submission.
/// Multiple callers that submitted under the same key hold the same
/// `Arc<JobState>` and block on the same condvar.
pub struct JobState {
    outcome: Mutex<Option<Arc<JobOutcome>>>,
    cvar: Condvar,
}

impl JobState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(None),
            cvar: Condvar::new(),
        })
    }

    pub fn complete(&self, outcome: Arc<JobOutcome>) {
        let mut slot = self.outcome.lock().expect("job state mutex poisoned");
        *slot = Some(outcome);
        self.cvar.notify_all();
    }

    /// Block the calling thread until the job completes.
    pub fn join(&self) -> Arc<JobOutcome> {
        let mut slot = self.outcome.lock().expect("job state mutex poisoned");
        while slot.is_none() {
            slot = self.cvar.wait(slot).expect("job state mutex poisoned");
        }
        slot.clone().expect("outcome set before notify")
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.lock().expect("job state mutex poisoned").is_some()
    }
}

/// A handle returned from [`crate::Executor::submit`]. Cheap to clone;
/// every clone observes the same completion.
#[derive(Clone)]
pub struct JobHandle {
    state: Arc<JobState>,
}

impl JobHandle {
    pub(crate) fn new(state: Arc<JobState>) -> Self {
        Self { state }
    }

    /// Block until the job completes and return its outcome.
    pub fn join(&self) -> Arc<JobOutcome> {
        self.state.join()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }
}
