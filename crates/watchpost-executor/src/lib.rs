//! Key-deduplicating dispatcher over a worker-thread pool and a single
//! event-loop thread, with rolling statistics and a bounded errored-work
//! buffer. One mutex guards shared state, taken only at
//! submit/start/completion, never while user code runs.

mod event_loop;
mod job;
mod worker_pool;

pub use job::{JobHandle, JobOutcome};

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use watchpost_types::{CheckResult, Dispatch, EngineStatistics, ErroredEntry, WatchpostError};

use event_loop::EventLoop;
use job::{Job, JobState};
use worker_pool::WorkerPool;

const ERRORED_BUFFER_CAPACITY: usize = 100;

/// The work a submission runs: produces the check's normalized results or
/// fails with a taxonomy error.
pub type Work = Box<dyn FnOnce() -> Result<Vec<CheckResult>, WatchpostError> + Send + 'static>;

struct Shared {
    in_flight: Mutex<HashMap<String, Arc<JobState>>>,
    stats: Mutex<EngineStatistics>,
    errored: Mutex<VecDeque<ErroredEntry>>,
}

/// Key-aware concurrent dispatcher. One [`Executor`] owns both back-ends for
/// the lifetime of the engine; cloning an `Executor` is not supported, share
/// it behind an `Arc` instead.
pub struct Executor {
    shared: Arc<Shared>,
    worker_pool: Option<WorkerPool>,
    event_loop: Option<EventLoop>,
    shutdown: Mutex<bool>,
}

impl Executor {
    /// `worker_threads` sized at `2 * num_cpus` by default;
    /// `queue_capacity` bounds the worker pool's backlog before `submit`
    /// rejects with [`WatchpostError::ExecutorSaturated`].
    pub fn new(worker_threads: usize, queue_capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                in_flight: Mutex::new(HashMap::new()),
                stats: Mutex::new(EngineStatistics::default()),
                errored: Mutex::new(VecDeque::new()),
            }),
            worker_pool: Some(WorkerPool::new(worker_threads, queue_capacity)),
            event_loop: Some(EventLoop::new()),
            shutdown: Mutex::new(false),
        }
    }

    pub fn with_default_pool_size() -> Self {
        Self::new(2 * num_cpus::get(), 256)
    }

    /// Submit `work` under `key`. If a job for `key` is already in flight,
    /// returns a handle to that job instead of starting a new one — this is
    /// the executor's whole dedup contract.
    pub fn submit(&self, key: impl Into<String>, dispatch: Dispatch, work: Work) -> Result<JobHandle, WatchpostError> {
        let key = key.into();

        if *self.shutdown.lock().expect("shutdown flag mutex poisoned") {
            return Err(WatchpostError::ExecutorSaturated { key });
        }

        {
            let in_flight = self.shared.in_flight.lock().expect("in-flight map mutex poisoned");
            if let Some(state) = in_flight.get(&key) {
                return Ok(JobHandle::new(Arc::clone(state)));
            }
        }

        let state = JobState::new();
        {
            let mut in_flight = self.shared.in_flight.lock().expect("in-flight map mutex poisoned");
            // Re-check under the same critical section as the insert so two
            // concurrent submits for the same key can never both win.
            if let Some(existing) = in_flight.get(&key) {
                return Ok(JobHandle::new(Arc::clone(existing)));
            }
            in_flight.insert(key.clone(), Arc::clone(&state));
            let mut stats = self.shared.stats.lock().expect("stats mutex poisoned");
            stats.running += 1;
        }

        let job = self.build_job(key.clone(), Arc::clone(&state), work);

        let rejected = match dispatch {
            Dispatch::Sync => self
                .worker_pool
                .as_ref()
                .expect("executor used after shutdown")
                .try_submit(job)
                .is_err(),
            Dispatch::Async => self
                .event_loop
                .as_ref()
                .expect("executor used after shutdown")
                .submit(job)
                .is_err(),
        };

        if rejected {
            self.shared.in_flight.lock().expect("in-flight map mutex poisoned").remove(&key);
            let mut stats = self.shared.stats.lock().expect("stats mutex poisoned");
            stats.running -= 1;
            return Err(WatchpostError::ExecutorSaturated { key });
        }

        Ok(JobHandle::new(state))
    }

    fn build_job(&self, key: String, state: Arc<JobState>, work: Work) -> Job {
        let shared = Arc::clone(&self.shared);
        Box::new(move || {
            let outcome = work();

            {
                let mut in_flight = shared.in_flight.lock().expect("in-flight map mutex poisoned");
                in_flight.remove(&key);
            }
            {
                let mut stats = shared.stats.lock().expect("stats mutex poisoned");
                stats.running = stats.running.saturating_sub(1);
                match &outcome {
                    Ok(_) => stats.completed += 1,
                    Err(_) => stats.errored += 1,
                }
            }
            if let Err(e) = &outcome {
                let mut errored = shared.errored.lock().expect("errored buffer mutex poisoned");
                if errored.len() == ERRORED_BUFFER_CAPACITY {
                    errored.pop_front();
                }
                errored.push_back(ErroredEntry::new(key.clone(), e.to_string(), Utc::now()));
            }

            state.complete(Arc::new(outcome));
        })
    }

    pub fn statistics(&self) -> EngineStatistics {
        *self.shared.stats.lock().expect("stats mutex poisoned")
    }

    /// Most recent entries first, bounded to the last 100.
    pub fn errored_snapshot(&self) -> Vec<ErroredEntry> {
        self.shared
            .errored
            .lock()
            .expect("errored buffer mutex poisoned")
            .iter()
            .rev()
            .cloned()
            .collect()
    }

    /// Stop accepting new work. If `drain`, block until every in-flight job
    /// completes before joining the worker pool and event-loop threads.
    pub fn shutdown(&mut self, drain: bool) {
        *self.shutdown.lock().expect("shutdown flag mutex poisoned") = true;

        if drain {
            loop {
                let empty = self.shared.in_flight.lock().expect("in-flight map mutex poisoned").is_empty();
                if empty {
                    break;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        }

        if let Some(pool) = self.worker_pool.take() {
            pool.shutdown();
        }
        if let Some(event_loop) = self.event_loop.take() {
            event_loop.shutdown();
        }
    }
}
