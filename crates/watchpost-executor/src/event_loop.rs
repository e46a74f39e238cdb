use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::job::Job;

/// One dedicated OS thread running a single-threaded Tokio runtime, used as
/// the back-end for checks declared `Dispatch::Async`. Jobs are still plain
/// closures (check bodies are synchronous Rust) — running them here rather
/// than on the worker pool keeps async-declared checks from competing with
/// the pool for threads and serializes them behind one another, matching
/// the "single event-loop thread" contract.
pub struct EventLoop {
    sender: UnboundedSender<Job>,
    handle: Option<JoinHandle<()>>,
}

impl EventLoop {
    pub fn new() -> Self {
        let (sender, mut receiver) = unbounded_channel::<Job>();

        let handle = thread::Builder::new()
            .name("watchpost-event-loop".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .expect("failed to build event-loop runtime");

                runtime.block_on(async move {
                    while let Some(job) = receiver.recv().await {
                        job();
                    }
                });
            })
            .expect("failed to spawn event-loop thread");

        Self {
            sender,
            handle: Some(handle),
        }
    }

    pub fn submit(&self, job: Job) -> Result<(), Job> {
        self.sender.send(job).map_err(|e| e.0)
    }

    pub fn shutdown(self) {
        // Dropping the sender ends the receiver loop once drained, letting
        // `block_on` return and the thread exit.
        let EventLoop { sender, handle } = self;
        drop(sender);
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
