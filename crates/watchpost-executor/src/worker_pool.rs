use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::job::Job;

/// A fixed-size pool of OS threads consuming jobs from a bounded channel.
/// A long-lived pool fed by a channel, rather than threads re-spawned per
/// batch of work.
pub struct WorkerPool {
    sender: SyncSender<Job>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(size: usize, queue_capacity: usize) -> Self {
        let (sender, receiver) = sync_channel::<Job>(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..size)
            .map(|i| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("watchpost-worker-{i}"))
                    .spawn(move || loop {
                        let job = {
                            let rx = receiver.lock().expect("worker receiver mutex poisoned");
                            rx.recv()
                        };
                        match job {
                            Ok(job) => job(),
                            Err(_) => break,
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self {
            sender,
            handles: Mutex::new(handles),
        }
    }

    /// Try to enqueue `job`, retrying once after a short backoff if the
    /// queue is momentarily full. Returns the job back to the caller if the
    /// pool is saturated or shut down.
    pub fn try_submit(&self, job: Job) -> Result<(), Job> {
        match self.sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(std::sync::mpsc::TrySendError::Full(job)) => {
                thread::sleep(Duration::from_millis(10));
                self.sender.try_send(job).map_err(|e| match e {
                    std::sync::mpsc::TrySendError::Full(job) => job,
                    std::sync::mpsc::TrySendError::Disconnected(job) => job,
                })
            }
            Err(std::sync::mpsc::TrySendError::Disconnected(job)) => Err(job),
        }
    }

    /// Drop the sender (causing every worker's `recv` to return `Err` once
    /// the queue drains) and join every worker thread.
    pub fn shutdown(self) {
        drop(self.sender);
        let mut handles = self.handles.lock().expect("worker handles mutex poisoned");
        for handle in handles.drain(..) {
            let _ = handle.join();
        }
    }
}
