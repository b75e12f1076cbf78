//! Dedicated single-consumer task queue
//!
//! Each protocol instance owns one worker thread with its own
//! current-thread tokio runtime. Jobs execute strictly in submission order;
//! a job may block the worker on async sends through the runtime handle it
//! receives. Dropping the executor closes the queue and joins the worker,
//! so every accepted job runs before the owner is gone.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tokio::runtime::Runtime;

type Job = Box<dyn FnOnce(&Runtime) + Send>;

pub(crate) struct SerialExecutor {
    job_tx: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl SerialExecutor {
    /// Start the worker thread. Fails only if the runtime cannot be built.
    pub(crate) fn new(label: String) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (job_tx, job_rx) = mpsc::channel::<Job>();

        let worker = thread::spawn(move || {
            tracing::debug!(label = %label, "protocol worker started");
            while let Ok(job) = job_rx.recv() {
                job(&runtime);
            }
            tracing::debug!(label = %label, "protocol worker shut down");
        });

        Ok(Self {
            job_tx: Some(job_tx),
            worker: Some(worker),
        })
    }

    /// Enqueue a job. Returns `false` if the queue has shut down.
    pub(crate) fn submit<F>(&self, job: F) -> bool
    where
        F: FnOnce(&Runtime) + Send + 'static,
    {
        match &self.job_tx {
            Some(tx) => tx.send(Box::new(job)).is_ok(),
            None => false,
        }
    }
}

impl Drop for SerialExecutor {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain remaining jobs and exit.
        self.job_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("protocol worker panicked");
            }
        }
    }
}
