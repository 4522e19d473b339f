use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crate::ParallelError;

/// Flags shared between a [`SimulationTask`] and the thread it runs.
#[derive(Clone)]
pub struct TaskSignals {
    running: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
}

impl TaskSignals {
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

// Clears the running flag however the thread body exits, panics included.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A simulation thread together with its running and stop flags.
///
/// The thread's result can only be obtained by consuming the task with
/// [`SimulationTask::join`], so a task can never be restarted without first
/// being joined.
pub struct SimulationTask<T> {
    handle: JoinHandle<T>,
    running: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
}

impl<T: Send + 'static> SimulationTask<T> {
    pub fn spawn<F>(name: String, body: F) -> Result<Self, ParallelError>
    where
        F: FnOnce(TaskSignals) -> T + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let stop = Arc::new(AtomicBool::new(false));
        let signals = TaskSignals {
            running: running.clone(),
            stop: stop.clone(),
        };

        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || {
                let _guard = RunningGuard(signals.running.clone());
                body(signals)
            })
            .map_err(|error| ParallelError::SpawnFailed {
                reason: error.to_string(),
            })?;

        Ok(Self {
            handle,
            running,
            stop,
        })
    }
}

impl<T> SimulationTask<T> {
    /// Whether the thread body is still executing
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the thread has fully exited, so `join` will not block
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Asks the thread to return after its current step
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Waits for the thread and takes its result
    pub fn join(self) -> Result<T, ParallelError> {
        self.handle.join().map_err(|_| ParallelError::TaskPanicked)
    }
}
