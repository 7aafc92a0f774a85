//! The scheduled background sync cycle.
//!
//! An explicit recurring task with a fixed interval and a shutdown
//! handle, rather than an implicit timer callback: the engine exposes
//! its state tag, the scheduler owns the thread, and shutdown is a
//! synchronous, observable operation.

use crate::engine::SyncEngine;
use crate::transport::ChangeLogTransport;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

struct Shutdown {
    stop: Mutex<bool>,
    signal: Condvar,
}

impl Shutdown {
    fn new() -> Self {
        Self {
            stop: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    /// Sleeps for the interval or until shutdown. Returns false once
    /// the scheduler should exit.
    fn sleep(&self, interval: Duration) -> bool {
        let mut stop = self.stop.lock();
        if *stop {
            return false;
        }
        self.signal.wait_for(&mut stop, interval);
        !*stop
    }

    fn trigger(&self) {
        *self.stop.lock() = true;
        self.signal.notify_all();
    }
}

/// Drives an engine's cycle on a fixed interval.
///
/// Cycle failures are logged and absorbed: a transient failure simply
/// means this tick did nothing and the next one retries, with queue and
/// checkpoint untouched.
pub struct SyncScheduler {
    shutdown: Arc<Shutdown>,
    handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    /// Starts the background thread. The first cycle runs immediately,
    /// then one per interval.
    pub fn start<T: ChangeLogTransport + 'static>(
        engine: Arc<SyncEngine<T>>,
        interval: Duration,
    ) -> Self {
        let shutdown = Arc::new(Shutdown::new());
        let thread_shutdown = Arc::clone(&shutdown);

        let handle = std::thread::spawn(move || loop {
                match engine.run_cycle() {
                    Ok(report) => {
                        debug!(pushed = report.pushed, pulled = report.pulled, "scheduled cycle ran");
                    }
                    Err(error) if error.is_transient() => {
                        debug!(%error, "scheduled cycle skipped, will retry next tick");
                    }
                    Err(error) => {
                        warn!(%error, "scheduled cycle failed");
                    }
                }

                if !thread_shutdown.sleep(interval) {
                    break;
                }
            });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Stops the scheduler and waits for the thread to exit. A cycle
    /// already in flight finishes first.
    pub fn shutdown(mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        // Signal without joining; dropping mid-cycle must not block.
        self.shutdown.trigger();
    }
}
