// Background storage refresh delivering results to the UI thread

use crate::models::DriveInfo;
use crate::probe::disk_scanner::DriveEnumerator;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

/// Runs storage enumerations off the UI thread.
///
/// Each request gets its own worker. Workers are never cancelled; whichever
/// result arrives last is the one the UI keeps.
pub struct StorageRefresher {
    tx: Sender<Vec<DriveInfo>>,
    rx: Receiver<Vec<DriveInfo>>,
    in_flight: usize,
}

impl Default for StorageRefresher {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageRefresher {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx, in_flight: 0 }
    }

    /// Starts an enumeration in a background thread.
    ///
    /// # Arguments
    /// * `scanner` - enumerator to run
    /// * `notify` - called from the worker once the result is queued,
    ///   typically `ctx.request_repaint()`
    pub fn request<F>(&mut self, scanner: Arc<dyn DriveEnumerator>, notify: F)
    where
        F: Fn() + Send + 'static,
    {
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("storage-refresh".into())
            .spawn(move || {
                let drives = scanner.enumerate();
                if tx.send(drives).is_ok() {
                    notify();
                }
            });
        match spawned {
            Ok(_) => self.in_flight += 1,
            Err(e) => tracing::warn!("failed to start storage refresh: {}", e),
        }
    }

    /// Drains delivered results and returns the most recent one, if any.
    pub fn poll(&mut self) -> Option<Vec<DriveInfo>> {
        let mut latest = None;
        while let Ok(drives) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            latest = Some(drives);
        }
        latest
    }

    /// Whether any worker has not delivered yet.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}
