//! Patient notification poller.
//!
//! Fetches the patient's notifications once on start, then every
//! `interval` on a background thread. The latest successful snapshot is
//! shared with the dashboard; a failed fetch keeps the previous one.
//! The thread stops when the handle is dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::backend::ClinicBackend;
use crate::models::Notification;

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY: Duration = Duration::from_millis(100);

/// Handle for one patient's polling thread.
pub struct NotificationPoller {
    patient_id: i64,
    latest: Arc<Mutex<Vec<Notification>>>,
    fetches: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl NotificationPoller {
    /// Start polling for `patient_id`.
    pub fn start(backend: Arc<dyn ClinicBackend>, patient_id: i64, interval: Duration) -> Self {
        let latest = Arc::new(Mutex::new(Vec::new()));
        let fetches = Arc::new(AtomicU64::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker = PollWorker {
            backend,
            patient_id,
            interval,
            latest: latest.clone(),
            fetches: fetches.clone(),
            shutdown: shutdown.clone(),
        };
        let handle = std::thread::spawn(move || {
            tracing::debug!(
                patient_id,
                interval_ms = interval.as_millis() as u64,
                "Notification poller started"
            );
            worker.run();
        });

        Self {
            patient_id,
            latest,
            fetches,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn patient_id(&self) -> i64 {
        self.patient_id
    }

    /// Most recent notifications, newest first.
    pub fn latest(&self) -> Vec<Notification> {
        match self.latest.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn unread_count(&self) -> usize {
        self.latest().iter().filter(|n| !n.is_read).count()
    }

    /// Number of completed fetch attempts, successful or not.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Request shutdown. A fetch already in flight completes first.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// Stops the thread and joins it. A fetch in flight is not cancelled, so
/// dropping can block until it returns or hits the client's request timeout.
impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.stop();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

struct PollWorker {
    backend: Arc<dyn ClinicBackend>,
    patient_id: i64,
    interval: Duration,
    latest: Arc<Mutex<Vec<Notification>>>,
    fetches: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
}

impl PollWorker {
    fn run(&self) {
        while !self.shutdown.load(Ordering::Relaxed) {
            self.fetch();
            if !self.sleep_interval() {
                break;
            }
        }
        tracing::debug!(patient_id = self.patient_id, "Notification poller shutting down");
    }

    fn fetch(&self) {
        match self.backend.notifications(self.patient_id) {
            Ok(notifications) => {
                tracing::debug!(
                    patient_id = self.patient_id,
                    count = notifications.len(),
                    "Notifications refreshed"
                );
                match self.latest.lock() {
                    Ok(mut guard) => *guard = notifications,
                    Err(poisoned) => *poisoned.into_inner() = notifications,
                }
            }
            Err(e) => {
                tracing::warn!(patient_id = self.patient_id, error = %e, "Notification fetch failed");
            }
        }
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Sleep in small increments. Returns false when shutdown was requested.
    fn sleep_interval(&self) -> bool {
        let deadline = Instant::now() + self.interval;
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_GRANULARITY.min(deadline - now));
        }
    }
}
