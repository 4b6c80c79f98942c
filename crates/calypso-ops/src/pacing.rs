use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Inter-command delay source. Bulk drivers pause through this so tests do not sleep.
pub trait Pacer {
    fn pause(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Records requested delays without sleeping
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, delay: Duration) {
        if let Ok(mut p) = self.pauses.lock() {
            p.push(delay);
        }
    }
}
