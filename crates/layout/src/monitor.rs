use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::trace;

/// Mutual-exclusion gate around a session's current snapshot.
///
/// The orchestration layer takes the gate before it marks the vertices of
/// the current graph as not-yet-stable and hands them to a layouter, and a
/// renderer takes it before reading coordinates, so a half-initialized pass
/// is never observable. This is a gate between subsystems, not a data lock;
/// the snapshot itself is guarded by its own mutex.
///
/// Waiters block on a condition variable, never spin. The guard releases on
/// drop, so a panic during pass setup cannot leave the gate held.
#[derive(Debug, Default)]
pub struct LayoutMonitor {
    held: Mutex<bool>,
    released: Condvar,
}

impl LayoutMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the gate, blocking without bound until the holder releases.
    pub fn lock(&self) -> MonitorGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
        trace!("Layout monitor acquired");
        MonitorGuard { monitor: self }
    }

    /// Acquire the gate, giving up after `timeout`. Unbounded [`Self::lock`]
    /// matches the historical behavior; callers that cannot afford to be
    /// starved by a stuck pass use this instead.
    pub fn lock_timeout(&self, timeout: Duration) -> Option<MonitorGuard<'_>> {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while *held {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (guard, result) = self
                .released
                .wait_timeout(held, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            held = guard;
            if result.timed_out() && *held {
                return None;
            }
        }
        *held = true;
        trace!("Layout monitor acquired (bounded wait)");
        Some(MonitorGuard { monitor: self })
    }
}

/// Holds [`LayoutMonitor`] until dropped.
#[derive(Debug)]
pub struct MonitorGuard<'a> {
    monitor: &'a LayoutMonitor,
}

impl Drop for MonitorGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .monitor
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *held = false;
        self.monitor.released.notify_one();
        trace!("Layout monitor released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use test_log::test;

    #[test]
    fn waiter_blocks_until_holder_releases() {
        let monitor = Arc::new(LayoutMonitor::new());
        let guard = monitor.lock();

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                let _guard = monitor.lock();
                tx.send(()).unwrap();
            })
        };

        // The waiter must not get through while we hold the gate.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        drop(guard);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn bounded_wait_gives_up() {
        let monitor = LayoutMonitor::new();
        let _guard = monitor.lock();
        assert!(monitor.lock_timeout(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn bounded_wait_succeeds_when_free() {
        let monitor = LayoutMonitor::new();
        let guard = monitor.lock_timeout(Duration::from_millis(50));
        assert!(guard.is_some());
        drop(guard);
        // Reacquisition after release must succeed immediately.
        assert!(monitor.lock_timeout(Duration::from_millis(50)).is_some());
    }
}
