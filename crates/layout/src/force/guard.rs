use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// One-shot deadline for a force-directed pass.
///
/// The simulator has no analytic convergence proof, so the guard is the
/// only termination guarantee for pathological inputs: when the deadline
/// expires the space's forced-stable flag is flipped and the scheduler
/// observes it at the next tick boundary. An in-flight tick is never
/// preempted.
pub struct LayoutGuard {
    cancel: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl LayoutGuard {
    /// Arm the deadline. `forced` is the flag shared with the pass's
    /// simulation space.
    pub fn arm(timeout: Duration, forced: Arc<AtomicBool>) -> Self {
        let (cancel, expired) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("layout-guard".into())
            .spawn(move || match expired.recv_timeout(timeout) {
                Err(RecvTimeoutError::Timeout) => {
                    warn!("Layout pass hit the {timeout:?} deadline, forcing termination");
                    forced.store(true, Ordering::SeqCst);
                }
                _ => debug!("Layout guard canceled"),
            })
            .expect("spawning the guard thread failed");
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Disarm the deadline. Idempotent; also happens on drop.
    pub fn cancel(&self) {
        let _ = self.cancel.try_send(());
    }
}

impl Drop for LayoutGuard {
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
