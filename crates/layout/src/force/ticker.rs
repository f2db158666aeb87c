use crate::error::LayoutError;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerState {
    Idle,
    Running,
    Stopped,
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Periodic scheduler for one layout pass.
///
/// [`Ticker::start`] spawns a dedicated worker that invokes the tick
/// closure at a fixed period until it reports completion or
/// [`Ticker::terminate`] is called; the stop flag is checked between
/// ticks, never mid-tick. On natural completion the `on_done` closure
/// runs exactly once, on the worker thread.
pub struct Ticker {
    period: Duration,
    stop: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            stop: Arc::new(AtomicBool::new(false)),
            state: Arc::new(AtomicU8::new(IDLE)),
            handle: None,
        }
    }

    pub fn state(&self) -> TickerState {
        match self.state.load(Ordering::SeqCst) {
            RUNNING => TickerState::Running,
            STOPPED => TickerState::Stopped,
            _ => TickerState::Idle,
        }
    }

    /// Begin periodic invocation of `tick`. `tick` returns whether the
    /// pass is still running; once it reports completion, `on_done` fires
    /// and the worker stops.
    pub fn start<T, F>(&mut self, mut tick: T, on_done: F) -> Result<(), LayoutError>
    where
        T: FnMut() -> bool + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        if self.state() == TickerState::Running {
            return Err(LayoutError::AlreadyRunning);
        }
        self.stop.store(false, Ordering::SeqCst);
        self.state.store(RUNNING, Ordering::SeqCst);

        let period = self.period;
        let stop = Arc::clone(&self.stop);
        let state = Arc::clone(&self.state);
        let handle = thread::Builder::new()
            .name("layout-ticker".into())
            .spawn(move || {
                let mut on_done = Some(on_done);
                loop {
                    if stop.load(Ordering::SeqCst) {
                        debug!("Ticker terminated");
                        break;
                    }
                    if !tick() {
                        debug!("Pass converged, signaling completion");
                        if let Some(done) = on_done.take() {
                            done();
                        }
                        break;
                    }
                    thread::sleep(period);
                }
                state.store(STOPPED, Ordering::SeqCst);
            })
            .expect("spawning the ticker worker failed");
        self.handle = Some(handle);
        Ok(())
    }

    /// Request the worker to stop at the next tick boundary. Idempotent.
    pub fn terminate(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Wait for the worker to stop, whether by convergence or termination.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.terminate();
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use test_log::test;

    #[test]
    fn runs_until_the_tick_reports_completion() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        let mut ticker = Ticker::new(Duration::from_millis(1));
        assert_eq!(ticker.state(), TickerState::Idle);

        let tick_counter = Arc::clone(&ticks);
        let done_counter = Arc::clone(&done);
        ticker
            .start(
                move || tick_counter.fetch_add(1, Ordering::SeqCst) < 9,
                move || {
                    done_counter.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();

        ticker.join();
        assert_eq!(ticker.state(), TickerState::Stopped);
        assert_eq!(ticks.load(Ordering::SeqCst), 10);
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn terminate_skips_the_completion_callback() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut ticker = Ticker::new(Duration::from_millis(1));

        let done_counter = Arc::clone(&done);
        ticker
            .start(
                || true,
                move || {
                    done_counter.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();
        assert_eq!(ticker.state(), TickerState::Running);

        ticker.terminate();
        ticker.terminate(); // idempotent
        ticker.join();
        assert_eq!(ticker.state(), TickerState::Stopped);
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn starting_twice_while_running_is_rejected() {
        let mut ticker = Ticker::new(Duration::from_millis(1));
        ticker.start(|| true, || ()).unwrap();
        assert_eq!(
            ticker.start(|| true, || ()).unwrap_err(),
            LayoutError::AlreadyRunning
        );
        ticker.terminate();
        ticker.join();
    }
}
