mod guard;
mod particle;
mod space;
mod ticker;

pub use guard::LayoutGuard;
pub use particle::{Particle, Spring};
pub use space::{Placement, SimulationSpace};
pub use ticker::{Ticker, TickerState};

use crate::config::ForceConfig;
use crate::error::LayoutError;
use skein_data::Graph;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Graph snapshot shared between the layout worker and its observers.
///
/// Every tick takes the lock, applies one simulation step and releases it,
/// so a renderer holding the same handle never observes a half-applied
/// tick.
pub type SharedGraph = Arc<Mutex<Graph>>;

/// Orchestrates force-directed passes over a session's graph snapshots.
///
/// One pass at a time: starting a new pass terminates the previous worker
/// and joins it before any new particle or spring is built, so no two
/// ticks ever run concurrently and no two passes share a simulation space.
pub struct GraphLayouter {
    config: ForceConfig,
    ticker: Option<Ticker>,
}

impl GraphLayouter {
    pub fn new(config: ForceConfig) -> Self {
        Self {
            config,
            ticker: None,
        }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    /// Whether the current pass's worker is still running.
    pub fn is_running(&self) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|t| t.state() == TickerState::Running)
    }

    /// Start a layout pass over `graph`.
    ///
    /// Returns as soon as the pass is scheduled. `on_done` is invoked
    /// exactly once when the pass converges (naturally or forced by the
    /// guard), on the worker thread; callers needing thread affinity must
    /// re-marshal. A pass replaced by a newer one never reports
    /// completion.
    pub fn layout<F>(
        &mut self,
        graph: &SharedGraph,
        placement: Placement,
        on_done: F,
    ) -> Result<(), LayoutError>
    where
        F: FnOnce() + Send + 'static,
    {
        // Join-before-replace: the previous worker must have fully
        // stopped before this pass touches the shared snapshot.
        if let Some(mut previous) = self.ticker.take() {
            debug!("Replacing a running pass");
            previous.terminate();
            previous.join();
        }

        let config = self.config.clone();
        let mut space = {
            let mut graph = graph.lock().unwrap_or_else(PoisonError::into_inner);
            info!(
                seq = graph.seq(),
                vertices = graph.vertex_count(),
                "Starting force-directed pass"
            );
            SimulationSpace::build(&mut graph, &config, placement)?
        };

        let guard = LayoutGuard::arm(config.guard_timeout, space.forced_handle());
        let shared = Arc::clone(graph);
        let mut ticker = Ticker::new(config.tick_period);
        ticker.start(
            move || {
                let mut graph = shared.lock().unwrap_or_else(PoisonError::into_inner);
                space.tick(&mut graph)
            },
            move || {
                // Dropping the guard cancels the deadline.
                drop(guard);
                on_done();
            },
        )?;
        self.ticker = Some(ticker);
        Ok(())
    }

    /// Stop the current pass, if any, and wait for its worker.
    pub fn terminate(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.terminate();
            ticker.join();
        }
    }

    /// Wait for the current pass to finish on its own.
    pub fn wait(&mut self) {
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.join();
        }
    }
}
