use std::time::Duration;

/// Configuration for the force-directed graph layout.
///
/// Every constant of the simulation is tunable here; the defaults are the
/// values the interactive session UI ships with.
#[derive(Debug, Clone)]
pub struct ForceConfig {
    /// Velocity damping per tick, `velocity *= 1 - viscosity`.
    pub viscosity: f64,
    /// Maximum particle speed per tick.
    pub max_speed: f64,
    /// Velocity kept by the violating component when a particle bounces
    /// off the simulation-space boundary.
    pub restitution: f64,
    /// Width of the simulation space.
    pub width: f64,
    /// Height of the simulation space.
    pub height: f64,
    /// Period of the scheduler worker between two ticks.
    pub tick_period: Duration,
    /// Deadline after which the guard forces the pass to terminate.
    pub guard_timeout: Duration,
    /// Mass of every particle.
    pub mass: f64,
    /// Strength of the spring correction toward the rest length.
    pub spring_impact: f64,
    /// Rest length springs relax toward.
    pub spring_rest: f64,
    /// Strength of the pairwise repulsion, inverse with distance.
    pub repulsion: f64,
    /// Strength of the pull toward the space center, linear with distance.
    pub center_pull: f64,
    /// A particle is stable once `|vx + vy|` drops below this.
    pub stability_epsilon: f64,
    /// Multiplier applied to a prior stable position when a pass continues
    /// from an already laid out snapshot.
    pub continuation_scale: f64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            viscosity: 0.15,
            max_speed: 10.0,
            restitution: 0.9,
            width: 800.0,
            height: 600.0,
            tick_period: Duration::from_millis(38),
            guard_timeout: Duration::from_secs(10),
            mass: 1.0,
            spring_impact: 0.02,
            spring_rest: 40.0,
            repulsion: 8.0,
            center_pull: 0.01,
            stability_epsilon: 0.2,
            continuation_scale: 1.2,
        }
    }
}

/// Configuration for the two-pass tree layout.
#[derive(Debug, Clone)]
pub struct TreeConfig {
    /// Minimum horizontal distance between sibling vertices.
    pub sibling_distance: f64,
    /// Vertical distance between two tree levels.
    pub level_distance: f64,
    /// Margin kept between the canvas origin and the outermost vertices.
    pub margin: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            sibling_distance: 40.0,
            level_distance: 40.0,
            margin: 20.0,
        }
    }
}
