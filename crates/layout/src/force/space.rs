use super::particle::{Particle, Spring};
use crate::config::ForceConfig;
use crate::error::LayoutError;
use crate::geometry::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skein_data::{Graph, ModelError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Distance below which two particles are treated as coincident, to keep
/// force directions well-defined.
const MIN_DISTANCE: f64 = 0.01;

/// How initial particle positions are drawn.
#[derive(Debug, Clone, Copy, Default)]
pub enum Placement {
    /// Uniform-random inside the simulation space.
    #[default]
    Random,
    /// Fixed-seed stream, so replays and tests reproduce the same layout.
    Seeded(u64),
}

/// Bounded 2D region holding all particles and springs of one pass.
///
/// Built fresh for every pass from a [`Graph`] snapshot and dropped when
/// the pass ends; vertex coordinates are written through on every tick.
pub struct SimulationSpace {
    config: ForceConfig,
    particles: Vec<Particle>,
    springs: Vec<Spring>,
    /// Flipped by the layout guard when the deadline expires.
    forced_stable: Arc<AtomicBool>,
    stable: bool,
}

impl SimulationSpace {
    /// Build the pass-local state for `graph`.
    ///
    /// Pinned vertices get no particle and no incident springs. Non-pinned
    /// vertices start from a prior stable position scaled by the
    /// continuation factor, or from a drawn point otherwise; their `stable`
    /// flag is cleared for the duration of the pass.
    pub fn build(
        graph: &mut Graph,
        config: &ForceConfig,
        placement: Placement,
    ) -> Result<Self, LayoutError> {
        if let Err(ModelError::DanglingEdge(id) | ModelError::DuplicateVertex(id)) =
            graph.validate()
        {
            return Err(LayoutError::DanglingEdge(id));
        }

        let mut rng = match placement {
            Placement::Random => StdRng::from_entropy(),
            Placement::Seeded(seed) => StdRng::seed_from_u64(seed),
        };

        let mut particles = Vec::new();
        let mut index = HashMap::new();
        for vertex in graph.vertices_mut() {
            if vertex.pinned {
                continue;
            }
            let position = if vertex.stable {
                // Soft continuation from the previous pass.
                Vec2::new(vertex.x, vertex.y) * config.continuation_scale
            } else {
                Vec2::new(
                    rng.gen_range(0.0..config.width),
                    rng.gen_range(0.0..config.height),
                )
            };
            vertex.stable = false;
            index.insert(vertex.id, particles.len());
            particles.push(Particle::new(vertex.id, position, config.mass));
        }

        let mut springs = Vec::new();
        for edge in graph.edges() {
            let (Some(&a), Some(&b)) = (index.get(&edge.from), index.get(&edge.to)) else {
                // At least one endpoint is pinned; its coordinates are
                // authoritative, so the edge exerts no force.
                continue;
            };
            if a == b {
                continue;
            }
            springs.push(Spring {
                a,
                b,
                rest: config.spring_rest,
                impact: config.spring_impact,
            });
        }

        debug!(
            particles = particles.len(),
            springs = springs.len(),
            "Built simulation space for graph {}",
            graph.seq()
        );

        Ok(Self {
            config: config.clone(),
            particles,
            springs,
            forced_stable: Arc::new(AtomicBool::new(false)),
            stable: false,
        })
    }

    /// Handle the layout guard uses to force termination.
    pub fn forced_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.forced_stable)
    }

    /// True once every particle has settled, or the guard fired.
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    /// Advance the simulation by one step and write the new positions back
    /// into `graph`. Returns whether the pass is still running.
    pub fn tick(&mut self, graph: &mut Graph) -> bool {
        if self.stable {
            return false;
        }
        let cfg = &self.config;
        let center = Vec2::new(cfg.width / 2.0, cfg.height / 2.0);

        for particle in &mut self.particles {
            particle.acceleration = Vec2::zero();
        }

        // Spring corrections toward the rest length.
        for spring in &self.springs {
            let (dir, dist) =
                separation(self.particles[spring.a].position, self.particles[spring.b].position);
            let correction = dir * ((dist - spring.rest) * spring.impact);
            let (a, b) = (spring.a, spring.b);
            let mass_a = self.particles[a].mass;
            let mass_b = self.particles[b].mass;
            self.particles[a].acceleration += correction * (1.0 / mass_a);
            self.particles[b].acceleration -= correction * (1.0 / mass_b);
        }

        // Pairwise repulsion, inverse with distance.
        for i in 0..self.particles.len() {
            for j in i + 1..self.particles.len() {
                let (dir, dist) =
                    separation(self.particles[i].position, self.particles[j].position);
                let push = dir * (cfg.repulsion / dist);
                let mass_i = self.particles[i].mass;
                let mass_j = self.particles[j].mass;
                self.particles[i].acceleration -= push * (1.0 / mass_i);
                self.particles[j].acceleration += push * (1.0 / mass_j);
            }
        }

        for particle in &mut self.particles {
            // Gentle pull toward the center keeps disconnected components
            // from drifting out of the space.
            particle.acceleration +=
                (center - particle.position) * (cfg.center_pull / particle.mass);

            particle.velocity = particle.velocity * (1.0 - cfg.viscosity);
            particle.velocity += particle.acceleration;
            particle.position += particle.velocity;
            particle.velocity = particle.velocity.clamped(cfg.max_speed);

            reflect(particle, cfg);

            particle.stable = particle.velocity.sum().abs() < cfg.stability_epsilon;
            trace!(
                vertex = particle.vertex.0,
                x = particle.position.x,
                y = particle.position.y,
                stable = particle.stable,
                "tick"
            );
        }

        let forced = self.forced_stable.load(Ordering::SeqCst);
        self.stable = forced || self.particles.iter().all(|p| p.stable);
        if self.stable {
            debug!(forced, "Simulation space settled");
        }

        // Write-through on every tick, stable or not, so observers can
        // animate the relaxation.
        for particle in &self.particles {
            if let Some(vertex) = graph.vertex_mut(particle.vertex) {
                vertex.x = particle.position.x;
                vertex.y = particle.position.y;
                vertex.stable = particle.stable || self.stable;
            }
        }

        !self.stable
    }
}

/// Unit direction from `a` to `b` and their distance, with coincident
/// points resolved to a fixed axis at `MIN_DISTANCE`.
fn separation(a: Vec2, b: Vec2) -> (Vec2, f64) {
    let delta = b - a;
    let dist = delta.length();
    if dist < MIN_DISTANCE {
        (Vec2::new(1.0, 0.0), MIN_DISTANCE)
    } else {
        (delta * (1.0 / dist), dist)
    }
}

/// Inelastic bounce off the space boundary: clamp to the wall and invert
/// the violating velocity component, scaled by the restitution factor.
fn reflect(particle: &mut Particle, cfg: &ForceConfig) {
    if particle.position.x < 0.0 {
        particle.position.x = 0.0;
        particle.velocity.x = -particle.velocity.x * cfg.restitution;
    } else if particle.position.x > cfg.width {
        particle.position.x = cfg.width;
        particle.velocity.x = -particle.velocity.x * cfg.restitution;
    }
    if particle.position.y < 0.0 {
        particle.position.y = 0.0;
        particle.velocity.y = -particle.velocity.y * cfg.restitution;
    } else if particle.position.y > cfg.height {
        particle.position.y = cfg.height;
        particle.velocity.y = -particle.velocity.y * cfg.restitution;
    }
}
