use crate::geometry::Vec2;
use skein_data::VertexId;

/// Physics proxy for one non-pinned vertex during a single pass.
///
/// Particles are pass-local: they are built when the pass starts and
/// dropped with the simulation space; only positions and stability flags
/// flow back into the owning vertex.
#[derive(Debug, Clone)]
pub struct Particle {
    pub vertex: VertexId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub mass: f64,
    pub stable: bool,
}

impl Particle {
    pub fn new(vertex: VertexId, position: Vec2, mass: f64) -> Self {
        Self {
            vertex,
            position,
            velocity: Vec2::zero(),
            acceleration: Vec2::zero(),
            mass,
            stable: false,
        }
    }
}

/// Attractive constraint between two particles, derived from one graph
/// edge whose endpoints are both simulated.
#[derive(Debug, Clone, Copy)]
pub struct Spring {
    /// Indices into the simulation space's particle list.
    pub a: usize,
    pub b: usize,
    pub rest: f64,
    pub impact: f64,
}
