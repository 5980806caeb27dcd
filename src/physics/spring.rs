//! Damped springs between particle pairs.

use log::debug;

use crate::physics::particle::Particle;

/// Minimum spring length before the direction becomes meaningless.
const MIN_LENGTH: f32 = 1e-6;

/// A spring-damper connecting two particles by index into the owning
/// container's particle vector. Indices stay valid across reallocation,
/// unlike references.
#[derive(Debug, Clone, Copy)]
pub struct SpringDamper {
    pub p1: usize,
    pub p2: usize,
    pub spring_constant: f32,
    pub damping_constant: f32,
    pub rest_length: f32,
}

impl SpringDamper {
    #[must_use]
    pub fn new(p1: usize, p2: usize, spring_constant: f32, damping_constant: f32, rest_length: f32) -> Self {
        Self {
            p1,
            p2,
            spring_constant,
            damping_constant,
            rest_length,
        }
    }

    /// Accumulates equal-and-opposite spring and damping forces onto both
    /// endpoints. A near-zero-length spring has no defined axis and is
    /// skipped for the step.
    pub fn apply_force(&self, particles: &mut [Particle]) {
        let delta = particles[self.p2].position - particles[self.p1].position;
        let length = delta.length();
        if length < MIN_LENGTH {
            debug!("SpringDamper - degenerate length between {} and {}", self.p1, self.p2);
            return;
        }
        let axis = delta / length;

        let closing_velocity =
            (particles[self.p2].velocity - particles[self.p1].velocity).dot(axis);
        let magnitude = -self.spring_constant * (length - self.rest_length)
            - self.damping_constant * closing_velocity;

        // magnitude is along p2→p1 for positive stretch, so p1 gets -axis
        let force = axis * magnitude;
        particles[self.p1].apply_force(-force);
        particles[self.p2].apply_force(force);
    }
}
