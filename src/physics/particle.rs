//! Point masses shared by the cloth and fluid simulators.

use glam::Vec3;

/// A point mass with a per-step force accumulator.
///
/// `density` and `pressure` are only meaningful inside the SPH solver;
/// the cloth leaves them at zero.
#[derive(Debug, Clone, Copy)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub force: Vec3,
    pub mass: f32,
    /// Pinned particles ignore integration but still zero their force.
    pub fixed: bool,
    pub density: f32,
    pub pressure: f32,
}

impl Particle {
    #[must_use]
    pub fn new(position: Vec3, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            mass,
            fixed: false,
            density: 0.0,
            pressure: 0.0,
        }
    }

    /// Accumulates a force for the next integration step. Pinned particles
    /// ignore it.
    #[inline]
    pub fn apply_force(&mut self, f: Vec3) {
        if !self.fixed {
            self.force += f;
        }
    }

    /// Symplectic Euler: velocity first, then position from the new
    /// velocity. The force accumulator is consumed (zeroed) either way, so
    /// pinned particles don't accumulate force across steps.
    pub fn integrate(&mut self, dt: f32) {
        if !self.fixed && self.mass > 0.0 {
            self.velocity += (self.force / self.mass) * dt;
            self.position += self.velocity * dt;
        }
        self.force = Vec3::ZERO;
    }
}
