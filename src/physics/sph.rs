//! Smoothed-particle-hydrodynamics fluid: cubic-spline kernels, a stiff
//! equation of state, and box boundary handling.

use glam::Vec3;
use log::debug;
use rand::Rng;

use crate::physics::particle::Particle;

/// Cubic-spline normalization constant, `3 / 2π`.
const SIGMA: f32 = 3.0 / (2.0 * std::f32::consts::PI);

/// Separation below which pair gradients are singular and the pair is
/// skipped.
const MIN_SEPARATION: f32 = 1e-6;

/// Tait equation-of-state exponent. 7 gives stiff, nearly incompressible
/// behavior.
const EOS_GAMMA: i32 = 7;

/// Tuning parameters for the fluid solver.
#[derive(Debug, Clone, Copy)]
pub struct SphParams {
    /// Kernel smoothing radius `h`; the kernel support extends to `2h`.
    pub smoothing_radius: f32,
    pub particle_mass: f32,
    pub rest_density: f32,
    pub viscosity: f32,
    pub gas_constant: f32,
    pub gravity: Vec3,
    pub boundary_stiffness: f32,
    pub boundary_damping: f32,
    pub box_min: Vec3,
    pub box_max: Vec3,
}

impl Default for SphParams {
    fn default() -> Self {
        Self {
            smoothing_radius: 0.1,
            particle_mass: 0.02,
            rest_density: 30.0,
            viscosity: 0.01,
            gas_constant: 1.0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            boundary_stiffness: 10_000.0,
            boundary_damping: 0.5,
            box_min: Vec3::splat(-1.0),
            box_max: Vec3::splat(1.0),
        }
    }
}

/// A blob of fluid particles stepped with brute-force O(n²) neighbor sums.
///
/// [`ParticleSystem::update`] runs the four phases in a strict order:
/// density and pressure, then forces, then integration, then boundary
/// handling. Boundary handling always finishes with a hard position clamp,
/// so no particle ever leaves the box whatever the soft penalty did.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pub params: SphParams,
    particles: Vec<Particle>,
    /// Soft boundary penalty toggle. The hard clamp runs regardless.
    pub soft_boundary: bool,
}

impl ParticleSystem {
    /// Spawns `count` particles as a near-cubic blob in the upper half of
    /// the box, spaced at the smoothing radius with a small jitter to break
    /// the lattice symmetry.
    #[must_use]
    pub fn new(count: usize, params: SphParams) -> Self {
        let mut system = Self {
            params,
            particles: Vec::new(),
            soft_boundary: true,
        };
        system.spawn_blob(count);
        system
    }

    /// Discards the current state and re-seeds the blob with the same
    /// particle count.
    pub fn reset(&mut self) {
        let count = self.particles.len();
        self.spawn_blob(count);
    }

    fn spawn_blob(&mut self, count: usize) {
        let mut rng = rand::thread_rng();

        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
        let side = (count as f32).cbrt().ceil() as usize;
        let side = side.max(1);
        let spacing = self.params.smoothing_radius;
        #[allow(clippy::cast_precision_loss)]
        let half_extent = (side as f32 - 1.0) * spacing * 0.5;
        let center = Vec3::new(
            (self.params.box_min.x + self.params.box_max.x) * 0.5,
            self.params.box_max.y - half_extent - spacing,
            (self.params.box_min.z + self.params.box_max.z) * 0.5,
        );
        let jitter = spacing * 0.1;

        self.particles.clear();
        self.particles.reserve(count);
        'fill: for ix in 0..side {
            for iy in 0..side {
                for iz in 0..side {
                    if self.particles.len() == count {
                        break 'fill;
                    }
                    #[allow(clippy::cast_precision_loss)]
                    let lattice = Vec3::new(ix as f32, iy as f32, iz as f32) * spacing
                        - Vec3::splat(half_extent);
                    let offset = Vec3::new(
                        rng.gen_range(-jitter..jitter),
                        rng.gen_range(-jitter..jitter),
                        rng.gen_range(-jitter..jitter),
                    );
                    self.particles.push(Particle::new(
                        center + lattice + offset,
                        self.params.particle_mass,
                    ));
                }
            }
        }

        debug!(
            "ParticleSystem - seeded blob of {} particles",
            self.particles.len()
        );
    }

    #[inline]
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    #[must_use]
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Render-facing position buffer.
    #[must_use]
    pub fn positions(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.position).collect()
    }

    /// One fluid step. Phase order is load-bearing: forces read the
    /// densities computed this step, and the boundary pass sees
    /// post-integration positions.
    pub fn update(&mut self, dt: f32) {
        self.compute_density_pressure();
        self.compute_forces();
        for p in &mut self.particles {
            p.integrate(dt);
        }
        self.handle_boundary_conditions(dt);
    }

    // ========================================================================
    // Kernels (cubic spline, support 2h)
    // ========================================================================

    /// `W(r, h) = σ/h³ · f(q)`, `q = r/h`, with
    /// `f(q) = 2/3 − q² + q³/2` for `q < 1`, `(2−q)³/6` for `1 ≤ q < 2`.
    #[must_use]
    fn kernel(&self, r: f32) -> f32 {
        let h = self.params.smoothing_radius;
        let q = r / h;
        let f = if q < 1.0 {
            2.0 / 3.0 - q * q + 0.5 * q * q * q
        } else if q < 2.0 {
            let s = 2.0 - q;
            s * s * s / 6.0
        } else {
            return 0.0;
        };
        SIGMA * f / (h * h * h)
    }

    /// `∇W = σ/h⁴ · f'(q) · r̂`, with
    /// `f'(q) = −2q + 3q²/2` for `q < 1`, `−(2−q)²/2` for `1 ≤ q < 2`.
    #[must_use]
    fn kernel_gradient(&self, delta: Vec3, r: f32) -> Vec3 {
        let h = self.params.smoothing_radius;
        let q = r / h;
        let df = if q < 1.0 {
            -2.0 * q + 1.5 * q * q
        } else if q < 2.0 {
            let s = 2.0 - q;
            -0.5 * s * s
        } else {
            return Vec3::ZERO;
        };
        (delta / r) * (SIGMA * df / (h * h * h * h))
    }

    /// Radial Laplacian `∇²W = σ/h⁵ · (f''(q) + 2f'(q)/q)`:
    /// `−6 + 6q` for `q < 1`, `(2−q) − (2−q)²/q` for `1 ≤ q < 2`.
    /// Negative near the center, as the cubic spline's second derivative is.
    #[must_use]
    fn kernel_laplacian(&self, r: f32) -> f32 {
        let h = self.params.smoothing_radius;
        let q = r / h;
        let d2 = if q < 1.0 {
            -6.0 + 6.0 * q
        } else if q < 2.0 {
            let s = 2.0 - q;
            s - s * s / q
        } else {
            return 0.0;
        };
        SIGMA * d2 / (h * h * h * h * h)
    }

    // ========================================================================
    // Solver phases
    // ========================================================================

    /// Brute-force density sums (self-contribution included), then the Tait
    /// equation of state `p = k·((ρ/ρ₀)^γ − 1)` with the tensile branch
    /// clamped to zero.
    fn compute_density_pressure(&mut self) {
        let support = 2.0 * self.params.smoothing_radius;
        let mass = self.params.particle_mass;

        for i in 0..self.particles.len() {
            let mut density = 0.0;
            let xi = self.particles[i].position;
            for j in 0..self.particles.len() {
                let r = (xi - self.particles[j].position).length();
                if r < support {
                    density += mass * self.kernel(r);
                }
            }
            self.particles[i].density = density;

            let ratio = density / self.params.rest_density;
            let pressure = self.params.gas_constant * (ratio.powi(EOS_GAMMA) - 1.0);
            self.particles[i].pressure = pressure.max(0.0);
        }
    }

    /// Pressure, viscosity, and gravity forces. Self-pairs and near-zero
    /// separations are skipped to keep gradients finite.
    fn compute_forces(&mut self) {
        let support = 2.0 * self.params.smoothing_radius;
        let mass = self.params.particle_mass;

        for i in 0..self.particles.len() {
            let pi = &self.particles[i];
            let (xi, vi, rho_i, press_i) = (pi.position, pi.velocity, pi.density, pi.pressure);
            if rho_i < f32::EPSILON {
                continue;
            }

            let mut force = self.params.gravity * mass;
            for j in 0..self.particles.len() {
                if j == i {
                    continue;
                }
                let pj = &self.particles[j];
                let delta = xi - pj.position;
                let r = delta.length();
                if r >= support || r < MIN_SEPARATION || pj.density < f32::EPSILON {
                    continue;
                }

                let grad = self.kernel_gradient(delta, r);
                force -= mass
                    * (press_i / (rho_i * rho_i) + pj.pressure / (pj.density * pj.density))
                    * grad;

                force += self.params.viscosity * mass * (pj.velocity - vi) / pj.density
                    * self.kernel_laplacian(r);
            }

            self.particles[i].force = force;
        }
    }

    /// Soft penalty near the six box faces (when enabled) followed by the
    /// mandatory hard clamp. The clamp runs every step so the domain bound
    /// holds even when the penalty forces are off or overwhelmed.
    fn handle_boundary_conditions(&mut self, dt: f32) {
        if self.soft_boundary {
            let stiffness = self.params.boundary_stiffness;
            let damping = self.params.boundary_damping;
            let (lo, hi) = (self.params.box_min, self.params.box_max);
            for p in &mut self.particles {
                for axis in 0..3 {
                    let x = p.position[axis];
                    let v = p.velocity[axis];
                    if x < lo[axis] {
                        let penetration = lo[axis] - x;
                        p.velocity[axis] += (stiffness * penetration - damping * v) * dt;
                    } else if x > hi[axis] {
                        let penetration = x - hi[axis];
                        p.velocity[axis] -= (stiffness * penetration + damping * v) * dt;
                    }
                }
            }
        }

        self.enforce_hard_boundaries();
    }

    /// Clamps every particle into the box, reflecting and damping the
    /// velocity component that carried it out.
    fn enforce_hard_boundaries(&mut self) {
        let (lo, hi) = (self.params.box_min, self.params.box_max);
        let damping = self.params.boundary_damping;
        for p in &mut self.particles {
            for axis in 0..3 {
                if p.position[axis] < lo[axis] {
                    p.position[axis] = lo[axis];
                    if p.velocity[axis] < 0.0 {
                        p.velocity[axis] = -p.velocity[axis] * damping;
                    }
                } else if p.position[axis] > hi[axis] {
                    p.position[axis] = hi[axis];
                    if p.velocity[axis] > 0.0 {
                        p.velocity[axis] = -p.velocity[axis] * damping;
                    }
                }
            }
        }
    }
}
