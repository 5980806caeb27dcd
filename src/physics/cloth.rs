//! Mass-spring cloth with aerodynamic drag and ground contact.

use glam::Vec3;
use log::debug;

use crate::physics::particle::Particle;
use crate::physics::spring::SpringDamper;

/// Density of air at sea level, kg/m³.
const AIR_DENSITY: f32 = 1.225;
/// Drag coefficient for a flat plate normal to flow.
const FLAT_PLATE_DRAG: f32 = 1.28;

const GROUND_HEIGHT: f32 = 0.0;
const GROUND_RESTITUTION: f32 = 0.05;
const GROUND_FRICTION: f32 = 0.5;

/// A triangle of cloth particles (by index) that turns relative wind into
/// an aerodynamic force on its vertices.
#[derive(Debug, Clone, Copy)]
pub struct ClothTriangle {
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
    pub drag_coefficient: f32,
    pub fluid_density: f32,
}

impl ClothTriangle {
    #[must_use]
    pub fn new(p1: usize, p2: usize, p3: usize) -> Self {
        Self {
            p1,
            p2,
            p3,
            drag_coefficient: FLAT_PLATE_DRAG,
            fluid_density: AIR_DENSITY,
        }
    }

    /// Unit face normal from the winding `p1 → p2 → p3`, or zero when the
    /// triangle is degenerate.
    #[must_use]
    pub fn normal(&self, particles: &[Particle]) -> Vec3 {
        let e1 = particles[self.p2].position - particles[self.p1].position;
        let e2 = particles[self.p3].position - particles[self.p1].position;
        e1.cross(e2).normalize_or_zero()
    }

    /// Accumulates the drag force `-½·ρ·|v|²·c_d·a_eff·n̂` onto the three
    /// vertices, a third each.
    ///
    /// `a_eff` is the face area projected onto the flow direction
    /// (`area · v̂·n̂`). It is deliberately left signed: wind striking the
    /// back face produces suction, which keeps the force continuous as a
    /// triangle flips orientation mid-flutter.
    pub fn apply_aerodynamic_force(&self, particles: &mut [Particle], wind: Vec3) {
        let velocity = (particles[self.p1].velocity
            + particles[self.p2].velocity
            + particles[self.p3].velocity)
            / 3.0
            - wind;
        let speed = velocity.length();
        if speed < 1e-6 {
            return;
        }

        let e1 = particles[self.p2].position - particles[self.p1].position;
        let e2 = particles[self.p3].position - particles[self.p1].position;
        let cross = e1.cross(e2);
        let double_area = cross.length();
        if double_area < 1e-9 {
            debug!(
                "ClothTriangle - degenerate triangle ({}, {}, {})",
                self.p1, self.p2, self.p3
            );
            return;
        }
        let normal = cross / double_area;
        let area = 0.5 * double_area;

        let effective_area = area * (velocity / speed).dot(normal);
        let force = -0.5
            * self.fluid_density
            * speed
            * speed
            * self.drag_coefficient
            * effective_area
            * normal;

        let third = force / 3.0;
        particles[self.p1].apply_force(third);
        particles[self.p2].apply_force(third);
        particles[self.p3].apply_force(third);
    }
}

/// A rectangular cloth grid.
///
/// Particles are laid out row-major (`index = y * width + x`); row 0 is
/// pinned. Spring topology, built once in [`Cloth::new`]:
/// - structural: 4-neighbor edges at `rest = spacing`
/// - shear: both cell diagonals at `rest = spacing·√2`
/// - bend: skip-one edges horizontally, vertically, and along both
///   diagonals (`rest = 2·spacing` and `2·spacing·√2`), with half the
///   spring constant and 1.5× the damping
#[derive(Debug, Clone)]
pub struct Cloth {
    particles: Vec<Particle>,
    springs: Vec<SpringDamper>,
    triangles: Vec<ClothTriangle>,
    width: usize,
    height: usize,
    pub wind: Vec3,
    pub gravity: Vec3,
}

impl Cloth {
    /// Builds a `width × height` grid hanging down the y-axis with row 0
    /// fixed in place. The bottom row starts one grid spacing above the
    /// ground plane so the cloth has room to sag before contact.
    #[must_use]
    pub fn new(
        width: usize,
        height: usize,
        spacing: f32,
        particle_mass: f32,
        spring_constant: f32,
        damping_constant: f32,
    ) -> Self {
        let mut particles = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                #[allow(clippy::cast_precision_loss)]
                let position = Vec3::new(
                    (x as f32 - (width as f32 - 1.0) * 0.5) * spacing,
                    (height - y) as f32 * spacing,
                    0.0,
                );
                let mut p = Particle::new(position, particle_mass);
                p.fixed = y == 0;
                particles.push(p);
            }
        }

        let index = |x: usize, y: usize| y * width + x;
        let mut springs = Vec::new();
        let diagonal_rest = spacing * std::f32::consts::SQRT_2;
        for y in 0..height {
            for x in 0..width {
                // structural
                if x + 1 < width {
                    springs.push(SpringDamper::new(
                        index(x, y),
                        index(x + 1, y),
                        spring_constant,
                        damping_constant,
                        spacing,
                    ));
                }
                if y + 1 < height {
                    springs.push(SpringDamper::new(
                        index(x, y),
                        index(x, y + 1),
                        spring_constant,
                        damping_constant,
                        spacing,
                    ));
                }
                // shear, both diagonals of each cell
                if x + 1 < width && y + 1 < height {
                    springs.push(SpringDamper::new(
                        index(x, y),
                        index(x + 1, y + 1),
                        spring_constant,
                        damping_constant,
                        diagonal_rest,
                    ));
                    springs.push(SpringDamper::new(
                        index(x + 1, y),
                        index(x, y + 1),
                        spring_constant,
                        damping_constant,
                        diagonal_rest,
                    ));
                }
                // bend, skip-one neighbors (horizontal, vertical, and both
                // diagonals); softer and more damped so the cloth resists
                // creasing without turning stiff
                if x + 2 < width {
                    springs.push(SpringDamper::new(
                        index(x, y),
                        index(x + 2, y),
                        spring_constant * 0.5,
                        damping_constant * 1.5,
                        spacing * 2.0,
                    ));
                }
                if y + 2 < height {
                    springs.push(SpringDamper::new(
                        index(x, y),
                        index(x, y + 2),
                        spring_constant * 0.5,
                        damping_constant * 1.5,
                        spacing * 2.0,
                    ));
                }
                if x + 2 < width && y + 2 < height {
                    springs.push(SpringDamper::new(
                        index(x, y),
                        index(x + 2, y + 2),
                        spring_constant * 0.5,
                        damping_constant * 1.5,
                        diagonal_rest * 2.0,
                    ));
                    springs.push(SpringDamper::new(
                        index(x + 2, y),
                        index(x, y + 2),
                        spring_constant * 0.5,
                        damping_constant * 1.5,
                        diagonal_rest * 2.0,
                    ));
                }
            }
        }

        let mut triangles =
            Vec::with_capacity(2 * width.saturating_sub(1) * height.saturating_sub(1));
        for y in 0..height.saturating_sub(1) {
            for x in 0..width.saturating_sub(1) {
                triangles.push(ClothTriangle::new(
                    index(x, y),
                    index(x, y + 1),
                    index(x + 1, y),
                ));
                triangles.push(ClothTriangle::new(
                    index(x + 1, y),
                    index(x, y + 1),
                    index(x + 1, y + 1),
                ));
            }
        }

        Self {
            particles,
            springs,
            triangles,
            width,
            height,
            wind: Vec3::ZERO,
            gravity: Vec3::new(0.0, -9.81, 0.0),
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
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

    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[ClothTriangle] {
        &self.triangles
    }

    #[inline]
    #[must_use]
    pub fn springs(&self) -> &[SpringDamper] {
        &self.springs
    }

    /// Render-facing position buffer, row-major grid order.
    #[must_use]
    pub fn positions(&self) -> Vec<Vec3> {
        self.particles.iter().map(|p| p.position).collect()
    }

    /// Render-facing per-vertex normals, area-averaged over the incident
    /// triangle faces.
    #[must_use]
    pub fn normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.particles.len()];
        for tri in &self.triangles {
            let e1 = self.particles[tri.p2].position - self.particles[tri.p1].position;
            let e2 = self.particles[tri.p3].position - self.particles[tri.p1].position;
            // unnormalized cross weights each face by its area
            let face = e1.cross(e2);
            normals[tri.p1] += face;
            normals[tri.p2] += face;
            normals[tri.p3] += face;
        }
        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        normals
    }

    /// Moves only the pinned particles, for interactive dragging of the
    /// cloth's anchor row.
    pub fn translate_pinned(&mut self, delta: Vec3) {
        for p in &mut self.particles {
            if p.fixed {
                p.position += delta;
            }
        }
    }

    /// One simulation step: gravity, spring forces, aerodynamics,
    /// symplectic-Euler integration, then ground contact.
    pub fn simulate(&mut self, dt: f32) {
        for p in &mut self.particles {
            if !p.fixed {
                let g = self.gravity * p.mass;
                p.apply_force(g);
            }
        }

        for spring in &self.springs {
            spring.apply_force(&mut self.particles);
        }

        for triangle in &self.triangles {
            triangle.apply_aerodynamic_force(&mut self.particles, self.wind);
        }

        for p in &mut self.particles {
            p.integrate(dt);
        }

        self.resolve_ground_contact();
    }

    /// Projects penetrating particles back onto the ground plane, damping
    /// the bounce and scrubbing tangential speed.
    fn resolve_ground_contact(&mut self) {
        for p in &mut self.particles {
            if p.fixed || p.position.y >= GROUND_HEIGHT {
                continue;
            }
            p.position.y = GROUND_HEIGHT;
            if p.velocity.y < 0.0 {
                p.velocity.y = -p.velocity.y * GROUND_RESTITUTION;
            }
            p.velocity.x *= 1.0 - GROUND_FRICTION;
            p.velocity.z *= 1.0 - GROUND_FRICTION;
        }
    }
}
