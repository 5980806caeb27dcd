pub mod cloth;
pub mod particle;
pub mod sph;
pub mod spring;

pub use cloth::{Cloth, ClothTriangle};
pub use particle::Particle;
pub use sph::{ParticleSystem, SphParams};
pub use spring::SpringDamper;
