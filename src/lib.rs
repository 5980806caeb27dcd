//! Marrow is the numerical core of an interactive character-animation and
//! physical-simulation sandbox: keyframe curve evaluation with cubic
//! Hermite interpolation and rich extrapolation modes, a joint hierarchy
//! with linear-blend skinning, a mass-spring cloth with aerodynamic drag,
//! and an SPH fluid with pressure/viscosity forces and box boundaries.
//!
//! The crate produces plain numeric buffers (positions, normals,
//! transforms) for an external renderer and consumes brace-delimited text
//! assets through the [`io::Tokenizer`] seam; it never touches a graphics
//! API.

pub mod animation;
pub mod engine;
pub mod errors;
pub mod io;
pub mod physics;
pub mod rig;

pub use animation::{AnimationClip, AnimationPlayer, Channel, Extrapolation, Keyframe, Pose};
pub use engine::Engine;
pub use errors::{MarrowError, Result};
pub use io::{TextTokenizer, Tokenizer};
pub use physics::{Cloth, Particle, ParticleSystem, SphParams, SpringDamper};
pub use rig::{Joint, Rig, Skeleton, Skin};
