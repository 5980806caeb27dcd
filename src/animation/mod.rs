pub mod channel;
pub mod clip;
pub mod keyframe;
pub mod player;
pub mod pose;

pub use channel::{Channel, Extrapolation, Span};
pub use clip::AnimationClip;
pub use keyframe::{Keyframe, TangentRule};
pub use player::AnimationPlayer;
pub use pose::{Dof, Pose};
