pub mod joint;
pub mod rig;
pub mod skeleton;
pub mod skin;

pub use joint::Joint;
pub use rig::Rig;
pub use skeleton::Skeleton;
pub use skin::{Skin, SkinVertex, MAX_ATTACHMENTS};
