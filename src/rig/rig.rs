//! Ties a skeleton and an optional skin together behind one pose-driven
//! update.

use log::debug;

use crate::animation::pose::Pose;
use crate::rig::skeleton::Skeleton;
use crate::rig::skin::Skin;

/// A posable character: skeleton plus optional skin.
///
/// [`Rig::apply_pose`] is the single entry point the animation player uses
/// each frame; it routes DOF values into the joints, propagates transforms,
/// and re-deforms the skin.
#[derive(Debug, Default)]
pub struct Rig {
    pub skeleton: Skeleton,
    pub skin: Option<Skin>,
}

impl Rig {
    #[must_use]
    pub fn new(skeleton: Skeleton, skin: Option<Skin>) -> Self {
        Self { skeleton, skin }
    }

    /// Applies a pose and refreshes all derived state.
    ///
    /// DOF layout: indices 0..2 are the root translation, then each joint
    /// `i` (in flattened pre-order) takes indices `3 + 3i .. 3 + 3i + 2`
    /// for its x/y/z rotation. Out-of-range reads yield 0.0, so a short
    /// pose leaves trailing joints at rest.
    pub fn apply_pose(&mut self, pose: &Pose) {
        // root is flattened index 0 by pre-order construction
        if let Some(joint) = self.skeleton.joint_mut(0) {
            joint.set_offset(pose.value(0), pose.value(1), pose.value(2));
        } else {
            debug!("Rig::apply_pose - skeleton has no root");
        }

        for i in 0..self.skeleton.joint_count() {
            let base = 3 + 3 * i;
            let (x, y, z) = (pose.value(base), pose.value(base + 1), pose.value(base + 2));
            if let Some(joint) = self.skeleton.joint_mut(i) {
                joint.set_pose(x, y, z);
            }
        }

        self.skeleton.update();
        if let Some(skin) = &mut self.skin {
            skin.update(Some(&self.skeleton));
        }
    }
}
