//! Drives clip time and pushes evaluated poses onto a rig each frame.

use log::warn;

use crate::animation::clip::AnimationClip;
use crate::animation::pose::Pose;
use crate::rig::Rig;

/// Owns the playhead, the active clip, and the scratch pose that carries
/// evaluated values to the rig.
///
/// Time is never clamped to the clip range: a playhead outside
/// `[start, end]` simply exercises the channels' extrapolation modes, which
/// allows negative pre-roll starts.
#[derive(Debug, Default)]
pub struct AnimationPlayer {
    pub time: f32,
    clip: Option<AnimationClip>,
    pose: Pose,
}

impl AnimationPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a clip and rewinds the playhead to its start time.
    pub fn set_clip(&mut self, clip: AnimationClip) {
        self.time = clip.start;
        self.pose.resize(clip.channels().len());
        self.clip = Some(clip);
    }

    #[inline]
    #[must_use]
    pub fn clip(&self) -> Option<&AnimationClip> {
        self.clip.as_ref()
    }

    /// The most recently evaluated pose.
    #[inline]
    #[must_use]
    pub fn current_pose(&self) -> &Pose {
        &self.pose
    }

    /// Advances time by `dt`, evaluates the clip, and applies the pose to
    /// the rig. Missing clip or rig degrades to a logged no-op so the frame
    /// loop never halts.
    pub fn update(&mut self, dt: f32, rig: Option<&mut Rig>) {
        let Some(clip) = &self.clip else {
            warn!("AnimationPlayer::update - no clip");
            return;
        };
        let Some(rig) = rig else {
            warn!("AnimationPlayer::update - no rig");
            return;
        };

        self.time += dt;

        if self.pose.len() != clip.channels().len() {
            warn!(
                "AnimationPlayer::update - pose size mismatch ({} vs {})",
                self.pose.len(),
                clip.channels().len()
            );
            self.pose.resize(clip.channels().len());
        }

        clip.evaluate(self.time, &mut self.pose);
        rig.apply_pose(&self.pose);
    }
}
