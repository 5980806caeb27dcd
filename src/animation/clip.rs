//! Animation clips: a named time range plus one channel per pose DOF.

use log::{debug, warn};

use crate::animation::channel::Channel;
use crate::animation::pose::Pose;
use crate::errors::{MarrowError, Result};
use crate::io::Tokenizer;

/// A time range and a parallel array of channels, index-aligned to the
/// [`Pose`] DOF layout (root translation ×3, then joint rotations ×3).
#[derive(Debug, Clone, Default)]
pub struct AnimationClip {
    pub start: f32,
    pub end: f32,
    channels: Vec<Channel>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(start: f32, end: f32, channels: Vec<Channel>) -> Self {
        Self {
            start,
            end,
            channels,
        }
    }

    #[inline]
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Evaluates every channel at `time` into the pose.
    ///
    /// A pose whose length does not match the channel count is resized to
    /// match (zero-filled tail) with a logged warning — a recoverable
    /// condition, not a rejection.
    pub fn evaluate(&self, time: f32, pose: &mut Pose) {
        if pose.len() != self.channels.len() {
            warn!(
                "AnimationClip::evaluate - pose has {} DOFs, clip has {} channels; resizing",
                pose.len(),
                self.channels.len()
            );
            pose.resize(self.channels.len());
        }

        for (i, channel) in self.channels.iter().enumerate() {
            pose.set(i, channel.evaluate(time));
        }
    }

    /// Reads an `animation { range <s> <e> numchannels <N> channel{...}×N }`
    /// block from the token stream.
    pub fn load<T: Tokenizer>(tokenizer: &mut T) -> Result<Self> {
        let Some(header) = tokenizer.get_token() else {
            return Err(MarrowError::parse("animation clip: empty input"));
        };
        if header != "animation" {
            return Err(MarrowError::parse(format!(
                "animation clip: expected 'animation', got '{header}'"
            )));
        }

        let mut clip = AnimationClip::default();

        if !tokenizer.find_token("{") {
            return Err(MarrowError::parse("animation clip: missing '{'"));
        }

        loop {
            let Some(token) = tokenizer.get_token() else {
                return Err(MarrowError::parse("animation clip: unexpected end of input"));
            };

            match token.as_str() {
                "range" => {
                    clip.start = tokenizer.get_float();
                    clip.end = tokenizer.get_float();
                }
                "numchannels" => {
                    let num_channels = tokenizer.get_int();
                    if num_channels < 0 {
                        return Err(MarrowError::Load(format!(
                            "animation clip declares {num_channels} channels"
                        )));
                    }
                    clip.channels.reserve(num_channels as usize);
                    for _ in 0..num_channels {
                        if !tokenizer.find_token("channel") {
                            return Err(MarrowError::parse(
                                "animation clip: fewer channel blocks than declared",
                            ));
                        }
                        clip.channels.push(Channel::load(tokenizer)?);
                    }
                }
                "}" => break,
                _ => {
                    warn!("AnimationClip::load - unrecognised token: {token}");
                    tokenizer.skip_line();
                }
            }
        }

        debug!(
            "AnimationClip::load - loaded {} channels over [{}, {}]",
            clip.channels.len(),
            clip.start,
            clip.end
        );
        Ok(clip)
    }
}
