//! Top-level sandbox context: owns every simulated subsystem and steps
//! them once per frame.

use std::path::Path;

use log::info;

use crate::animation::{AnimationClip, AnimationPlayer};
use crate::errors::Result;
use crate::io::TextTokenizer;
use crate::physics::{Cloth, ParticleSystem};
use crate::rig::{Rig, Skeleton, Skin};

/// The application context. Holds the animation player and whichever
/// subsystems have been loaded or attached; [`Engine::update`] advances all
/// of them with one delta time, so everything stays on the same clock.
///
/// All state lives here explicitly rather than in globals, and the caller
/// owns the single `Engine` for the application's lifetime.
#[derive(Debug, Default)]
pub struct Engine {
    pub player: AnimationPlayer,
    pub rig: Option<Rig>,
    pub cloth: Option<Cloth>,
    pub fluid: Option<ParticleSystem>,

    /// When set, [`Engine::update`] is a no-op and time stands still.
    pub paused: bool,
    time: f32,
    frame_count: u64,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed unpaused simulation time in seconds.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Steps every active subsystem by `dt`. Subsystems that aren't loaded
    /// are skipped; nothing here can halt the frame loop.
    pub fn update(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.time += dt;
        self.frame_count += 1;

        if self.player.clip().is_some() {
            self.player.update(dt, self.rig.as_mut());
        } else if let Some(rig) = &mut self.rig {
            // no clip driving the rig, but manual DOF edits still need to
            // propagate into world matrices and the skin
            rig.skeleton.update();
            if let Some(skin) = &mut rig.skin {
                skin.update(Some(&rig.skeleton));
            }
        }

        if let Some(cloth) = &mut self.cloth {
            cloth.simulate(dt);
        }
        if let Some(fluid) = &mut self.fluid {
            fluid.update(dt);
        }
    }

    /// Loads a `.skel` file and installs it as the rig's skeleton,
    /// preserving any already-loaded skin.
    pub fn load_skeleton(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut tokenizer = TextTokenizer::new(&text);
        let skeleton = Skeleton::load(&mut tokenizer)?;
        info!(
            "Engine::load_skeleton - {} joints from {}",
            skeleton.joint_count(),
            path.display()
        );

        let skin = self.rig.take().and_then(|rig| rig.skin);
        self.rig = Some(Rig::new(skeleton, skin));
        Ok(())
    }

    /// Loads a `.skin` file and binds it to the current skeleton (or to an
    /// empty rig if no skeleton has been loaded yet).
    pub fn load_skin(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut tokenizer = TextTokenizer::new(&text);
        let skin = Skin::load(&mut tokenizer)?;
        info!(
            "Engine::load_skin - {} vertices from {}",
            skin.vertex_count(),
            path.display()
        );

        match &mut self.rig {
            Some(rig) => rig.skin = Some(skin),
            None => self.rig = Some(Rig::new(Skeleton::new(), Some(skin))),
        }
        Ok(())
    }

    /// Loads a `.anim` clip and hands it to the player, rewinding the
    /// playhead to the clip's start.
    pub fn load_clip(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut tokenizer = TextTokenizer::new(&text);
        let clip = AnimationClip::load(&mut tokenizer)?;
        info!(
            "Engine::load_clip - {} channels from {}",
            clip.channels().len(),
            path.display()
        );

        self.player.set_clip(clip);
        Ok(())
    }
}
