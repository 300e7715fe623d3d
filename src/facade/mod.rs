//! Playback facades
//!
//! Facades are the game-facing API: they collect settings through builder
//! calls, then configure and start one or more pooled elements on `play`.
//! A facade never owns an element; it keeps a [`SourceHandle`] and asks the
//! [`AudioManager`] for it on every call, so a handle whose element was
//! released (and possibly handed to someone else) simply stops resolving.
//!
//! | Facade | Elements | Spatial by default |
//! |--------|----------|--------------------|
//! | [`Sound`] | 1 | yes |
//! | [`Music`] | 1 | no |
//! | [`Playlist`] | 1 (queued tracks) | no |
//! | [`DynamicMusic`] | 1 per layer | no |

use std::fmt;
use std::sync::Arc;

use crate::backend::AudioBackend;
use crate::element::{Callbacks, SourceKind, SourcePoolElement};
use crate::manager::AudioManager;
use crate::output::OutputBus;
use crate::pool::SourceHandle;
use crate::spatial::{FollowTarget, HearDistance, Position};

mod dynamic;
mod playlist;
mod sound;

pub use dynamic::DynamicMusic;
pub use playlist::Playlist;
pub use sound::{ClipFacade, ClipKind, Music, MusicKind, SfxKind, Sound};

/// Settings shared by every facade and copied onto elements at play time.
#[derive(Clone)]
pub struct PlaybackSettings {
    /// Target volume (0..1)
    pub volume: f32,
    /// Hearing range
    pub hear_distance: HearDistance,
    /// Pitch / speed
    pub pitch: f32,
    /// Identifier for the manager's per-id controls
    pub id: Option<String>,
    /// Emitter position
    pub position: Position,
    /// Target tracked every tick
    pub follow_target: Option<Arc<dyn FollowTarget>>,
    /// Loop the clip or playlist
    pub looping: bool,
    /// 3D when true
    pub spatial: bool,
    /// Fade-out used when the clip ends
    pub fade_out: f32,
    /// Output bus
    pub output: Option<OutputBus>,
    /// Notification closures
    pub callbacks: Callbacks,
}

impl PlaybackSettings {
    /// Defaults for a facade created against `manager`.
    pub fn new<B: AudioBackend>(manager: &AudioManager<B>, spatial: bool) -> Self {
        Self {
            volume: 1.0,
            hear_distance: manager.config().hear_distance,
            pitch: 1.0,
            id: None,
            position: [0.0; 3],
            follow_target: None,
            looping: false,
            spatial,
            fade_out: 0.0,
            output: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Copy the settings onto a freshly acquired element.
    pub(crate) fn apply<E: crate::backend::Emitter>(
        &self,
        element: &mut SourcePoolElement<E>,
        kind: SourceKind,
    ) {
        element
            .set_kind(kind)
            .set_volume(self.volume, self.hear_distance, 0.0)
            .set_pitch(self.pitch)
            .set_loop(self.looping)
            .set_position(self.position)
            .set_follow_target(self.follow_target.clone())
            .set_spatial(self.spatial)
            .set_fade_out(self.fade_out)
            .set_id(self.id.clone())
            .set_output(self.output.clone())
            .set_callbacks(self.callbacks.clone());
    }
}

impl fmt::Debug for PlaybackSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSettings")
            .field("volume", &self.volume)
            .field("hear_distance", &self.hear_distance)
            .field("pitch", &self.pitch)
            .field("id", &self.id)
            .field("position", &self.position)
            .field("follow_target", &self.follow_target.is_some())
            .field("looping", &self.looping)
            .field("spatial", &self.spatial)
            .field("fade_out", &self.fade_out)
            .field("output", &self.output.as_ref().map(OutputBus::name))
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// Builder methods shared by every facade.
///
/// Implementors only expose their [`PlaybackSettings`]; everything else has a
/// default implementation. Settings take effect on the next `play`.
pub trait PlaybackBuilder: Sized {
    /// Shared settings.
    fn settings(&self) -> &PlaybackSettings;

    /// Shared settings, mutably.
    fn settings_mut(&mut self) -> &mut PlaybackSettings;

    /// Set a fixed pitch.
    fn set_pitch(mut self, pitch: f32) -> Self {
        self.settings_mut().pitch = pitch;
        self
    }

    /// Identify the playback for the manager's per-id controls.
    fn set_id(mut self, id: impl Into<String>) -> Self {
        self.settings_mut().id = Some(id.into());
        self
    }

    /// Loop forever until stopped.
    fn set_loop(mut self, looping: bool) -> Self {
        self.settings_mut().looping = looping;
        self
    }

    /// Place the emitter.
    fn set_position(mut self, position: Position) -> Self {
        self.settings_mut().position = position;
        self
    }

    /// Track `target` every tick until it despawns.
    fn set_follow_target(mut self, target: impl FollowTarget + 'static) -> Self {
        self.settings_mut().follow_target = Some(Arc::new(target));
        self
    }

    /// 3D (`true`) or 2D (`false`) playback.
    fn set_spatial_sound(mut self, spatial: bool) -> Self {
        self.settings_mut().spatial = spatial;
        self
    }

    /// Fade-out used when the clip ends.
    fn set_fade_out(mut self, seconds: f32) -> Self {
        self.settings_mut().fade_out = seconds;
        self
    }

    /// Route to the output bus called `name`; unknown names log a warning
    /// and clear the routing.
    fn set_output<B: AudioBackend>(mut self, manager: &AudioManager<B>, name: &str) -> Self {
        self.settings_mut().output = manager.output(name);
        self
    }

    /// Called when playback starts.
    fn on_play(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.settings_mut().callbacks.on_play = Some(Arc::new(callback));
        self
    }

    /// Called when playback ends, naturally or by `stop`.
    fn on_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.settings_mut().callbacks.on_complete = Some(Arc::new(callback));
        self
    }

    /// Called every completed loop cycle; needs looping.
    fn on_loop_cycle_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.settings_mut().callbacks.on_loop_cycle_complete = Some(Arc::new(callback));
        self
    }

    /// Called on a pause request, before any fade.
    fn on_pause(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.settings_mut().callbacks.on_pause = Some(Arc::new(callback));
        self
    }

    /// Called once the pause fade finished.
    fn on_pause_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.settings_mut().callbacks.on_pause_complete = Some(Arc::new(callback));
        self
    }

    /// Called on resume.
    fn on_resume(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.settings_mut().callbacks.on_resume = Some(Arc::new(callback));
        self
    }

    /// Target volume.
    fn volume(&self) -> f32 {
        self.settings().volume
    }
}

/// Busy element behind an optional handle.
pub(crate) fn live_element<B: AudioBackend>(
    manager: &AudioManager<B>,
    handle: Option<SourceHandle>,
) -> Option<&SourcePoolElement<B::Emitter>> {
    handle
        .filter(|&handle| manager.is_in_use(handle))
        .and_then(|handle| manager.element(handle))
}

/// Run `f` on the busy element behind an optional handle.
pub(crate) fn with_live_element<B: AudioBackend, R>(
    manager: &mut AudioManager<B>,
    handle: Option<SourceHandle>,
    f: impl FnOnce(&mut SourcePoolElement<B::Emitter>) -> R,
) -> Option<R> {
    let handle = handle.filter(|&handle| manager.is_in_use(handle))?;
    manager.with_element(handle, f)
}

/// Float comparison tolerant to rounding noise.
pub(crate) fn approximately(a: f32, b: f32) -> bool {
    (b - a).abs() < (1e-6 * a.abs().max(b.abs())).max(f32::EPSILON * 8.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approximately_tolerates_rounding() {
        assert!(approximately(0.1 + 0.2, 0.3));
        assert!(!approximately(0.5, 0.51));
        assert!(approximately(0.0, 0.0));
    }
}
