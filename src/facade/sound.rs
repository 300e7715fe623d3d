//! Single-clip facades: [`Sound`] and [`Music`]

use std::marker::PhantomData;
use tracing::debug;

use super::{approximately, live_element, with_live_element, PlaybackBuilder, PlaybackSettings};
use crate::backend::AudioBackend;
use crate::clip::Clip;
use crate::element::SourceKind;
use crate::manager::AudioManager;
use crate::pool::SourceHandle;
use crate::spatial::HearDistance;

/// Differences between sound effects and music tracks.
pub trait ClipKind {
    /// Kind tagged on the element (drives the manager's filters).
    const SOURCE_KIND: SourceKind;
    /// Spatial default.
    const SPATIAL: bool;

    /// Resolve a clip for `tag` from the matching collection.
    fn resolve<B: AudioBackend>(manager: &AudioManager<B>, tag: &str) -> Option<Clip>;

    /// Whether `play` on a still-playing facade stops the previous playback.
    fn restarts(looping: bool) -> bool;
}

/// Sound-effect flavour.
#[derive(Debug, Clone, Copy, Default)]
pub struct SfxKind;

/// Music flavour.
#[derive(Debug, Clone, Copy, Default)]
pub struct MusicKind;

impl ClipKind for SfxKind {
    const SOURCE_KIND: SourceKind = SourceKind::Sound;
    const SPATIAL: bool = true;

    fn resolve<B: AudioBackend>(manager: &AudioManager<B>, tag: &str) -> Option<Clip> {
        manager.sfx(tag)
    }

    // One-shots overlap freely; only a loop would otherwise run forever.
    fn restarts(looping: bool) -> bool {
        looping
    }
}

impl ClipKind for MusicKind {
    const SOURCE_KIND: SourceKind = SourceKind::Music;
    const SPATIAL: bool = false;

    fn resolve<B: AudioBackend>(manager: &AudioManager<B>, tag: &str) -> Option<Clip> {
        manager.track(tag)
    }

    fn restarts(_looping: bool) -> bool {
        true
    }
}

/// A tagged clip played on one pooled element.
///
/// Use through the [`Sound`] and [`Music`] aliases.
#[derive(Debug, Clone)]
pub struct ClipFacade<K: ClipKind> {
    tag: String,
    clip: Option<Clip>,
    random_clip: bool,
    settings: PlaybackSettings,
    handle: Option<SourceHandle>,
    kind: PhantomData<K>,
}

/// Sound effect: spatial by default, overlapping one-shots.
pub type Sound = ClipFacade<SfxKind>;

/// Music track: 2D by default, restarts when played again.
pub type Music = ClipFacade<MusicKind>;

impl<K: ClipKind> ClipFacade<K> {
    /// Facade for `tag`; the clip is resolved right away.
    pub fn new<B: AudioBackend>(manager: &AudioManager<B>, tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            clip: K::resolve(manager, tag),
            random_clip: true,
            settings: PlaybackSettings::new(manager, K::SPATIAL),
            handle: None,
            kind: PhantomData,
        }
    }

    /// Set the volume used by the next `play`.
    pub fn set_volume(mut self, volume: f32) -> Self {
        self.settings.volume = volume;
        self
    }

    /// Set the volume and hearing range used by the next `play`.
    pub fn set_volume_with_distance(mut self, volume: f32, hear_distance: HearDistance) -> Self {
        self.settings.volume = volume;
        self.settings.hear_distance = hear_distance;
        self
    }

    /// Switch to another tag.
    pub fn set_clip<B: AudioBackend>(mut self, manager: &AudioManager<B>, tag: &str) -> Self {
        self.tag = tag.to_string();
        self.clip = K::resolve(manager, tag);
        self
    }

    /// Pick a new random alternative of the tag on every `play` (default on).
    pub fn set_random_clip(mut self, random: bool) -> Self {
        self.random_clip = random;
        self
    }

    /// Random pitch from the configured range.
    pub fn set_random_pitch<B: AudioBackend>(mut self, manager: &AudioManager<B>) -> Self {
        self.settings.pitch = manager.random_pitch();
        self
    }

    /// Random pitch in `[min, max)`.
    pub fn set_random_pitch_in<B: AudioBackend>(
        mut self,
        manager: &AudioManager<B>,
        min: f32,
        max: f32,
    ) -> Self {
        self.settings.pitch = manager.random_pitch_in(min, max);
        self
    }

    /// Change the volume, forwarding it to the live element.
    pub fn change_volume<B: AudioBackend>(
        &mut self,
        manager: &mut AudioManager<B>,
        volume: f32,
        lerp_time: f32,
    ) {
        if approximately(self.settings.volume, volume) {
            return;
        }
        self.settings.volume = volume;
        let hear_distance = self.settings.hear_distance;
        with_live_element(manager, self.handle, |el| {
            el.set_volume(volume, hear_distance, lerp_time);
        });
    }

    /// Play, fading in over `fade_in` seconds.
    pub fn play<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_in: f32) {
        if self.is_playing(manager) && K::restarts(self.settings.looping) {
            self.stop(manager, 0.0);
        }

        if self.random_clip {
            self.clip = K::resolve(manager, &self.tag);
        }

        let clip = self.clip.clone();
        let settings = &self.settings;
        self.handle = manager.spawn_source(|el| {
            settings.apply(el, K::SOURCE_KIND);
            el.set_clip(clip);
            el.play(fade_in);
        });
        if let Some(handle) = self.handle {
            debug!("'{}' playing on source {}", self.tag, handle.index());
        }
    }

    /// Pause, fading out over `fade_out` seconds first.
    pub fn pause<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_out: f32) {
        with_live_element(manager, self.handle, |el| el.pause(fade_out));
    }

    /// Resume, fading in over `fade_in` seconds.
    pub fn resume<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_in: f32) {
        with_live_element(manager, self.handle, |el| el.resume(fade_in));
    }

    /// Stop, fading out over `fade_out` seconds first.
    pub fn stop<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_out: f32) {
        with_live_element(manager, self.handle, |el| el.stop(fade_out, None));
    }

    /// True while the element is busy (also when paused).
    pub fn is_using<B: AudioBackend>(&self, manager: &AudioManager<B>) -> bool {
        live_element(manager, self.handle).is_some()
    }

    /// True while audio is produced.
    pub fn is_playing<B: AudioBackend>(&self, manager: &AudioManager<B>) -> bool {
        live_element(manager, self.handle).is_some_and(|el| el.is_playing())
    }

    /// True from a pause request until resume.
    pub fn is_paused<B: AudioBackend>(&self, manager: &AudioManager<B>) -> bool {
        live_element(manager, self.handle).is_some_and(|el| el.is_paused())
    }

    /// Seconds played, excluding pauses.
    pub fn playing_time<B: AudioBackend>(&self, manager: &AudioManager<B>) -> f32 {
        live_element(manager, self.handle).map_or(0.0, |el| el.playing_time())
    }

    /// Position inside the current loop cycle.
    pub fn current_loop_cycle_time<B: AudioBackend>(&self, manager: &AudioManager<B>) -> f32 {
        live_element(manager, self.handle).map_or(0.0, |el| el.current_loop_cycle_time())
    }

    /// Loop cycles completed.
    pub fn completed_loop_cycles<B: AudioBackend>(&self, manager: &AudioManager<B>) -> u32 {
        live_element(manager, self.handle).map_or(0, |el| el.completed_loop_cycles())
    }

    /// Resolved clip.
    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    /// Duration of the resolved clip, 0 without one.
    pub fn clip_duration(&self) -> f32 {
        self.clip.as_ref().map_or(0.0, Clip::duration)
    }

    /// Tag the clip is resolved from.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Handle of the element used by the last `play`.
    pub fn handle(&self) -> Option<SourceHandle> {
        self.handle
    }
}

impl<K: ClipKind> PlaybackBuilder for ClipFacade<K> {
    fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut PlaybackSettings {
        &mut self.settings
    }
}
