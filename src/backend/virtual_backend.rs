//! Deterministic headless backend
//!
//! Emitters keep a virtual playhead that only moves in [`Emitter::advance`],
//! so playback timing is exactly reproducible. Used by the CLI without a
//! device and by the test suite.

use super::{AudioBackend, Emitter};
use crate::clip::Clip;
use crate::output::OutputBus;
use crate::spatial::{HearDistance, Position};

/// Backend producing [`VirtualEmitter`]s.
#[derive(Debug, Default)]
pub struct VirtualBackend {
    live: usize,
    created: usize,
}

impl VirtualBackend {
    /// New backend with no emitters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every emitter created so far, as if their host objects were
    /// destroyed behind the pool's back.
    pub fn destroy_all(&mut self) {
        self.live = 0;
    }

    /// Total emitters ever created.
    pub fn created(&self) -> usize {
        self.created
    }
}

impl AudioBackend for VirtualBackend {
    type Emitter = VirtualEmitter;

    fn create_emitter(&mut self, name: &str) -> crate::Result<VirtualEmitter> {
        self.live += 1;
        self.created += 1;
        Ok(VirtualEmitter::new(name))
    }

    fn live_emitters(&self) -> Option<usize> {
        Some(self.live)
    }
}

/// Emitter with a virtual playhead.
#[derive(Debug, Clone)]
pub struct VirtualEmitter {
    name: String,
    clip: Option<Clip>,
    started: bool,
    paused: bool,
    time: f32,
    volume: f32,
    pitch: f32,
    looping: bool,
    spatial_blend: f32,
    hear_distance: HearDistance,
    output: Option<OutputBus>,
    position: Position,
    play_count: usize,
}

impl VirtualEmitter {
    /// Fresh, stopped emitter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clip: None,
            started: false,
            paused: false,
            time: 0.0,
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            spatial_blend: 0.0,
            hear_distance: HearDistance::default(),
            output: None,
            position: [0.0; 3],
            play_count: 0,
        }
    }

    /// Emitter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True between pause and unpause.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current pitch.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Whether the clip loops.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Current spatial blend.
    pub fn spatial_blend(&self) -> f32 {
        self.spatial_blend
    }

    /// Current hearing range.
    pub fn hear_distance(&self) -> HearDistance {
        self.hear_distance
    }

    /// Routed output bus.
    pub fn output(&self) -> Option<&OutputBus> {
        self.output.as_ref()
    }

    /// Current position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Volume after the output bus gain.
    pub fn effective_volume(&self) -> f32 {
        let gain = self.output.as_ref().map_or(1.0, OutputBus::linear_gain);
        self.volume * gain
    }

    /// Number of `play()` calls received.
    pub fn play_count(&self) -> usize {
        self.play_count
    }
}

impl Emitter for VirtualEmitter {
    fn play(&mut self) {
        self.time = 0.0;
        self.paused = false;
        self.started = self.clip.is_some();
        self.play_count += 1;
    }

    fn pause(&mut self) {
        if self.started {
            self.paused = true;
        }
    }

    fn unpause(&mut self) {
        self.paused = false;
    }

    fn stop(&mut self) {
        self.started = false;
        self.paused = false;
        self.time = 0.0;
    }

    fn is_playing(&self) -> bool {
        self.started && !self.paused
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn set_clip(&mut self, clip: Option<Clip>) {
        self.clip = clip;
        self.started = false;
        self.paused = false;
        self.time = 0.0;
    }

    fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_spatial_blend(&mut self, blend: f32) {
        self.spatial_blend = blend;
    }

    fn set_hear_distance(&mut self, distance: HearDistance) {
        self.hear_distance = distance;
    }

    fn set_output(&mut self, output: Option<OutputBus>) {
        self.output = output;
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    fn advance(&mut self, dt: f32) {
        if !self.is_playing() || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let Some(duration) = self.clip.as_ref().map(Clip::duration) else {
            self.started = false;
            return;
        };
        self.time += dt * self.pitch.max(0.0);
        if self.time >= duration {
            if self.looping && duration > 0.0 {
                self.time %= duration;
            } else {
                self.time = duration;
                self.started = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn emitter_with(duration: f32) -> VirtualEmitter {
        let mut emitter = VirtualEmitter::new("test");
        emitter.set_clip(Some(Clip::silent("clip", duration)));
        emitter
    }

    #[test]
    fn finishes_at_clip_end() {
        let mut emitter = emitter_with(1.0);
        emitter.play();
        emitter.advance(0.5);
        assert!(emitter.is_playing());
        emitter.advance(0.5);
        assert!(!emitter.is_playing());
        assert_relative_eq!(emitter.time(), 1.0);
    }

    #[test]
    fn looping_wraps_playhead() {
        let mut emitter = emitter_with(1.0);
        emitter.set_loop(true);
        emitter.play();
        emitter.advance(0.75);
        emitter.advance(0.5);
        assert!(emitter.is_playing());
        assert_relative_eq!(emitter.time(), 0.25);
    }

    #[test]
    fn paused_playhead_holds() {
        let mut emitter = emitter_with(2.0);
        emitter.play();
        emitter.advance(0.5);
        emitter.pause();
        emitter.advance(1.0);
        assert_relative_eq!(emitter.time(), 0.5);
        emitter.unpause();
        emitter.advance(0.25);
        assert_relative_eq!(emitter.time(), 0.75);
    }

    #[test]
    fn play_without_clip_does_nothing() {
        let mut emitter = VirtualEmitter::new("empty");
        emitter.play();
        assert!(!emitter.is_playing());
    }

    #[test]
    fn backend_tracks_live_emitters() {
        let mut backend = VirtualBackend::new();
        backend.create_emitter("a").unwrap();
        backend.create_emitter("b").unwrap();
        assert_eq!(backend.live_emitters(), Some(2));
        backend.destroy_all();
        assert_eq!(backend.live_emitters(), Some(0));
        assert_eq!(backend.created(), 2);
    }
}
