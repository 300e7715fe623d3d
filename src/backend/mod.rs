//! Emitter abstraction for pluggable audio outputs
//!
//! The playback state machine never touches samples or devices directly. It
//! drives an [`Emitter`] (one physical audio channel) created by an
//! [`AudioBackend`]. The crate ships a deterministic [`virtual_backend`] used
//! headless and in tests, and a rodio-based device backend behind the
//! `streaming` feature.
//!
//! # Implementing a custom backend
//!
//! ```ignore
//! use audio_pool::backend::{AudioBackend, Emitter};
//!
//! struct MyBackend;
//!
//! impl AudioBackend for MyBackend {
//!     type Emitter = MyEmitter;
//!
//!     fn create_emitter(&mut self, name: &str) -> audio_pool::Result<MyEmitter> {
//!         Ok(MyEmitter::new(name))
//!     }
//! }
//! ```

use crate::clip::Clip;
use crate::output::OutputBus;
use crate::spatial::{HearDistance, Position};

pub mod virtual_backend;

#[cfg(feature = "streaming")]
pub mod rodio_backend;

/// One audio-emission channel.
///
/// Mirrors the minimal engine audio-source surface: transport, clip
/// assignment, mix parameters and a playback-position query.
pub trait Emitter: Send {
    /// Start the assigned clip from the beginning.
    fn play(&mut self);

    /// Pause, keeping the position.
    fn pause(&mut self);

    /// Continue after [`Emitter::pause`].
    fn unpause(&mut self);

    /// Halt and rewind.
    fn stop(&mut self);

    /// True while audio is being produced (false when paused or finished).
    fn is_playing(&self) -> bool;

    /// Position in seconds inside the current clip.
    fn time(&self) -> f32;

    /// Assign or clear the clip.
    fn set_clip(&mut self, clip: Option<Clip>);

    /// Currently assigned clip.
    fn clip(&self) -> Option<&Clip>;

    /// Set the emitter volume (before output bus gain).
    fn set_volume(&mut self, volume: f32);

    /// Current emitter volume.
    fn volume(&self) -> f32;

    /// Set playback speed / pitch factor.
    fn set_pitch(&mut self, pitch: f32);

    /// Loop the assigned clip.
    fn set_loop(&mut self, looping: bool);

    /// 0.0 = 2D, 1.0 = fully 3D.
    fn set_spatial_blend(&mut self, blend: f32);

    /// Distance attenuation range.
    fn set_hear_distance(&mut self, distance: HearDistance);

    /// Route to an output bus (or the master output with `None`).
    fn set_output(&mut self, output: Option<OutputBus>);

    /// Move the emitter.
    fn set_position(&mut self, position: Position);

    /// Advance the backend clock. Device backends may use this to refresh
    /// mix parameters; clock-driven backends move their playhead.
    fn advance(&mut self, _dt: f32) {}
}

/// Factory for emitters.
pub trait AudioBackend {
    /// Emitter type produced by this backend.
    type Emitter: Emitter;

    /// Create a new emitter named `name`.
    fn create_emitter(&mut self, name: &str) -> crate::Result<Self::Emitter>;

    /// Number of emitters created by this backend that still exist, if the
    /// backend can tell. A mismatch with the pool size makes the pool
    /// rebuild itself.
    fn live_emitters(&self) -> Option<usize> {
        None
    }
}
