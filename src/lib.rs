//! Pooled audio playback engine
//!
//! Manages a growable pool of audio emitters and the per-emitter playback
//! state machine on top of it: fades, volume/pitch, loop-cycle bookkeeping,
//! playlist sequencing and layered "dynamic" music. Everything is driven by a
//! single per-frame [`AudioManager::tick`] call; there are no threads and no
//! coroutines.
//!
//! # Features
//! - Free-list pool of reusable emitters addressed by generation-checked handles
//! - Linear volume ramps for fade-in, fade-out, pause and track changes
//! - Sound, Music, Playlist and DynamicMusic playback facades
//! - Tag-based clip and output lookup with random clip selection
//! - Output buses with persisted volumes
//! - Deterministic headless backend and optional real device output
//!
//! # Crate feature flags
//! - `wav` (default): WAV clip decoding (`Clip::from_wav_file`, enables `hound`)
//! - `manifest` (default): RON library manifests (`library::manifest`, enables `ron`)
//! - `streaming` (opt-in): Real-time audio output (`backend::rodio_backend`, enables `rodio`)
//!
//! # Quick start
//! ```no_run
//! use audio_pool::{AudioLibrary, AudioManager, Clip, PlaybackBuilder, Sound, VirtualBackend};
//!
//! let mut library = AudioLibrary::new();
//! library.add_sound("laser", vec![Clip::silent("laser_01", 0.4)]);
//!
//! let mut manager = AudioManager::new(VirtualBackend::new(), library);
//! let mut laser = Sound::new(&manager, "laser")
//!     .set_volume(0.8)
//!     .set_random_pitch(&manager)
//!     .on_complete(|| println!("laser done"));
//! laser.play(&mut manager, 0.0);
//!
//! // once per frame
//! manager.tick(1.0 / 60.0);
//! for event in manager.drain_events() {
//!     println!("{event:?}");
//! }
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod backend; // Emitter abstraction + virtual/device backends
pub mod clip; // Audio clip handles
pub mod config; // Pool-wide defaults
pub mod element; // Per-emitter playback state machine
pub mod events; // Playback notifications
pub mod facade; // Sound / Music / Playlist / DynamicMusic
pub mod library; // Tag -> clip collections
pub mod manager; // Registry and global controls
pub mod output; // Output buses
pub mod pool; // Free-list pool
pub mod ramp; // Volume ramps
pub mod settings; // Persisted output volumes
pub mod spatial; // Positions and follow targets

/// Error types for audio pool operations
#[derive(thiserror::Error, Debug)]
pub enum AudioPoolError {
    /// Error decoding an audio clip
    #[error("Failed to load clip '{path}': {reason}")]
    ClipLoad {
        /// Path of the clip that failed to load
        path: String,
        /// Decoder message
        reason: String,
    },

    /// Clip data is unusable (empty, zero channels, ...)
    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    /// Error parsing a library manifest
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Error reading or writing persisted settings
    #[error("Settings error: {0}")]
    Settings(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl AudioPoolError {
    /// Creates a clip load error with path and reason
    pub fn clip_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        AudioPoolError::ClipLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a manifest error
    pub fn manifest(msg: impl Into<String>) -> Self {
        AudioPoolError::Manifest(msg.into())
    }

    /// Creates a settings error
    pub fn settings(msg: impl Into<String>) -> Self {
        AudioPoolError::Settings(msg.into())
    }
}

impl From<String> for AudioPoolError {
    /// Converts a String into `AudioPoolError::Other`.
    ///
    /// Prefer the specific variants (`Manifest`, `Settings`, `AudioDevice`, ...)
    /// where the failure category is known.
    fn from(msg: String) -> Self {
        AudioPoolError::Other(msg)
    }
}

impl From<&str> for AudioPoolError {
    /// Converts a string slice into `AudioPoolError::Other`.
    fn from(msg: &str) -> Self {
        AudioPoolError::Other(msg.to_string())
    }
}

/// Result type for audio pool operations
pub type Result<T> = std::result::Result<T, AudioPoolError>;

// Public API exports
pub use backend::virtual_backend::{VirtualBackend, VirtualEmitter};
pub use backend::{AudioBackend, Emitter};
pub use clip::Clip;
pub use config::AudioPoolConfig;
pub use element::{Callback, Callbacks, SourceKind, SourcePoolElement, SourceState};
pub use events::{PlaybackEvent, PlaybackEventKind};
pub use facade::{DynamicMusic, Music, PlaybackBuilder, PlaybackSettings, Playlist, Sound};
pub use library::{AudioLibrary, SoundData, SoundDataCollection};
pub use manager::AudioManager;
pub use output::{OutputBus, OutputCollection};
pub use pool::{SourceHandle, SourcePool};
pub use ramp::VolumeRamp;
pub use settings::{JsonVolumeStore, MemoryVolumeStore, VolumeStore};
pub use spatial::{FollowTarget, HearDistance, Position, SharedPosition};

#[cfg(feature = "manifest")]
pub use library::manifest::{ClipSource, LibraryManifest};
#[cfg(feature = "streaming")]
pub use backend::rodio_backend::{RodioBackend, RodioEmitter};
