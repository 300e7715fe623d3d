//! Playback notifications
//!
//! Every callback an element fires is mirrored as a [`PlaybackEvent`] queued on
//! the pool. Callers that prefer polling over closures drain them once per
//! frame with [`crate::AudioManager::drain_events`].

use crate::pool::SourceHandle;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackEventKind {
    /// Playback started (on-play).
    Started,
    /// Playback ended, naturally or by a stop request (on-complete).
    Completed,
    /// A looping clip or playlist completed one more cycle.
    LoopCycleCompleted,
    /// A playlist moved on to its next track.
    NextTrackStarted,
    /// A pause was requested (on-pause).
    Paused,
    /// The pause fade finished and the emitter is paused (on-pause-complete).
    PauseCompleted,
    /// Playback resumed (on-resume).
    Resumed,
    /// The element went back to the free pool.
    Stopped,
}

/// Event emitted by a pooled element.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    /// Element that produced the event.
    pub handle: SourceHandle,
    /// Element id at the time of the event.
    pub id: Option<String>,
    /// Event kind.
    pub kind: PlaybackEventKind,
}
