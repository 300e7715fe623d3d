//! Positions, hearing ranges and follow targets

use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;

/// World position of an emitter.
pub type Position = [f32; 3];

/// Distance range in which a spatial emitter is audible.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HearDistance {
    /// Distance below which the emitter plays at full volume.
    pub min: f32,
    /// Distance beyond which the emitter is no longer attenuated.
    pub max: f32,
}

impl HearDistance {
    /// Construct a range.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

impl Default for HearDistance {
    fn default() -> Self {
        Self::new(3.0, 500.0)
    }
}

/// Something an emitter can track every tick.
///
/// Returning `None` means the target no longer exists; the element then
/// drops it.
pub trait FollowTarget: Send + Sync {
    /// Current world position.
    fn position(&self) -> Option<Position>;
}

/// Position shared between the game side and any emitters following it.
#[derive(Debug, Clone, Default)]
pub struct SharedPosition(Arc<RwLock<Option<Position>>>);

impl SharedPosition {
    /// New target at `position`.
    pub fn new(position: Position) -> Self {
        Self(Arc::new(RwLock::new(Some(position))))
    }

    /// Move the target.
    pub fn set(&self, position: Position) {
        *self.0.write() = Some(position);
    }

    /// Mark the target as destroyed.
    pub fn despawn(&self) {
        *self.0.write() = None;
    }
}

impl FollowTarget for SharedPosition {
    fn position(&self) -> Option<Position> {
        *self.0.read()
    }
}
