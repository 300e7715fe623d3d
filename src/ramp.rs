//! Linear volume ramps
//!
//! A ramp replaces a per-frame interpolation coroutine: it is a plain value
//! advanced by the owning element's tick.

/// Time-bounded linear interpolation between two volumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRamp {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
    ignore_pause: bool,
}

impl VolumeRamp {
    /// Ramp from `from` to `to` over `duration` seconds.
    ///
    /// Non-positive or non-finite durations produce a ramp that is already
    /// finished and reports `to`.
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            from,
            to,
            elapsed: 0.0,
            duration,
            ignore_pause: false,
        }
    }

    /// Keep running while the owner is paused.
    pub fn ignoring_pause(mut self) -> Self {
        self.ignore_pause = true;
        self
    }

    /// Whether the ramp keeps running while the owner is paused.
    pub fn ignores_pause(&self) -> bool {
        self.ignore_pause
    }

    /// Target volume.
    pub fn target(&self) -> f32 {
        self.to
    }

    /// Seconds left until the target is reached.
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }

    /// True once the ramp reached its target.
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Current interpolated volume.
    pub fn sample(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed / self.duration;
        self.from + (self.to - self.from) * t
    }

    /// Advance by `dt` seconds and return the new volume.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
        self.sample()
    }
}
