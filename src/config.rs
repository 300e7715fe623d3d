//! Pool-wide playback defaults

use serde::Deserialize;

use crate::spatial::HearDistance;

/// Defaults and tuning knobs shared by every element and facade.
///
/// Use the builder methods or deserialize it from a library manifest.
///
/// ```
/// use audio_pool::AudioPoolConfig;
///
/// let config = AudioPoolConfig::default()
///     .with_initial_pool_size(8)
///     .with_rng_seed(7);
/// assert_eq!(config.initial_pool_size, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioPoolConfig {
    /// Hearing range applied when a facade does not set one.
    pub hear_distance: HearDistance,
    /// Range used by `set_random_pitch()`.
    pub random_pitch_range: (f32, f32),
    /// Seconds before a clip's end at which a fade-out stop must begin.
    pub end_of_clip_guard: f32,
    /// Extra seconds added to every loop-cycle boundary before it counts.
    /// Zero counts a cycle exactly at each multiple of the clip length; engines
    /// that report the boundary late can use the classic 1.0 s.
    pub loop_cycle_slack: f32,
    /// Starting volume of every DynamicMusic layer.
    pub dynamic_track_volume: f32,
    /// Output volume reported when nothing was persisted yet.
    pub default_output_volume: f32,
    /// Clamp applied to output volumes before the dB conversion.
    pub output_volume_range: (f32, f32),
    /// Emitters created up front.
    pub initial_pool_size: usize,
    /// Seed for clip and pitch randomization; OS entropy when unset.
    pub rng_seed: Option<u64>,
    /// Undrained events kept by the pool; the oldest are dropped past this.
    /// Zero disables event recording.
    pub event_queue_capacity: usize,
}

impl Default for AudioPoolConfig {
    fn default() -> Self {
        Self {
            hear_distance: HearDistance::default(),
            random_pitch_range: (0.85, 1.15),
            end_of_clip_guard: 0.05,
            loop_cycle_slack: 0.0,
            dynamic_track_volume: 0.5,
            default_output_volume: 0.5,
            output_volume_range: (0.001, 0.99),
            initial_pool_size: 0,
            rng_seed: None,
            event_queue_capacity: 1024,
        }
    }
}

impl AudioPoolConfig {
    /// Override the default hearing range.
    pub fn with_hear_distance(mut self, min: f32, max: f32) -> Self {
        self.hear_distance = HearDistance::new(min, max);
        self
    }

    /// Override the random pitch range.
    pub fn with_random_pitch_range(mut self, min: f32, max: f32) -> Self {
        self.random_pitch_range = (min.min(max), min.max(max));
        self
    }

    /// Override the end-of-clip guard used by fade-out stops.
    pub fn with_end_of_clip_guard(mut self, seconds: f32) -> Self {
        self.end_of_clip_guard = seconds.max(0.0);
        self
    }

    /// Add slack to every loop-cycle boundary.
    pub fn with_loop_cycle_slack(mut self, seconds: f32) -> Self {
        self.loop_cycle_slack = seconds.max(0.0);
        self
    }

    /// Starting volume of DynamicMusic layers.
    pub fn with_dynamic_track_volume(mut self, volume: f32) -> Self {
        self.dynamic_track_volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Volume reported for outputs that were never saved.
    pub fn with_default_output_volume(mut self, volume: f32) -> Self {
        self.default_output_volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Pre-create this many emitters.
    pub fn with_initial_pool_size(mut self, size: usize) -> Self {
        self.initial_pool_size = size;
        self
    }

    /// Seed clip/pitch randomization for reproducible runs.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Bound the undrained event queue; `0` turns recording off.
    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }

    /// Check ranges that would otherwise produce NaNs or panics.
    pub fn validate(&self) -> crate::Result<()> {
        let (lo, hi) = self.output_volume_range;
        if !(lo > 0.0 && lo <= hi) {
            return Err(crate::AudioPoolError::Config(format!(
                "output_volume_range must satisfy 0 < min <= max, got ({lo}, {hi})"
            )));
        }
        let (pmin, pmax) = self.random_pitch_range;
        if !(pmin.is_finite() && pmax.is_finite() && pmin <= pmax) {
            return Err(crate::AudioPoolError::Config(format!(
                "random_pitch_range must satisfy min <= max, got ({pmin}, {pmax})"
            )));
        }
        if self.hear_distance.min > self.hear_distance.max {
            return Err(crate::AudioPoolError::Config(
                "hear_distance.min must not exceed hear_distance.max".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_values() {
        let config = AudioPoolConfig::default();
        assert_eq!(config.hear_distance, HearDistance::new(3.0, 500.0));
        assert_eq!(config.random_pitch_range, (0.85, 1.15));
        assert_eq!(config.end_of_clip_guard, 0.05);
        assert_eq!(config.loop_cycle_slack, 0.0);
        assert_eq!(config.event_queue_capacity, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn pitch_range_is_ordered() {
        let config = AudioPoolConfig::default().with_random_pitch_range(1.2, 0.8);
        assert_eq!(config.random_pitch_range, (0.8, 1.2));
    }

    #[test]
    fn invalid_output_range_rejected() {
        let config = AudioPoolConfig {
            output_volume_range: (0.0, 1.0),
            ..AudioPoolConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: AudioPoolConfig =
            serde_json::from_str(r#"{ "initial_pool_size": 4 }"#).unwrap();
        assert_eq!(config.initial_pool_size, 4);
        assert_eq!(config.dynamic_track_volume, 0.5);
    }
}
