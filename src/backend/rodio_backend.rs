//! Device backend using rodio
//!
//! Every emitter owns one `rodio::Sink` on a shared output stream. Clips
//! carrying samples play through a `SamplesBuffer`; clips without samples play
//! silence for their duration so timing still works.

use super::{AudioBackend, Emitter};
use crate::clip::Clip;
use crate::output::OutputBus;
use crate::spatial::{HearDistance, Position};
use crate::AudioPoolError;
use rodio::buffer::SamplesBuffer;
use rodio::source::Zero;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::time::Duration;
use tracing::{debug, error};

/// Backend playing on the system default output device.
pub struct RodioBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    live: usize,
    listener: Position,
}

impl RodioBackend {
    /// Open the default output device.
    pub fn new() -> crate::Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AudioPoolError::AudioDevice(format!("Failed to create audio stream: {}", e)))?;
        debug!("opened default audio output");
        Ok(Self {
            _stream: stream,
            handle,
            live: 0,
            listener: [0.0; 3],
        })
    }

    /// Listener position used for distance attenuation of emitters created
    /// afterwards.
    pub fn with_listener(mut self, listener: Position) -> Self {
        self.listener = listener;
        self
    }
}

impl AudioBackend for RodioBackend {
    type Emitter = RodioEmitter;

    fn create_emitter(&mut self, name: &str) -> crate::Result<RodioEmitter> {
        self.live += 1;
        Ok(RodioEmitter::new(name, self.handle.clone(), self.listener))
    }

    fn live_emitters(&self) -> Option<usize> {
        Some(self.live)
    }
}

/// One sink on the shared output stream.
pub struct RodioEmitter {
    name: String,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    clip: Option<Clip>,
    volume: f32,
    pitch: f32,
    looping: bool,
    spatial_blend: f32,
    hear_distance: HearDistance,
    output: Option<OutputBus>,
    position: Position,
    listener: Position,
    time: f32,
}

impl RodioEmitter {
    fn new(name: &str, handle: OutputStreamHandle, listener: Position) -> Self {
        Self {
            name: name.to_string(),
            handle,
            sink: None,
            clip: None,
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            spatial_blend: 0.0,
            hear_distance: HearDistance::default(),
            output: None,
            position: [0.0; 3],
            listener,
            time: 0.0,
        }
    }

    /// Emitter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inverse-distance rolloff blended by the spatial factor.
    fn distance_gain(&self) -> f32 {
        if self.spatial_blend <= 0.0 {
            return 1.0;
        }
        let d = self
            .position
            .iter()
            .zip(self.listener.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt();
        let min = self.hear_distance.min.max(f32::EPSILON);
        let attenuation = if d <= min {
            1.0
        } else if d >= self.hear_distance.max {
            min / self.hear_distance.max.max(min)
        } else {
            min / d
        };
        (1.0 - self.spatial_blend) + self.spatial_blend * attenuation
    }

    fn effective_volume(&self) -> f32 {
        let bus = self.output.as_ref().map_or(1.0, OutputBus::linear_gain);
        self.volume * bus * self.distance_gain()
    }

    fn refresh_mix(&self) {
        if let Some(sink) = &self.sink {
            sink.set_volume(self.effective_volume());
            sink.set_speed(self.pitch.max(0.01));
        }
    }

    fn build_source(clip: &Clip, looping: bool) -> Box<dyn Source<Item = f32> + Send> {
        let base: Box<dyn Source<Item = f32> + Send> = match clip.samples() {
            Some(samples) => Box::new(SamplesBuffer::new(
                clip.channels(),
                clip.sample_rate(),
                samples.to_vec(),
            )),
            None => Box::new(
                Zero::<f32>::new(clip.channels(), clip.sample_rate())
                    .take_duration(Duration::from_secs_f32(clip.duration())),
            ),
        };
        if looping {
            Box::new(base.repeat_infinite())
        } else {
            base
        }
    }
}

impl Emitter for RodioEmitter {
    fn play(&mut self) {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.time = 0.0;
        let Some(clip) = &self.clip else {
            return;
        };
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(e) => {
                error!("{}: failed to create audio sink: {}", self.name, e);
                return;
            }
        };
        sink.append(Self::build_source(clip, self.looping));
        self.sink = Some(sink);
        self.refresh_mix();
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn unpause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.time = 0.0;
    }

    fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.empty() && !sink.is_paused())
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn set_clip(&mut self, clip: Option<Clip>) {
        self.stop();
        self.clip = clip;
    }

    fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.refresh_mix();
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
        self.refresh_mix();
    }

    fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_spatial_blend(&mut self, blend: f32) {
        self.spatial_blend = blend.clamp(0.0, 1.0);
        self.refresh_mix();
    }

    fn set_hear_distance(&mut self, distance: HearDistance) {
        self.hear_distance = distance;
        self.refresh_mix();
    }

    fn set_output(&mut self, output: Option<OutputBus>) {
        self.output = output;
        self.refresh_mix();
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
        self.refresh_mix();
    }

    fn advance(&mut self, dt: f32) {
        // Bus gains can change from elsewhere at any time.
        self.refresh_mix();
        if !self.is_playing() || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let duration = self.clip.as_ref().map_or(0.0, Clip::duration);
        self.time += dt * self.pitch.max(0.0);
        if self.looping && duration > 0.0 {
            self.time %= duration;
        } else {
            self.time = self.time.min(duration);
        }
    }
}

impl Drop for RodioEmitter {
    fn drop(&mut self) {
        self.stop();
    }
}
