//! Layered music played in lock-step

use super::{approximately, live_element, with_live_element, PlaybackBuilder, PlaybackSettings};
use crate::backend::AudioBackend;
use crate::clip::Clip;
use crate::element::{Callbacks, SourceKind};
use crate::manager::AudioManager;
use crate::pool::SourceHandle;
use crate::spatial::HearDistance;

#[derive(Debug, Clone)]
struct Layer {
    tag: String,
    clip: Option<Clip>,
    volume: f32,
    hear_distance: HearDistance,
    handle: Option<SourceHandle>,
}

/// Several music tracks started together, one element each, with
/// independent volumes.
///
/// The first layer is the timing reference: transport queries read it and
/// only it carries the callbacks.
#[derive(Debug, Clone)]
pub struct DynamicMusic {
    layers: Vec<Layer>,
    settings: PlaybackSettings,
}

impl DynamicMusic {
    /// One layer per music tag, each starting at the configured layer volume.
    pub fn new<B, I, S>(manager: &AudioManager<B>, tags: I) -> Self
    where
        B: AudioBackend,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let config = manager.config();
        let layers = tags
            .into_iter()
            .map(|tag| {
                let tag = tag.as_ref();
                Layer {
                    tag: tag.to_string(),
                    clip: manager.track(tag),
                    volume: config.dynamic_track_volume,
                    hear_distance: config.hear_distance,
                    handle: None,
                }
            })
            .collect();
        Self {
            layers,
            settings: PlaybackSettings::new(manager, false),
        }
    }

    /// Same volume for every layer.
    pub fn set_all_volumes(mut self, volume: f32) -> Self {
        for layer in &mut self.layers {
            layer.volume = volume;
        }
        self
    }

    /// Same volume and hearing range for every layer.
    pub fn set_all_volumes_with_distance(mut self, volume: f32, hear_distance: HearDistance) -> Self {
        for layer in &mut self.layers {
            layer.volume = volume;
            layer.hear_distance = hear_distance;
        }
        self
    }

    /// Volume of the layer playing `tag`.
    pub fn set_track_volume(mut self, tag: &str, volume: f32) -> Self {
        for layer in self.layers.iter_mut().filter(|l| l.tag == tag) {
            layer.volume = volume;
        }
        self
    }

    /// Volume and hearing range of the layer playing `tag`.
    pub fn set_track_volume_with_distance(
        mut self,
        tag: &str,
        volume: f32,
        hear_distance: HearDistance,
    ) -> Self {
        for layer in self.layers.iter_mut().filter(|l| l.tag == tag) {
            layer.volume = volume;
            layer.hear_distance = hear_distance;
        }
        self
    }

    /// Change every layer's volume, forwarding to live elements.
    pub fn change_all_volumes<B: AudioBackend>(
        &mut self,
        manager: &mut AudioManager<B>,
        volume: f32,
        lerp_time: f32,
    ) {
        for layer in &mut self.layers {
            change_layer_volume(manager, layer, volume, lerp_time);
        }
    }

    /// Change the volume of the layer playing `tag`.
    pub fn change_track_volume<B: AudioBackend>(
        &mut self,
        manager: &mut AudioManager<B>,
        tag: &str,
        volume: f32,
        lerp_time: f32,
    ) {
        for layer in self.layers.iter_mut().filter(|l| l.tag == tag) {
            change_layer_volume(manager, layer, volume, lerp_time);
        }
    }

    /// Start every layer, fading in over `fade_in` seconds.
    pub fn play<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_in: f32) {
        if self.is_playing(manager) {
            self.stop(manager, 0.0);
        }

        let settings = &self.settings;
        for (index, layer) in self.layers.iter_mut().enumerate() {
            let clip = layer.clip.clone();
            let (volume, hear_distance) = (layer.volume, layer.hear_distance);
            layer.handle = manager.spawn_source(|el| {
                settings.apply(el, SourceKind::Music);
                if index > 0 {
                    el.set_callbacks(Callbacks::default());
                }
                el.set_volume(volume, hear_distance, 0.0).set_clip(clip);
                el.play(fade_in);
            });
        }
    }

    /// Pause every layer.
    pub fn pause<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_out: f32) {
        for layer in &self.layers {
            with_live_element(manager, layer.handle, |el| el.pause(fade_out));
        }
    }

    /// Resume every layer.
    pub fn resume<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_in: f32) {
        for layer in &self.layers {
            with_live_element(manager, layer.handle, |el| el.resume(fade_in));
        }
    }

    /// Stop every layer.
    pub fn stop<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_out: f32) {
        for layer in &self.layers {
            with_live_element(manager, layer.handle, |el| el.stop(fade_out, None));
        }
    }

    fn reference(&self) -> Option<SourceHandle> {
        self.layers.first().and_then(|layer| layer.handle)
    }

    /// True while the reference layer is busy.
    pub fn is_using<B: AudioBackend>(&self, manager: &AudioManager<B>) -> bool {
        live_element(manager, self.reference()).is_some()
    }

    /// True while the reference layer produces audio.
    pub fn is_playing<B: AudioBackend>(&self, manager: &AudioManager<B>) -> bool {
        live_element(manager, self.reference()).is_some_and(|el| el.is_playing())
    }

    /// True while the reference layer is paused.
    pub fn is_paused<B: AudioBackend>(&self, manager: &AudioManager<B>) -> bool {
        live_element(manager, self.reference()).is_some_and(|el| el.is_paused())
    }

    /// Seconds played by the reference layer.
    pub fn playing_time<B: AudioBackend>(&self, manager: &AudioManager<B>) -> f32 {
        live_element(manager, self.reference()).map_or(0.0, |el| el.playing_time())
    }

    /// Position inside the reference layer's loop cycle.
    pub fn current_loop_cycle_time<B: AudioBackend>(&self, manager: &AudioManager<B>) -> f32 {
        live_element(manager, self.reference()).map_or(0.0, |el| el.current_loop_cycle_time())
    }

    /// Loop cycles completed by the reference layer.
    pub fn completed_loop_cycles<B: AudioBackend>(&self, manager: &AudioManager<B>) -> u32 {
        live_element(manager, self.reference()).map_or(0, |el| el.completed_loop_cycles())
    }

    /// Duration of the reference clip.
    pub fn clip_duration(&self) -> f32 {
        self.layers
            .first()
            .and_then(|layer| layer.clip.as_ref())
            .map_or(0.0, Clip::duration)
    }

    /// Resolved clips, one per layer.
    pub fn clips(&self) -> impl Iterator<Item = Option<&Clip>> {
        self.layers.iter().map(|layer| layer.clip.as_ref())
    }

    /// Target volume of the layer playing `tag`.
    pub fn track_volume(&self, tag: &str) -> Option<f32> {
        self.layers
            .iter()
            .find(|layer| layer.tag == tag)
            .map(|layer| layer.volume)
    }

    /// Element handles, one per layer.
    pub fn handles(&self) -> Vec<Option<SourceHandle>> {
        self.layers.iter().map(|layer| layer.handle).collect()
    }
}

fn change_layer_volume<B: AudioBackend>(
    manager: &mut AudioManager<B>,
    layer: &mut Layer,
    volume: f32,
    lerp_time: f32,
) {
    if approximately(layer.volume, volume) {
        return;
    }
    layer.volume = volume;
    let hear_distance = layer.hear_distance;
    with_live_element(manager, layer.handle, |el| {
        el.set_volume(volume, hear_distance, lerp_time);
    });
}

impl PlaybackBuilder for DynamicMusic {
    fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut PlaybackSettings {
        &mut self.settings
    }
}
