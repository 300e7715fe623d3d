//! Registry and global controls
//!
//! [`AudioManager`] owns the pool, the library, the persisted output volumes
//! and the random source used for clip and pitch selection. Facades borrow it
//! for every transport call; the host calls [`AudioManager::tick`] once per
//! frame.

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{error, warn};

use crate::backend::AudioBackend;
use crate::clip::Clip;
use crate::config::AudioPoolConfig;
use crate::element::SourcePoolElement;
use crate::events::PlaybackEvent;
use crate::library::AudioLibrary;
use crate::output::OutputBus;
use crate::pool::{SourceHandle, SourcePool};
use crate::settings::{MemoryVolumeStore, VolumeStore};

/// Audio registry: pool, library, settings and global controls.
pub struct AudioManager<B: AudioBackend> {
    pool: SourcePool<B>,
    library: AudioLibrary,
    store: Box<dyn VolumeStore>,
    config: AudioPoolConfig,
    rng: Mutex<SmallRng>,
}

impl<B: AudioBackend> AudioManager<B> {
    /// Manager with default configuration and in-memory volume storage.
    pub fn new(backend: B, library: AudioLibrary) -> Self {
        let config = AudioPoolConfig::default();
        Self {
            pool: SourcePool::new(backend, config.clone()),
            library,
            store: Box::new(MemoryVolumeStore::new()),
            rng: Mutex::new(make_rng(&config)),
            config,
        }
    }

    /// Manager with explicit configuration; creates `initial_pool_size`
    /// emitters up front.
    pub fn with_config(
        backend: B,
        library: AudioLibrary,
        config: AudioPoolConfig,
    ) -> crate::Result<Self> {
        config.validate()?;
        let mut pool = SourcePool::new(backend, config.clone());
        pool.prewarm(config.initial_pool_size)?;
        Ok(Self {
            pool,
            library,
            store: Box::new(MemoryVolumeStore::new()),
            rng: Mutex::new(make_rng(&config)),
            config,
        })
    }

    /// Replace the volume store.
    pub fn with_store(mut self, store: impl VolumeStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &AudioPoolConfig {
        &self.config
    }

    /// Clip library.
    pub fn library(&self) -> &AudioLibrary {
        &self.library
    }

    /// Clip library, mutably.
    pub fn library_mut(&mut self) -> &mut AudioLibrary {
        &mut self.library
    }

    /// Element pool.
    pub fn pool(&self) -> &SourcePool<B> {
        &self.pool
    }

    /// Element pool, mutably.
    pub fn pool_mut(&mut self) -> &mut SourcePool<B> {
        &mut self.pool
    }

    /// Backend.
    pub fn backend_mut(&mut self) -> &mut B {
        self.pool.backend_mut()
    }

    // ----- pool access ------------------------------------------------------

    /// Reserve a free element, creating one if needed.
    ///
    /// The reservation lapses at the next tick unless the element starts
    /// playing; prefer [`AudioManager::spawn_source`] to configure and start
    /// it in one step.
    pub fn source(&mut self) -> Option<SourceHandle> {
        match self.pool.acquire() {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Unable to create an audio source: {}", e);
                None
            }
        }
    }

    /// Reserve an element and run `start` on it. Returns the handle only if
    /// the element is in use afterwards.
    pub fn spawn_source(
        &mut self,
        start: impl FnOnce(&mut SourcePoolElement<B::Emitter>),
    ) -> Option<SourceHandle> {
        let handle = self.source()?;
        self.pool.update(handle, start);
        self.pool.is_in_use(handle).then_some(handle)
    }

    /// Run `f` on the element behind `handle`; `None` for stale handles.
    pub fn with_element<R>(
        &mut self,
        handle: SourceHandle,
        f: impl FnOnce(&mut SourcePoolElement<B::Emitter>) -> R,
    ) -> Option<R> {
        self.pool.update(handle, f)
    }

    /// Element behind `handle`, if current.
    pub fn element(&self, handle: SourceHandle) -> Option<&SourcePoolElement<B::Emitter>> {
        self.pool.element(handle)
    }

    /// True while `handle` is current and its element busy.
    pub fn is_in_use(&self, handle: SourceHandle) -> bool {
        self.pool.is_in_use(handle)
    }

    // ----- lookups ----------------------------------------------------------

    /// Sound-effect clip for `tag`; random among alternatives.
    pub fn sfx(&self, tag: &str) -> Option<Clip> {
        let Some(data) = self.library.sounds.get(tag) else {
            error!("There is no sound with the tag '{}'", tag);
            return None;
        };
        let clip = data.clip(&mut *self.rng.lock());
        if clip.is_none() {
            error!("Sound '{}' has no audio clips", tag);
        }
        clip
    }

    /// Music clip for `tag`; random among alternatives.
    pub fn track(&self, tag: &str) -> Option<Clip> {
        let Some(data) = self.library.music.get(tag) else {
            error!("There is no music track with the tag '{}'", tag);
            return None;
        };
        let clip = data.clip(&mut *self.rng.lock());
        if clip.is_none() {
            error!("Music track '{}' has no audio clips", tag);
        }
        clip
    }

    /// Output bus by name (spaces ignored).
    pub fn output(&self, name: &str) -> Option<OutputBus> {
        self.library.outputs.get(name)
    }

    /// Random pitch from the configured range.
    pub fn random_pitch(&self) -> f32 {
        let (min, max) = self.config.random_pitch_range;
        self.random_pitch_in(min, max)
    }

    /// Random pitch in `[min, max)`.
    pub fn random_pitch_in(&self, min: f32, max: f32) -> f32 {
        if !(min.is_finite() && max.is_finite()) {
            warn!("Invalid pitch range ({}, {}), using 1.0", min, max);
            return 1.0;
        }
        let (lo, hi) = (min.min(max), min.max(max));
        if lo >= hi {
            return lo;
        }
        self.rng.lock().random_range(lo..hi)
    }

    // ----- output volumes ---------------------------------------------------

    /// Last persisted volume of `output`, or the configured default.
    pub fn last_saved_output_volume(&self, output: &str) -> f32 {
        let key = output_key(output);
        match self.store.get(&key) {
            Some(volume) => volume,
            None => {
                warn!("The {}'s volume has not been saved yet", output);
                self.config.default_output_volume
            }
        }
    }

    /// Set the volume of `output` (0..1), converting to dB on the bus and
    /// persisting the raw value.
    pub fn change_output_volume(&mut self, output: &str, value: f32) -> crate::Result<()> {
        let Some(bus) = self.library.outputs.get(output) else {
            error!(
                "Can't change output volume because {} doesn't exist. Make sure the output is registered in the library",
                output
            );
            return Ok(());
        };
        bus.set_gain_db(self.volume_to_db(value));
        self.store.set(&output_key(bus.name()), value)
    }

    /// Apply every persisted volume to its bus.
    pub fn restore_output_volumes(&mut self) {
        for bus in self.library.outputs.iter() {
            if let Some(value) = self.store.get(&output_key(bus.name())) {
                bus.set_gain_db(self.volume_to_db(value));
            }
        }
    }

    fn volume_to_db(&self, value: f32) -> f32 {
        let (lo, hi) = self.config.output_volume_range;
        let value = if value.is_nan() { lo } else { value };
        20.0 * value.clamp(lo, hi).log10()
    }

    // ----- global controls ---------------------------------------------------

    /// Pause every pooled element.
    pub fn pause_all(&mut self, fade_out: f32) {
        self.pool.update_all(|el| el.pause(fade_out));
    }

    /// Pause every pooled element; the sound and music variants share the
    /// same sweep.
    pub fn pause_all_sounds(&mut self, fade_out: f32) {
        self.pause_all(fade_out);
    }

    /// Pause every pooled element.
    pub fn pause_all_music(&mut self, fade_out: f32) {
        self.pause_all(fade_out);
    }

    /// Stop every pooled element.
    pub fn stop_all(&mut self, fade_out: f32) {
        self.pool.update_all(|el| el.stop(fade_out, None));
    }

    /// Stop every pooled element.
    pub fn stop_all_sounds(&mut self, fade_out: f32) {
        self.stop_all(fade_out);
    }

    /// Stop every pooled element.
    pub fn stop_all_music(&mut self, fade_out: f32) {
        self.stop_all(fade_out);
    }

    /// Pause the first busy element whose id is `id`.
    pub fn pause_sound(&mut self, id: &str, fade_out: f32) {
        if !self.for_id(id, |el| el.pause(fade_out)) {
            warn!("There is no sound reproducing with the id '{}'", id);
        }
    }

    /// Stop the first busy element whose id is `id`.
    pub fn stop_sound(&mut self, id: &str, fade_out: f32) {
        if !self.for_id(id, |el| el.stop(fade_out, None)) {
            warn!("There is no sound reproducing with the id '{}'", id);
        }
    }

    /// Pause the first busy element whose id is `id`.
    pub fn pause_music(&mut self, id: &str, fade_out: f32) {
        if !self.for_id(id, |el| el.pause(fade_out)) {
            warn!("There is no music with the id '{}'", id);
        }
    }

    /// Stop the first busy element whose id is `id`.
    pub fn stop_music(&mut self, id: &str, fade_out: f32) {
        if !self.for_id(id, |el| el.stop(fade_out, None)) {
            warn!("There is no music with the id '{}'", id);
        }
    }

    /// Runs `f` on the first busy element whose id is `id`.
    fn for_id(&mut self, id: &str, f: impl FnOnce(&mut SourcePoolElement<B::Emitter>)) -> bool {
        match self.pool.find_by_id(id) {
            Some(handle) => self.pool.update(handle, f).is_some(),
            None => false,
        }
    }

    // ----- frame loop -------------------------------------------------------

    /// Advance every element by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.pool.tick(dt);
    }

    /// Events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.pool.drain_events()
    }
}

fn output_key(name: &str) -> String {
    name.replace(' ', "")
}

fn make_rng(config: &AudioPoolConfig) -> SmallRng {
    match config.rng_seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}
