//! Free-list pool of playback elements
//!
//! The pool owns every [`SourcePoolElement`] by index. Callers address them
//! through [`SourceHandle`]s carrying a generation, so a handle kept after its
//! element was released and handed to someone else simply stops resolving.
//! Occupancy lives in a pool-side bitset that is re-synced from element state
//! after every mutation and every tick.

use std::collections::VecDeque;

use tracing::debug;

use crate::backend::AudioBackend;
use crate::config::AudioPoolConfig;
use crate::element::SourcePoolElement;
use crate::events::PlaybackEvent;

/// Generation-checked reference to a pooled element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle {
    index: u32,
    generation: u64,
}

impl SourceHandle {
    /// Slot index inside the pool.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Acquisition generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct Slot<E: crate::backend::Emitter> {
    element: SourcePoolElement<E>,
    generation: u64,
}

/// Growable pool of elements created by one backend.
pub struct SourcePool<B: AudioBackend> {
    backend: B,
    config: AudioPoolConfig,
    slots: Vec<Slot<B::Emitter>>,
    in_use: Vec<u64>,
    next_generation: u64,
    events: VecDeque<PlaybackEvent>,
    dropped_events: usize,
}

impl<B: AudioBackend> SourcePool<B> {
    /// Empty pool.
    pub fn new(backend: B, config: AudioPoolConfig) -> Self {
        Self {
            backend,
            config,
            slots: Vec::new(),
            in_use: Vec::new(),
            next_generation: 0,
            events: VecDeque::new(),
            dropped_events: 0,
        }
    }

    /// Create emitters until the pool holds at least `size` elements.
    pub fn prewarm(&mut self, size: usize) -> crate::Result<()> {
        while self.slots.len() < size {
            self.grow()?;
        }
        Ok(())
    }

    /// Hand out the first free element, creating one if all are busy.
    ///
    /// The element is reserved until the next [`SourcePool::update`] or
    /// [`SourcePool::tick`] finds it idle.
    pub fn acquire(&mut self) -> crate::Result<SourceHandle> {
        self.rebuild_if_diverged();

        let index = match self.first_free() {
            Some(index) => index,
            None => self.grow()?,
        };

        self.next_generation += 1;
        let generation = self.next_generation;
        let slot = &mut self.slots[index];
        slot.generation = generation;
        slot.element.prepare();
        self.set_bit(index, true);

        Ok(SourceHandle {
            index: index as u32,
            generation,
        })
    }

    /// Run `f` on the element behind `handle`. Returns `None` for stale
    /// handles.
    pub fn update<R>(
        &mut self,
        handle: SourceHandle,
        f: impl FnOnce(&mut SourcePoolElement<B::Emitter>) -> R,
    ) -> Option<R> {
        let index = handle.index();
        let slot = self.slots.get_mut(index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let result = f(&mut slot.element);
        self.sync(index);
        Some(result)
    }

    /// Run `f` on every element currently in use.
    pub fn update_all(&mut self, mut f: impl FnMut(&mut SourcePoolElement<B::Emitter>)) {
        for index in 0..self.slots.len() {
            if !self.bit(index) {
                continue;
            }
            f(&mut self.slots[index].element);
            self.sync(index);
        }
    }

    /// Advance every element by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        for index in 0..self.slots.len() {
            self.slots[index].element.tick(dt);
            self.sync(index);
        }
    }

    /// Element behind `handle`, if the handle is current.
    pub fn element(&self, handle: SourceHandle) -> Option<&SourcePoolElement<B::Emitter>> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .map(|slot| &slot.element)
    }

    /// True while the handle is current and its element is busy.
    pub fn is_in_use(&self, handle: SourceHandle) -> bool {
        self.element(handle).is_some() && self.bit(handle.index())
    }

    /// First busy element whose id matches.
    pub fn find_by_id(&self, id: &str) -> Option<SourceHandle> {
        self.slots
            .iter()
            .enumerate()
            .find(|(index, slot)| self.bit(*index) && slot.element.id() == Some(id))
            .map(|(index, slot)| SourceHandle {
                index: index as u32,
                generation: slot.generation,
            })
    }

    /// Handles of every busy element.
    pub fn handles_in_use(&self) -> Vec<SourceHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(index, _)| self.bit(*index))
            .map(|(index, slot)| SourceHandle {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True before the first element was created.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of busy elements.
    pub fn in_use_count(&self) -> usize {
        self.in_use.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Take queued events.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        if self.dropped_events > 0 {
            debug!(
                "Dropped {} playback events that were never drained",
                self.dropped_events
            );
            self.dropped_events = 0;
        }
        self.events.drain(..).collect()
    }

    /// Events waiting to be drained.
    pub fn queued_events(&self) -> usize {
        self.events.len()
    }

    /// Backend that creates the emitters.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn grow(&mut self) -> crate::Result<usize> {
        let index = self.slots.len();
        let name = format!("Audio Source {}", index);
        let emitter = self.backend.create_emitter(&name)?;
        debug!("created pooled emitter '{}'", name);
        self.slots.push(Slot {
            element: SourcePoolElement::new(emitter, &self.config),
            generation: 0,
        });
        if self.in_use.len() * 64 < self.slots.len() {
            self.in_use.push(0);
        }
        Ok(index)
    }

    fn rebuild_if_diverged(&mut self) {
        let Some(live) = self.backend.live_emitters() else {
            return;
        };
        if live != self.slots.len() {
            debug!(
                "pool tracks {} elements but backend reports {}, rebuilding",
                self.slots.len(),
                live
            );
            self.slots.clear();
            self.in_use.clear();
        }
    }

    fn first_free(&self) -> Option<usize> {
        for (word_index, word) in self.in_use.iter().enumerate() {
            if *word == u64::MAX {
                continue;
            }
            let index = word_index * 64 + (!word).trailing_zeros() as usize;
            if index < self.slots.len() {
                return Some(index);
            }
        }
        None
    }

    fn bit(&self, index: usize) -> bool {
        self.in_use
            .get(index / 64)
            .is_some_and(|word| word & (1u64 << (index % 64)) != 0)
    }

    fn set_bit(&mut self, index: usize, value: bool) {
        if let Some(word) = self.in_use.get_mut(index / 64) {
            if value {
                *word |= 1u64 << (index % 64);
            } else {
                *word &= !(1u64 << (index % 64));
            }
        }
    }

    /// Mirror element state into the bitset and collect its events.
    fn sync(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        let using = slot.element.is_using();
        let handle = SourceHandle {
            index: index as u32,
            generation: slot.generation,
        };
        let capacity = self.config.event_queue_capacity;
        for (kind, id) in slot.element.take_events() {
            if capacity == 0 {
                continue;
            }
            if self.events.len() == capacity {
                self.events.pop_front();
                self.dropped_events += 1;
            }
            self.events.push_back(PlaybackEvent { handle, id, kind });
        }
        self.set_bit(index, using);
    }
}
