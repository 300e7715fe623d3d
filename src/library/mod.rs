//! Tag → clip collections
//!
//! An [`AudioLibrary`] groups the sound-effect collection, the music
//! collection and the output buses. It is built in code or loaded from a
//! manifest (see [`manifest`]).

use rand::Rng;
use std::collections::HashMap;

use crate::clip::Clip;
use crate::output::{OutputBus, OutputCollection};

#[cfg(feature = "manifest")]
pub mod manifest;

/// A tag with one or more alternative clips.
#[derive(Debug, Clone)]
pub struct SoundData {
    tag: String,
    clips: Vec<Clip>,
}

impl SoundData {
    /// New entry.
    pub fn new(tag: impl Into<String>, clips: Vec<Clip>) -> Self {
        Self {
            tag: tag.into(),
            clips,
        }
    }

    /// Entry tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// All alternatives.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Uniformly random alternative; `None` if the entry has no clips.
    pub fn clip(&self, rng: &mut impl Rng) -> Option<Clip> {
        match self.clips.len() {
            0 => None,
            1 => Some(self.clips[0].clone()),
            n => Some(self.clips[rng.random_range(0..n)].clone()),
        }
    }
}

/// Tag → [`SoundData`] map.
#[derive(Debug, Clone, Default)]
pub struct SoundDataCollection {
    entries: HashMap<String, SoundData>,
}

impl SoundDataCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, data: SoundData) {
        self.entries.insert(data.tag.clone(), data);
    }

    /// Entry for `tag`.
    pub fn get(&self, tag: &str) -> Option<&SoundData> {
        self.entries.get(tag)
    }

    /// All tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Sound effects, music tracks and outputs.
#[derive(Debug, Clone, Default)]
pub struct AudioLibrary {
    /// Sound-effect collection.
    pub sounds: SoundDataCollection,
    /// Music collection.
    pub music: SoundDataCollection,
    /// Output buses.
    pub outputs: OutputCollection,
}

impl AudioLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sound-effect tag.
    pub fn add_sound(&mut self, tag: impl Into<String>, clips: Vec<Clip>) -> &mut Self {
        self.sounds.insert(SoundData::new(tag, clips));
        self
    }

    /// Register a music tag.
    pub fn add_music(&mut self, tag: impl Into<String>, clips: Vec<Clip>) -> &mut Self {
        self.music.insert(SoundData::new(tag, clips));
        self
    }

    /// Register an output bus.
    pub fn add_output(&mut self, name: &str) -> OutputBus {
        self.outputs.add(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn random_clip_covers_alternatives() {
        let data = SoundData::new(
            "step",
            vec![Clip::silent("a", 0.1), Clip::silent("b", 0.1), Clip::silent("c", 0.1)],
        );
        let mut rng = SmallRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(data.clip(&mut rng).unwrap().name().to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn empty_entry_has_no_clip() {
        let data = SoundData::new("none", vec![]);
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(data.clip(&mut rng).is_none());
    }

    #[test]
    fn tags_are_sorted() {
        let mut library = AudioLibrary::new();
        library
            .add_sound("zap", vec![Clip::silent("z", 1.0)])
            .add_sound("boom", vec![Clip::silent("b", 1.0)]);
        assert_eq!(library.sounds.tags(), vec!["boom", "zap"]);
    }
}
