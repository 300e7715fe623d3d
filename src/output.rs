//! Output buses (mixer groups)
//!
//! An [`OutputBus`] is a named gain stage shared by every emitter routed to
//! it. Gains are stored in decibels; emitters multiply their own volume by
//! [`OutputBus::linear_gain`].

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Named, shared gain stage.
#[derive(Debug, Clone)]
pub struct OutputBus {
    name: Arc<str>,
    gain_db: Arc<RwLock<f32>>,
}

impl OutputBus {
    /// New bus at 0 dB.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            gain_db: Arc::new(RwLock::new(0.0)),
        }
    }

    /// Bus name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gain in decibels.
    pub fn gain_db(&self) -> f32 {
        *self.gain_db.read()
    }

    /// Set the gain in decibels.
    pub fn set_gain_db(&self, db: f32) {
        *self.gain_db.write() = db;
    }

    /// Gain as a linear amplitude factor.
    pub fn linear_gain(&self) -> f32 {
        10f32.powf(self.gain_db() / 20.0)
    }

    /// True when both handles refer to the same bus.
    pub fn same_bus(&self, other: &OutputBus) -> bool {
        Arc::ptr_eq(&self.gain_db, &other.gain_db)
    }
}

/// Name → bus lookup. Names are stored and looked up with spaces removed.
#[derive(Debug, Clone, Default)]
pub struct OutputCollection {
    outputs: HashMap<String, OutputBus>,
}

fn normalize(name: &str) -> String {
    name.replace(' ', "")
}

impl OutputCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bus under its normalized name, returning it.
    pub fn add(&mut self, name: &str) -> OutputBus {
        let key = normalize(name);
        self.outputs
            .entry(key.clone())
            .or_insert_with(|| OutputBus::new(&key))
            .clone()
    }

    /// Look up a bus; logs a warning on a miss.
    pub fn get(&self, name: &str) -> Option<OutputBus> {
        let found = self.outputs.get(&normalize(name)).cloned();
        if found.is_none() {
            warn!("Output with tag '{}' doesn't exist", name);
        }
        found
    }

    /// Whether a bus with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.outputs.contains_key(&normalize(name))
    }

    /// Iterate over all buses.
    pub fn iter(&self) -> impl Iterator<Item = &OutputBus> {
        self.outputs.values()
    }

    /// Number of buses.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// True if no bus is registered.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
