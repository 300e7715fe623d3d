//! Library manifests
//!
//! A manifest lists sound-effect and music tags, the clips behind each tag and
//! the output buses, plus an optional [`AudioPoolConfig`]. RON and JSON are
//! both accepted:
//!
//! ```ron
//! (
//!     config: (initial_pool_size: 8),
//!     sounds: [
//!         (tag: "laser", clips: [(type: "file", path: "sfx/laser.wav")]),
//!         (tag: "click", clips: [(type: "silent", seconds: 0.1)]),
//!     ],
//!     music: [
//!         (tag: "theme", clips: [(type: "file", path: "music/theme.wav")]),
//!     ],
//!     outputs: ["Music", "Sound Effects"],
//! )
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::clip::Clip;
use crate::config::AudioPoolConfig;
use crate::library::{AudioLibrary, SoundData};
use crate::AudioPoolError;

/// Where a clip's audio comes from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClipSource {
    /// WAV file, relative to the manifest directory unless absolute.
    File {
        /// File path
        path: String,
    },
    /// Silence of a fixed length.
    Silent {
        /// Clip name; derived from the tag when absent
        #[serde(default)]
        name: Option<String>,
        /// Length in seconds
        seconds: f32,
    },
}

/// One tag and its alternative clips.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoundEntry {
    /// Lookup tag
    pub tag: String,
    /// Alternatives; one is picked at random per play
    pub clips: Vec<ClipSource>,
}

/// Deserialized manifest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LibraryManifest {
    /// Pool-wide defaults
    pub config: AudioPoolConfig,
    /// Sound-effect tags
    pub sounds: Vec<SoundEntry>,
    /// Music tags
    pub music: Vec<SoundEntry>,
    /// Output bus names
    pub outputs: Vec<String>,
}

impl LibraryManifest {
    /// Parse a RON manifest.
    pub fn from_ron_str(text: &str) -> crate::Result<Self> {
        ron::from_str(text).map_err(|e| AudioPoolError::manifest(e.to_string()))
    }

    /// Parse a JSON manifest.
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        serde_json::from_str(text).map_err(|e| AudioPoolError::manifest(e.to_string()))
    }

    /// Read a manifest file; `.json` files are parsed as JSON, anything else
    /// as RON.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        debug!("parsing manifest {}", path.display());
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_ron_str(&text)
        }
    }

    /// Resolve every clip source and build the library. Relative file paths
    /// are joined onto `base_dir`.
    pub fn into_library(
        self,
        base_dir: impl AsRef<Path>,
    ) -> crate::Result<(AudioLibrary, AudioPoolConfig)> {
        let base_dir = base_dir.as_ref();
        self.config.validate()?;

        let mut library = AudioLibrary::new();
        for entry in self.sounds {
            library.sounds.insert(resolve_entry(entry, base_dir)?);
        }
        for entry in self.music {
            library.music.insert(resolve_entry(entry, base_dir)?);
        }
        for name in &self.outputs {
            library.add_output(name);
        }

        info!(
            "Library loaded: {} sound tags, {} music tags, {} outputs",
            library.sounds.len(),
            library.music.len(),
            library.outputs.len()
        );
        Ok((library, self.config))
    }
}

fn resolve_entry(entry: SoundEntry, base_dir: &Path) -> crate::Result<SoundData> {
    let mut clips = Vec::with_capacity(entry.clips.len());
    for (index, source) in entry.clips.into_iter().enumerate() {
        clips.push(resolve_clip(&entry.tag, index, source, base_dir)?);
    }
    Ok(SoundData::new(entry.tag, clips))
}

fn resolve_clip(
    tag: &str,
    index: usize,
    source: ClipSource,
    base_dir: &Path,
) -> crate::Result<Clip> {
    match source {
        ClipSource::Silent { name, seconds } => {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(AudioPoolError::manifest(format!(
                    "tag '{}': silent clip length must be a non-negative number, got {}",
                    tag, seconds
                )));
            }
            let name = name.unwrap_or_else(|| format!("{}_{:02}", tag, index + 1));
            Ok(Clip::silent(name, seconds))
        }
        ClipSource::File { path } => load_file(&resolve_path(base_dir, &path)),
    }
}

fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(feature = "wav")]
fn load_file(path: &Path) -> crate::Result<Clip> {
    Clip::from_wav_file(path)
}

#[cfg(not(feature = "wav"))]
fn load_file(path: &Path) -> crate::Result<Clip> {
    Err(AudioPoolError::clip_load(
        path.display().to_string(),
        "WAV decoding requires the `wav` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"(
        config: (initial_pool_size: 4, rng_seed: Some(9)),
        sounds: [
            (tag: "click", clips: [(type: "silent", seconds: 0.1)]),
            (tag: "step", clips: [
                (type: "silent", name: Some("step_a"), seconds: 0.2),
                (type: "silent", seconds: 0.3),
            ]),
        ],
        music: [
            (tag: "theme", clips: [(type: "silent", seconds: 30.0)]),
        ],
        outputs: ["Music", "Sound Effects"],
    )"#;

    #[test]
    fn parses_ron_manifest() {
        let manifest = LibraryManifest::from_ron_str(MANIFEST).unwrap();
        assert_eq!(manifest.sounds.len(), 2);
        assert_eq!(manifest.config.initial_pool_size, 4);
        assert_eq!(manifest.config.rng_seed, Some(9));
        assert_eq!(
            manifest.sounds[1].clips[0],
            ClipSource::Silent {
                name: Some("step_a".into()),
                seconds: 0.2
            }
        );
    }

    #[test]
    fn builds_library() {
        let manifest = LibraryManifest::from_ron_str(MANIFEST).unwrap();
        let (library, config) = manifest.into_library(".").unwrap();
        assert_eq!(config.initial_pool_size, 4);
        assert_eq!(library.sounds.tags(), vec!["click", "step"]);
        let step = library.sounds.get("step").unwrap();
        assert_eq!(step.clips()[0].name(), "step_a");
        assert_eq!(step.clips()[1].name(), "step_02");
        assert!(library.outputs.contains("SoundEffects"));
        assert!(library.music.get("theme").is_some());
    }

    #[test]
    fn parses_json_manifest() {
        let json = r#"{
            "sounds": [{"tag": "beep", "clips": [{"type": "silent", "seconds": 0.5}]}],
            "outputs": ["Master"]
        }"#;
        let manifest = LibraryManifest::from_json_str(json).unwrap();
        assert_eq!(manifest.sounds[0].tag, "beep");
        assert!(manifest.music.is_empty());
        assert_eq!(manifest.config, AudioPoolConfig::default());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            LibraryManifest::from_ron_str("(sounds: 3)"),
            Err(AudioPoolError::Manifest(_))
        ));

        let manifest = LibraryManifest::from_ron_str(
            r#"(sounds: [(tag: "x", clips: [(type: "silent", seconds: -1.0)])])"#,
        )
        .unwrap();
        assert!(manifest.into_library(".").is_err());
    }

    #[test]
    fn missing_file_is_a_clip_error() {
        let manifest = LibraryManifest::from_ron_str(
            r#"(sounds: [(tag: "x", clips: [(type: "file", path: "does/not/exist.wav")])])"#,
        )
        .unwrap();
        assert!(matches!(
            manifest.into_library("/nonexistent"),
            Err(AudioPoolError::ClipLoad { .. })
        ));
    }

    #[test]
    fn load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(&path, r#"{"outputs": ["Music"]}"#).unwrap();
        let manifest = LibraryManifest::load(&path).unwrap();
        assert_eq!(manifest.outputs, vec!["Music".to_string()]);
    }
}
