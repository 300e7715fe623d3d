//! Integration tests for pool reuse, asset loading and persisted volumes
//!
//! Covers the parts that touch the filesystem: WAV decoding, library
//! manifests and the JSON volume store.

#![cfg(all(feature = "wav", feature = "manifest"))]

use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use audio_pool::{
    AudioLibrary, AudioManager, AudioPoolConfig, AudioPoolError, Clip, JsonVolumeStore,
    LibraryManifest, Music, PlaybackBuilder, Playlist, Sound, SourceKind, VirtualBackend,
    VolumeStore,
};

fn write_tone(path: &Path, sample_rate: u32, seconds: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    let frames = (sample_rate as f32 * seconds) as usize;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = (t * 440.0 * std::f32::consts::TAU).sin() * 0.5;
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

fn silent_library() -> AudioLibrary {
    let mut library = AudioLibrary::new();
    library
        .add_sound("step", vec![Clip::silent("step", 0.5)])
        .add_music("theme", vec![Clip::silent("theme", 4.0)]);
    library.add_output("Music");
    library.add_output("Sound Effects");
    library
}

#[test]
fn test_elements_are_reused_after_release() {
    let mut manager = AudioManager::new(VirtualBackend::new(), silent_library());
    let mut first = Sound::new(&manager, "step");
    first.play(&mut manager, 0.0);
    let old = first.handle().unwrap();

    // Let the one-shot finish and release itself.
    for _ in 0..4 {
        manager.tick(0.25);
    }
    assert_eq!(manager.pool().in_use_count(), 0);

    let mut second = Music::new(&manager, "theme");
    second.play(&mut manager, 0.0);
    let new = second.handle().unwrap();
    assert_eq!(new.index(), old.index(), "the idle element is handed out again");
    assert_ne!(new.generation(), old.generation());
    assert_eq!(manager.pool().len(), 1);

    // The stale handle no longer reaches the element.
    assert!(!first.is_using(&manager));
    assert!(manager.element(old).is_none());
    assert_eq!(manager.element(new).unwrap().kind(), SourceKind::Music);
}

#[test]
fn test_busy_elements_grow_the_pool() {
    let mut manager = AudioManager::with_config(
        VirtualBackend::new(),
        silent_library(),
        AudioPoolConfig::default().with_initial_pool_size(2),
    )
    .unwrap();
    assert_eq!(manager.pool().len(), 2);

    let mut sounds: Vec<_> = (0..5)
        .map(|_| Sound::new(&manager, "step").set_loop(true))
        .collect();
    for sound in &mut sounds {
        sound.play(&mut manager, 0.0);
    }
    assert_eq!(manager.pool().len(), 5);
    assert_eq!(manager.pool().in_use_count(), 5);

    manager.stop_all_sounds(0.0);
    assert_eq!(manager.pool().in_use_count(), 0);
    assert_eq!(manager.pool().len(), 5);
}

#[test]
fn test_wav_clip_duration_and_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beep.wav");
    write_tone(&path, 22_050, 0.5);

    let clip = Clip::from_wav_file(&path).unwrap();
    assert_eq!(clip.name(), "beep");
    assert_eq!(clip.sample_rate(), 22_050);
    assert_eq!(clip.channels(), 1);
    assert_relative_eq!(clip.duration(), 0.5, epsilon = 1e-4);

    let samples = clip.samples().expect("decoded samples");
    assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    assert!(samples.iter().any(|s| s.abs() > 0.4));
}

#[test]
fn test_missing_wav_is_a_clip_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Clip::from_wav_file(dir.path().join("nope.wav")).unwrap_err();
    assert!(matches!(err, AudioPoolError::ClipLoad { .. }));
}

#[test]
fn test_manifest_library_plays_wav_playlist() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("music")).unwrap();
    write_tone(&dir.path().join("music/a.wav"), 8_000, 1.0);
    write_tone(&dir.path().join("music/b.wav"), 8_000, 0.5);

    let manifest_path = dir.path().join("library.ron");
    fs::write(
        &manifest_path,
        r#"(
            config: (rng_seed: Some(3), initial_pool_size: 1),
            sounds: [(tag: "click", clips: [(type: "silent", seconds: 0.1)])],
            music: [
                (tag: "a", clips: [(type: "file", path: "music/a.wav")]),
                (tag: "b", clips: [(type: "file", path: "music/b.wav")]),
            ],
            outputs: ["Music"],
        )"#,
    )
    .unwrap();

    let manifest = LibraryManifest::load(&manifest_path).unwrap();
    let (library, config) = manifest.into_library(dir.path()).unwrap();
    assert_eq!(config.rng_seed, Some(3));
    assert_eq!(library.music.tags(), vec!["a", "b"]);
    assert_eq!(
        manager_clip_name(&library, "click").as_deref(),
        Some("click_01")
    );

    let mut manager = AudioManager::with_config(VirtualBackend::new(), library, config).unwrap();
    let mut playlist = Playlist::new(&manager, ["a", "b"]);
    assert_relative_eq!(playlist.playlist_duration(), 1.5, epsilon = 1e-4);
    playlist.play(&mut manager);
    assert_eq!(
        playlist.current_playlist_clip(&manager).map(|c| c.name().to_string()),
        Some("a".to_string())
    );

    for _ in 0..5 {
        manager.tick(0.25);
    }
    assert_eq!(playlist.current_track_index(&manager), 1);
    for _ in 0..4 {
        manager.tick(0.25);
    }
    assert!(!playlist.is_using(&manager));
}

fn manager_clip_name(library: &AudioLibrary, tag: &str) -> Option<String> {
    library
        .sounds
        .get(tag)
        .and_then(|data| data.clips().first())
        .map(|clip| clip.name().to_string())
}

#[test]
fn test_output_volumes_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("volumes.json");

    {
        let store = JsonVolumeStore::open(&path).unwrap();
        let mut manager =
            AudioManager::new(VirtualBackend::new(), silent_library()).with_store(store);
        manager.change_output_volume("Sound Effects", 0.01).unwrap();
        manager.change_output_volume("Music", 0.1).unwrap();
    }

    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("SoundEffects"));

    let store = JsonVolumeStore::open(&path).unwrap();
    assert_relative_eq!(store.get("Music").unwrap(), 0.1);
    let mut manager =
        AudioManager::new(VirtualBackend::new(), silent_library()).with_store(store);
    assert_relative_eq!(manager.last_saved_output_volume("Sound Effects"), 0.01);
    manager.restore_output_volumes();
    assert_relative_eq!(
        manager.output("Sound Effects").unwrap().gain_db(),
        -40.0,
        epsilon = 1e-3
    );
    assert_relative_eq!(manager.output("Music").unwrap().gain_db(), -20.0, epsilon = 1e-3);
}

#[test]
fn test_corrupt_volume_file_is_a_settings_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("volumes.json");
    fs::write(&path, "not json").unwrap();
    let err = JsonVolumeStore::open(&path).unwrap_err();
    assert!(matches!(err, AudioPoolError::Settings(_)));
}
