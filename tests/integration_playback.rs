//! Integration tests for facade-driven playback
//!
//! These tests drive the public API the way a game loop would: build facades
//! against an `AudioManager`, tick it at a fixed step and check state,
//! callbacks and events.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use approx::assert_relative_eq;
use audio_pool::{
    AudioLibrary, AudioManager, AudioPoolConfig, Clip, DynamicMusic, Emitter, HearDistance,
    Music, PlaybackBuilder, PlaybackEventKind, Playlist, SharedPosition, Sound, SourceState,
    VirtualBackend,
};

const STEP: f32 = 0.25;

fn library() -> AudioLibrary {
    let mut library = AudioLibrary::new();
    library
        .add_sound("coin", vec![Clip::silent("coin", 1.0)])
        .add_sound("engine", vec![Clip::silent("engine", 2.0)])
        .add_music("calm", vec![Clip::silent("calm", 8.0)])
        .add_music("intro", vec![Clip::silent("intro", 2.0)])
        .add_music("verse", vec![Clip::silent("verse", 3.0)])
        .add_music("outro", vec![Clip::silent("outro", 4.0)]);
    library.add_output("Music");
    library
}

fn manager() -> AudioManager<VirtualBackend> {
    AudioManager::with_config(
        VirtualBackend::new(),
        library(),
        AudioPoolConfig::default().with_rng_seed(42),
    )
    .expect("valid config")
}

fn run(manager: &mut AudioManager<VirtualBackend>, seconds: f32) {
    let steps = (seconds / STEP).round() as usize;
    for _ in 0..steps {
        manager.tick(STEP);
    }
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    (count, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn test_using_tracks_element_lifetime() {
    let mut manager = manager();
    let mut coin = Sound::new(&manager, "coin");
    assert!(!coin.is_using(&manager));

    coin.play(&mut manager, 0.0);
    assert!(coin.is_using(&manager));
    assert!(coin.is_playing(&manager));

    run(&mut manager, 1.5);
    assert!(!coin.is_using(&manager), "one-shot should release itself");
    assert_eq!(manager.pool().in_use_count(), 0);
}

#[test]
fn test_playing_time_grows_per_unpaused_tick() {
    let mut manager = manager();
    let mut music = Music::new(&manager, "calm");
    music.play(&mut manager, 0.0);
    assert_relative_eq!(music.playing_time(&manager), 0.0);

    run(&mut manager, 1.0);
    assert_relative_eq!(music.playing_time(&manager), 1.0);

    music.pause(&mut manager, 0.0);
    run(&mut manager, 2.0);
    assert_relative_eq!(music.playing_time(&manager), 1.0);

    music.resume(&mut manager, 0.0);
    run(&mut manager, 0.5);
    assert_relative_eq!(music.playing_time(&manager), 1.5);
}

#[test]
fn test_loop_cycles_once_per_clip_length() {
    let mut manager = manager();
    let (cycles, on_cycle) = counter();
    let mut engine = Sound::new(&manager, "engine")
        .set_loop(true)
        .on_loop_cycle_complete(on_cycle);
    engine.play(&mut manager, 0.0);

    run(&mut manager, 1.75);
    assert_eq!(engine.completed_loop_cycles(&manager), 0);
    run(&mut manager, 0.25);
    assert_eq!(engine.completed_loop_cycles(&manager), 1);
    run(&mut manager, 4.0);
    assert_eq!(engine.completed_loop_cycles(&manager), 3);
    assert_eq!(cycles.load(Ordering::SeqCst), 3);
    assert!(engine.current_loop_cycle_time(&manager) < 2.0);
}

#[test]
fn test_stop_releases_and_notifies() {
    let mut manager = manager();
    let (completed, on_complete) = counter();
    let (played, on_play) = counter();
    let mut music = Music::new(&manager, "calm")
        .set_id("menu")
        .on_play(on_play)
        .on_complete(on_complete);
    music.play(&mut manager, 0.0);
    let handle = music.handle().expect("music is playing");

    music.stop(&mut manager, 0.0);
    assert!(!music.is_using(&manager));
    assert_eq!(played.load(Ordering::SeqCst), 1);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
    // The handle no longer addresses a busy element.
    assert!(!manager.is_in_use(handle));

    let kinds: Vec<_> = manager.drain_events().into_iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PlaybackEventKind::Started,
            PlaybackEventKind::Completed,
            PlaybackEventKind::Stopped
        ]
    );
}

#[test]
fn test_faded_stop_takes_the_fade_time() {
    let mut manager = manager();
    let mut music = Music::new(&manager, "calm").set_volume(0.8);
    music.play(&mut manager, 0.0);
    music.stop(&mut manager, 1.0);

    let handle = music.handle().unwrap();
    assert_eq!(manager.element(handle).unwrap().state(), SourceState::Stopping);
    run(&mut manager, 0.5);
    let volume = manager.element(handle).unwrap().emitter().volume();
    assert_relative_eq!(volume, 0.4, epsilon = 1e-5);
    assert!(music.is_using(&manager));
    run(&mut manager, 0.5);
    assert!(!music.is_using(&manager));
}

#[test]
fn test_pause_fade_then_resume_fade() {
    let mut manager = manager();
    let (pause_done, on_pause_complete) = counter();
    let (resumed, on_resume) = counter();
    let mut music = Music::new(&manager, "calm")
        .set_volume(0.6)
        .on_pause_complete(on_pause_complete)
        .on_resume(on_resume);
    music.play(&mut manager, 0.0);
    run(&mut manager, 1.0);

    music.pause(&mut manager, 1.0);
    assert!(music.is_paused(&manager));
    assert!(music.is_playing(&manager), "still audible while fading out");
    run(&mut manager, 1.0);
    assert_eq!(pause_done.load(Ordering::SeqCst), 1);
    assert!(!music.is_playing(&manager));

    music.resume(&mut manager, 0.5);
    assert_eq!(resumed.load(Ordering::SeqCst), 1);
    run(&mut manager, 0.5);
    let handle = music.handle().unwrap();
    let el = manager.element(handle).unwrap();
    assert_eq!(el.state(), SourceState::Playing);
    assert_relative_eq!(el.emitter().volume(), 0.6);
}

#[test]
fn test_playlist_track_boundaries() {
    let mut manager = manager();
    let mut playlist = Playlist::new(&manager, ["intro", "verse", "outro"]);
    playlist.play(&mut manager);

    run(&mut manager, 2.5);
    assert_eq!(playlist.current_track_index(&manager), 1);
    // Verse began at the 2 s boundary.
    assert_relative_eq!(playlist.current_loop_cycle_time(&manager), 0.5);
    run(&mut manager, 3.5);
    assert_relative_eq!(playlist.current_loop_cycle_time(&manager), 1.0);
    assert_eq!(playlist.current_track_index(&manager), 2);
    assert_eq!(playlist.reproduced_tracks(&manager), 2);

    run(&mut manager, 4.0);
    assert!(!playlist.is_using(&manager));
}

#[test]
fn test_playlist_fades_between_tracks() {
    let mut manager = manager();
    let (next, on_next) = counter();
    let mut playlist = Playlist::new(&manager, ["intro", "verse"])
        .set_volume(0.5)
        .set_fade_out(0.5)
        .set_fade_in(0.5)
        .on_next_track_start(on_next);
    playlist.play(&mut manager);
    let handle = playlist.handle().unwrap();

    // First track fades in.
    assert_eq!(manager.element(handle).unwrap().state(), SourceState::FadingIn);
    run(&mut manager, 0.5);
    assert_eq!(manager.element(handle).unwrap().state(), SourceState::Playing);

    // Fade-out starts half a second before the boundary.
    run(&mut manager, 1.25);
    assert_eq!(
        manager.element(handle).unwrap().state(),
        SourceState::ChangingTrack
    );

    // Volume changes during the track change only retarget the next fade-in.
    playlist.change_volume(&mut manager, 0.9, 0.0);
    run(&mut manager, 0.5);
    assert_eq!(next.load(Ordering::SeqCst), 1);
    assert_eq!(manager.element(handle).unwrap().state(), SourceState::FadingIn);
    run(&mut manager, 0.5);
    let el = manager.element(handle).unwrap();
    assert_eq!(el.state(), SourceState::Playing);
    assert_relative_eq!(el.emitter().volume(), 0.9);
    assert_eq!(el.current_clip().map(Clip::name), Some("verse"));
}

#[test]
fn test_volume_deferred_while_stopping() {
    let mut manager = manager();
    let mut music = Music::new(&manager, "calm").set_volume(1.0);
    music.play(&mut manager, 0.0);
    music.stop(&mut manager, 1.0);
    run(&mut manager, 0.5);
    music.change_volume(&mut manager, 0.2, 0.0);
    let handle = music.handle().unwrap();
    let el = manager.element(handle).unwrap();
    assert_relative_eq!(el.emitter().volume(), 0.5, epsilon = 1e-5);
    assert_relative_eq!(el.target_volume(), 0.2);
}

#[test]
fn test_dynamic_music_layers_in_lock_step() {
    let mut manager = manager();
    let mut layers = DynamicMusic::new(&manager, ["intro", "verse"])
        .set_loop(true)
        .set_track_volume("verse", 0.0);
    layers.play(&mut manager, 0.0);
    run(&mut manager, 2.0);
    assert_eq!(layers.completed_loop_cycles(&manager), 1);

    layers.change_track_volume(&mut manager, "verse", 0.7, 1.0);
    run(&mut manager, 1.0);
    let handles = layers.handles();
    let verse = manager.element(handles[1].unwrap()).unwrap();
    assert_relative_eq!(verse.emitter().volume(), 0.7);
    assert_relative_eq!(verse.playing_time(), layers.playing_time(&manager));

    layers.stop(&mut manager, 0.0);
    assert_eq!(manager.pool().in_use_count(), 0);
}

#[test]
fn test_follow_target_moves_emitter() {
    let mut manager = manager();
    let car = SharedPosition::new([0.0, 0.0, 0.0]);
    let mut engine = Sound::new(&manager, "engine")
        .set_loop(true)
        .set_volume_with_distance(1.0, HearDistance::new(1.0, 50.0))
        .set_follow_target(car.clone());
    engine.play(&mut manager, 0.0);

    car.set([10.0, 0.0, 5.0]);
    manager.tick(STEP);
    let handle = engine.handle().unwrap();
    let emitter = manager.element(handle).unwrap().emitter();
    assert_eq!(emitter.position(), [10.0, 0.0, 5.0]);
    assert_eq!(emitter.hear_distance(), HearDistance::new(1.0, 50.0));
}

#[test]
fn test_global_controls_and_output_volume() {
    let mut manager = manager();
    let mut coin = Sound::new(&manager, "coin").set_loop(true);
    let mut music = Music::new(&manager, "calm")
        .set_id("bgm")
        .set_output(&manager, "Music");
    coin.play(&mut manager, 0.0);
    music.play(&mut manager, 0.0);

    manager.change_output_volume("Music", 0.1).unwrap();
    let handle = music.handle().unwrap();
    let effective = manager.element(handle).unwrap().emitter().effective_volume();
    assert_relative_eq!(effective, 0.1, epsilon = 1e-4);

    // Global sweeps reach every pooled element.
    manager.pause_all_music(0.0);
    assert!(music.is_paused(&manager));
    assert!(coin.is_paused(&manager));
    manager.pause_all(0.0);
    assert!(coin.is_paused(&manager));

    manager.stop_music("bgm", 0.0);
    assert!(!music.is_using(&manager));
    assert!(coin.is_using(&manager));

    manager.stop_all_sounds(0.0);
    assert!(!coin.is_using(&manager));
}
