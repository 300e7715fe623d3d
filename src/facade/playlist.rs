//! Sequential music tracks on one element

use std::sync::Arc;
use tracing::error;

use super::{approximately, live_element, with_live_element, PlaybackBuilder, PlaybackSettings};
use crate::backend::AudioBackend;
use crate::clip::Clip;
use crate::element::SourceKind;
use crate::manager::AudioManager;
use crate::pool::SourceHandle;
use crate::spatial::HearDistance;

/// Ordered list of music tags played back to back.
///
/// Track changes honour the fade-out (before the boundary) and the fade-in
/// (after it). With looping on, the queue starts over after the last track.
#[derive(Debug, Clone)]
pub struct Playlist {
    tags: Vec<String>,
    clips: Vec<Option<Clip>>,
    fade_in: f32,
    settings: PlaybackSettings,
    handle: Option<SourceHandle>,
}

impl Playlist {
    /// Playlist of music `tags`, resolved right away.
    pub fn new<B, I, S>(manager: &AudioManager<B>, tags: I) -> Self
    where
        B: AudioBackend,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut playlist = Self {
            tags: Vec::new(),
            clips: Vec::new(),
            fade_in: 0.0,
            settings: PlaybackSettings::new(manager, false),
            handle: None,
        };
        playlist.resolve(manager, tags);
        playlist
    }

    fn resolve<B, I, S>(&mut self, manager: &AudioManager<B>, tags: I)
    where
        B: AudioBackend,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.clear();
        self.clips.clear();
        for tag in tags {
            let tag = tag.as_ref();
            self.clips.push(manager.track(tag));
            self.tags.push(tag.to_string());
        }
    }

    /// Replace the tracks used by the next `play`.
    pub fn set_playlist<B, I, S>(mut self, manager: &AudioManager<B>, tags: I) -> Self
    where
        B: AudioBackend,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resolve(manager, tags);
        self
    }

    /// Set the volume used by the next `play`.
    pub fn set_volume(mut self, volume: f32) -> Self {
        self.settings.volume = volume;
        self
    }

    /// Set the volume and hearing range used by the next `play`.
    pub fn set_volume_with_distance(mut self, volume: f32, hear_distance: HearDistance) -> Self {
        self.settings.volume = volume;
        self.settings.hear_distance = hear_distance;
        self
    }

    /// Fade-in for the first track and every track change.
    pub fn set_fade_in(mut self, seconds: f32) -> Self {
        self.fade_in = seconds;
        self
    }

    /// Called whenever the next track starts.
    pub fn on_next_track_start(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.settings.callbacks.on_next_track_start = Some(Arc::new(callback));
        self
    }

    /// Append a track; a playing playlist picks it up too.
    pub fn add_to_playlist<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, tag: &str) {
        let clip = manager.track(tag);
        self.tags.push(tag.to_string());
        self.clips.push(clip.clone());
        if let Some(clip) = clip {
            with_live_element(manager, self.handle, |el| el.add_to_playlist(clip));
        }
    }

    /// Change the volume, forwarding it to the live element.
    pub fn change_volume<B: AudioBackend>(
        &mut self,
        manager: &mut AudioManager<B>,
        volume: f32,
        lerp_time: f32,
    ) {
        if approximately(self.settings.volume, volume) {
            return;
        }
        self.settings.volume = volume;
        let hear_distance = self.settings.hear_distance;
        with_live_element(manager, self.handle, |el| {
            el.set_volume(volume, hear_distance, lerp_time);
        });
    }

    /// Play from the first track.
    ///
    /// Refused (error log) when a tag did not resolve to a clip.
    pub fn play<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>) {
        if self.is_playing(manager) {
            self.stop(manager, 0.0);
        }

        let resolved: Option<Vec<Clip>> = self.clips.iter().cloned().collect();
        let Some(clips) = resolved else {
            let missing: Vec<&str> = self
                .tags
                .iter()
                .zip(&self.clips)
                .filter(|(_, clip)| clip.is_none())
                .map(|(tag, _)| tag.as_str())
                .collect();
            error!("Playlist has tracks without audio clips: {:?}", missing);
            self.handle = None;
            return;
        };

        let settings = &self.settings;
        let fade_in = self.fade_in;
        self.handle = manager.spawn_source(|el| {
            settings.apply(el, SourceKind::Music);
            el.mark_as_playlist()
                .set_playlist(clips)
                .set_fade_in(fade_in);
            el.play_playlist(fade_in);
        });
    }

    /// Pause, fading out over `fade_out` seconds first.
    pub fn pause<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_out: f32) {
        with_live_element(manager, self.handle, |el| el.pause(fade_out));
    }

    /// Resume, fading in over `fade_in` seconds.
    pub fn resume<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_in: f32) {
        with_live_element(manager, self.handle, |el| el.resume(fade_in));
    }

    /// Stop, fading out over `fade_out` seconds first.
    pub fn stop<B: AudioBackend>(&mut self, manager: &mut AudioManager<B>, fade_out: f32) {
        with_live_element(manager, self.handle, |el| el.stop(fade_out, None));
    }

    /// True while the element is busy (also when paused).
    pub fn is_using<B: AudioBackend>(&self, manager: &AudioManager<B>) -> bool {
        live_element(manager, self.handle).is_some()
    }

    /// True while audio is produced.
    pub fn is_playing<B: AudioBackend>(&self, manager: &AudioManager<B>) -> bool {
        live_element(manager, self.handle).is_some_and(|el| el.is_playing())
    }

    /// True from a pause request until resume.
    pub fn is_paused<B: AudioBackend>(&self, manager: &AudioManager<B>) -> bool {
        live_element(manager, self.handle).is_some_and(|el| el.is_paused())
    }

    /// Seconds played, excluding pauses.
    pub fn playing_time<B: AudioBackend>(&self, manager: &AudioManager<B>) -> f32 {
        live_element(manager, self.handle).map_or(0.0, |el| el.playing_time())
    }

    /// Position inside the current track.
    pub fn current_loop_cycle_time<B: AudioBackend>(&self, manager: &AudioManager<B>) -> f32 {
        live_element(manager, self.handle).map_or(0.0, |el| el.current_loop_cycle_time())
    }

    /// Full passes through the playlist.
    pub fn completed_loop_cycles<B: AudioBackend>(&self, manager: &AudioManager<B>) -> u32 {
        live_element(manager, self.handle).map_or(0, |el| el.completed_loop_cycles())
    }

    /// Tracks started after the first one.
    pub fn reproduced_tracks<B: AudioBackend>(&self, manager: &AudioManager<B>) -> u32 {
        live_element(manager, self.handle).map_or(0, |el| el.reproduced_tracks())
    }

    /// Duration of the playing track.
    pub fn current_clip_duration<B: AudioBackend>(&self, manager: &AudioManager<B>) -> f32 {
        live_element(manager, self.handle).map_or(0.0, |el| el.current_clip_duration())
    }

    /// Playing track.
    pub fn current_playlist_clip<B: AudioBackend>(&self, manager: &AudioManager<B>) -> Option<Clip> {
        live_element(manager, self.handle).and_then(|el| el.current_clip().cloned())
    }

    /// Track queued after the playing one.
    pub fn next_playlist_clip<B: AudioBackend>(&self, manager: &AudioManager<B>) -> Option<Clip> {
        live_element(manager, self.handle).and_then(|el| el.next_playlist_clip().cloned())
    }

    /// Index of the playing track.
    pub fn current_track_index<B: AudioBackend>(&self, manager: &AudioManager<B>) -> usize {
        live_element(manager, self.handle).map_or(0, |el| el.current_track_index())
    }

    /// Sum of the resolved track durations.
    pub fn playlist_duration(&self) -> f32 {
        self.clips.iter().flatten().map(Clip::duration).sum()
    }

    /// Track tags, in order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Handle of the element used by the last `play`.
    pub fn handle(&self) -> Option<SourceHandle> {
        self.handle
    }
}

impl PlaybackBuilder for Playlist {
    fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut PlaybackSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::virtual_backend::VirtualBackend;
    use crate::library::AudioLibrary;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manager() -> AudioManager<VirtualBackend> {
        let mut library = AudioLibrary::new();
        library
            .add_music("intro", vec![Clip::silent("intro", 2.0)])
            .add_music("verse", vec![Clip::silent("verse", 3.0)])
            .add_music("outro", vec![Clip::silent("outro", 4.0)]);
        AudioManager::new(VirtualBackend::new(), library)
    }

    fn run(manager: &mut AudioManager<VirtualBackend>, seconds: f32) {
        let steps = (seconds / 0.5).round() as usize;
        for _ in 0..steps {
            manager.tick(0.5);
        }
    }

    #[test]
    fn plays_tracks_in_order() {
        let mut manager = manager();
        let next = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&next);
        let mut playlist = Playlist::new(&manager, ["intro", "verse", "outro"]).on_next_track_start(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        assert_relative_eq!(playlist.playlist_duration(), 9.0);

        playlist.play(&mut manager);
        assert_eq!(playlist.current_track_index(&manager), 0);
        assert_eq!(
            playlist.next_playlist_clip(&manager).map(|c| c.name().to_string()),
            Some("verse".to_string())
        );

        run(&mut manager, 2.5);
        assert_eq!(playlist.current_track_index(&manager), 1);
        assert_relative_eq!(playlist.current_clip_duration(&manager), 3.0);

        run(&mut manager, 3.5);
        assert_eq!(playlist.current_track_index(&manager), 2);
        assert_eq!(playlist.reproduced_tracks(&manager), 2);
        assert_eq!(next.load(Ordering::SeqCst), 2);

        run(&mut manager, 4.0);
        assert!(!playlist.is_using(&manager));
    }

    #[test]
    fn unresolved_track_refuses_to_play() {
        let mut manager = manager();
        let mut playlist = Playlist::new(&manager, ["intro", "nope"]);
        assert_relative_eq!(playlist.playlist_duration(), 2.0);
        playlist.play(&mut manager);
        assert!(!playlist.is_using(&manager));
        assert_eq!(manager.pool().in_use_count(), 0);
    }

    #[test]
    fn empty_playlist_refuses_to_play() {
        let mut manager = manager();
        let mut playlist = Playlist::new(&manager, Vec::<String>::new());
        playlist.play(&mut manager);
        assert!(!playlist.is_using(&manager));
    }

    #[test]
    fn added_tracks_reach_the_live_element() {
        let mut manager = manager();
        let mut playlist = Playlist::new(&manager, ["intro"]);
        playlist.play(&mut manager);
        playlist.add_to_playlist(&mut manager, "outro");
        assert_relative_eq!(playlist.playlist_duration(), 6.0);
        assert_eq!(
            playlist.next_playlist_clip(&manager).map(|c| c.name().to_string()),
            Some("outro".to_string())
        );
        run(&mut manager, 2.5);
        assert_eq!(
            playlist.current_playlist_clip(&manager).map(|c| c.name().to_string()),
            Some("outro".to_string())
        );
    }

    #[test]
    fn looping_playlist_counts_cycles() {
        let mut manager = manager();
        let mut playlist = Playlist::new(&manager, ["intro", "verse"]).set_loop(true);
        playlist.play(&mut manager);
        run(&mut manager, 5.5);
        assert_eq!(playlist.completed_loop_cycles(&manager), 1);
        assert_eq!(playlist.current_track_index(&manager), 0);
        assert!(playlist.is_using(&manager));
        let el = manager.element(playlist.handle().unwrap()).unwrap();
        assert_eq!(el.kind(), SourceKind::Music);
    }

    #[test]
    fn pause_holds_track_position() {
        let mut manager = manager();
        let mut playlist = Playlist::new(&manager, ["intro", "verse"]);
        playlist.play(&mut manager);
        run(&mut manager, 1.0);
        playlist.pause(&mut manager, 0.0);
        run(&mut manager, 5.0);
        assert!(playlist.is_paused(&manager));
        assert_eq!(playlist.current_track_index(&manager), 0);
        assert_relative_eq!(playlist.playing_time(&manager), 1.0);
        playlist.resume(&mut manager, 0.0);
        run(&mut manager, 1.5);
        assert_eq!(playlist.current_track_index(&manager), 1);
    }
}
