//! Per-emitter playback state machine
//!
//! A [`SourcePoolElement`] owns one [`Emitter`] and everything needed to play a
//! single clip or a playlist on it: target volume, fades, loop-cycle and
//! track bookkeeping, follow target and callbacks.
//!
//! ```text
//! Stopped ─play─► Playing ─pause─► Pausing ─► Paused ─resume─► Playing
//!    ▲   └fade─► FadingIn ─┘ │                                 │
//!    └──────── Stopping ◄─stop┘        Playing ─► ChangingTrack ┘
//! ```
//!
//! Fades are [`VolumeRamp`]s advanced by [`SourcePoolElement::tick`]; at most
//! one ramp is active and starting a new one cancels the previous one.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{error, warn};

use crate::backend::Emitter;
use crate::clip::Clip;
use crate::config::AudioPoolConfig;
use crate::events::PlaybackEventKind;
use crate::output::OutputBus;
use crate::ramp::VolumeRamp;
use crate::spatial::{FollowTarget, HearDistance, Position};

/// Notification closure.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Callbacks attached to one playback.
#[derive(Clone, Default)]
pub struct Callbacks {
    /// Playback started.
    pub on_play: Option<Callback>,
    /// Playback ended (natural end or stop).
    pub on_complete: Option<Callback>,
    /// A loop cycle completed.
    pub on_loop_cycle_complete: Option<Callback>,
    /// A playlist started its next track.
    pub on_next_track_start: Option<Callback>,
    /// Pause requested.
    pub on_pause: Option<Callback>,
    /// Pause fade finished.
    pub on_pause_complete: Option<Callback>,
    /// Playback resumed.
    pub on_resume: Option<Callback>,
}

impl Callbacks {
    /// Drop everything except `on_play`.
    pub fn clear_except_play(&mut self) {
        *self = Callbacks {
            on_play: self.on_play.take(),
            ..Callbacks::default()
        };
    }

    /// True when no callback is set.
    pub fn is_empty(&self) -> bool {
        self.on_play.is_none()
            && self.on_complete.is_none()
            && self.on_loop_cycle_complete.is_none()
            && self.on_next_track_start.is_none()
            && self.on_pause.is_none()
            && self.on_pause_complete.is_none()
            && self.on_resume.is_none()
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_play", &self.on_play.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_loop_cycle_complete", &self.on_loop_cycle_complete.is_some())
            .field("on_next_track_start", &self.on_next_track_start.is_some())
            .field("on_pause", &self.on_pause.is_some())
            .field("on_pause_complete", &self.on_pause_complete.is_some())
            .field("on_resume", &self.on_resume.is_some())
            .finish()
    }
}

/// Playback state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceState {
    /// Producing audio at the target volume.
    Playing,
    /// Paused; the emitter holds its position.
    Paused,
    /// Fading out before pausing.
    Pausing,
    /// Fading in towards the target volume.
    FadingIn,
    /// Fading out / switching to the next playlist track.
    ChangingTrack,
    /// Fading out before stopping.
    Stopping,
    /// Idle and free for reuse.
    #[default]
    Stopped,
}

/// Which family of controls an element answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Sound effect.
    #[default]
    Sound,
    /// Music, playlist or dynamic music layer.
    Music,
}

/// What to do when the active ramp reaches its target.
enum RampDone {
    Nothing,
    EnterPlaying,
    CompletePause,
    FinishStop(Option<Callback>),
    AdvanceTrack,
}

struct ActiveRamp {
    ramp: VolumeRamp,
    on_done: RampDone,
}

/// One pooled audio channel plus its playback state.
pub struct SourcePoolElement<E: Emitter> {
    emitter: E,
    kind: SourceKind,
    state: SourceState,
    paused: bool,
    stopping: bool,
    changing_track: bool,
    pending_track_start: bool,
    track_restarted: bool,
    is_playlist: bool,
    looping: bool,
    volume: f32,
    hear_distance: HearDistance,
    default_hear_distance: HearDistance,
    fade_in: f32,
    fade_out: f32,
    id: Option<String>,
    follow_target: Option<Arc<dyn FollowTarget>>,
    playlist: VecDeque<Clip>,
    playlist_len: usize,
    playlist_duration: f32,
    next_track_at: f32,
    playing_time: f32,
    completed_loop_cycles: u32,
    reproduced_tracks: u32,
    ramp: Option<ActiveRamp>,
    callbacks: Callbacks,
    end_of_clip_guard: f32,
    loop_cycle_slack: f32,
    outbox: Vec<(PlaybackEventKind, Option<String>)>,
}

impl<E: Emitter> SourcePoolElement<E> {
    /// Wrap an emitter.
    pub fn new(emitter: E, config: &AudioPoolConfig) -> Self {
        Self {
            emitter,
            kind: SourceKind::Sound,
            state: SourceState::Stopped,
            paused: false,
            stopping: false,
            changing_track: false,
            pending_track_start: false,
            track_restarted: false,
            is_playlist: false,
            looping: false,
            volume: 1.0,
            hear_distance: config.hear_distance,
            default_hear_distance: config.hear_distance,
            fade_in: 0.0,
            fade_out: 0.0,
            id: None,
            follow_target: None,
            playlist: VecDeque::new(),
            playlist_len: 0,
            playlist_duration: 0.0,
            next_track_at: 0.0,
            playing_time: 0.0,
            completed_loop_cycles: 0,
            reproduced_tracks: 0,
            ramp: None,
            callbacks: Callbacks::default(),
            end_of_clip_guard: config.end_of_clip_guard,
            loop_cycle_slack: config.loop_cycle_slack,
            outbox: Vec::new(),
        }
    }

    /// Reset configuration left over from the previous owner.
    pub(crate) fn prepare(&mut self) {
        self.kind = SourceKind::Sound;
        self.is_playlist = false;
        self.looping = false;
        self.volume = 1.0;
        self.hear_distance = self.default_hear_distance;
        self.fade_in = 0.0;
        self.fade_out = 0.0;
        self.id = None;
        self.follow_target = None;
        self.playlist.clear();
        self.playlist_len = 0;
        self.playlist_duration = 0.0;
        self.ramp = None;
        self.callbacks = Callbacks::default();
        self.emitter.set_loop(false);
        self.emitter.set_pitch(1.0);
        self.emitter.set_spatial_blend(0.0);
        self.emitter.set_hear_distance(self.default_hear_distance);
        self.emitter.set_output(None);
        self.emitter.set_position([0.0; 3]);
    }

    // ----- configuration -------------------------------------------------

    /// Tag the element as sound or music.
    pub fn set_kind(&mut self, kind: SourceKind) -> &mut Self {
        self.kind = kind;
        self
    }

    /// Switch to playlist bookkeeping.
    pub fn mark_as_playlist(&mut self) -> &mut Self {
        self.is_playlist = true;
        self.kind = SourceKind::Music;
        self
    }

    /// Set the target volume and hearing range, optionally ramping over
    /// `lerp_time` seconds.
    ///
    /// While pausing, paused, stopping or changing track the live volume is
    /// left alone; the new target is used by the next fade-in.
    pub fn set_volume(
        &mut self,
        volume: f32,
        hear_distance: HearDistance,
        lerp_time: f32,
    ) -> &mut Self {
        self.volume = volume;
        self.hear_distance = hear_distance;
        self.emitter.set_hear_distance(hear_distance);

        if matches!(
            self.state,
            SourceState::Paused
                | SourceState::Pausing
                | SourceState::Stopping
                | SourceState::ChangingTrack
        ) {
            warn!(
                "A volume fade is in progress, volume will reach {} on the next fade in",
                volume
            );
            return self;
        }

        match (self.state, self.ramp.take()) {
            (SourceState::FadingIn, Some(active)) => {
                let duration = lerp_time.max(active.ramp.remaining());
                let ramp = VolumeRamp::new(self.emitter.volume(), volume, duration);
                self.start_ramp(ramp, active.on_done);
            }
            _ if lerp_time > 0.0 => {
                let ramp = VolumeRamp::new(self.emitter.volume(), volume, lerp_time);
                self.start_ramp(ramp, RampDone::Nothing);
            }
            _ => self.emitter.set_volume(volume),
        }
        self
    }

    /// Set pitch / speed.
    pub fn set_pitch(&mut self, pitch: f32) -> &mut Self {
        self.emitter.set_pitch(pitch);
        self
    }

    /// Assign the clip for single-clip playback.
    pub fn set_clip(&mut self, clip: Option<Clip>) -> &mut Self {
        self.emitter.set_clip(clip);
        self
    }

    /// Replace the playlist queue.
    pub fn set_playlist(&mut self, clips: impl IntoIterator<Item = Clip>) -> &mut Self {
        self.playlist = clips.into_iter().collect();
        self.playlist_len = self.playlist.len();
        self.playlist_duration = self.playlist.iter().map(Clip::duration).sum();
        self
    }

    /// Append a clip to the live playlist.
    pub fn add_to_playlist(&mut self, clip: Clip) {
        self.playlist_duration += clip.duration();
        self.playlist_len += 1;
        self.playlist.push_back(clip);
    }

    /// Identifier used by the per-id controls.
    pub fn set_id(&mut self, id: Option<String>) -> &mut Self {
        self.id = id;
        self
    }

    /// 3D (`true`) or 2D (`false`) playback.
    pub fn set_spatial(&mut self, spatial: bool) -> &mut Self {
        self.emitter.set_spatial_blend(if spatial { 1.0 } else { 0.0 });
        self
    }

    /// Move the emitter.
    pub fn set_position(&mut self, position: Position) -> &mut Self {
        self.emitter.set_position(position);
        self
    }

    /// Track a target every tick.
    pub fn set_follow_target(&mut self, target: Option<Arc<dyn FollowTarget>>) -> &mut Self {
        self.follow_target = target;
        self
    }

    /// Fade-in used for every playlist track after the first.
    pub fn set_fade_in(&mut self, seconds: f32) -> &mut Self {
        self.fade_in = seconds;
        self
    }

    /// Fade-out used when a clip or track ends.
    pub fn set_fade_out(&mut self, seconds: f32) -> &mut Self {
        self.fade_out = seconds;
        self
    }

    /// Loop the clip (or cycle the playlist).
    pub fn set_loop(&mut self, looping: bool) -> &mut Self {
        self.looping = looping;
        self.emitter.set_loop(looping);
        self
    }

    /// Route to an output bus.
    pub fn set_output(&mut self, output: Option<OutputBus>) -> &mut Self {
        self.emitter.set_output(output);
        self
    }

    /// Replace every callback.
    pub fn set_callbacks(&mut self, callbacks: Callbacks) -> &mut Self {
        self.callbacks = callbacks;
        self
    }

    // ----- queries ------------------------------------------------------

    /// In use until the element returns to `Stopped`.
    pub fn is_using(&self) -> bool {
        self.state != SourceState::Stopped
    }

    /// True while the emitter produces audio.
    pub fn is_playing(&self) -> bool {
        self.emitter.is_playing()
    }

    /// True from a pause request until resume.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current state.
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Sound or music.
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Identifier, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Seconds played since the last `play`, excluding pauses.
    pub fn playing_time(&self) -> f32 {
        self.playing_time
    }

    /// Position inside the current clip.
    pub fn current_loop_cycle_time(&self) -> f32 {
        self.emitter.time()
    }

    /// Loop cycles completed since the last `play`.
    pub fn completed_loop_cycles(&self) -> u32 {
        self.completed_loop_cycles
    }

    /// Playlist tracks started after the first one.
    pub fn reproduced_tracks(&self) -> u32 {
        self.reproduced_tracks
    }

    /// Clip on the emitter.
    pub fn current_clip(&self) -> Option<&Clip> {
        self.emitter.clip()
    }

    /// Duration of the clip on the emitter, 0 without one.
    pub fn current_clip_duration(&self) -> f32 {
        self.emitter.clip().map_or(0.0, Clip::duration)
    }

    /// Next clip in the playlist queue.
    pub fn next_playlist_clip(&self) -> Option<&Clip> {
        self.playlist.front()
    }

    /// Index of the playing track within the playlist.
    pub fn current_track_index(&self) -> usize {
        if self.playlist_len == 0 {
            return 0;
        }
        let played = self.reproduced_tracks as usize;
        if self.looping {
            played % self.playlist_len
        } else {
            played.min(self.playlist_len - 1)
        }
    }

    /// Sum of all playlist track durations.
    pub fn playlist_duration(&self) -> f32 {
        self.playlist_duration
    }

    /// Volume the element converges to.
    pub fn target_volume(&self) -> f32 {
        self.volume
    }

    /// Hearing range.
    pub fn hear_distance(&self) -> HearDistance {
        self.hear_distance
    }

    /// Whether the clip or playlist loops.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Underlying emitter.
    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Underlying emitter, mutably.
    pub fn emitter_mut(&mut self) -> &mut E {
        &mut self.emitter
    }

    pub(crate) fn take_events(&mut self) -> Vec<(PlaybackEventKind, Option<String>)> {
        std::mem::take(&mut self.outbox)
    }

    // ----- transport ----------------------------------------------------

    /// Play the assigned clip, fading in over `fade_in` seconds.
    pub fn play(&mut self, fade_in: f32) {
        if self.emitter.clip().is_none() {
            error!("No audio clip assigned, ignoring play request");
            return;
        }

        self.reset_transport();
        let on_play = self.callbacks.on_play.clone();
        self.fire(PlaybackEventKind::Started, on_play);

        self.emitter.play();
        self.state = SourceState::Playing;
        self.begin_fade_in(fade_in);
    }

    /// Play the playlist queue from its first track.
    pub fn play_playlist(&mut self, fade_in: f32) {
        if self.playlist.is_empty() {
            error!("Playlist has no valid audio clips, ignoring play request");
            return;
        }

        self.is_playlist = true;
        self.reset_transport();
        self.next_track_at = 0.0;
        // The queue loops, not the emitter.
        self.emitter.set_loop(false);

        let on_play = self.callbacks.on_play.clone();
        self.fire(PlaybackEventKind::Started, on_play);

        self.start_next_track(true);
        self.begin_fade_in(fade_in);
    }

    /// Pause, fading out over `fade_out` seconds first.
    pub fn pause(&mut self, fade_out: f32) {
        if !self.is_using() || self.paused {
            return;
        }
        if self.stopping {
            warn!("Element is stopping, ignoring pause request");
            return;
        }

        self.paused = true;
        let on_pause = self.callbacks.on_pause.clone();
        self.fire(PlaybackEventKind::Paused, on_pause);

        if self.changing_track {
            self.complete_pause();
            return;
        }

        if fade_out > 0.0 {
            self.state = SourceState::Pausing;
            let ramp = VolumeRamp::new(self.emitter.volume(), 0.0, fade_out).ignoring_pause();
            self.start_ramp(ramp, RampDone::CompletePause);
            return;
        }
        self.complete_pause();
    }

    /// Resume, fading in over `fade_in` seconds.
    pub fn resume(&mut self, fade_in: f32) {
        if !self.paused {
            return;
        }

        let on_resume = self.callbacks.on_resume.clone();
        self.fire(PlaybackEventKind::Resumed, on_resume);
        self.paused = false;

        if matches!(
            self.ramp,
            Some(ActiveRamp {
                on_done: RampDone::CompletePause,
                ..
            })
        ) {
            self.ramp = None;
        }

        if self.pending_track_start {
            self.pending_track_start = false;
            self.emitter.play();
        } else {
            self.emitter.unpause();
        }

        if self.changing_track {
            self.state = SourceState::ChangingTrack;
            return;
        }

        if fade_in > 0.0 {
            self.state = SourceState::FadingIn;
            let ramp = VolumeRamp::new(self.emitter.volume(), self.volume, fade_in);
            self.start_ramp(ramp, RampDone::EnterPlaying);
            return;
        }

        match &self.ramp {
            Some(ActiveRamp {
                on_done: RampDone::EnterPlaying,
                ..
            }) => self.state = SourceState::FadingIn,
            Some(_) => self.state = SourceState::Playing,
            None => {
                self.state = SourceState::Playing;
                self.emitter.set_volume(self.volume);
            }
        }
    }

    /// Stop, fading out over `fade_out` seconds first. `on_stop` runs right
    /// after on-complete once the element is actually released.
    pub fn stop(&mut self, fade_out: f32, on_stop: Option<Callback>) {
        if !self.is_using() {
            return;
        }

        // A paused element cannot fade: its ramp would never advance.
        if fade_out > 0.0 && !self.paused {
            if self.stopping {
                return;
            }
            self.stopping = true;
            self.state = SourceState::Stopping;
            let ramp = VolumeRamp::new(self.emitter.volume(), 0.0, fade_out);
            self.start_ramp(ramp, RampDone::FinishStop(on_stop));
            return;
        }
        self.stop_now(on_stop);
    }

    /// Advance the element by one frame of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if !self.is_using() {
            return;
        }
        self.track_restarted = false;

        self.advance_ramp(dt);

        if self.is_using() && !self.looping {
            if self.is_playlist {
                self.handle_playlist_stop();
            } else {
                self.handle_sound_stop();
            }
        }

        if self.is_using() && (self.emitter.is_playing() || (self.is_playlist && !self.paused)) {
            self.playing_time += dt;
            if self.is_playlist {
                self.handle_playlist_playing();
            } else {
                self.handle_sound_playing();
            }
        }

        match self.follow_target.as_ref().map(|target| target.position()) {
            Some(Some(position)) => self.emitter.set_position(position),
            Some(None) => self.follow_target = None,
            None => {}
        }

        // A track started during this tick begins at the end of the frame.
        if !self.track_restarted {
            self.emitter.advance(dt);
        }
    }

    // ----- internals ----------------------------------------------------

    fn reset_transport(&mut self) {
        self.ramp = None;
        self.paused = false;
        self.stopping = false;
        self.changing_track = false;
        self.pending_track_start = false;
        self.playing_time = 0.0;
        self.completed_loop_cycles = 0;
        self.reproduced_tracks = 0;
    }

    fn begin_fade_in(&mut self, fade_in: f32) {
        if fade_in > 0.0 {
            self.state = SourceState::FadingIn;
            self.emitter.set_volume(0.0);
            let ramp = VolumeRamp::new(0.0, self.volume, fade_in);
            self.start_ramp(ramp, RampDone::EnterPlaying);
        } else {
            self.emitter.set_volume(self.volume);
        }
    }

    fn fire(&mut self, kind: PlaybackEventKind, callback: Option<Callback>) {
        if let Some(callback) = callback {
            callback();
        }
        self.outbox.push((kind, self.id.clone()));
    }

    fn start_ramp(&mut self, ramp: VolumeRamp, on_done: RampDone) {
        if ramp.is_finished() {
            self.ramp = None;
            self.emitter.set_volume(ramp.target());
            self.complete_ramp(on_done);
        } else {
            self.ramp = Some(ActiveRamp { ramp, on_done });
        }
    }

    fn advance_ramp(&mut self, dt: f32) {
        let finished = match self.ramp.as_mut() {
            Some(active) => {
                if self.paused && !active.ramp.ignores_pause() {
                    return;
                }
                let volume = active.ramp.advance(dt);
                self.emitter.set_volume(volume);
                active.ramp.is_finished()
            }
            None => return,
        };
        if finished {
            if let Some(active) = self.ramp.take() {
                self.complete_ramp(active.on_done);
            }
        }
    }

    fn complete_ramp(&mut self, on_done: RampDone) {
        match on_done {
            RampDone::Nothing => {}
            RampDone::EnterPlaying => {
                if self.state == SourceState::FadingIn {
                    self.state = SourceState::Playing;
                }
            }
            RampDone::CompletePause => self.complete_pause(),
            RampDone::FinishStop(on_stop) => self.stop_now(on_stop),
            RampDone::AdvanceTrack => self.start_next_track(false),
        }
    }

    fn complete_pause(&mut self) {
        let on_pause_complete = self.callbacks.on_pause_complete.clone();
        self.fire(PlaybackEventKind::PauseCompleted, on_pause_complete);
        self.emitter.pause();
        self.state = SourceState::Paused;
    }

    fn stop_now(&mut self, on_stop: Option<Callback>) {
        // An interrupted faded stop still owes its caller the notification.
        let earlier = match self.ramp.take() {
            Some(ActiveRamp {
                on_done: RampDone::FinishStop(callback),
                ..
            }) => callback,
            _ => None,
        };

        let on_complete = self.callbacks.on_complete.clone();
        self.fire(PlaybackEventKind::Completed, on_complete);
        if let Some(callback) = earlier {
            callback();
        }
        if let Some(callback) = on_stop {
            callback();
        }
        self.outbox.push((PlaybackEventKind::Stopped, self.id.clone()));

        self.emitter.stop();
        self.emitter.set_clip(None);
        self.state = SourceState::Stopped;

        self.follow_target = None;
        self.callbacks.clear_except_play();
        self.id = None;
        self.playlist.clear();

        self.paused = false;
        self.stopping = false;
        self.changing_track = false;
        self.pending_track_start = false;
    }

    fn handle_sound_playing(&mut self) {
        if !self.looping {
            return;
        }
        let duration = self.current_clip_duration();
        if duration <= 0.0 {
            return;
        }
        let reached = ((self.playing_time - self.loop_cycle_slack) / duration).floor();
        if reached < 1.0 {
            return;
        }
        let reached = reached as u32;
        while self.completed_loop_cycles < reached {
            self.completed_loop_cycles += 1;
            let callback = self.callbacks.on_loop_cycle_complete.clone();
            self.fire(PlaybackEventKind::LoopCycleCompleted, callback);
        }
    }

    fn handle_playlist_playing(&mut self) {
        if self.changing_track || self.playlist.is_empty() {
            return;
        }
        if self.playing_time < self.next_track_at - self.fade_out {
            return;
        }

        self.changing_track = true;
        self.state = SourceState::ChangingTrack;
        if self.fade_out > 0.0 {
            let ramp = VolumeRamp::new(self.emitter.volume(), 0.0, self.fade_out);
            self.start_ramp(ramp, RampDone::AdvanceTrack);
        } else {
            self.start_next_track(false);
        }
    }

    fn handle_sound_stop(&mut self) {
        if self.stopping {
            return;
        }
        let duration = self.current_clip_duration();
        if self.fade_out > 0.0
            && self.playing_time >= duration - self.end_of_clip_guard - self.fade_out
        {
            self.stop(self.fade_out, None);
            return;
        }
        if !self.emitter.is_playing() && !self.paused {
            self.stop(0.0, None);
        }
    }

    fn handle_playlist_stop(&mut self) {
        if !self.playlist.is_empty() || self.stopping || self.changing_track {
            return;
        }
        let duration = self.current_clip_duration();
        if self.fade_out > 0.0
            && self.emitter.time() >= duration - self.end_of_clip_guard - self.fade_out
        {
            self.stop(self.fade_out, None);
            return;
        }
        if !self.emitter.is_playing() && !self.paused {
            self.stop(0.0, None);
        }
    }

    fn start_next_track(&mut self, first_track: bool) {
        let Some(clip) = self.playlist.pop_front() else {
            self.changing_track = false;
            return;
        };
        if self.looping {
            self.playlist.push_back(clip.clone());
        }
        self.next_track_at += clip.duration();
        self.emitter.set_clip(Some(clip));

        if !first_track {
            self.reproduced_tracks += 1;
            let callback = self.callbacks.on_next_track_start.clone();
            self.fire(PlaybackEventKind::NextTrackStarted, callback);

            if self.looping
                && self.playlist_len > 0
                && self.reproduced_tracks as usize % self.playlist_len == 0
            {
                self.completed_loop_cycles += 1;
                let callback = self.callbacks.on_loop_cycle_complete.clone();
                self.fire(PlaybackEventKind::LoopCycleCompleted, callback);
            }
        }
        self.changing_track = false;

        if self.paused {
            self.pending_track_start = true;
            return;
        }

        self.emitter.play();
        self.track_restarted = !first_track;
        if self.fade_in > 0.0 && !first_track {
            self.state = SourceState::FadingIn;
            let ramp = VolumeRamp::new(self.emitter.volume(), self.volume, self.fade_in);
            self.start_ramp(ramp, RampDone::EnterPlaying);
        } else {
            self.state = SourceState::Playing;
            self.emitter.set_volume(self.volume);
        }
    }
}

impl<E: Emitter> fmt::Debug for SourcePoolElement<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourcePoolElement")
            .field("state", &self.state)
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("paused", &self.paused)
            .field("volume", &self.volume)
            .field("playing_time", &self.playing_time)
            .field("completed_loop_cycles", &self.completed_loop_cycles)
            .field("reproduced_tracks", &self.reproduced_tracks)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
