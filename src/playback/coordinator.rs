use std::sync::mpsc::Receiver;

use tracing::{debug, info};

use crate::engine::{EngineSignal, MediaEngine, SignalReceiver};
use crate::error::Result;
use crate::track::{SourceUri, Track};

use super::ambience::AmbiencePlayerGroup;
use super::narration::{NarrationEvent, NarrationPlayer};
use super::snapshot::{PlayerSnapshot, SnapshotPublisher};
use super::time::PlaybackTimeState;

/// Where the session is in its lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    Playing,
    Paused,
    /// Narration ran to the end. Nothing leaves this state.
    Finished,
}

/// Knobs the coordinator takes from its host.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Distance of a single rewind.
    pub rewind_seconds: f64,
    /// Start playing on the first ready signal after the view appears.
    pub autoplay: bool,
    /// Looping noise asset paired with the background video.
    pub noise_source: Option<SourceUri>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            rewind_seconds: 15.0,
            autoplay: true,
            noise_source: None,
        }
    }
}

/// Persists the favorite flag elsewhere and returns the new value.
pub type FavoriteToggle = Box<dyn FnMut() -> bool>;

/// The session state engine.
///
/// Owns the narration player and the ambience group, accepts user intents,
/// folds engine signals in and publishes a [`PlayerSnapshot`] after every
/// change. Everything runs on the thread that owns the coordinator; engine
/// signals reach it through [`PlaybackCoordinator::pump`].
pub struct PlaybackCoordinator {
    track: Track,
    options: SessionOptions,
    narration: NarrationPlayer,
    ambience: AmbiencePlayerGroup,
    signals: Option<SignalReceiver>,
    favorite_toggle: FavoriteToggle,
    publisher: SnapshotPublisher,
    state: SessionState,
    is_playing: bool,
    is_unguided_part: bool,
    favorited: bool,
    ambience_muted: bool,
    appeared: bool,
    narration_ready: bool,
    destroyed: bool,
}

impl PlaybackCoordinator {
    /// Open every resource for `track`.
    ///
    /// Fails when the track is invalid or the narration cannot be opened.
    /// Ambience problems only leave the session without ambience.
    pub fn new(
        track: Track,
        engine: &mut dyn MediaEngine,
        signals: SignalReceiver,
        favorite_toggle: impl FnMut() -> bool + 'static,
        options: SessionOptions,
    ) -> Result<Self> {
        track.validate()?;
        let narration = NarrationPlayer::open(engine, &track.narration_source)?;
        let ambience = AmbiencePlayerGroup::open(engine, &track, options.noise_source.as_ref());
        info!(
            title = track.title.as_deref().unwrap_or(""),
            ambience = !ambience.is_empty(),
            "session created"
        );

        Ok(Self {
            favorited: track.favorited,
            track,
            options,
            narration,
            ambience,
            signals: Some(signals),
            favorite_toggle: Box::new(favorite_toggle),
            publisher: SnapshotPublisher::default(),
            state: SessionState::NotStarted,
            is_playing: false,
            is_unguided_part: false,
            ambience_muted: false,
            appeared: false,
            narration_ready: false,
            destroyed: false,
        })
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn time(&self) -> &PlaybackTimeState {
        self.narration.time()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let time = self.narration.time();
        PlayerSnapshot {
            display_time: time.display_time,
            duration: time.duration,
            is_playing: self.is_playing,
            is_finished: self.state == SessionState::Finished,
            is_unguided_part: self.is_unguided_part,
            track_favorited: self.favorited,
            ambience_muted: self.ambience_muted,
            ambience_ready: self.ambience.is_ready(),
            is_destroyed: self.destroyed,
            background_channel: self.ambience.background_channel(),
            noise_channel: self.ambience.noise_channel(),
            unguided_tail_seconds: self.track.unguided_tail_seconds,
        }
    }

    /// Receive every published snapshot, starting with the current one.
    pub fn subscribe(&mut self) -> Receiver<PlayerSnapshot> {
        let current = self.snapshot();
        if self.destroyed {
            // Hand back the final state on a channel that is already closed.
            return SnapshotPublisher::default().subscribe(current);
        }
        self.publisher.subscribe(current)
    }

    pub fn subscriber_count(&self) -> usize {
        self.publisher.len()
    }

    /// Arm the session once the presentation is on screen.
    ///
    /// With autoplay on, playback starts now if the narration is already
    /// ready, otherwise on its first ready signal.
    pub fn on_appear(&mut self) {
        if self.ignore_if_destroyed("appear") || self.appeared {
            return;
        }
        self.appeared = true;
        debug!("presentation appeared");
        if self.options.autoplay && self.narration_ready && self.state == SessionState::NotStarted {
            self.start_playing();
        }
        self.publish();
    }

    pub fn play(&mut self) {
        if self.ignore_if_destroyed("play") || self.ignore_if_finished("play") {
            return;
        }
        self.start_playing();
        self.publish();
    }

    pub fn pause(&mut self) {
        if self.ignore_if_destroyed("pause") || self.ignore_if_finished("pause") {
            return;
        }
        if let Some(event) = self.narration.pause() {
            self.handle_narration_event(event);
        }
        self.publish();
    }

    /// The single play button: pause when playing, play otherwise.
    pub fn toggle_play_pause(&mut self) {
        if self.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn rewind(&mut self) {
        if self.ignore_if_destroyed("rewind") || self.ignore_if_finished("rewind") {
            return;
        }
        if let Some(target) = self.narration.rewind(self.options.rewind_seconds) {
            debug!(target, "rewind");
        }
        self.publish();
    }

    pub fn begin_scrub(&mut self) {
        if self.ignore_if_destroyed("begin_scrub") || self.ignore_if_finished("begin_scrub") {
            return;
        }
        self.narration.begin_scrub();
        self.publish();
    }

    pub fn update_scrub(&mut self, value: f64) {
        if self.ignore_if_destroyed("update_scrub") || self.ignore_if_finished("update_scrub") {
            return;
        }
        self.narration.update_scrub(value);
        self.publish();
    }

    /// Release a scrub at `value`. The seek happens on the next tick.
    pub fn end_scrub(&mut self, value: f64) {
        if self.ignore_if_destroyed("end_scrub") || self.ignore_if_finished("end_scrub") {
            return;
        }
        self.narration.end_scrub(value);
        self.publish();
    }

    /// Silence the ambient noise. Narration volume is left alone.
    pub fn mute(&mut self) {
        if self.ignore_if_destroyed("mute") {
            return;
        }
        self.ambience.mute();
        self.ambience_muted = true;
        self.publish();
    }

    pub fn unmute(&mut self) {
        if self.ignore_if_destroyed("unmute") {
            return;
        }
        self.ambience.unmute();
        self.ambience_muted = false;
        self.publish();
    }

    pub fn toggle_favorite(&mut self) {
        if self.ignore_if_destroyed("toggle_favorite") {
            return;
        }
        self.favorited = (self.favorite_toggle)();
        debug!(favorited = self.favorited, "favorite toggled");
        self.publish();
    }

    /// Drain pending engine signals. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let pending: Vec<EngineSignal> = match self.signals.as_ref() {
            Some(rx) => rx.try_iter().collect(),
            None => return 0,
        };
        let count = pending.len();
        for signal in pending {
            self.handle_signal(signal);
        }
        count
    }

    /// Fold one engine signal into the session.
    pub fn handle_signal(&mut self, signal: EngineSignal) {
        if self.destroyed {
            return;
        }

        if signal.channel() == self.narration.channel() {
            if let Some(event) = self.narration.handle_signal(&signal) {
                self.handle_narration_event(event);
            }
            self.publish();
            return;
        }

        if let EngineSignal::ReadyToPlay { channel } = signal {
            if self.ambience.handle_ready(channel) {
                debug!(%channel, "ambience channel ready");
                self.publish();
            }
        }
    }

    /// Tear everything down. Signal subscriptions go first so nothing late
    /// can reach released handles. Every intent afterwards is a no-op.
    pub fn destroy_all(&mut self) {
        if self.destroyed {
            return;
        }
        self.signals = None;
        self.narration.detach();
        self.ambience.detach();

        self.narration.destroy();
        self.ambience.destroy();

        self.is_playing = false;
        self.destroyed = true;
        info!("session destroyed");

        let last = self.snapshot();
        self.publisher.publish(&last);
        self.publisher.clear();
    }

    fn start_playing(&mut self) {
        if let Some(event) = self.narration.play() {
            self.handle_narration_event(event);
        }
    }

    fn handle_narration_event(&mut self, event: NarrationEvent) {
        match event {
            NarrationEvent::Played => {
                self.ambience.play();
                self.is_playing = true;
                self.state = SessionState::Playing;
            }
            NarrationEvent::Paused => {
                self.ambience.pause();
                self.is_playing = false;
                if self.state != SessionState::Finished {
                    self.state = SessionState::Paused;
                }
            }
            NarrationEvent::ReadyToPlay => {
                self.narration_ready = true;
                if self.options.autoplay && self.appeared && self.state == SessionState::NotStarted {
                    info!("narration ready, starting playback");
                    self.start_playing();
                }
            }
            NarrationEvent::ReachedEnd => self.finish(),
        }
    }

    fn finish(&mut self) {
        if self.state == SessionState::Finished {
            return;
        }
        self.ambience.pause();
        self.ambience.destroy();
        self.narration.pause();
        self.is_playing = false;
        self.state = SessionState::Finished;
        info!("session finished");
    }

    /// The one place derived state is recomputed before it is published.
    fn recompute(&mut self) {
        self.is_unguided_part = self
            .narration
            .time()
            .is_unguided_part(self.track.unguided_tail_seconds);
    }

    fn publish(&mut self) {
        self.recompute();
        let snapshot = self.snapshot();
        self.publisher.publish(&snapshot);
    }

    fn ignore_if_destroyed(&self, intent: &str) -> bool {
        if self.destroyed {
            debug!(intent, "ignored, session destroyed");
        }
        self.destroyed
    }

    fn ignore_if_finished(&self, intent: &str) -> bool {
        let finished = self.state == SessionState::Finished;
        if finished {
            debug!(intent, "ignored, session finished");
        }
        finished
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        self.destroy_all();
    }
}
