use tracing::{debug, info};

use crate::engine::{ChannelId, EngineSignal, MediaEngine, MediaHandle, MediaKind, OpenRequest};
use crate::error::Result;
use crate::track::SourceUri;

use super::time::PlaybackTimeState;

/// Lifecycle notifications produced by [`NarrationPlayer`].
///
/// The coordinator handles each one in the same call that produced it, which
/// is how ambience follows narration without a drift window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NarrationEvent {
    Played,
    Paused,
    ReadyToPlay,
    ReachedEnd,
}

/// Owner of the narration handle and the authoritative session timeline.
pub struct NarrationPlayer {
    handle: Option<Box<dyn MediaHandle>>,
    channel: ChannelId,
    time: PlaybackTimeState,
    rate: f32,
    /// A buffering episode is open until the engine reports ready.
    buffering: bool,
    reached_end: bool,
}

impl NarrationPlayer {
    /// Open `source`. Failure here is fatal for the whole session.
    pub fn open(engine: &mut dyn MediaEngine, source: &SourceUri) -> Result<Self> {
        let handle = engine.open(OpenRequest {
            uri: source,
            kind: MediaKind::Narration,
        })?;
        let channel = handle.channel();
        debug!(%channel, %source, "narration opened");

        Ok(Self {
            handle: Some(handle),
            channel,
            time: PlaybackTimeState::new(),
            rate: 0.0,
            buffering: true,
            reached_end: false,
        })
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn time(&self) -> &PlaybackTimeState {
        &self.time
    }

    /// 1.0 while playing, 0.0 otherwise.
    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    pub fn has_reached_end(&self) -> bool {
        self.reached_end
    }

    /// Start or resume. Reports `Played` on every call, even when already playing.
    pub fn play(&mut self) -> Option<NarrationEvent> {
        let handle = self.handle.as_mut()?;
        handle.play();
        self.rate = 1.0;
        Some(NarrationEvent::Played)
    }

    /// Pause. Reports `Paused` on every call, even when already paused.
    ///
    /// The observed time is pinned to where the engine stopped so it does not
    /// lag a tick behind while paused.
    pub fn pause(&mut self) -> Option<NarrationEvent> {
        let handle = self.handle.as_mut()?;
        handle.pause();
        self.time.observed_time = handle.current_time();
        self.rate = 0.0;
        Some(NarrationEvent::Paused)
    }

    pub fn seek(&mut self, seconds: f64) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        debug!(channel = %self.channel, seconds, "narration seek");
        handle.seek(seconds);
        self.buffering = true;
    }

    /// Jump back `seconds` from the displayed time, clamped at the start.
    ///
    /// A released scrub that has not been resolved yet absorbs the rewind, so
    /// the next tick still issues exactly one seek.
    pub fn rewind(&mut self, seconds: f64) -> Option<f64> {
        self.handle.as_ref()?;
        let target = self.time.rewind_target(seconds);
        if self.time.has_pending_seek() {
            self.time.end_scrub(target);
        } else {
            self.seek(target);
        }
        Some(target)
    }

    /// Periodic tick: fold the engine position into the timeline and resolve
    /// a released scrub into its single seek.
    pub fn tick(&mut self, observed: f64) {
        if self.handle.is_none() {
            return;
        }
        if let Some(target) = self.time.advance(observed) {
            self.seek(target);
        }
    }

    pub fn begin_scrub(&mut self) {
        self.time.begin_scrub();
    }

    pub fn update_scrub(&mut self, value: f64) {
        self.time.update_scrub(value);
    }

    pub fn end_scrub(&mut self, value: f64) {
        self.time.end_scrub(value);
    }

    /// Route an engine signal addressed to this channel.
    pub fn handle_signal(&mut self, signal: &EngineSignal) -> Option<NarrationEvent> {
        if self.handle.is_none() || signal.channel() != self.channel {
            return None;
        }
        match *signal {
            EngineSignal::ReadyToPlay { .. } => {
                if !self.buffering {
                    return None;
                }
                self.buffering = false;
                Some(NarrationEvent::ReadyToPlay)
            }
            EngineSignal::PeriodicTime { seconds, .. } => {
                self.tick(seconds);
                None
            }
            EngineSignal::DurationResolved { seconds, .. } => {
                if seconds.is_finite() && seconds > 0.0 {
                    self.time.duration = seconds;
                }
                None
            }
            EngineSignal::ReachedEnd { .. } => {
                if self.reached_end {
                    return None;
                }
                self.reached_end = true;
                info!(channel = %self.channel, "narration reached the end");
                Some(NarrationEvent::ReachedEnd)
            }
        }
    }

    /// Stop signal delivery for the handle without releasing it yet.
    pub fn detach(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.detach();
        }
    }

    /// Pause, detach and free the handle. Later calls are no-ops.
    pub fn destroy(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        handle.pause();
        handle.detach();
        handle.release();
        self.rate = 0.0;
        debug!(channel = %self.channel, "narration released");
    }
}
