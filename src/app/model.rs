//! Application model types: `App`, `Intent` and `KeyboardScrub`.
//!
//! The coordinator owns the session; `App` only mirrors what it published and
//! turns key presses into intents for the runtime to apply.

use std::time::{Duration, Instant};

use crate::playback::{LabelTexts, PlayerSnapshot, SessionLabels};
use crate::track::Track;

/// A user intent, applied to the coordinator by the runtime.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Intent {
    TogglePlayPause,
    Rewind,
    BeginScrub,
    UpdateScrub(f64),
    EndScrub(f64),
    Mute,
    Unmute,
    ToggleFavorite,
    /// Tear the session down and leave.
    Skip,
    Quit,
}

/// A scrub driven by repeated `h`/`l` presses.
///
/// Each press moves the target and pushes the commit deadline back; the scrub
/// is released once the keys go quiet or on Enter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KeyboardScrub {
    pub target: f64,
    pub commit_at: Instant,
}

/// The main application model.
pub struct App {
    pub track: Track,
    pub snapshot: PlayerSnapshot,
    pub scrub: Option<KeyboardScrub>,
    pub metadata_window: bool,
    label_texts: LabelTexts,
}

impl App {
    /// Create a new `App` for `track`, rendering labels with `label_texts`.
    pub fn new(track: Track, label_texts: LabelTexts) -> Self {
        Self {
            snapshot: PlayerSnapshot {
                track_favorited: track.favorited,
                unguided_tail_seconds: track.unguided_tail_seconds,
                ..PlayerSnapshot::default()
            },
            track,
            scrub: None,
            metadata_window: false,
            label_texts,
        }
    }

    /// Fold a published snapshot into the model.
    pub fn apply_snapshot(&mut self, snapshot: PlayerSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn labels(&self) -> SessionLabels {
        SessionLabels::new(&self.track, &self.snapshot, &self.label_texts)
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Whether transport controls still do anything.
    pub fn accepts_transport(&self) -> bool {
        !self.snapshot.is_finished && !self.snapshot.is_destroyed
    }

    pub fn mute_intent(&self) -> Intent {
        if self.snapshot.ambience_muted {
            Intent::Unmute
        } else {
            Intent::Mute
        }
    }

    /// Move the keyboard scrub by `delta` seconds.
    ///
    /// The first press starts a scrub from the displayed time. The target is
    /// clamped to the scrub range.
    pub fn scrub_by(&mut self, delta: f64, now: Instant, commit_after: Duration) -> Vec<Intent> {
        if !self.accepts_transport() {
            return Vec::new();
        }
        let range = self.snapshot.scrub_range();
        let mut intents = Vec::with_capacity(2);
        let from = match self.scrub {
            Some(s) => s.target,
            None => {
                intents.push(Intent::BeginScrub);
                self.snapshot.display_time
            }
        };
        let target = (from + delta).clamp(*range.start(), *range.end());
        self.scrub = Some(KeyboardScrub {
            target,
            commit_at: now + commit_after,
        });
        intents.push(Intent::UpdateScrub(target));
        intents
    }

    /// Release the scrub if its deadline has passed.
    pub fn scrub_commit_due(&mut self, now: Instant) -> Option<Intent> {
        match self.scrub {
            Some(s) if now >= s.commit_at => self.commit_scrub(),
            _ => None,
        }
    }

    /// Release the scrub immediately.
    pub fn commit_scrub(&mut self) -> Option<Intent> {
        self.scrub.take().map(|s| Intent::EndScrub(s.target))
    }

    /// Time left before the pending scrub commits, for the event poll timeout.
    pub fn until_scrub_commit(&self, now: Instant) -> Option<Duration> {
        self.scrub.map(|s| s.commit_at.saturating_duration_since(now))
    }
}
