use std::ops::RangeInclusive;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::engine::ChannelId;

use super::time;

/// Everything the presentation layer renders, published after each change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSnapshot {
    pub display_time: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub is_finished: bool,
    pub is_unguided_part: bool,
    pub track_favorited: bool,
    pub ambience_muted: bool,
    /// Both ambience loops have reported ready.
    pub ambience_ready: bool,
    pub is_destroyed: bool,
    /// Passed through for rendering only; the coordinator stays in control.
    pub background_channel: Option<ChannelId>,
    pub noise_channel: Option<ChannelId>,
    pub unguided_tail_seconds: Option<f64>,
}

impl PlayerSnapshot {
    pub fn percent_complete(&self) -> f64 {
        time::percent_complete(self.display_time, self.duration)
    }

    pub fn scrub_range(&self) -> RangeInclusive<f64> {
        time::scrub_range(self.duration)
    }

    /// Fraction of the scrub bar (0.0-1.0) where the unguided tail begins.
    pub fn unguided_marker(&self) -> Option<f64> {
        let tail = self.unguided_tail_seconds?;
        if self.duration <= 0.0 {
            return None;
        }
        Some(((self.duration - tail) / self.duration).clamp(0.0, 1.0))
    }

    pub fn has_duration(&self) -> bool {
        self.duration > 0.0
    }
}

/// Ordered fan-out of snapshots to subscribers.
#[derive(Debug, Default)]
pub(crate) struct SnapshotPublisher {
    subscribers: Vec<Sender<PlayerSnapshot>>,
}

impl SnapshotPublisher {
    pub(crate) fn subscribe(&mut self, current: PlayerSnapshot) -> Receiver<PlayerSnapshot> {
        let (tx, rx) = mpsc::channel();
        if tx.send(current).is_ok() {
            self.subscribers.push(tx);
        }
        rx
    }

    /// Deliver to every live subscriber, dropping those that hung up.
    pub(crate) fn publish(&mut self, snapshot: &PlayerSnapshot) {
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    pub(crate) fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}
