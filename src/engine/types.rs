use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::track::SourceUri;

/// Opaque identity of an opened media resource.
///
/// Handed to the presentation layer so it can bind a renderer to the
/// background or noise channel without controlling it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u32);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// What a resource is used for; engines may open them differently.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MediaKind {
    /// Foreground narration that drives the session timeline.
    Narration,
    /// Muted, visual-only background loop.
    BackgroundVideo,
    /// Audible ambient noise loop.
    NoiseLoop,
}

#[derive(Debug, Clone, Copy)]
pub struct OpenRequest<'a> {
    pub uri: &'a SourceUri,
    pub kind: MediaKind,
}

/// Asynchronous notifications from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    /// Enough is buffered to start playing.
    ReadyToPlay { channel: ChannelId },
    /// Periodic position report.
    PeriodicTime { channel: ChannelId, seconds: f64 },
    /// Total length became known.
    DurationResolved { channel: ChannelId, seconds: f64 },
    /// Playback ran off the end of a non-looping resource.
    ReachedEnd { channel: ChannelId },
}

impl EngineSignal {
    pub fn channel(&self) -> ChannelId {
        match self {
            Self::ReadyToPlay { channel }
            | Self::PeriodicTime { channel, .. }
            | Self::DurationResolved { channel, .. }
            | Self::ReachedEnd { channel } => *channel,
        }
    }
}

pub type SignalSender = Sender<EngineSignal>;
pub type SignalReceiver = Receiver<EngineSignal>;

/// Create the channel an engine reports through.
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    mpsc::channel()
}
