use tracing::debug;

use crate::engine::{ChannelId, MediaEngine, MediaHandle, MediaKind, OpenRequest};
use crate::error::Result;
use crate::track::SourceUri;

/// A media handle that loops forever at the engine level.
pub struct LoopingMediaChannel {
    handle: Option<Box<dyn MediaHandle>>,
    channel: ChannelId,
    ready: bool,
}

impl LoopingMediaChannel {
    pub fn open(engine: &mut dyn MediaEngine, source: &SourceUri, kind: MediaKind) -> Result<Self> {
        let mut handle = engine.open(OpenRequest { uri: source, kind })?;
        handle.set_looping(true);
        let channel = handle.channel();
        debug!(%channel, ?kind, %source, "loop channel opened");

        Ok(Self {
            handle: Some(handle),
            channel,
            ready: false,
        })
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Whether the engine has reported this loop ready to play.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub(crate) fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn play(&mut self) {
        if let Some(h) = self.handle.as_mut() {
            h.play();
        }
    }

    pub fn pause(&mut self) {
        if let Some(h) = self.handle.as_mut() {
            h.pause();
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        if let Some(h) = self.handle.as_mut() {
            h.seek(seconds);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        if let Some(h) = self.handle.as_mut() {
            h.set_muted(muted);
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        if let Some(h) = self.handle.as_mut() {
            h.set_volume(volume);
        }
    }

    pub fn detach(&mut self) {
        if let Some(h) = self.handle.as_mut() {
            h.detach();
        }
    }

    /// Drop the loop controller first, then stop and free the player.
    pub fn destroy(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        handle.set_looping(false);
        handle.detach();
        handle.pause();
        handle.release();
        self.ready = false;
    }
}
