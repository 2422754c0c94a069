use tracing::{debug, warn};

use crate::engine::{ChannelId, MediaEngine, MediaKind};
use crate::track::{SourceUri, Track};

use super::looping::LoopingMediaChannel;

struct Channels {
    background: LoopingMediaChannel,
    noise: LoopingMediaChannel,
}

/// Background video loop and noise loop driven as one unit.
///
/// Either both channels exist or neither does. An empty group accepts every
/// call and does nothing, so callers never need to check.
pub struct AmbiencePlayerGroup {
    channels: Option<Channels>,
}

impl AmbiencePlayerGroup {
    /// A group with no channels.
    pub fn empty() -> Self {
        Self { channels: None }
    }

    /// Open the ambience for `track`.
    ///
    /// Without a background source, a noise source, or when either fails to
    /// open, the group comes back empty. Narration is never affected.
    pub fn open(engine: &mut dyn MediaEngine, track: &Track, noise_source: Option<&SourceUri>) -> Self {
        let Some(background_source) = track.background_animation_source.as_ref() else {
            return Self::empty();
        };
        let Some(noise_source) = noise_source else {
            warn!("no noise source configured, ambience disabled");
            return Self::empty();
        };

        let mut background =
            match LoopingMediaChannel::open(engine, background_source, MediaKind::BackgroundVideo) {
                Ok(ch) => ch,
                Err(e) => {
                    warn!(error = %e, "background loop unavailable, ambience disabled");
                    return Self::empty();
                }
            };
        let mut noise = match LoopingMediaChannel::open(engine, noise_source, MediaKind::NoiseLoop) {
            Ok(ch) => ch,
            Err(e) => {
                warn!(error = %e, "noise loop unavailable, ambience disabled");
                background.destroy();
                return Self::empty();
            }
        };

        // The video is visual only.
        background.set_muted(true);
        background.set_volume(0.0);
        noise.set_volume(track.noise_volume());

        Self {
            channels: Some(Channels { background, noise }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_none()
    }

    pub fn background_channel(&self) -> Option<ChannelId> {
        self.channels.as_ref().map(|c| c.background.channel())
    }

    pub fn noise_channel(&self) -> Option<ChannelId> {
        self.channels.as_ref().map(|c| c.noise.channel())
    }

    /// Both loops have reported ready.
    pub fn is_ready(&self) -> bool {
        self.channels
            .as_ref()
            .is_some_and(|c| c.background.is_ready() && c.noise.is_ready())
    }

    /// Record a ready signal if it belongs to one of this group's channels.
    pub fn handle_ready(&mut self, channel: ChannelId) -> bool {
        let Some(c) = self.channels.as_mut() else {
            return false;
        };
        if c.background.channel() == channel {
            c.background.mark_ready();
        } else if c.noise.channel() == channel {
            c.noise.mark_ready();
        } else {
            return false;
        }
        true
    }

    pub fn play(&mut self) {
        if let Some(c) = self.channels.as_mut() {
            c.background.play();
            c.noise.play();
        }
    }

    pub fn pause(&mut self) {
        if let Some(c) = self.channels.as_mut() {
            c.background.pause();
            c.noise.pause();
        }
    }

    /// Silence the noise loop. The video stays muted regardless.
    pub fn mute(&mut self) {
        if let Some(c) = self.channels.as_mut() {
            c.noise.set_muted(true);
        }
    }

    pub fn unmute(&mut self) {
        if let Some(c) = self.channels.as_mut() {
            c.noise.set_muted(false);
        }
    }

    pub fn seek_to_start(&mut self) {
        if let Some(c) = self.channels.as_mut() {
            c.noise.seek(0.0);
            c.background.seek(0.0);
        }
    }

    pub fn detach(&mut self) {
        if let Some(c) = self.channels.as_mut() {
            c.background.detach();
            c.noise.detach();
        }
    }

    /// Stop and release both loops. The group is empty afterwards.
    pub fn destroy(&mut self) {
        if let Some(mut c) = self.channels.take() {
            c.background.destroy();
            c.noise.destroy();
            debug!("ambience released");
        }
    }
}
