//! Boundary to the external media engine.
//!
//! The player never decodes media itself. It asks a [`MediaEngine`] to open
//! sources and drives the returned [`MediaHandle`]s. All engine calls are
//! fire-and-forget; results come back later as [`EngineSignal`]s over an mpsc
//! channel that the coordinator drains on its own thread.

mod output;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use output::RodioEngine;
pub use types::*;

use crate::error::Result;

/// Opens media sources.
pub trait MediaEngine {
    fn open(&mut self, request: OpenRequest<'_>) -> Result<Box<dyn MediaHandle>>;
}

/// One opened media resource, exclusively owned by its wrapper.
pub trait MediaHandle {
    fn channel(&self) -> ChannelId;
    fn play(&mut self);
    fn pause(&mut self);
    /// Seek to `seconds` from the start of the resource.
    fn seek(&mut self, seconds: f64);
    fn set_muted(&mut self, muted: bool);
    fn set_volume(&mut self, volume: f32);
    /// Engage or drop the engine-level loop controller.
    fn set_looping(&mut self, looping: bool);
    /// Last known playback position in seconds.
    fn current_time(&self) -> f64;
    /// Stop delivering signals for this handle. Must be called before `release`.
    fn detach(&mut self);
    /// Stop playback and free the resource.
    fn release(self: Box<Self>);
}
