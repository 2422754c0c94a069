//! Guided-session audio player.
//!
//! A session plays one narration track with optional ambience: a muted
//! looping background animation and a looping noise bed. The
//! [`playback::PlaybackCoordinator`] keeps them in lock-step, tracks the
//! unguided tail at the end of the narration and publishes snapshots for the
//! terminal front end.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod playback;
pub mod runtime;
pub mod track;
pub mod ui;

pub use error::{PlayerError, Result};
