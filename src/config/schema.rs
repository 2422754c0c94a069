use std::path::PathBuf;

use serde::Deserialize;

use crate::playback::{LabelTexts, SessionOptions};
use crate::track::SourceUri;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/unguided/config.toml` or `~/.config/unguided/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `UNGUIDED__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub ambience: AmbienceSettings,
    pub controls: ControlsSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Session knobs handed to the coordinator.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            rewind_seconds: self.playback.rewind_seconds,
            autoplay: self.playback.autoplay,
            noise_source: self.ambience.noise_source.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Interval of the periodic time signal (milliseconds).
    pub tick_interval_ms: u64,
    /// How far `r` jumps back (seconds).
    pub rewind_seconds: f64,
    /// Start playing as soon as the narration is ready.
    pub autoplay: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            rewind_seconds: 15.0,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AmbienceSettings {
    /// Looping noise played under tracks that have a background animation.
    /// Without it, sessions run narration only.
    pub noise_source: Option<SourceUri>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `h` / `l`.
    pub scrub_seconds: u64,
    /// Idle time after the last scrub key before the scrub is committed.
    pub scrub_commit_ms: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            scrub_commit_ms: 700,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Title shown once the unguided tail begins.
    pub unguided_title: String,
    /// Subtitle shown once the unguided tail begins.
    pub unguided_subtitle: String,
    /// Subtitle shown for tracks without one.
    pub missing_subtitle: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        let labels = LabelTexts::default();
        Self {
            header_text: " ~ unguided ~ ".to_string(),
            unguided_title: labels.unguided_title,
            unguided_subtitle: labels.unguided_subtitle,
            missing_subtitle: labels.missing_subtitle,
        }
    }
}

impl UiSettings {
    pub fn label_texts(&self) -> LabelTexts {
        LabelTexts {
            unguided_title: self.unguided_title.clone(),
            unguided_subtitle: self.unguided_subtitle.clone(),
            missing_subtitle: self.missing_subtitle.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub filter: String,
    /// Log destination. Nothing is logged when unset, the terminal is busy.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}
