use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schema::Settings;

const ENV_PREFIX: &str = "UNGUIDED";
const PATH_OVERRIDE: &str = "UNGUIDED_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Settings {
    /// Load settings from the resolved config path and the environment.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(config_path().as_deref())
    }

    /// Layer defaults, the file at `path` (if it exists) and `UNGUIDED__*`
    /// variables, then validate.
    ///
    /// A relative `ambience.noise_source` is anchored at the directory of
    /// `path`.
    pub fn load_from(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        let cfg = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = cfg.try_deserialize()?;
        if let Some(dir) = path.and_then(Path::parent) {
            settings.ambience.noise_source = settings
                .ambience
                .noise_source
                .take()
                .map(|uri| uri.resolve_against(dir));
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));
        if self.playback.tick_interval_ms == 0 {
            return invalid("playback.tick_interval_ms must be >= 1");
        }
        if !(self.playback.rewind_seconds.is_finite() && self.playback.rewind_seconds > 0.0) {
            return invalid("playback.rewind_seconds must be > 0");
        }
        if self.controls.scrub_commit_ms == 0 {
            return invalid("controls.scrub_commit_ms must be >= 1");
        }
        Ok(())
    }
}

/// `UNGUIDED_CONFIG_PATH` if set, else `<config home>/unguided/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    env::var_os(PATH_OVERRIDE)
        .map(PathBuf::from)
        .or_else(|| config_home().map(|d| d.join("unguided").join("config.toml")))
}

/// `$XDG_CONFIG_HOME`, or `~/.config` without it.
fn config_home() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))
}
