use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PlayerError, Result};

/// Location of a media resource: a plain filesystem path or a `scheme://` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct SourceUri(String);

impl SourceUri {
    /// Validate `raw` as a source location.
    ///
    /// Plain paths are accepted as-is. Anything containing `://` must carry a
    /// well-formed scheme and a non-empty remainder.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PlayerError::InvalidSource(raw));
        }

        if let Some((scheme, rest)) = trimmed.split_once("://") {
            let scheme_ok = scheme
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if !scheme_ok || rest.is_empty() {
                return Err(PlayerError::InvalidSource(raw));
            }
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::parse(path.display().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI scheme in lowercase, `None` for plain paths.
    pub fn scheme(&self) -> Option<String> {
        self.0
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
    }

    /// Filesystem path for plain paths and `file://` URIs.
    pub fn to_local_path(&self) -> Option<PathBuf> {
        match self.scheme().as_deref() {
            None => Some(PathBuf::from(&self.0)),
            Some("file") => self.0.split_once("://").map(|(_, p)| PathBuf::from(p)),
            Some(_) => None,
        }
    }

    /// Anchor a relative local path at `base`. URIs and absolute paths are kept.
    pub(crate) fn resolve_against(self, base: &Path) -> Self {
        if self.scheme().is_some() {
            return self;
        }
        let path = Path::new(&self.0);
        if path.is_absolute() {
            return self;
        }
        Self(base.join(path).display().to_string())
    }
}

impl TryFrom<String> for SourceUri {
    type Error = PlayerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl fmt::Display for SourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A playable guided session.
///
/// Created once by the caller and handed to the coordinator, which keeps its
/// own copy; nothing in the player mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub narration_source: SourceUri,
    /// Looping background video. Without it no ambience is created at all.
    pub background_animation_source: Option<SourceUri>,
    /// Noise loop volume, 0-100.
    pub background_volume_percent: Option<u8>,
    pub favorited: bool,
    /// Length of the unguided tail at the end of the narration.
    pub unguided_tail_seconds: Option<f64>,
}

impl Track {
    pub fn new(narration_source: SourceUri) -> Self {
        Self {
            title: None,
            subtitle: None,
            narration_source,
            background_animation_source: None,
            background_volume_percent: None,
            favorited: false,
            unguided_tail_seconds: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_background(mut self, source: SourceUri, volume_percent: Option<u8>) -> Self {
        self.background_animation_source = Some(source);
        self.background_volume_percent = volume_percent;
        self
    }

    pub fn with_unguided_tail(mut self, seconds: f64) -> Self {
        self.unguided_tail_seconds = Some(seconds);
        self
    }

    pub fn with_favorited(mut self, favorited: bool) -> Self {
        self.favorited = favorited;
        self
    }

    /// Check value ranges that the type system does not enforce.
    pub fn validate(&self) -> Result<()> {
        if let Some(v) = self.background_volume_percent {
            if v > 100 {
                return Err(PlayerError::InvalidTrack(format!(
                    "background volume {v} is outside 0-100"
                )));
            }
        }
        if let Some(tail) = self.unguided_tail_seconds {
            if !tail.is_finite() || tail < 0.0 {
                return Err(PlayerError::InvalidTrack(format!(
                    "unguided tail {tail} must be a non-negative number of seconds"
                )));
            }
        }
        Ok(())
    }

    /// Linear gain for the noise loop. A missing volume means silent.
    pub fn noise_volume(&self) -> f32 {
        f32::from(self.background_volume_percent.unwrap_or(0).min(100)) / 100.0
    }
}
