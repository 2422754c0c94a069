use std::fs;
use std::path::Path;

use lofty::prelude::{Accessor, TaggedFileExt};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

use super::model::{SourceUri, Track};

/// On-disk shape of a track descriptor (`*.toml`).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrackDescriptor {
    title: Option<String>,
    subtitle: Option<String>,
    narration: SourceUri,
    #[serde(default)]
    favorited: bool,
    unguided_seconds: Option<f64>,
    #[serde(default)]
    animation: AnimationDescriptor,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnimationDescriptor {
    background: Option<SourceUri>,
    volume: Option<u8>,
}

impl Track {
    /// Parse a descriptor, resolving relative sources against `base_dir`.
    pub fn from_descriptor_str(text: &str, base_dir: &Path) -> Result<Self> {
        let desc: TrackDescriptor = toml::from_str(text)?;

        let track = Track {
            title: desc.title.filter(|t| !t.trim().is_empty()),
            subtitle: desc.subtitle.filter(|s| !s.trim().is_empty()),
            narration_source: desc.narration.resolve_against(base_dir),
            background_animation_source: desc
                .animation
                .background
                .map(|b| b.resolve_against(base_dir)),
            background_volume_percent: desc.animation.volume,
            favorited: desc.favorited,
            unguided_tail_seconds: desc.unguided_seconds,
        };
        track.validate()?;
        Ok(track)
    }

    /// Load a descriptor file. A missing title is taken from the narration tags.
    pub fn load_descriptor(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut track = Self::from_descriptor_str(&text, base_dir)?;
        if track.title.is_none() {
            track.title = track
                .narration_source
                .to_local_path()
                .and_then(|p| title_from_file(&p));
        }
        debug!(path = %path.display(), title = ?track.title, "loaded track descriptor");
        Ok(track)
    }

    /// Build a narration-only track straight from an audio file.
    pub fn from_audio_file(path: &Path) -> Result<Self> {
        let mut track = Track::new(SourceUri::from_path(path)?);
        track.title = title_from_file(path);
        Ok(track)
    }

    /// Load `path` as a descriptor when it ends in `.toml`, otherwise as audio.
    pub fn load(path: &Path) -> Result<Self> {
        if is_descriptor_path(path) {
            Self::load_descriptor(path)
        } else {
            Self::from_audio_file(path)
        }
    }
}

fn is_descriptor_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

/// Title tag of `path`, falling back to the file stem.
fn title_from_file(path: &Path) -> Option<String> {
    let tagged_title = lofty::read_from_path(path).ok().and_then(|tagged| {
        tagged
            .primary_tag()
            .or_else(|| tagged.first_tag())
            .and_then(|tag| tag.title().map(|t| t.trim().to_string()))
            .filter(|t| !t.is_empty())
    });

    tagged_title.or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty())
    })
}
