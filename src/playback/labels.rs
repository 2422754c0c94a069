//! Text shown next to the scrub bar.

use crate::track::Track;

use super::snapshot::PlayerSnapshot;

/// Fixed strings used while rendering labels.
#[derive(Debug, Clone)]
pub struct LabelTexts {
    pub unguided_title: String,
    pub unguided_subtitle: String,
    pub missing_subtitle: String,
}

impl Default for LabelTexts {
    fn default() -> Self {
        Self {
            unguided_title: "Unguided".to_string(),
            unguided_subtitle: "End of class".to_string(),
            missing_subtitle: "No track subtitle".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLabels {
    pub title: String,
    pub subtitle: String,
    pub elapsed: String,
    /// `-mm:ss` until the unguided tail, `+mm:ss` into it counting from
    /// `+00:01`. `None` until the duration is known.
    pub remaining: Option<String>,
}

impl SessionLabels {
    pub fn new(track: &Track, snapshot: &PlayerSnapshot, texts: &LabelTexts) -> Self {
        let (title, subtitle) = if snapshot.is_unguided_part {
            (texts.unguided_title.clone(), texts.unguided_subtitle.clone())
        } else {
            (
                track.title.clone().unwrap_or_default(),
                track
                    .subtitle
                    .clone()
                    .unwrap_or_else(|| texts.missing_subtitle.clone()),
            )
        };

        Self {
            title,
            subtitle,
            elapsed: format_mmss(snapshot.display_time),
            remaining: remaining_text(
                snapshot.display_time,
                snapshot.duration,
                snapshot.unguided_tail_seconds,
                snapshot.is_unguided_part,
            ),
        }
    }
}

/// Format seconds as `MM:SS`. Negative and non-finite inputs read as zero.
pub fn format_mmss(seconds: f64) -> String {
    let secs = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn remaining_text(
    display_time: f64,
    duration: f64,
    unguided_tail_seconds: Option<f64>,
    is_unguided_part: bool,
) -> Option<String> {
    if duration <= 0.0 {
        return None;
    }
    let boundary = duration - unguided_tail_seconds.unwrap_or(0.0);
    Some(if is_unguided_part {
        format!("+{}", format_mmss(display_time - boundary + 1.0))
    } else {
        format!("-{}", format_mmss(boundary - display_time))
    })
}
