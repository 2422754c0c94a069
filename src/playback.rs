//! Session playback: the timeline, the narration and ambience wrappers, and
//! the coordinator that drives them as one unit.

mod ambience;
mod coordinator;
mod labels;
mod looping;
mod narration;
mod snapshot;
mod time;

pub use ambience::AmbiencePlayerGroup;
pub use coordinator::{FavoriteToggle, PlaybackCoordinator, SessionOptions, SessionState};
pub use labels::{LabelTexts, SessionLabels, format_mmss};
pub use looping::LoopingMediaChannel;
pub use narration::{NarrationEvent, NarrationPlayer};
pub use snapshot::PlayerSnapshot;
pub use time::{PlaybackTimeState, ScrubPhase, is_unguided_part, percent_complete, scrub_range};

#[cfg(test)]
mod tests;
