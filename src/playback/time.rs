use std::ops::RangeInclusive;

/// Where a user scrub interaction stands.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum ScrubPhase {
    #[default]
    Idle,
    /// The UI owns the displayed value; engine time is ignored.
    ScrubStarted(f64),
    /// Released at this value; resolved into a seek on the next tick.
    ScrubEnded(f64),
}

/// The session timeline as seen by the UI.
///
/// `observed_time` is whatever the engine last reported. `display_time` is
/// what the scrub bar shows and only diverges from it while a scrub is in
/// progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackTimeState {
    pub observed_time: f64,
    pub display_time: f64,
    /// Zero until the engine resolves it.
    pub duration: f64,
    pub scrub_phase: ScrubPhase,
}

impl PlaybackTimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one periodic tick into the state.
    ///
    /// Returns the seek target when a released scrub is resolved; the caller
    /// issues exactly that one seek.
    pub fn advance(&mut self, observed: f64) -> Option<f64> {
        self.observed_time = observed;
        match self.scrub_phase {
            ScrubPhase::Idle => {
                self.display_time = observed;
                None
            }
            ScrubPhase::ScrubStarted(value) => {
                self.display_time = value;
                None
            }
            ScrubPhase::ScrubEnded(value) => {
                self.scrub_phase = ScrubPhase::Idle;
                self.display_time = value;
                Some(value)
            }
        }
    }

    pub fn begin_scrub(&mut self) {
        self.scrub_phase = ScrubPhase::ScrubStarted(self.display_time);
    }

    /// Replace the in-flight scrub value. Ignored unless a scrub is active.
    pub fn update_scrub(&mut self, value: f64) {
        if let ScrubPhase::ScrubStarted(_) = self.scrub_phase {
            let value = self.clamp_to_range(value);
            self.scrub_phase = ScrubPhase::ScrubStarted(value);
            self.display_time = value;
        }
    }

    pub fn end_scrub(&mut self, value: f64) {
        let value = self.clamp_to_range(value);
        self.scrub_phase = ScrubPhase::ScrubEnded(value);
        self.display_time = value;
    }

    pub fn is_scrubbing(&self) -> bool {
        matches!(self.scrub_phase, ScrubPhase::ScrubStarted(_))
    }

    /// A scrub was released and its seek waits for the next tick.
    pub fn has_pending_seek(&self) -> bool {
        matches!(self.scrub_phase, ScrubPhase::ScrubEnded(_))
    }

    pub fn percent_complete(&self) -> f64 {
        percent_complete(self.display_time, self.duration)
    }

    pub fn is_unguided_part(&self, unguided_tail_seconds: Option<f64>) -> bool {
        is_unguided_part(self.display_time, self.duration, unguided_tail_seconds)
    }

    /// Valid scrub values; collapses to `0..=0` until the duration is known.
    pub fn scrub_range(&self) -> RangeInclusive<f64> {
        scrub_range(self.duration)
    }

    /// Target of a rewind by `seconds`, never before the start.
    pub fn rewind_target(&self, seconds: f64) -> f64 {
        (self.display_time - seconds).max(0.0)
    }

    fn clamp_to_range(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        let range = self.scrub_range();
        if self.duration > 0.0 {
            value.clamp(*range.start(), *range.end())
        } else {
            // Unknown duration: only the lower bound is meaningful.
            value.max(0.0)
        }
    }
}

pub fn percent_complete(display_time: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        display_time / duration * 100.0
    } else {
        0.0
    }
}

/// Whether `display_time` falls inside the unguided tail of the track.
pub fn is_unguided_part(display_time: f64, duration: f64, unguided_tail_seconds: Option<f64>) -> bool {
    match unguided_tail_seconds {
        Some(tail) if duration > 0.0 => display_time >= duration - tail,
        _ => false,
    }
}

pub fn scrub_range(duration: f64) -> RangeInclusive<f64> {
    if duration > 0.0 { 0.0..=duration } else { 0.0..=0.0 }
}
