//! Recording engine used by unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{PlayerError, Result};

use super::{ChannelId, MediaEngine, MediaHandle, MediaKind, OpenRequest};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Open(ChannelId, MediaKind),
    Play(ChannelId),
    Pause(ChannelId),
    Seek(ChannelId, f64),
    SetMuted(ChannelId, bool),
    SetVolume(ChannelId, f32),
    SetLooping(ChannelId, bool),
    Detach(ChannelId),
    Release(ChannelId),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub(crate) fn count(&self, call: &Call) -> usize {
        self.0.borrow().iter().filter(|c| *c == call).count()
    }

    pub(crate) fn seeks(&self, channel: ChannelId) -> Vec<f64> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Seek(ch, t) if *ch == channel => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn position(&self, call: &Call) -> Option<usize> {
        self.0.borrow().iter().position(|c| c == call)
    }
}

/// Hands out sequential channel ids and records every handle call.
#[derive(Debug, Default)]
pub(crate) struct RecordingEngine {
    pub(crate) log: CallLog,
    next_channel: u32,
    failing: Vec<String>,
    opened: Vec<(ChannelId, MediaKind)>,
    time: Rc<Cell<f64>>,
}

impl RecordingEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make `open` fail for this exact URI string.
    pub(crate) fn fail_on(mut self, uri: &str) -> Self {
        self.failing.push(uri.to_string());
        self
    }

    pub(crate) fn channel_for(&self, kind: MediaKind) -> Option<ChannelId> {
        self.opened
            .iter()
            .rev()
            .find(|(_, k)| *k == kind)
            .map(|(ch, _)| *ch)
    }

    /// Position every handle reports from `current_time`.
    pub(crate) fn set_time(&self, seconds: f64) {
        self.time.set(seconds);
    }
}

impl MediaEngine for RecordingEngine {
    fn open(&mut self, request: OpenRequest<'_>) -> Result<Box<dyn MediaHandle>> {
        if self.failing.iter().any(|u| u == request.uri.as_str()) {
            return Err(PlayerError::unresolvable(request.uri, "refused by test engine"));
        }
        let channel = ChannelId(self.next_channel);
        self.next_channel += 1;
        self.opened.push((channel, request.kind));
        self.log.push(Call::Open(channel, request.kind));
        Ok(Box::new(RecordingHandle {
            channel,
            log: self.log.clone(),
            time: self.time.clone(),
        }))
    }
}

struct RecordingHandle {
    channel: ChannelId,
    log: CallLog,
    time: Rc<Cell<f64>>,
}

impl MediaHandle for RecordingHandle {
    fn channel(&self) -> ChannelId {
        self.channel
    }

    fn play(&mut self) {
        self.log.push(Call::Play(self.channel));
    }

    fn pause(&mut self) {
        self.log.push(Call::Pause(self.channel));
    }

    fn seek(&mut self, seconds: f64) {
        self.log.push(Call::Seek(self.channel, seconds));
    }

    fn set_muted(&mut self, muted: bool) {
        self.log.push(Call::SetMuted(self.channel, muted));
    }

    fn set_volume(&mut self, volume: f32) {
        self.log.push(Call::SetVolume(self.channel, volume));
    }

    fn set_looping(&mut self, looping: bool) {
        self.log.push(Call::SetLooping(self.channel, looping));
    }

    fn current_time(&self) -> f64 {
        self.time.get()
    }

    fn detach(&mut self) {
        self.log.push(Call::Detach(self.channel));
    }

    fn release(self: Box<Self>) {
        self.log.push(Call::Release(self.channel));
    }
}
