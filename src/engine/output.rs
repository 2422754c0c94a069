//! `rodio`-backed engine for local files.
//!
//! Narration and noise are decoded into `Sink`s on the default output
//! stream. The background video is visual-only and always silent, so it is
//! kept as a looping clock that a renderer can follow. Nothing here runs on
//! its own: the owner calls [`RodioEngine::poll`] from its loop and the engine
//! emits whatever signals are due.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use lofty::prelude::AudioFile;
use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::error::{PlayerError, Result};

use super::{
    ChannelId, EngineSignal, MediaEngine, MediaHandle, MediaKind, OpenRequest, SignalSender,
};

pub struct RodioEngine {
    stream: OutputStream,
    signals: SignalSender,
    tick_interval: Duration,
    next_channel: u32,
    slots: Vec<Weak<RefCell<Slot>>>,
}

impl RodioEngine {
    /// Open the default output device and report through `signals`.
    pub fn new(signals: SignalSender, tick_interval: Duration) -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlayerError::OutputUnavailable(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which tears the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            signals,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            next_channel: 0,
            slots: Vec::new(),
        })
    }

    /// Apply deferred seeks, keep loops fed and emit due signals.
    pub fn poll(&mut self) {
        let now = Instant::now();
        self.slots.retain(|w| w.strong_count() > 0);

        for weak in &self.slots {
            let Some(slot) = weak.upgrade() else {
                continue;
            };
            let mut slot = slot.borrow_mut();

            if let Some(at) = slot.rebuild_at.take() {
                if let Err(e) = slot.rebuild(self.stream.mixer(), at) {
                    warn!(channel = %slot.channel, error = %e, "failed to reposition source");
                }
            }
            if let Output::Audio(audio) = &mut slot.output {
                audio.settle();
            }
            if slot.looping {
                slot.top_up_loop();
            }
            if !slot.attached {
                continue;
            }

            let channel = slot.channel;
            if slot.pending_ready {
                slot.pending_ready = false;
                let _ = self.signals.send(EngineSignal::ReadyToPlay { channel });
            }
            if !slot.duration_sent {
                if let Some(d) = slot.duration {
                    slot.duration_sent = true;
                    let _ = self.signals.send(EngineSignal::DurationResolved {
                        channel,
                        seconds: d.as_secs_f64(),
                    });
                }
            }
            let tick_due = slot
                .last_tick
                .is_none_or(|t| now.duration_since(t) >= self.tick_interval);
            if tick_due {
                slot.last_tick = Some(now);
                let _ = self.signals.send(EngineSignal::PeriodicTime {
                    channel,
                    seconds: slot.position().as_secs_f64(),
                });
            }
            if !slot.ended_sent && slot.ran_off_end() {
                slot.ended_sent = true;
                slot.playing = false;
                let _ = self.signals.send(EngineSignal::ReachedEnd { channel });
            }
        }
    }
}

impl MediaEngine for RodioEngine {
    fn open(&mut self, request: OpenRequest<'_>) -> Result<Box<dyn MediaHandle>> {
        let path = request
            .uri
            .to_local_path()
            .ok_or_else(|| PlayerError::unresolvable(request.uri, "only local files are supported"))?;
        if !path.is_file() {
            return Err(PlayerError::unresolvable(request.uri, "no such file"));
        }

        let channel = ChannelId(self.next_channel);
        self.next_channel += 1;

        let output = match request.kind {
            MediaKind::BackgroundVideo => Output::Clock(Clock::default()),
            MediaKind::Narration | MediaKind::NoiseLoop => {
                Output::Audio(create_sink_at(self.stream.mixer(), &path, Duration::ZERO)?)
            }
        };

        let duration = probe_duration(&path);
        let slot = Rc::new(RefCell::new(Slot::new(channel, path, output, duration)));
        self.slots.push(Rc::downgrade(&slot));
        debug!(%channel, kind = ?request.kind, uri = %request.uri, "opened media");

        Ok(Box::new(RodioHandle { slot }))
    }
}

/// Wall-clock position for outputs that produce no sound.
#[derive(Debug, Default)]
struct Clock {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Clock {
    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }

    fn set(&mut self, at: Duration) {
        self.accumulated = at;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }
}

/// A sink plus where in the file its first queued source started.
///
/// `Sink::get_pos` counts from the start of the current source, and a source
/// rebuilt with `skip_duration` starts counting at zero.
struct AudioOutput {
    sink: Sink,
    base_offset: Duration,
    queued: usize,
}

impl AudioOutput {
    fn new(sink: Sink, base_offset: Duration) -> Self {
        let queued = sink.len();
        Self {
            sink,
            base_offset,
            queued,
        }
    }

    fn position(&self) -> Duration {
        self.base_offset + self.sink.get_pos()
    }

    fn append(&mut self, source: Decoder<BufReader<File>>) {
        self.sink.append(source);
        self.queued = self.sink.len();
    }

    /// Forget the offset once the source it belonged to has finished.
    fn settle(&mut self) {
        let len = self.sink.len();
        if len < self.queued {
            self.base_offset = Duration::ZERO;
        }
        self.queued = len;
    }

    fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume);
    }
}

enum Output {
    Audio(AudioOutput),
    Clock(Clock),
}

struct Slot {
    channel: ChannelId,
    path: PathBuf,
    output: Output,
    duration: Option<Duration>,
    looping: bool,
    attached: bool,
    playing: bool,
    muted: bool,
    volume: f32,
    pending_ready: bool,
    duration_sent: bool,
    ended_sent: bool,
    /// Seek target the sink could not reach in place.
    rebuild_at: Option<Duration>,
    last_tick: Option<Instant>,
}

impl Slot {
    fn new(channel: ChannelId, path: PathBuf, output: Output, duration: Option<Duration>) -> Self {
        Self {
            channel,
            path,
            output,
            duration,
            looping: false,
            attached: true,
            playing: false,
            muted: false,
            volume: 1.0,
            pending_ready: true,
            duration_sent: false,
            ended_sent: false,
            rebuild_at: None,
            last_tick: None,
        }
    }

    fn position(&self) -> Duration {
        match &self.output {
            Output::Audio(audio) => self.rebuild_at.unwrap_or_else(|| audio.position()),
            Output::Clock(clock) => {
                let elapsed = clock.elapsed();
                match self.duration {
                    Some(d) if self.looping && !d.is_zero() => {
                        Duration::from_secs_f64(elapsed.as_secs_f64() % d.as_secs_f64())
                    }
                    _ => elapsed,
                }
            }
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    fn ran_off_end(&self) -> bool {
        if self.looping || !self.playing || self.rebuild_at.is_some() {
            return false;
        }
        match &self.output {
            Output::Audio(audio) => audio.sink.empty(),
            Output::Clock(clock) => self.duration.is_some_and(|d| clock.elapsed() >= d),
        }
    }

    /// Keep one extra copy queued so the loop wraps without a gap.
    fn top_up_loop(&mut self) {
        let Output::Audio(audio) = &mut self.output else {
            return;
        };
        while audio.sink.len() < 2 {
            match open_decoder(&self.path) {
                Ok(source) => audio.append(source),
                Err(e) => {
                    warn!(channel = %self.channel, error = %e, "loop source could not be re-queued");
                    self.looping = false;
                    return;
                }
            }
        }
    }

    fn seek(&mut self, at: Duration) {
        self.ended_sent = false;
        match &mut self.output {
            Output::Audio(audio) => match audio.sink.try_seek(at) {
                // The seek is absolute within the current source.
                Ok(()) => audio.base_offset = Duration::ZERO,
                Err(e) => {
                    debug!(channel = %self.channel, error = %e, "in-place seek failed, rebuilding sink");
                    self.rebuild_at = Some(at);
                }
            },
            Output::Clock(clock) => clock.set(at),
        }
    }

    /// Replace the sink with a fresh one starting at `at`.
    fn rebuild(&mut self, mixer: &Mixer, at: Duration) -> Result<()> {
        let Output::Audio(old) = &self.output else {
            return Ok(());
        };
        old.sink.stop();

        let audio = create_sink_at(mixer, &self.path, at)?;
        audio.set_volume(self.effective_volume());
        if self.playing {
            audio.sink.play();
        }
        self.output = Output::Audio(audio);
        self.pending_ready = true;
        Ok(())
    }
}

struct RodioHandle {
    slot: Rc<RefCell<Slot>>,
}

impl MediaHandle for RodioHandle {
    fn channel(&self) -> ChannelId {
        self.slot.borrow().channel
    }

    fn play(&mut self) {
        let mut slot = self.slot.borrow_mut();
        slot.playing = true;
        match &mut slot.output {
            Output::Audio(audio) => audio.sink.play(),
            Output::Clock(clock) => clock.start(),
        }
    }

    fn pause(&mut self) {
        let mut slot = self.slot.borrow_mut();
        slot.playing = false;
        match &mut slot.output {
            Output::Audio(audio) => audio.sink.pause(),
            Output::Clock(clock) => clock.stop(),
        }
    }

    fn seek(&mut self, seconds: f64) {
        let at = Duration::from_secs_f64(seconds.max(0.0));
        self.slot.borrow_mut().seek(at);
    }

    fn set_muted(&mut self, muted: bool) {
        let mut slot = self.slot.borrow_mut();
        slot.muted = muted;
        if let Output::Audio(audio) = &slot.output {
            audio.set_volume(slot.effective_volume());
        }
    }

    fn set_volume(&mut self, volume: f32) {
        let mut slot = self.slot.borrow_mut();
        slot.volume = volume.clamp(0.0, 1.0);
        if let Output::Audio(audio) = &slot.output {
            audio.set_volume(slot.effective_volume());
        }
    }

    fn set_looping(&mut self, looping: bool) {
        let mut slot = self.slot.borrow_mut();
        slot.looping = looping;
        if looping {
            slot.top_up_loop();
        }
    }

    fn current_time(&self) -> f64 {
        self.slot.borrow().position().as_secs_f64()
    }

    fn detach(&mut self) {
        self.slot.borrow_mut().attached = false;
    }

    fn release(self: Box<Self>) {
        let mut slot = self.slot.borrow_mut();
        slot.attached = false;
        slot.looping = false;
        slot.playing = false;
        if let Output::Audio(audio) = &slot.output {
            audio.sink.stop();
        }
        debug!(channel = %slot.channel, "released media");
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path).map_err(|e| PlayerError::unresolvable(path.display(), e))?;
    Decoder::new(BufReader::new(file)).map_err(|e| PlayerError::unresolvable(path.display(), e))
}

/// Create a paused sink for `path` that starts playback at `start_at`.
fn create_sink_at(mixer: &Mixer, path: &Path, start_at: Duration) -> Result<AudioOutput> {
    // `skip_duration` is the fallback seeking primitive; even Duration::ZERO is fine.
    let source = open_decoder(path)?.skip_duration(start_at);

    let sink = Sink::connect_new(mixer);
    sink.append(source);
    sink.pause();
    Ok(AudioOutput::new(sink, start_at))
}

fn probe_duration(path: &Path) -> Option<Duration> {
    let tagged = lofty::read_from_path(path).ok()?;
    let d = tagged.properties().duration();
    (!d.is_zero()).then_some(d)
}
