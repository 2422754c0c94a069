use super::*;
use crate::engine::testing::{Call, CallLog, RecordingEngine};
use crate::engine::{ChannelId, EngineSignal, MediaKind, SignalSender, signal_channel};
use crate::error::PlayerError;
use crate::track::{SourceUri, Track};
use proptest::prelude::*;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::TryRecvError;

fn uri(s: &str) -> SourceUri {
    SourceUri::parse(s).unwrap()
}

fn full_track() -> Track {
    Track::new(uri("narration.mp3"))
        .with_title("Deep Breath Morning Cycle")
        .with_subtitle("William Pratt")
        .with_background(uri("loop.mp4"), Some(50))
        .with_unguided_tail(100.0)
}

fn with_noise() -> SessionOptions {
    SessionOptions {
        noise_source: Some(uri("noise.mp3")),
        ..SessionOptions::default()
    }
}

struct Session {
    coordinator: PlaybackCoordinator,
    engine: RecordingEngine,
    tx: SignalSender,
    favorite: Rc<Cell<bool>>,
}

impl Session {
    fn new(track: Track, options: SessionOptions) -> Self {
        Self::with_engine(track, options, RecordingEngine::new())
    }

    fn with_engine(track: Track, options: SessionOptions, mut engine: RecordingEngine) -> Self {
        let (tx, rx) = signal_channel();
        let favorite = Rc::new(Cell::new(track.favorited));
        let flag = favorite.clone();
        let coordinator = PlaybackCoordinator::new(
            track,
            &mut engine,
            rx,
            move || {
                flag.set(!flag.get());
                flag.get()
            },
            options,
        )
        .unwrap();
        Self {
            coordinator,
            engine,
            tx,
            favorite,
        }
    }

    fn log(&self) -> &CallLog {
        &self.engine.log
    }

    fn narration(&self) -> ChannelId {
        self.engine.channel_for(MediaKind::Narration).unwrap()
    }

    fn background(&self) -> ChannelId {
        self.engine.channel_for(MediaKind::BackgroundVideo).unwrap()
    }

    fn noise(&self) -> ChannelId {
        self.engine.channel_for(MediaKind::NoiseLoop).unwrap()
    }

    fn send(&mut self, signal: EngineSignal) {
        self.tx.send(signal).unwrap();
        self.coordinator.pump();
    }

    fn ready(&mut self) {
        let channel = self.narration();
        self.send(EngineSignal::ReadyToPlay { channel });
    }

    fn duration(&mut self, seconds: f64) {
        let channel = self.narration();
        self.send(EngineSignal::DurationResolved { channel, seconds });
    }

    fn tick(&mut self, seconds: f64) {
        let channel = self.narration();
        self.send(EngineSignal::PeriodicTime { channel, seconds });
    }

    fn reached_end(&mut self) {
        let channel = self.narration();
        self.send(EngineSignal::ReachedEnd { channel });
    }
}

// --- timeline ---------------------------------------------------------------

proptest! {
    #[test]
    fn percent_complete_is_ratio_of_duration(duration in 0.001f64..100_000.0, frac in 0.0f64..=1.0) {
        let t = duration * frac;
        let state = PlaybackTimeState { display_time: t, duration, ..PlaybackTimeState::default() };
        prop_assert!((state.percent_complete() - t / duration * 100.0).abs() < 1e-9);
    }

    #[test]
    fn percent_complete_is_zero_without_duration(t in -1_000.0f64..1_000.0) {
        prop_assert_eq!(percent_complete(t, 0.0), 0.0);
    }

    #[test]
    fn unguided_part_needs_duration_and_tail(t in -1_000.0f64..100_000.0, duration in 0.0f64..10_000.0, tail in 0.0f64..1_000.0) {
        prop_assert!(!is_unguided_part(t, 0.0, Some(tail)));
        prop_assert!(!is_unguided_part(t, duration, None));
    }
}

#[test]
fn unguided_boundary_is_inclusive() {
    assert!(!is_unguided_part(499.0, 600.0, Some(100.0)));
    assert!(is_unguided_part(500.0, 600.0, Some(100.0)));
    assert!(is_unguided_part(600.0, 600.0, Some(100.0)));
}

#[test]
fn scrub_range_collapses_without_duration() {
    assert_eq!(scrub_range(0.0), 0.0..=0.0);
    assert_eq!(scrub_range(600.0), 0.0..=600.0);
}

#[test]
fn tick_follows_engine_time_when_idle() {
    let mut state = PlaybackTimeState::new();
    assert_eq!(state.advance(12.5), None);
    assert_eq!(state.observed_time, 12.5);
    assert_eq!(state.display_time, 12.5);
}

#[test]
fn scrub_owns_display_time_until_released() {
    let mut state = PlaybackTimeState {
        duration: 600.0,
        ..PlaybackTimeState::default()
    };
    state.advance(10.0);
    state.begin_scrub();
    assert_eq!(state.scrub_phase, ScrubPhase::ScrubStarted(10.0));
    assert!(state.is_scrubbing());

    state.update_scrub(42.0);
    assert_eq!(state.advance(11.0), None);
    assert_eq!(state.display_time, 42.0);
    assert_eq!(state.observed_time, 11.0);

    state.end_scrub(42.0);
    assert_eq!(state.advance(11.5), Some(42.0));
    assert_eq!(state.scrub_phase, ScrubPhase::Idle);
    assert!(!state.is_scrubbing());
    assert_eq!(state.display_time, 42.0);

    assert_eq!(state.advance(42.5), None);
    assert_eq!(state.display_time, 42.5);
}

#[test]
fn update_scrub_without_begin_is_ignored() {
    let mut state = PlaybackTimeState::new();
    state.update_scrub(30.0);
    assert_eq!(state.scrub_phase, ScrubPhase::Idle);
    assert_eq!(state.display_time, 0.0);
}

#[test]
fn scrub_values_are_clamped_to_track() {
    let mut state = PlaybackTimeState {
        duration: 600.0,
        ..PlaybackTimeState::default()
    };
    state.begin_scrub();
    state.update_scrub(900.0);
    assert_eq!(state.display_time, 600.0);
    state.end_scrub(-4.0);
    assert_eq!(state.scrub_phase, ScrubPhase::ScrubEnded(0.0));
}

#[test]
fn rewind_target_clamps_at_start() {
    let state = PlaybackTimeState {
        display_time: 10.0,
        ..PlaybackTimeState::default()
    };
    assert_eq!(state.rewind_target(15.0), 0.0);
    let later = PlaybackTimeState {
        display_time: 100.0,
        ..PlaybackTimeState::default()
    };
    assert_eq!(later.rewind_target(15.0), 85.0);
}

// --- narration --------------------------------------------------------------

#[test]
fn narration_ready_fires_once_per_buffering_episode() {
    let mut engine = RecordingEngine::new();
    let mut player = NarrationPlayer::open(&mut engine, &uri("n.mp3")).unwrap();
    let channel = player.channel();
    let ready = EngineSignal::ReadyToPlay { channel };

    assert_eq!(player.handle_signal(&ready), Some(NarrationEvent::ReadyToPlay));
    assert_eq!(player.handle_signal(&ready), None);

    player.seek(30.0);
    assert_eq!(player.handle_signal(&ready), Some(NarrationEvent::ReadyToPlay));
}

#[test]
fn narration_reports_end_exactly_once() {
    let mut engine = RecordingEngine::new();
    let mut player = NarrationPlayer::open(&mut engine, &uri("n.mp3")).unwrap();
    let end = EngineSignal::ReachedEnd {
        channel: player.channel(),
    };
    assert_eq!(player.handle_signal(&end), Some(NarrationEvent::ReachedEnd));
    assert_eq!(player.handle_signal(&end), None);
    assert!(player.has_reached_end());
}

#[test]
fn narration_play_and_pause_report_every_call() {
    let mut engine = RecordingEngine::new();
    let mut player = NarrationPlayer::open(&mut engine, &uri("n.mp3")).unwrap();
    assert_eq!(player.play(), Some(NarrationEvent::Played));
    assert_eq!(player.play(), Some(NarrationEvent::Played));
    assert_eq!(player.rate(), 1.0);
    assert_eq!(player.pause(), Some(NarrationEvent::Paused));
    assert_eq!(player.pause(), Some(NarrationEvent::Paused));
    assert_eq!(player.rate(), 0.0);
}

#[test]
fn narration_pause_pins_engine_position() {
    let mut engine = RecordingEngine::new();
    let mut player = NarrationPlayer::open(&mut engine, &uri("n.mp3")).unwrap();
    player.tick(40.0);
    engine.set_time(42.5);
    player.pause();
    assert_eq!(player.time().observed_time, 42.5);
    assert_eq!(player.time().display_time, 40.0);
}

#[test]
fn narration_ignores_other_channels_and_bad_durations() {
    let mut engine = RecordingEngine::new();
    let mut player = NarrationPlayer::open(&mut engine, &uri("n.mp3")).unwrap();
    let other = ChannelId(player.channel().0 + 7);
    assert_eq!(
        player.handle_signal(&EngineSignal::ReachedEnd { channel: other }),
        None
    );
    player.handle_signal(&EngineSignal::DurationResolved {
        channel: player.channel(),
        seconds: f64::NAN,
    });
    assert_eq!(player.time().duration, 0.0);
}

#[test]
fn destroyed_narration_is_inert() {
    let mut engine = RecordingEngine::new();
    let mut player = NarrationPlayer::open(&mut engine, &uri("n.mp3")).unwrap();
    let channel = player.channel();
    player.destroy();
    player.destroy();
    assert!(player.is_released());
    assert_eq!(player.play(), None);
    assert_eq!(player.rewind(15.0), None);
    assert_eq!(engine.log.count(&Call::Release(channel)), 1);
    assert_eq!(engine.log.count(&Call::Play(channel)), 0);
}

// --- looping channels -------------------------------------------------------

#[test]
fn looping_channel_loops_at_the_engine() {
    let mut engine = RecordingEngine::new();
    let mut channel = LoopingMediaChannel::open(&mut engine, &uri("noise.mp3"), MediaKind::NoiseLoop).unwrap();
    let ch = channel.channel();
    assert_eq!(engine.log.calls(), vec![Call::Open(ch, MediaKind::NoiseLoop), Call::SetLooping(ch, true)]);

    channel.destroy();
    channel.destroy();
    channel.play();
    assert_eq!(
        engine.log.calls()[2..],
        [
            Call::SetLooping(ch, false),
            Call::Detach(ch),
            Call::Pause(ch),
            Call::Release(ch),
        ]
    );
}

// --- ambience ---------------------------------------------------------------

#[test]
fn ambience_without_background_opens_nothing() {
    let mut engine = RecordingEngine::new();
    let track = Track::new(uri("n.mp3"));
    let mut group = AmbiencePlayerGroup::open(&mut engine, &track, Some(&uri("noise.mp3")));

    group.play();
    group.pause();
    group.mute();
    group.unmute();
    group.seek_to_start();
    group.destroy();

    assert!(group.is_empty());
    assert_eq!(group.background_channel(), None);
    assert!(engine.log.calls().is_empty());
}

#[test]
fn ambience_configures_both_loops() {
    let mut engine = RecordingEngine::new();
    let group = AmbiencePlayerGroup::open(&mut engine, &full_track(), Some(&uri("noise.mp3")));
    let bg = group.background_channel().unwrap();
    let noise = group.noise_channel().unwrap();

    let log = &engine.log;
    assert_eq!(log.count(&Call::SetLooping(bg, true)), 1);
    assert_eq!(log.count(&Call::SetLooping(noise, true)), 1);
    assert_eq!(log.count(&Call::SetMuted(bg, true)), 1);
    assert_eq!(log.count(&Call::SetVolume(bg, 0.0)), 1);
    assert_eq!(log.count(&Call::SetVolume(noise, 0.5)), 1);
    assert_eq!(log.count(&Call::SetMuted(noise, true)), 0);
}

#[test]
fn ambience_mute_touches_noise_only() {
    let mut engine = RecordingEngine::new();
    let mut group = AmbiencePlayerGroup::open(&mut engine, &full_track(), Some(&uri("noise.mp3")));
    let bg = group.background_channel().unwrap();
    let noise = group.noise_channel().unwrap();
    engine.log.clear();

    group.mute();
    group.unmute();
    assert_eq!(
        engine.log.calls(),
        vec![Call::SetMuted(noise, true), Call::SetMuted(noise, false)]
    );
    assert_eq!(engine.log.count(&Call::SetMuted(bg, false)), 0);
}

#[test]
fn ambience_seek_to_start_rewinds_both_loops() {
    let mut engine = RecordingEngine::new();
    let mut group = AmbiencePlayerGroup::open(&mut engine, &full_track(), Some(&uri("noise.mp3")));
    let bg = group.background_channel().unwrap();
    let noise = group.noise_channel().unwrap();
    group.seek_to_start();
    assert_eq!(engine.log.seeks(bg), vec![0.0]);
    assert_eq!(engine.log.seeks(noise), vec![0.0]);
}

#[test]
fn ambience_drops_loop_controller_before_release() {
    let mut engine = RecordingEngine::new();
    let mut group = AmbiencePlayerGroup::open(&mut engine, &full_track(), Some(&uri("noise.mp3")));
    let bg = group.background_channel().unwrap();
    let noise = group.noise_channel().unwrap();
    group.destroy();

    for ch in [bg, noise] {
        let unloop = engine.log.position(&Call::SetLooping(ch, false)).unwrap();
        let release = engine.log.position(&Call::Release(ch)).unwrap();
        assert!(unloop < release);
    }
    assert!(group.is_empty());

    engine.log.clear();
    group.play();
    assert!(engine.log.calls().is_empty());
}

#[test]
fn ambience_is_all_or_nothing_when_noise_fails() {
    let mut engine = RecordingEngine::new().fail_on("noise.mp3");
    let group = AmbiencePlayerGroup::open(&mut engine, &full_track(), Some(&uri("noise.mp3")));
    let bg = engine.channel_for(MediaKind::BackgroundVideo).unwrap();

    assert!(group.is_empty());
    assert_eq!(engine.log.count(&Call::Release(bg)), 1);
}

#[test]
fn ambience_needs_a_noise_source() {
    let mut engine = RecordingEngine::new();
    let group = AmbiencePlayerGroup::open(&mut engine, &full_track(), None);
    assert!(group.is_empty());
    assert!(engine.log.calls().is_empty());
}

#[test]
fn ambience_tracks_ready_per_channel() {
    let mut engine = RecordingEngine::new();
    let mut group = AmbiencePlayerGroup::open(&mut engine, &full_track(), Some(&uri("noise.mp3")));
    let bg = group.background_channel().unwrap();
    let noise = group.noise_channel().unwrap();

    assert!(!group.is_ready());
    assert!(group.handle_ready(bg));
    assert!(!group.is_ready());
    assert!(group.handle_ready(noise));
    assert!(group.is_ready());
    assert!(!group.handle_ready(ChannelId(99)));

    group.destroy();
    assert!(!group.is_ready());
}

#[test]
fn snapshot_reports_ambience_ready_once_both_loops_are() {
    let mut s = Session::new(full_track(), with_noise());
    let updates = s.coordinator.subscribe();
    assert!(!s.coordinator.snapshot().ambience_ready);

    let background = s.background();
    s.send(EngineSignal::ReadyToPlay { channel: background });
    assert!(!s.coordinator.snapshot().ambience_ready);

    let noise = s.noise();
    s.send(EngineSignal::ReadyToPlay { channel: noise });
    assert!(s.coordinator.snapshot().ambience_ready);
    assert!(updates.try_iter().last().is_some_and(|snap| snap.ambience_ready));
}

// --- coordinator ------------------------------------------------------------

#[test]
fn construction_fails_when_narration_cannot_open() {
    let mut engine = RecordingEngine::new().fail_on("narration.mp3");
    let (_tx, rx) = signal_channel();
    let result = PlaybackCoordinator::new(full_track(), &mut engine, rx, || false, with_noise());
    assert!(matches!(result, Err(PlayerError::SourceUnresolvable { .. })));
}

#[test]
fn construction_rejects_invalid_track() {
    let mut engine = RecordingEngine::new();
    let (_tx, rx) = signal_channel();
    let track = Track::new(uri("n.mp3")).with_unguided_tail(f64::INFINITY);
    let result = PlaybackCoordinator::new(track, &mut engine, rx, || false, SessionOptions::default());
    assert!(matches!(result, Err(PlayerError::InvalidTrack(_))));
    assert!(engine.log.calls().is_empty());
}

#[test]
fn broken_ambience_does_not_stop_narration() {
    let engine = RecordingEngine::new().fail_on("loop.mp4");
    let mut s = Session::with_engine(full_track(), with_noise(), engine);
    s.coordinator.play();

    let snap = s.coordinator.snapshot();
    assert!(snap.is_playing);
    assert_eq!(snap.background_channel, None);
    assert_eq!(snap.noise_channel, None);
    assert_eq!(s.log().count(&Call::Play(s.narration())), 1);
}

#[test]
fn autoplay_starts_on_first_ready_after_appear() {
    let mut s = Session::new(full_track(), with_noise());
    assert_eq!(s.coordinator.state(), SessionState::NotStarted);

    s.coordinator.on_appear();
    assert_eq!(s.coordinator.state(), SessionState::NotStarted);

    s.ready();
    assert_eq!(s.coordinator.state(), SessionState::Playing);
    assert!(s.coordinator.snapshot().is_playing);
    assert_eq!(s.log().count(&Call::Play(s.narration())), 1);
    assert_eq!(s.log().count(&Call::Play(s.background())), 1);
    assert_eq!(s.log().count(&Call::Play(s.noise())), 1);

    // Later buffering episodes never restart a paused session.
    s.coordinator.pause();
    s.coordinator.end_scrub(0.0);
    s.tick(5.0);
    s.ready();
    assert_eq!(s.coordinator.state(), SessionState::Paused);
}

#[test]
fn appear_after_ready_starts_immediately() {
    let mut s = Session::new(full_track(), with_noise());
    s.ready();
    assert_eq!(s.coordinator.state(), SessionState::NotStarted);
    s.coordinator.on_appear();
    assert_eq!(s.coordinator.state(), SessionState::Playing);
}

#[test]
fn autoplay_off_waits_for_play() {
    let options = SessionOptions {
        autoplay: false,
        ..with_noise()
    };
    let mut s = Session::new(full_track(), options);
    s.coordinator.on_appear();
    s.ready();
    assert_eq!(s.coordinator.state(), SessionState::NotStarted);
    s.coordinator.play();
    assert_eq!(s.coordinator.state(), SessionState::Playing);
}

#[test]
fn play_and_pause_move_narration_and_ambience_together() {
    let mut s = Session::new(full_track(), with_noise());
    let (n, bg, noise) = (s.narration(), s.background(), s.noise());
    s.log().clear();

    s.coordinator.play();
    assert_eq!(
        s.log().calls(),
        vec![Call::Play(n), Call::Play(bg), Call::Play(noise)]
    );

    s.log().clear();
    s.coordinator.pause();
    assert_eq!(
        s.log().calls(),
        vec![Call::Pause(n), Call::Pause(bg), Call::Pause(noise)]
    );
    assert_eq!(s.coordinator.state(), SessionState::Paused);
}

#[test]
fn pausing_twice_repeats_side_effects_without_seeking() {
    let mut s = Session::new(full_track(), with_noise());
    s.coordinator.play();
    s.log().clear();

    s.coordinator.pause();
    s.coordinator.pause();

    assert_eq!(s.log().count(&Call::Pause(s.background())), 2);
    assert_eq!(s.log().count(&Call::Pause(s.noise())), 2);
    assert!(s.log().seeks(s.narration()).is_empty());
    assert!(!s.coordinator.snapshot().is_playing);
}

#[test]
fn toggle_play_pause_flips_state() {
    let mut s = Session::new(full_track(), with_noise());
    s.coordinator.toggle_play_pause();
    assert!(s.coordinator.snapshot().is_playing);
    s.coordinator.toggle_play_pause();
    assert!(!s.coordinator.snapshot().is_playing);
    assert_eq!(s.coordinator.state(), SessionState::Paused);
}

#[test]
fn rewind_near_start_seeks_to_zero() {
    let mut s = Session::new(full_track(), with_noise());
    s.duration(600.0);
    s.tick(10.0);
    s.coordinator.rewind();
    assert_eq!(s.log().seeks(s.narration()), vec![0.0]);

    s.tick(120.0);
    s.coordinator.rewind();
    assert_eq!(s.log().seeks(s.narration()), vec![0.0, 105.0]);
}

#[test]
fn scrub_round_trip_issues_a_single_seek() {
    let mut s = Session::new(full_track(), with_noise());
    let n = s.narration();
    s.duration(600.0);
    s.tick(3.0);

    s.coordinator.begin_scrub();
    s.coordinator.update_scrub(42.0);
    s.tick(3.5);
    assert_eq!(s.coordinator.snapshot().display_time, 42.0);
    assert!(s.log().seeks(n).is_empty());

    s.coordinator.end_scrub(42.0);
    assert!(s.log().seeks(n).is_empty());
    s.tick(4.0);
    assert_eq!(s.log().seeks(n), vec![42.0]);
    assert_eq!(s.coordinator.time().scrub_phase, ScrubPhase::Idle);

    s.tick(42.5);
    assert_eq!(s.log().seeks(n), vec![42.0]);
    assert_eq!(s.coordinator.snapshot().display_time, 42.5);
}

#[test]
fn rewind_after_scrub_release_folds_into_the_pending_seek() {
    let mut s = Session::new(full_track(), with_noise());
    let n = s.narration();
    s.duration(600.0);
    s.tick(10.0);

    s.coordinator.begin_scrub();
    s.coordinator.update_scrub(300.0);
    s.coordinator.end_scrub(300.0);
    s.coordinator.rewind();
    assert!(s.log().seeks(n).is_empty());
    assert_eq!(s.coordinator.time().scrub_phase, ScrubPhase::ScrubEnded(285.0));

    s.tick(10.5);
    assert_eq!(s.log().seeks(n), vec![285.0]);
    assert_eq!(s.coordinator.snapshot().display_time, 285.0);
}

#[test]
fn unguided_part_is_derived_on_tick() {
    let mut s = Session::new(full_track(), with_noise());
    s.tick(550.0);
    assert!(!s.coordinator.snapshot().is_unguided_part, "duration unknown");

    s.duration(600.0);
    s.tick(499.0);
    assert!(!s.coordinator.snapshot().is_unguided_part);
    s.tick(500.0);
    assert!(s.coordinator.snapshot().is_unguided_part);
}

#[test]
fn unguided_part_follows_scrub_value() {
    let mut s = Session::new(full_track(), with_noise());
    s.duration(600.0);
    s.tick(10.0);
    s.coordinator.begin_scrub();
    s.coordinator.update_scrub(550.0);
    assert!(s.coordinator.snapshot().is_unguided_part);
}

#[test]
fn mute_applies_to_noise_only() {
    let mut s = Session::new(full_track(), with_noise());
    s.log().clear();
    s.coordinator.mute();
    assert_eq!(s.log().calls(), vec![Call::SetMuted(s.noise(), true)]);
    assert!(s.coordinator.snapshot().ambience_muted);

    s.coordinator.unmute();
    assert_eq!(s.log().count(&Call::SetMuted(s.noise(), false)), 1);
    assert_eq!(s.log().count(&Call::SetMuted(s.narration(), true)), 0);
    assert!(!s.coordinator.snapshot().ambience_muted);
}

#[test]
fn favorite_is_delegated() {
    let mut s = Session::new(full_track().with_favorited(true), with_noise());
    assert!(s.coordinator.snapshot().track_favorited);

    s.coordinator.toggle_favorite();
    assert!(!s.favorite.get());
    assert!(!s.coordinator.snapshot().track_favorited);

    s.coordinator.toggle_favorite();
    assert!(s.coordinator.snapshot().track_favorited);
}

#[test]
fn reaching_the_end_finishes_and_releases_ambience() {
    let mut s = Session::new(full_track(), with_noise());
    let (n, bg, noise) = (s.narration(), s.background(), s.noise());
    s.coordinator.play();
    s.log().clear();

    s.reached_end();
    let snap = s.coordinator.snapshot();
    assert!(snap.is_finished);
    assert!(!snap.is_playing);
    assert_eq!(snap.background_channel, None);
    assert_eq!(snap.noise_channel, None);
    assert_eq!(s.coordinator.state(), SessionState::Finished);
    assert_eq!(s.log().count(&Call::Release(bg)), 1);
    assert_eq!(s.log().count(&Call::Release(noise)), 1);
    assert_eq!(s.log().count(&Call::Pause(n)), 1);
    assert_eq!(s.log().count(&Call::Release(n)), 0);

    // Terminal.
    s.log().clear();
    s.coordinator.play();
    s.coordinator.rewind();
    s.reached_end();
    assert!(s.log().calls().is_empty());
    assert_eq!(s.coordinator.state(), SessionState::Finished);
}

#[test]
fn subscribers_get_current_state_then_updates_in_order() {
    let mut s = Session::new(full_track(), with_noise());
    let rx = s.coordinator.subscribe();
    assert!(!rx.try_recv().unwrap().is_playing);

    s.coordinator.play();
    s.duration(600.0);
    s.tick(12.0);

    let updates: Vec<PlayerSnapshot> = rx.try_iter().collect();
    assert_eq!(updates.len(), 3);
    assert!(updates[0].is_playing);
    assert_eq!(updates[1].duration, 600.0);
    assert_eq!(updates[2].display_time, 12.0);
}

#[test]
fn dropped_subscribers_are_pruned() {
    let mut s = Session::new(full_track(), with_noise());
    let rx = s.coordinator.subscribe();
    let _keep = s.coordinator.subscribe();
    drop(rx);
    s.coordinator.play();
    assert_eq!(s.coordinator.subscriber_count(), 1);
}

#[test]
fn destroy_detaches_before_releasing() {
    let mut s = Session::new(full_track(), with_noise());
    let channels = [s.narration(), s.background(), s.noise()];
    s.coordinator.play();
    s.coordinator.destroy_all();

    let last_detach = channels
        .iter()
        .map(|ch| s.log().position(&Call::Detach(*ch)).unwrap())
        .max()
        .unwrap();
    let first_release = channels
        .iter()
        .map(|ch| s.log().position(&Call::Release(*ch)).unwrap())
        .min()
        .unwrap();
    assert!(last_detach < first_release);
    for ch in channels {
        assert_eq!(s.log().count(&Call::Release(ch)), 1);
    }
}

#[test]
fn intents_after_destroy_are_no_ops() {
    let mut s = Session::new(full_track(), with_noise());
    let rx = s.coordinator.subscribe();
    s.coordinator.play();
    s.coordinator.destroy_all();
    assert!(s.coordinator.is_destroyed());

    let final_snapshot = rx.try_iter().last().unwrap();
    assert!(final_snapshot.is_destroyed);
    assert!(!final_snapshot.is_playing);
    assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));

    s.log().clear();
    s.coordinator.play();
    s.coordinator.pause();
    s.coordinator.rewind();
    s.coordinator.begin_scrub();
    s.coordinator.end_scrub(3.0);
    s.coordinator.mute();
    s.coordinator.toggle_favorite();
    s.coordinator.on_appear();
    s.coordinator.destroy_all();

    assert!(s.log().calls().is_empty());
    assert!(!s.coordinator.snapshot().is_playing);
    assert!(!s.favorite.get());
}

#[test]
fn late_signals_never_reach_a_destroyed_session() {
    let mut s = Session::new(full_track(), with_noise());
    let n = s.narration();
    s.coordinator.destroy_all();
    let _ = s.tx.send(EngineSignal::PeriodicTime {
        channel: n,
        seconds: 30.0,
    });
    assert_eq!(s.coordinator.pump(), 0);
    s.coordinator.handle_signal(EngineSignal::ReachedEnd { channel: n });
    assert!(!s.coordinator.snapshot().is_finished);
}

#[test]
fn subscribe_after_destroy_returns_final_snapshot() {
    let mut s = Session::new(full_track(), with_noise());
    s.coordinator.destroy_all();
    let rx = s.coordinator.subscribe();
    assert!(rx.try_recv().unwrap().is_destroyed);
    assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
}

#[test]
fn dropping_the_coordinator_releases_everything() {
    let s = Session::new(full_track(), with_noise());
    let log = s.engine.log.clone();
    let channels = [s.narration(), s.background(), s.noise()];
    drop(s);
    for ch in channels {
        assert_eq!(log.count(&Call::Release(ch)), 1);
    }
}

#[test]
fn session_without_background_ignores_ambience_calls() {
    let mut s = Session::new(Track::new(uri("narration.mp3")), with_noise());
    s.coordinator.play();
    s.coordinator.mute();
    s.coordinator.pause();
    let n = s.narration();
    assert!(
        s.log()
            .calls()
            .iter()
            .all(|c| matches!(c, Call::Open(ch, _) | Call::Play(ch) | Call::Pause(ch) if *ch == n))
    );
}

// --- snapshot & labels ------------------------------------------------------

#[test]
fn snapshot_marker_and_percent() {
    let snap = PlayerSnapshot {
        display_time: 150.0,
        duration: 600.0,
        unguided_tail_seconds: Some(100.0),
        ..PlayerSnapshot::default()
    };
    assert_eq!(snap.percent_complete(), 25.0);
    let marker = snap.unguided_marker().unwrap();
    assert!((marker - 500.0 / 600.0).abs() < 1e-12);

    let unknown = PlayerSnapshot::default();
    assert_eq!(unknown.unguided_marker(), None);
    assert_eq!(unknown.scrub_range(), 0.0..=0.0);
}

#[test]
fn format_mmss_pads_and_floors() {
    assert_eq!(format_mmss(0.0), "00:00");
    assert_eq!(format_mmss(59.9), "00:59");
    assert_eq!(format_mmss(895.0), "14:55");
    assert_eq!(format_mmss(-3.0), "00:00");
    assert_eq!(format_mmss(f64::NAN), "00:00");
}

#[test]
fn labels_switch_in_unguided_tail() {
    let track = full_track();
    let texts = LabelTexts::default();

    let guided = PlayerSnapshot {
        display_time: 200.0,
        duration: 600.0,
        unguided_tail_seconds: Some(100.0),
        ..PlayerSnapshot::default()
    };
    let labels = SessionLabels::new(&track, &guided, &texts);
    assert_eq!(labels.title, "Deep Breath Morning Cycle");
    assert_eq!(labels.subtitle, "William Pratt");
    assert_eq!(labels.elapsed, "03:20");
    assert_eq!(labels.remaining.as_deref(), Some("-05:00"));

    let tail = PlayerSnapshot {
        display_time: 530.0,
        is_unguided_part: true,
        ..guided
    };
    let labels = SessionLabels::new(&track, &tail, &texts);
    assert_eq!(labels.title, "Unguided");
    assert_eq!(labels.subtitle, "End of class");
    assert_eq!(labels.remaining.as_deref(), Some("+00:31"));

    let boundary = PlayerSnapshot {
        display_time: 500.0,
        ..tail
    };
    let labels = SessionLabels::new(&track, &boundary, &texts);
    assert_eq!(labels.remaining.as_deref(), Some("+00:01"));
}

#[test]
fn labels_without_duration_or_subtitle() {
    let track = Track::new(uri("n.mp3"));
    let labels = SessionLabels::new(&track, &PlayerSnapshot::default(), &LabelTexts::default());
    assert_eq!(labels.title, "");
    assert_eq!(labels.subtitle, "No track subtitle");
    assert_eq!(labels.remaining, None);
}
