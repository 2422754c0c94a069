use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config;
use crate::engine::{RodioEngine, SignalReceiver, signal_channel};
use crate::error::Result;
use crate::playback::PlaybackCoordinator;
use crate::track::Track;

/// Install a file-backed subscriber when `logging.file` is set.
///
/// The terminal belongs to the UI, so without a file nothing is installed.
pub fn init_logging(settings: &config::LoggingSettings) -> Result<()> {
    let Some(path) = settings.file.as_ref() else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init();
    Ok(())
}

/// Open the audio output with the configured tick interval.
pub fn open_engine(settings: &config::Settings) -> Result<(RodioEngine, SignalReceiver)> {
    let (tx, rx) = signal_channel();
    let tick = Duration::from_millis(settings.playback.tick_interval_ms);
    let engine = RodioEngine::new(tx, tick)?;
    Ok((engine, rx))
}

/// Build the session for `track`.
///
/// Favorites live in memory for the lifetime of the session.
pub fn create_session(
    track: Track,
    engine: &mut RodioEngine,
    signals: SignalReceiver,
    settings: &config::Settings,
) -> Result<PlaybackCoordinator> {
    let mut favorited = track.favorited;
    let title = track.title.clone().unwrap_or_default();
    let toggle = move || {
        favorited = !favorited;
        info!(title = %title, favorited, "favorite changed");
        favorited
    };
    PlaybackCoordinator::new(track, engine, signals, toggle, settings.session_options())
}
