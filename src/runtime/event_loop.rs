use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, Intent};
use crate::config;
use crate::engine::RodioEngine;
use crate::playback::{PlaybackCoordinator, PlayerSnapshot};
use crate::ui;

const INPUT_POLL: Duration = Duration::from_millis(50);

/// Main terminal event loop: drives the engine, drains signals and
/// snapshots, draws and handles input. Returns `Ok(())` when the user leaves.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    coordinator: &mut PlaybackCoordinator,
    engine: &mut RodioEngine,
    snapshots: &Receiver<PlayerSnapshot>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        engine.poll();
        coordinator.pump();
        for snapshot in snapshots.try_iter() {
            app.apply_snapshot(snapshot);
        }

        if let Some(intent) = app.scrub_commit_due(Instant::now()) {
            apply_intent(intent, coordinator);
            continue;
        }

        terminal.draw(|f| ui::draw(f, app, &settings.ui, &settings.controls))?;

        let timeout = app
            .until_scrub_commit(Instant::now())
            .map_or(INPUT_POLL, |d| d.min(INPUT_POLL));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                for intent in intents_for_key(key, app, settings) {
                    if apply_intent(intent, coordinator) {
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn intents_for_key(key: KeyEvent, app: &mut App, settings: &config::Settings) -> Vec<Intent> {
    let scrub = settings.controls.scrub_seconds as f64;
    let commit_after = Duration::from_millis(settings.controls.scrub_commit_ms);

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => vec![Intent::Quit],
        KeyCode::Char('s') => vec![Intent::Skip],
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            // A pending scrub lands before the transport changes.
            let mut intents: Vec<Intent> = app.commit_scrub().into_iter().collect();
            intents.push(Intent::TogglePlayPause);
            intents
        }
        KeyCode::Char('r') => {
            let mut intents: Vec<Intent> = app.commit_scrub().into_iter().collect();
            intents.push(Intent::Rewind);
            intents
        }
        KeyCode::Char('h') | KeyCode::Left => app.scrub_by(-scrub, Instant::now(), commit_after),
        KeyCode::Char('l') | KeyCode::Right => app.scrub_by(scrub, Instant::now(), commit_after),
        KeyCode::Enter => app.commit_scrub().into_iter().collect(),
        KeyCode::Char('m') => vec![app.mute_intent()],
        KeyCode::Char('f') => vec![Intent::ToggleFavorite],
        KeyCode::Char('K') => {
            app.toggle_metadata_window();
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Apply one intent. Returns true when the loop should end.
fn apply_intent(intent: Intent, coordinator: &mut PlaybackCoordinator) -> bool {
    debug!(?intent, "intent");
    match intent {
        Intent::TogglePlayPause => coordinator.toggle_play_pause(),
        Intent::Rewind => coordinator.rewind(),
        Intent::BeginScrub => coordinator.begin_scrub(),
        Intent::UpdateScrub(value) => coordinator.update_scrub(value),
        Intent::EndScrub(value) => coordinator.end_scrub(value),
        Intent::Mute => coordinator.mute(),
        Intent::Unmute => coordinator.unmute(),
        Intent::ToggleFavorite => coordinator.toggle_favorite(),
        Intent::Skip => {
            coordinator.destroy_all();
            return true;
        }
        Intent::Quit => return true,
    }
    false
}
