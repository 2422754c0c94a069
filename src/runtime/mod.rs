use std::env;
use std::path::Path;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::track::Track;

mod event_loop;
mod settings;
mod startup;

/// Play the track named on the command line until the user leaves.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, note) = settings::load_settings();
    startup::init_logging(&settings.logging)?;
    settings::report(note);

    let path = env::args()
        .nth(1)
        .ok_or("usage: unguided <track.toml | audio file>")?;
    let track = Track::load(Path::new(&path))?;

    let (mut engine, signals) = startup::open_engine(&settings)?;
    let mut coordinator = startup::create_session(track, &mut engine, signals, &settings)?;
    let snapshots = coordinator.subscribe();
    let mut app = App::new(coordinator.track().clone(), settings.ui.label_texts());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    coordinator.on_appear();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &mut coordinator,
        &mut engine,
        &snapshots,
    );
    coordinator.destroy_all();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
