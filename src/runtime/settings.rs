use tracing::warn;

use crate::config;

/// Load settings, falling back to defaults on any problem.
///
/// Returns the settings plus a note to log once logging is up.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => (s, None),
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("unguided: {e}, using defaults");
            (config::Settings::default(), Some(format!("{e}, using defaults")))
        }
    }
}

pub fn report(note: Option<String>) {
    if let Some(note) = note {
        warn!("{note}");
    }
}
