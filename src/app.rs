//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the loaded track, the
//! latest session snapshot and the keyboard scrub in progress.

mod model;

pub use model::*;
