//! Configuration loader and schema types.
//!
//! This module exposes the settings that drive the player session and the
//! terminal front end, and helpers to load them from disk and environment.

mod load;
mod schema;

pub use load::{SettingsError, config_path};
pub use schema::*;
