//! Track description: the immutable input of a playback session.
//!
//! A `Track` names the narration source, the optional background loop and
//! its noise volume, and the length of the unguided tail. Tracks can be built
//! in code or loaded from a small TOML descriptor.

mod descriptor;
mod model;

pub use model::*;
