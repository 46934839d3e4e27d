//! Live TV playback: the state machine, its engine seam and the sessions
//! that tie a device to a running controller.

pub mod controller;
pub mod engine;
pub mod errors;
pub mod registry;

pub use controller::{PlaybackSnapshot, PlaybackState, PlayerCommand, StreamTarget};
pub use engine::{EngineCommand, EngineEvent};
pub use errors::PlayerError;
pub use registry::PlayerRegistry;
