//! Media engine seam.
//!
//! The controller drives an engine through [`MediaEngine`] and learns about
//! playback through [`EngineEvent`]s posted to its queue. On this server the
//! engine is the TV device itself: [`RemoteEngine`] queues commands for the
//! device to drain, and the device reports events over HTTP.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Lifecycle states reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

/// Notification from the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    StateChanged {
        state: EngineState,
    },
    IsPlayingChanged {
        playing: bool,
    },
    Error {
        code: i32,
        #[serde(default)]
        details: Option<String>,
    },
}

pub trait MediaEngine: Send {
    fn set_media(&mut self, url: &str);
    fn prepare(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek_to(&mut self, position_ms: u64);
    fn release(&mut self);
}

/// Instruction for the device-side player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EngineCommand {
    SetMedia { url: String },
    Prepare,
    Play,
    Pause,
    SeekTo { position_ms: u64 },
    Release,
}

/// Device-facing end of a [`RemoteEngine`]
#[derive(Clone, Default)]
pub struct EngineOutbox(Arc<Mutex<VecDeque<EngineCommand>>>);

impl EngineOutbox {
    /// Take every queued command, oldest first
    pub fn drain(&self) -> Vec<EngineCommand> {
        self.lock().drain(..).collect()
    }

    fn push(&self, command: EngineCommand) {
        self.lock().push_back(command);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<EngineCommand>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct RemoteEngine {
    outbox: EngineOutbox,
}

impl RemoteEngine {
    pub fn new() -> (Self, EngineOutbox) {
        let outbox = EngineOutbox::default();
        (
            Self {
                outbox: outbox.clone(),
            },
            outbox,
        )
    }
}

impl MediaEngine for RemoteEngine {
    fn set_media(&mut self, url: &str) {
        self.outbox.push(EngineCommand::SetMedia {
            url: url.to_string(),
        });
    }

    fn prepare(&mut self) {
        self.outbox.push(EngineCommand::Prepare);
    }

    fn play(&mut self) {
        self.outbox.push(EngineCommand::Play);
    }

    fn pause(&mut self) {
        self.outbox.push(EngineCommand::Pause);
    }

    fn seek_to(&mut self, position_ms: u64) {
        self.outbox.push(EngineCommand::SeekTo { position_ms });
    }

    fn release(&mut self) {
        self.outbox.push(EngineCommand::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_engine_queues_commands_in_order() {
        let (mut engine, outbox) = RemoteEngine::new();
        engine.set_media("http://tv/live/a/b/1.m3u8");
        engine.prepare();
        engine.play();

        assert_eq!(
            outbox.drain(),
            vec![
                EngineCommand::SetMedia {
                    url: "http://tv/live/a/b/1.m3u8".to_string()
                },
                EngineCommand::Prepare,
                EngineCommand::Play,
            ]
        );
        assert!(outbox.drain().is_empty());
    }

    #[test]
    fn test_engine_event_json() {
        let event: EngineEvent =
            serde_json::from_str(r#"{"type":"state_changed","state":"ready"}"#).unwrap();
        assert_eq!(
            event,
            EngineEvent::StateChanged {
                state: EngineState::Ready
            }
        );

        let event: EngineEvent = serde_json::from_str(r#"{"type":"error","code":2002}"#).unwrap();
        assert_eq!(
            event,
            EngineEvent::Error {
                code: 2002,
                details: None
            }
        );
    }
}
