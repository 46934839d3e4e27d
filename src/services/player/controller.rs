//! Playback state machine and the task that owns it.
//!
//! [`PlaybackController`] holds the state and the engine and reacts to engine
//! events and user commands. [`PlayerHandle::spawn`] moves a controller into a
//! task that consumes one ordered queue of messages, runs the controls
//! auto-hide timer and publishes immutable [`PlaybackSnapshot`]s on a watch
//! channel.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};

use super::engine::{EngineEvent, EngineState, MediaEngine};
use super::errors::{playback_error_message, PlaybackErrorKind, PlayerError};
use crate::services::metrics;

/// Controls hide after this long without interaction while playing
pub const CONTROLS_AUTO_HIDE: Duration = Duration::from_secs(5);

const QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum PlaybackState {
    Buffering,
    Ready,
    Playing,
    Ended,
    Error(String),
}

/// What the player screen renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub stream_url: String,
    pub channel_name: String,
    pub channel_number: i32,
    pub state: PlaybackState,
    pub is_playing: bool,
    pub is_buffering: bool,
    pub controls_visible: bool,
    pub error_message: Option<String>,
}

/// User commands from the player screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerCommand {
    Play,
    Pause,
    TogglePlayPause,
    Retry,
    ToggleControls,
    /// Any remote key press: shows the controls and restarts the hide window
    ShowControls,
}

/// Stream to open in a new session
#[derive(Debug, Clone)]
pub struct StreamTarget {
    pub stream_url: String,
    pub channel_name: String,
    pub channel_number: i32,
}

pub struct PlaybackController {
    snapshot: PlaybackSnapshot,
    /// `None` in preview mode or once released
    engine: Option<Box<dyn MediaEngine>>,
    /// Bumped every time the controls are shown
    controls_shown: u64,
}

impl PlaybackController {
    /// Open `target` on `engine` and start playing when ready
    pub fn new(target: StreamTarget, mut engine: Option<Box<dyn MediaEngine>>) -> Self {
        if let Some(engine) = engine.as_mut() {
            engine.set_media(&target.stream_url);
            engine.prepare();
            engine.play();
        }

        Self {
            snapshot: PlaybackSnapshot {
                stream_url: target.stream_url,
                channel_name: target.channel_name,
                channel_number: target.channel_number,
                state: PlaybackState::Buffering,
                is_playing: false,
                is_buffering: true,
                controls_visible: true,
                error_message: None,
            },
            engine,
            controls_shown: 0,
        }
    }

    pub fn snapshot(&self) -> &PlaybackSnapshot {
        &self.snapshot
    }

    #[cfg(test)]
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Controls are showing over a stream that is actually playing.
    ///
    /// The hide window starts whenever this becomes true, so it also starts
    /// when playback begins under already-visible controls, not only when
    /// the controls are shown.
    pub fn auto_hide_armed(&self) -> bool {
        self.snapshot.controls_visible
            && self.snapshot.is_playing
            && matches!(
                self.snapshot.state,
                PlaybackState::Ready | PlaybackState::Playing
            )
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        let s = &mut self.snapshot;
        match event {
            EngineEvent::StateChanged { state } => match state {
                EngineState::Buffering => {
                    s.state = PlaybackState::Buffering;
                    s.is_buffering = true;
                    s.error_message = None;
                }
                EngineState::Ready => {
                    // Ready is reported as playing, matching the TV app's status badge
                    s.state = PlaybackState::Ready;
                    s.is_buffering = false;
                    s.is_playing = true;
                    s.error_message = None;
                }
                EngineState::Ended => {
                    s.is_playing = false;
                    s.state = PlaybackState::Ended;
                }
                EngineState::Idle => {
                    s.is_buffering = false;
                }
            },
            EngineEvent::IsPlayingChanged { playing } => {
                s.is_playing = playing;
                match (&s.state, playing) {
                    (PlaybackState::Ready, true) => s.state = PlaybackState::Playing,
                    (PlaybackState::Playing, false) => s.state = PlaybackState::Ready,
                    _ => {}
                }
            }
            EngineEvent::Error { code, details } => {
                let kind = PlaybackErrorKind::from_code(code);
                let message = playback_error_message(code, details.as_deref());
                metrics::PLAYBACK_ERRORS
                    .with_label_values(&[kind.as_str()])
                    .inc();
                tracing::warn!(
                    code = code,
                    stream = %s.channel_name,
                    "Playback error: {}",
                    message
                );

                s.is_buffering = false;
                s.error_message = Some(message.clone());
                s.state = PlaybackState::Error(message);
            }
        }
    }

    pub fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Play => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.play();
                }
            }
            PlayerCommand::Pause => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.pause();
                }
            }
            PlayerCommand::TogglePlayPause => {
                let command = if self.snapshot.is_playing {
                    PlayerCommand::Pause
                } else {
                    PlayerCommand::Play
                };
                self.handle_command(command);
            }
            PlayerCommand::Retry => self.retry(),
            PlayerCommand::ToggleControls => {
                self.snapshot.controls_visible = !self.snapshot.controls_visible;
                if self.snapshot.controls_visible {
                    self.controls_shown += 1;
                }
            }
            PlayerCommand::ShowControls => {
                self.snapshot.controls_visible = true;
                self.controls_shown += 1;
            }
        }
    }

    fn retry(&mut self) {
        if !matches!(self.snapshot.state, PlaybackState::Error(_)) {
            tracing::debug!("Retry ignored outside of error state");
            return;
        }

        tracing::info!("Retrying stream {}", self.snapshot.channel_name);
        self.snapshot.error_message = None;
        self.snapshot.state = PlaybackState::Buffering;
        self.snapshot.is_buffering = true;

        if let Some(engine) = self.engine.as_mut() {
            engine.seek_to(0);
            engine.prepare();
            engine.play();
        }
    }

    pub fn hide_controls(&mut self) {
        self.snapshot.controls_visible = false;
    }

    /// Release the engine. Safe to call repeatedly and without an engine.
    pub fn dispose(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.release();
            tracing::debug!("Engine released for {}", self.snapshot.channel_name);
        }
    }
}

enum Message {
    Command(PlayerCommand, oneshot::Sender<PlaybackSnapshot>),
    Engine(EngineEvent, oneshot::Sender<PlaybackSnapshot>),
    Snapshot(oneshot::Sender<PlaybackSnapshot>),
    Dispose(oneshot::Sender<()>),
}

/// Cloneable handle to a running controller task
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::Sender<Message>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
}

impl PlayerHandle {
    pub fn spawn(controller: PlaybackController) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (snapshot_tx, snapshots) = watch::channel(controller.snapshot().clone());
        tokio::spawn(run(controller, rx, snapshot_tx));
        Self { tx, snapshots }
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<PlaybackSnapshot>) -> Message,
    ) -> Result<PlaybackSnapshot, PlayerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| PlayerError::Closed)?;
        reply_rx.await.map_err(|_| PlayerError::Closed)
    }

    /// Apply a user command; returns the resulting snapshot
    pub async fn command(&self, command: PlayerCommand) -> Result<PlaybackSnapshot, PlayerError> {
        self.request(|reply| Message::Command(command, reply)).await
    }

    /// Deliver an engine notification; returns the resulting snapshot
    pub async fn engine_event(&self, event: EngineEvent) -> Result<PlaybackSnapshot, PlayerError> {
        self.request(|reply| Message::Engine(event, reply)).await
    }

    /// Snapshot after every queued message (and due timer) has been applied
    pub async fn current(&self) -> Result<PlaybackSnapshot, PlayerError> {
        self.request(Message::Snapshot).await
    }

    /// Last published snapshot, without waiting for the queue
    pub fn latest(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the task and release the engine. Disposing twice is a no-op.
    pub async fn dispose(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Message::Dispose(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

async fn run(
    mut controller: PlaybackController,
    mut rx: mpsc::Receiver<Message>,
    snapshots: watch::Sender<PlaybackSnapshot>,
) {
    let mut hide_at: Option<Instant> = None;

    loop {
        let armed_before = controller.auto_hide_armed();
        let shown_before = controller.controls_shown;

        let reply = tokio::select! {
            biased;

            _ = sleep_until(hide_at.unwrap_or_else(Instant::now)), if hide_at.is_some() => {
                hide_at = None;
                controller.hide_controls();
                None
            }
            message = rx.recv() => match message {
                Some(Message::Command(command, reply)) => {
                    controller.handle_command(command);
                    Some(reply)
                }
                Some(Message::Engine(event, reply)) => {
                    controller.handle_engine_event(event);
                    Some(reply)
                }
                Some(Message::Snapshot(reply)) => Some(reply),
                Some(Message::Dispose(ack)) => {
                    controller.dispose();
                    let _ = ack.send(());
                    break;
                }
                None => {
                    controller.dispose();
                    break;
                }
            }
        };

        if !controller.auto_hide_armed() {
            hide_at = None;
        } else if !armed_before || controller.controls_shown != shown_before {
            hide_at = Some(Instant::now() + CONTROLS_AUTO_HIDE);
        }

        snapshots.send_if_modified(|current| {
            if current != controller.snapshot() {
                *current = controller.snapshot().clone();
                true
            } else {
                false
            }
        });

        if let Some(reply) = reply {
            let _ = reply.send(controller.snapshot().clone());
        }
    }

    tracing::debug!("Player task stopped for {}", controller.snapshot().channel_name);
}
