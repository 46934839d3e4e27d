//! Player sessions keyed by id, one per device.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

use super::controller::{
    PlaybackController, PlaybackSnapshot, PlayerCommand, PlayerHandle, StreamTarget,
};
use super::engine::{EngineCommand, EngineEvent, EngineOutbox, RemoteEngine};
use super::errors::PlayerError;
use crate::services::metrics;

struct PlayerSession {
    device_id: String,
    handle: PlayerHandle,
    outbox: EngineOutbox,
    /// Last request from the device for this session
    last_seen: Mutex<Instant>,
}

impl PlayerSession {
    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|p| p.into_inner()) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last_seen = *self.last_seen.lock().unwrap_or_else(|p| p.into_inner());
        now.saturating_duration_since(last_seen)
    }
}

pub struct PlayerRegistry {
    sessions: RwLock<HashMap<Uuid, PlayerSession>>,
    max_sessions: usize,
}

impl PlayerRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    /// Open a stream for `device_id`. A device's previous session is
    /// disposed first, so leaving one channel for another never leaks an
    /// engine.
    pub async fn create(
        &self,
        device_id: &str,
        target: StreamTarget,
    ) -> Result<(Uuid, PlaybackSnapshot), PlayerError> {
        let (replaced, result) = {
            let mut sessions = self.sessions.write().await;

            let previous: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, s)| s.device_id == device_id)
                .map(|(id, _)| *id)
                .collect();
            let replaced: Vec<(Uuid, PlayerSession)> = previous
                .into_iter()
                .filter_map(|id| sessions.remove(&id).map(|s| (id, s)))
                .collect();

            let result = if sessions.len() >= self.max_sessions {
                Err(PlayerError::TooManySessions(self.max_sessions))
            } else {
                Ok(self.open(&mut sessions, device_id, target))
            };
            metrics::PLAYER_SESSIONS.set(sessions.len() as i64);
            (replaced, result)
        };

        // Old engines are released outside the lock
        for (id, old) in replaced {
            tracing::info!("Replacing player session {} for device {}", id, device_id);
            old.handle.dispose().await;
        }

        result
    }

    fn open(
        &self,
        sessions: &mut HashMap<Uuid, PlayerSession>,
        device_id: &str,
        target: StreamTarget,
    ) -> (Uuid, PlaybackSnapshot) {
        let (engine, outbox) = RemoteEngine::new();
        let handle = PlayerHandle::spawn(PlaybackController::new(target, Some(Box::new(engine))));
        let snapshot = handle.latest();

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            PlayerSession {
                device_id: device_id.to_string(),
                handle,
                outbox,
                last_seen: Mutex::new(Instant::now()),
            },
        );

        tracing::info!(
            "Player session {} opened for device {}: {}",
            id,
            device_id,
            snapshot.channel_name
        );
        (id, snapshot)
    }

    async fn handle(&self, id: Uuid) -> Result<PlayerHandle, PlayerError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|s| {
                s.touch();
                s.handle.clone()
            })
            .ok_or(PlayerError::NotFound)
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<PlaybackSnapshot, PlayerError> {
        self.handle(id).await?.current().await
    }

    pub async fn subscribe(&self, id: Uuid) -> Result<watch::Receiver<PlaybackSnapshot>, PlayerError> {
        Ok(self.handle(id).await?.subscribe())
    }

    pub async fn command(
        &self,
        id: Uuid,
        command: PlayerCommand,
    ) -> Result<PlaybackSnapshot, PlayerError> {
        self.handle(id).await?.command(command).await
    }

    pub async fn engine_event(
        &self,
        id: Uuid,
        event: EngineEvent,
    ) -> Result<PlaybackSnapshot, PlayerError> {
        self.handle(id).await?.engine_event(event).await
    }

    /// Commands queued for the device since the last drain
    pub async fn drain_engine_commands(&self, id: Uuid) -> Result<Vec<EngineCommand>, PlayerError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|s| {
                s.touch();
                s.outbox.drain()
            })
            .ok_or(PlayerError::NotFound)
    }

    /// Close a session. The engine's final `release` stays queued on the
    /// returned commands so the device can tear down its player.
    pub async fn dispose(&self, id: Uuid) -> Result<Vec<EngineCommand>, PlayerError> {
        let session = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.remove(&id).ok_or(PlayerError::NotFound)?;
            metrics::PLAYER_SESSIONS.set(sessions.len() as i64);
            session
        };

        session.handle.dispose().await;
        tracing::info!("Player session {} closed", id);
        Ok(session.outbox.drain())
    }

    /// Close every session (shutdown)
    pub async fn dispose_all(&self) {
        let sessions: Vec<PlayerSession> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, s)| s).collect()
        };
        metrics::PLAYER_SESSIONS.set(0);

        for session in &sessions {
            session.handle.dispose().await;
        }
        if !sessions.is_empty() {
            tracing::info!("Closed {} player sessions", sessions.len());
        }
    }

    /// Dispose every session the device has not touched for `max_idle`.
    /// Returns how many were closed.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let idle: Vec<(Uuid, PlayerSession)> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, s)| s.idle_for(now) >= max_idle)
                .map(|(id, _)| *id)
                .collect();
            let idle = ids
                .into_iter()
                .filter_map(|id| sessions.remove(&id).map(|s| (id, s)))
                .collect();
            metrics::PLAYER_SESSIONS.set(sessions.len() as i64);
            idle
        };

        for (id, session) in &idle {
            tracing::info!(
                "Closing idle player session {} for device {}",
                id,
                session.device_id
            );
            session.handle.dispose().await;
        }
        idle.len()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
