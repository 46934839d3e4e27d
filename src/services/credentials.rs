//! Persisted login for the TV client.
//!
//! Credentials live in a small JSON file written with tmp-file + rename so a
//! crash never leaves a half-written file. Readers subscribe to a watch
//! channel and see every save/clear.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;

use crate::services::xtream::XtreamCredentials;

/// Last successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredentials {
    pub host: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UserCredentials {
    pub fn xtream(&self) -> XtreamCredentials {
        XtreamCredentials::new(&self.host, &self.username, &self.password)
    }
}

pub struct CredentialStore {
    path: PathBuf,
    tx: watch::Sender<Option<UserCredentials>>,
}

impl CredentialStore {
    /// Open the store, loading the file if present.
    ///
    /// An unreadable or corrupt file is logged and treated as "logged out".
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let initial = match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<UserCredentials>(&content) {
                Ok(creds) => Some(creds),
                Err(e) => {
                    tracing::warn!("Ignoring invalid credentials file {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read credentials file {}: {}", path.display(), e);
                None
            }
        };

        let (tx, _rx) = watch::channel(initial);
        Ok(Self { path, tx })
    }

    /// Current value
    pub fn current(&self) -> Option<UserCredentials> {
        self.tx.borrow().clone()
    }

    /// Observe every change
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserCredentials>> {
        self.tx.subscribe()
    }

    /// Save credentials. A missing expiry or status keeps the previously
    /// stored one.
    pub async fn save(&self, mut creds: UserCredentials) -> Result<()> {
        if let Some(previous) = self.current() {
            if creds.exp_date.is_none() {
                creds.exp_date = previous.exp_date;
            }
            if creds.status.is_none() {
                creds.status = previous.status;
            }
        }

        let content = serde_json::to_string_pretty(&creds)?;
        let tmp_path = self.tmp_path();

        let mut file = fs::File::create(&tmp_path)
            .await
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await?;

        tracing::info!("Credentials saved for {}", creds.username);
        self.tx.send_replace(Some(creds));
        Ok(())
    }

    /// Forget the stored login
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.tx.send_replace(None);
        tracing::info!("Credentials cleared");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::temp_path;

    fn alice() -> UserCredentials {
        UserCredentials {
            host: "http://tv.example.com:80".to_string(),
            username: "alice".to_string(),
            password: "secret".to_string(),
            exp_date: Some("1735689600".to_string()),
            status: Some("Active".to_string()),
        }
    }

    #[tokio::test]
    async fn test_save_persists_and_reloads() {
        let path = temp_path("credentials.json");
        let store = CredentialStore::open(&path).await.unwrap();
        assert_eq!(store.current(), None);

        store.save(alice()).await.unwrap();

        let reopened = CredentialStore::open(&path).await.unwrap();
        assert_eq!(reopened.current(), Some(alice()));
    }

    #[tokio::test]
    async fn test_subscribers_see_save_and_clear() {
        let store = CredentialStore::open(temp_path("credentials.json")).await.unwrap();
        let mut rx = store.subscribe();

        store.save(alice()).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|c| c.username.as_str()), Some("alice"));

        store.clear().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_save_keeps_previous_expiry_and_status() {
        let store = CredentialStore::open(temp_path("credentials.json")).await.unwrap();
        store.save(alice()).await.unwrap();

        let mut update = alice();
        update.password = "changed".to_string();
        update.exp_date = None;
        update.status = None;
        store.save(update).await.unwrap();

        let current = store.current().unwrap();
        assert_eq!(current.password, "changed");
        assert_eq!(current.exp_date.as_deref(), Some("1735689600"));
        assert_eq!(current.status.as_deref(), Some("Active"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_logged_out() {
        let path = temp_path("credentials.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = CredentialStore::open(&path).await.unwrap();
        assert_eq!(store.current(), None);
    }

    #[tokio::test]
    async fn test_clear_without_file_is_ok() {
        let store = CredentialStore::open(temp_path("credentials.json")).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.current(), None);
    }
}
