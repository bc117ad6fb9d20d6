//! services/client/src/adapters/token_store.rs
//!
//! Implementations of the `TokenStore` port: a durable JSON key-value file for real
//! sessions and an in-memory store for tests and throwaway sessions.

use async_trait::async_trait;
use document_manager_core::domain::AuthToken;
use document_manager_core::ports::{PortError, PortResult, TokenStore};
use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Key under which the session token is stored.
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Key under which the verified phone number is stored.
pub const PHONE_NUMBER_KEY: &str = "phoneNumber";

//=========================================================================================
// File-backed Store
//=========================================================================================

/// Stores the session in a small JSON object on disk. Other keys in the file are kept
/// whatever their value type.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> PortResult<Map<String, Value>> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) if raw.iter().all(u8::is_ascii_whitespace) => Ok(Map::new()),
            Ok(raw) => serde_json::from_slice(&raw).map_err(|e| {
                PortError::Storage(format!("{} is corrupt: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }

    async fn write_entries(&self, entries: &Map<String, Value>) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }
        let raw = serde_json::to_vec_pretty(entries)
            .map_err(|e| PortError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| storage_error(&self.path, e))
    }

    async fn read_string(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self.read_entries().await?;
        Ok(entries
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }
}

fn storage_error(path: &Path, err: io::Error) -> PortError {
    PortError::Storage(format!("{}: {}", path.display(), err))
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> PortResult<Option<AuthToken>> {
        Ok(self.read_string(AUTH_TOKEN_KEY).await?.map(AuthToken::new))
    }

    async fn load_phone_number(&self) -> PortResult<Option<String>> {
        self.read_string(PHONE_NUMBER_KEY).await
    }

    async fn save(&self, token: &AuthToken, phone_number: &str) -> PortResult<()> {
        let mut entries = self.read_entries().await?;
        entries.insert(AUTH_TOKEN_KEY.to_string(), Value::from(token.as_str()));
        entries.insert(PHONE_NUMBER_KEY.to_string(), Value::from(phone_number));
        self.write_entries(&entries).await?;
        info!(path = %self.path.display(), "session token saved");
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        let mut entries = self.read_entries().await?;
        let had_token = entries.remove(AUTH_TOKEN_KEY).is_some();
        let had_phone = entries.remove(PHONE_NUMBER_KEY).is_some();
        if !had_token && !had_phone {
            debug!(path = %self.path.display(), "no session token to clear");
            return Ok(());
        }
        self.write_entries(&entries).await?;
        info!(path = %self.path.display(), "session token cleared");
        Ok(())
    }
}

//=========================================================================================
// In-memory Store
//=========================================================================================

#[derive(Debug, Default)]
struct Saved {
    token: Option<AuthToken>,
    phone_number: Option<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    saved: Mutex<Saved>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AuthToken) -> Self {
        Self {
            saved: Mutex::new(Saved {
                token: Some(token),
                phone_number: None,
            }),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Saved> {
        self.saved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> PortResult<Option<AuthToken>> {
        Ok(self.slot().token.clone())
    }

    async fn load_phone_number(&self) -> PortResult<Option<String>> {
        Ok(self.slot().phone_number.clone())
    }

    async fn save(&self, token: &AuthToken, phone_number: &str) -> PortResult<()> {
        *self.slot() = Saved {
            token: Some(token.clone()),
            phone_number: Some(phone_number.to_string()),
        };
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        *self.slot() = Saved::default();
        Ok(())
    }
}
