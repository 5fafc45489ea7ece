//! Session state passed explicitly through the composition root.
//!
//! Presence of an access token is the only authentication signal; nothing here
//! inspects expiry or signature.

pub mod guard;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use guard::{resolve, Route, RouteDecision};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session storage is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Opaque access/refresh token pair returned by a successful login
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Tokens never show up in logs or debug output.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

pub trait SessionStore: Send + Sync {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    fn set_tokens(&self, tokens: TokenPair) -> Result<(), SessionError>;

    /// Drops both tokens
    fn clear(&self) -> Result<(), SessionError>;

    fn is_authenticated(&self) -> bool {
        self.access_token().is_some_and(|t| !t.is_empty())
    }
}

pub type Session = Arc<dyn SessionStore>;

/// Process-local session, lost on exit
#[derive(Default)]
pub struct MemorySession {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }

    pub fn shared() -> Session {
        Arc::new(Self::new())
    }

    fn read(&self) -> Option<TokenPair> {
        self.tokens.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SessionStore for MemorySession {
    fn access_token(&self) -> Option<String> {
        self.read().map(|t| t.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.read().map(|t| t.refresh_token)
    }

    fn set_tokens(&self, tokens: TokenPair) -> Result<(), SessionError> {
        *self.tokens.write().unwrap_or_else(|e| e.into_inner()) = Some(tokens);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.tokens.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    refresh_token: String,
    stored_at: DateTime<Utc>,
}

/// Session persisted as `session.json` so the CLI stays logged in between runs
pub struct FileSession {
    path: PathBuf,
}

impl FileSession {
    pub const FILE_NAME: &'static str = "session.json";

    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            path: config_dir.as_ref().join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the current tokens were written, if any
    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        self.load().ok().flatten().map(|s| s.stored_at)
    }

    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn load_or_warn(&self) -> Option<StoredSession> {
        match self.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable session file: {}", e);
                None
            }
        }
    }
}

impl SessionStore for FileSession {
    fn access_token(&self) -> Option<String> {
        self.load_or_warn().map(|s| s.access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.load_or_warn().map(|s| s.refresh_token)
    }

    fn set_tokens(&self, tokens: TokenPair) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let stored = StoredSession {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            stored_at: Utc::now(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
