//! Durable mirror of the session.
//!
//! The in-memory [`SessionStore`](super::SessionStore) is authoritative; a
//! [`SessionPersistence`] backend only lets a restarted client pick the token
//! and identity back up. Wallet balances are never persisted because they are
//! always re-fetched from the backend.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::store::Identity;
use crate::error::{Result, WalletLinkError};

/// What survives a restart.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// JWT bearer token
    pub token: String,

    /// Identity known when the session was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
}

impl std::fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSession")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .finish()
    }
}

/// Storage backend for the session mirror.
///
/// Implementations MUST keep tokens out of logs. File-backed stores should
/// use owner-only permissions (0600 on Unix).
///
/// Methods run synchronously on the caller's thread (outside the session
/// lock), so backends should stay cheap: a small local file or memory.
pub trait SessionPersistence: Send + Sync {
    /// Load the stored session. `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<PersistedSession>>;

    /// Store the session, replacing any previous one.
    fn save(&self, session: &PersistedSession) -> Result<()>;

    /// Remove the stored session. Succeeds when nothing is stored.
    fn clear(&self) -> Result<()>;
}

/// In-memory backend for tests and short-lived clients.
#[derive(Debug, Default)]
pub struct MemorySessionPersistence {
    slot: Mutex<Option<PersistedSession>>,
}

impl MemorySessionPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a stored session, as if a previous run had saved it.
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionPersistence for MemorySessionPersistence {
    fn load(&self) -> Result<Option<PersistedSession>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        *self.slot.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// TOML file backend.
///
/// ```toml
/// token = "eyJhbGciOiJIUzI1NiJ9..."
///
/// [identity]
/// id = 7
/// username = "alice"
/// role = "user"
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionPersistence {
    file_path: PathBuf,
}

impl FileSessionPersistence {
    /// Default session file path
    /// - Windows: `~/.wallet/session.toml`
    /// - Linux/macOS: `~/.config/wallet/session.toml`
    pub fn default_path() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".wallet").join("session.toml")
            } else {
                PathBuf::from(".wallet").join("session.toml")
            }
        }

        #[cfg(not(target_os = "windows"))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("wallet").join("session.toml")
            } else if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("wallet").join("session.toml")
            } else {
                PathBuf::from(".wallet").join("session.toml")
            }
        }
    }

    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    pub fn with_path(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl Default for FileSessionPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> Result<Option<PersistedSession>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.file_path).map_err(|e| {
            WalletLinkError::PersistenceError(format!(
                "Failed to read session file '{}': {}",
                self.file_path.display(),
                e
            ))
        })?;

        let session: PersistedSession = toml::from_str(&contents).map_err(|e| {
            WalletLinkError::PersistenceError(format!(
                "Corrupted session file '{}': {}",
                self.file_path.display(),
                e.message()
            ))
        })?;

        if session.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        let contents = toml::to_string_pretty(session).map_err(|e| {
            WalletLinkError::PersistenceError(format!("Failed to serialize session: {}", e))
        })?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    WalletLinkError::PersistenceError(format!(
                        "Failed to create session directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        fs::write(&self.file_path, contents).map_err(|e| {
            WalletLinkError::PersistenceError(format!(
                "Failed to write session file '{}': {}",
                self.file_path.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.file_path, permissions).map_err(|e| {
                WalletLinkError::PersistenceError(format!(
                    "Failed to set file permissions for '{}': {}",
                    self.file_path.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WalletLinkError::PersistenceError(format!(
                "Failed to remove session file '{}': {}",
                self.file_path.display(),
                e
            ))),
        }
    }
}
