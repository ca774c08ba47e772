//! Stable per-client session identity.
//!
//! The first call generates a UUID and persists it; later calls, including
//! after a restart, return the same value. When the storage location cannot
//! be used the provider hands out an ephemeral id for the rest of the
//! process instead of failing.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::IdentityError;

/// Environment variable overriding the identity file location.
pub const IDENTITY_FILE_ENV: &str = "RAG_IDENTITY_FILE";

const APP_DIR: &str = "rag-query";
const FILE_NAME: &str = "session_id";

/// Source of the identifier that scopes queries to their submitter.
pub trait IdentityProvider: Send + Sync {
    fn session_id(&self) -> String;
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Identity persisted as a single string in a local file.
#[derive(Debug)]
pub struct FileIdentity {
    path: Option<PathBuf>,
    /// Set once storage failed; sticks for the rest of the process.
    fallback: Mutex<Option<String>>,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            fallback: Mutex::new(None),
        }
    }

    /// `explicit` > `RAG_IDENTITY_FILE` > `<data-local-dir>/rag-query/session_id`.
    ///
    /// Without any usable location every call degrades to the ephemeral id.
    pub fn from_env(explicit: Option<PathBuf>) -> Self {
        let path = explicit
            .or_else(|| std::env::var_os(IDENTITY_FILE_ENV).map(PathBuf::from))
            .or_else(Self::default_path);
        Self {
            path,
            fallback: Mutex::new(None),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs_next::data_local_dir().map(|d| d.join(APP_DIR).join(FILE_NAME))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Forget the persisted identity. The next call generates a new one.
    pub fn clear(&self) -> Result<(), IdentityError> {
        self.fallback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let path = self.path.as_deref().ok_or(IdentityError::Unavailable)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(source) => Err(IdentityError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn load_or_create(&self) -> Result<String, IdentityError> {
        let path = self.path.as_deref().ok_or(IdentityError::Unavailable)?;
        let io_err = |source: std::io::Error| IdentityError::Io {
            path: path.to_path_buf(),
            source,
        };

        match fs::read_to_string(path) {
            Ok(stored) => {
                let stored = stored.trim();
                if !stored.is_empty() {
                    return Ok(stored.to_owned());
                }
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {}
            Err(e) => return Err(io_err(e)),
        }

        let id = new_session_id();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, &id).map_err(io_err)?;
        debug!(path = %path.display(), "persisted new session id");
        Ok(id)
    }
}

impl IdentityProvider for FileIdentity {
    fn session_id(&self) -> String {
        let mut fallback = self.fallback.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = fallback.as_ref() {
            return id.clone();
        }

        match self.load_or_create() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "session identity storage unavailable; using an ephemeral id");
                fallback.get_or_insert_with(new_session_id).clone()
            }
        }
    }
}

/// Identity that lives only as long as the value itself.
#[derive(Debug, Clone)]
pub struct EphemeralIdentity {
    id: String,
}

impl EphemeralIdentity {
    pub fn new() -> Self {
        Self { id: new_session_id() }
    }
}

impl Default for EphemeralIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for EphemeralIdentity {
    fn session_id(&self) -> String {
        self.id.clone()
    }
}
