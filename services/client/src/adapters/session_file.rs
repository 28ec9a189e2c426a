//! services/client/src/adapters/session_file.rs
//!
//! Durable storage for the signed-in user id: a small JSON object on disk,
//! playing the role a browser's local storage plays for a web client.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use news_digest_core::{PortError, PortResult, SessionStore, UserId};
use serde_json::{Map, Value};
use tracing::debug;

/// The fixed key the user id is stored under.
pub const SESSION_KEY: &str = "news_digest.user_id";

/// An adapter that implements the `SessionStore` port with a JSON file.
///
/// Other keys in the file are preserved; the file is removed once it holds nothing.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> PortResult<Map<String, Value>> {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) | Err(_) => Err(PortError::Storage(format!(
                    "{} does not contain a JSON object",
                    self.path.display()
                ))),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(storage_error(&self.path, &e)),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> PortResult<()> {
        if map.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(storage_error(&self.path, &e)),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_error(parent, &e))?;
        }
        let json = serde_json::to_vec_pretty(map).map_err(|e| PortError::Storage(e.to_string()))?;

        // Write to a sibling first so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| storage_error(&tmp, &e))?;
        fs::rename(&tmp, &self.path).map_err(|e| storage_error(&self.path, &e))
    }
}

fn storage_error(path: &Path, e: &io::Error) -> PortError {
    PortError::Storage(format!("{}: {}", path.display(), e))
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> PortResult<Option<UserId>> {
        let map = self.read_map()?;
        Ok(map
            .get(SESSION_KEY)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(UserId::new))
    }

    fn set(&self, user_id: &UserId) -> PortResult<()> {
        let mut map = self.read_map()?;
        map.insert(SESSION_KEY.to_string(), Value::String(user_id.to_string()));
        self.write_map(&map)?;
        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> PortResult<()> {
        let mut map = match self.read_map() {
            Ok(map) => map,
            // A corrupt file cannot hold a valid session; start over.
            Err(PortError::Storage(_)) if self.path.exists() => Map::new(),
            Err(e) => return Err(e),
        };
        map.remove(SESSION_KEY);
        self.write_map(&map)
    }
}
