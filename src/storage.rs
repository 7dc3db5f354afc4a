//! File-per-key persisted storage.
//!
//! Each key maps to one UTF-8 file under the store's root directory. A missing
//! file is a valid, empty state.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, ViewerError};

/// Key holding the heightmap image as a data URL.
pub const IMAGE_KEY: &str = "saved_epure_wavejs";
/// Key holding the JSON parameters blob.
pub const PARAMS_KEY: &str = "saved_params_wavejs";

/// Overrides the platform data directory.
pub const DATA_DIR_ENV: &str = "HEIGHTVIEW_DATA_DIR";

#[derive(Clone, Debug)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Opens the store at `$HEIGHTVIEW_DATA_DIR`, else the platform data dir.
    pub fn open_default() -> Result<Self> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Ok(Self::new(dir));
        }

        directories::ProjectDirs::from("com", "heightview", "heightview")
            .map(|dirs| Self::new(dirs.data_dir()))
            .ok_or(ViewerError::NoDataDir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "storage key absent");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        std::fs::write(&path, value).map_err(|source| ViewerError::Write { path, source })
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = Storage::new(dir.path());
        assert_eq!(store.get(IMAGE_KEY).unwrap(), None);
    }

    #[test]
    fn set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = Storage::new(dir.path().join("nested"));
        store.set(PARAMS_KEY, r#"{"Scale":2}"#).unwrap();
        assert_eq!(store.get(PARAMS_KEY).unwrap().as_deref(), Some(r#"{"Scale":2}"#));

        store.remove(PARAMS_KEY).unwrap();
        assert_eq!(store.get(PARAMS_KEY).unwrap(), None);
        store.remove(PARAMS_KEY).unwrap();
    }
}
