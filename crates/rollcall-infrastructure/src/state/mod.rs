use anyhow::{Context, Result};
use log::warn;
use std::path::PathBuf;

/// Stores the opaque balance fingerprint between runs as a single small
/// file. Read-then-write, no locking: the process runs alone.
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Previous fingerprint, if any. Unreadable state is treated as absent
    /// rather than an error: worst case the run re-persists the file.
    pub fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim().to_string();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed)
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read fingerprint file {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub fn save(&self, fingerprint: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create state directory {:?}", parent))?;
            }
        }
        std::fs::write(&self.path, fingerprint)
            .with_context(|| format!("Failed to write fingerprint file {:?}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("balance_hash.txt"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("balance_hash.txt"));

        store.save("a1b2c3d4e5f60718").unwrap();
        assert_eq!(store.load().as_deref(), Some("a1b2c3d4e5f60718"));

        store.save("ffffffffffffffff").unwrap();
        assert_eq!(store.load().as_deref(), Some("ffffffffffffffff"));
    }

    #[test]
    fn test_load_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("balance_hash.txt");
        std::fs::write(&path, "  abc123  \n").unwrap();

        let store = FingerprintStore::new(path);
        assert_eq!(store.load().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_empty_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("balance_hash.txt");
        std::fs::write(&path, "").unwrap();

        let store = FingerprintStore::new(path);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FingerprintStore::new(dir.path().join("state").join("balance_hash.txt"));
        store.save("abc").unwrap();
        assert_eq!(store.load().as_deref(), Some("abc"));
    }
}
