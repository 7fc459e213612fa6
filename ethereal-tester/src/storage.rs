//! Save slots on the local filesystem, one JSON file per key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ethereal_game::SaveStore;

const APP_DIR: &str = "ethereal-ink";

#[derive(Debug, Clone)]
pub struct FileSaveStore {
    dir: PathBuf,
}

impl FileSaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data dir>/ethereal-ink/saves`, or `./ethereal-ink/saves` when the
    /// platform has no data directory.
    #[must_use]
    pub fn default_location() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join(APP_DIR).join("saves"))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl SaveStore for FileSaveStore {
    type Error = io::Error;

    fn write_blob(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, blob)?;
        fs::rename(&staging, &path)?;
        log::debug!("saved {} bytes to {}", blob.len(), path.display());
        Ok(())
    }

    fn read_blob(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match fs::read(self.path_for(key)) {
            // Undecodable bytes still reach the save decoder, which rejects them as corrupt.
            Ok(bytes) => Ok(Some(String::from_utf8(bytes).unwrap_or_else(|err| {
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn delete_blob(&self, key: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereal_game::GameSession;

    fn temp_store(label: &str) -> FileSaveStore {
        FileSaveStore::new(std::env::temp_dir().join(format!(
            "ethereal-store-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        )))
    }

    #[test]
    fn keys_map_to_safe_file_names() {
        let store = FileSaveStore::new("/saves");
        assert_eq!(
            store.path_for("ethereal_ink.save.v1"),
            PathBuf::from("/saves/ethereal_ink.save.v1.json")
        );
        assert_eq!(
            store.path_for("../etc/passwd"),
            PathBuf::from("/saves/.._etc_passwd.json")
        );
    }

    #[test]
    fn blobs_roundtrip_and_delete() {
        let store = temp_store("blob");
        assert_eq!(store.read_blob("slot").unwrap(), None);
        store.write_blob("slot", "{\"a\":1}").unwrap();
        assert_eq!(store.read_blob("slot").unwrap().as_deref(), Some("{\"a\":1}"));
        store.delete_blob("slot").unwrap();
        store.delete_blob("slot").unwrap();
        assert_eq!(store.read_blob("slot").unwrap(), None);
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn binary_garbage_loads_as_no_save() {
        let store = temp_store("garbage");
        let mut session = GameSession::seeded(3);
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path_for(&session.config().save_key()), [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        assert!(store.read_blob(&session.config().save_key()).unwrap().is_some());
        assert!(!session.load_from(&store).unwrap());
        assert_eq!(session.phase(), ethereal_game::GamePhase::ClassSelect);
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn session_survives_the_filesystem() {
        let store = temp_store("session");
        let mut session = GameSession::seeded(8);
        session.select_class("archer").unwrap();
        session.select_companion("cat").unwrap();
        session.save_to(&store).unwrap();

        let mut restored = GameSession::seeded(9);
        assert!(restored.load_from(&store).unwrap());
        assert_eq!(restored.snapshot(), session.snapshot());
        let _ = fs::remove_dir_all(store.dir());
    }
}
