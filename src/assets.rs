use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Filesystem-backed store for certificate template assets. Keys are
/// slash-separated paths under the configured root; certificate assets
/// live under an event-scoped `certificates/<event id>/` namespace.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        AssetStore { root: root.into() }
    }

    pub fn certificate_key(event_id: i64, filename: &str) -> String {
        format!("certificates/{event_id}/{filename}")
    }

    pub fn certificate_dir(event_id: i64) -> String {
        format!("certificates/{event_id}")
    }

    pub fn write(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)
    }

    pub fn read(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.root.join(key))
    }

    /// Remove a stored asset; removing a missing asset is not an error.
    pub fn delete(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.root.join(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Remove a whole asset namespace, e.g. an event's certificate
    /// directory.
    pub fn delete_dir(&self, key: &str) -> io::Result<()> {
        match fs::remove_dir_all(self.root.join(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let key = AssetStore::certificate_key(7, "template.pdf");

        store.write(&key, b"%PDF-").unwrap();
        assert_eq!(store.read(&key).unwrap(), b"%PDF-");

        store.delete(&key).unwrap();
        assert!(store.read(&key).is_err());
        // deleting again is a no-op
        store.delete(&key).unwrap();
    }

    #[test]
    fn delete_dir_clears_the_event_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        store
            .write(&AssetStore::certificate_key(3, "a.pdf"), b"a")
            .unwrap();
        store
            .write(&AssetStore::certificate_key(3, "b.ttf"), b"b")
            .unwrap();

        store.delete_dir(&AssetStore::certificate_dir(3)).unwrap();
        assert!(store.read(&AssetStore::certificate_key(3, "a.pdf")).is_err());
        // missing namespace is a no-op
        store.delete_dir(&AssetStore::certificate_dir(3)).unwrap();
    }
}
