//! Directory-backed key-value storage.
//!
//! Each key is one file in a capability-scoped directory. Writes go to a
//! hidden temporary file that is then renamed over the target, so readers in
//! other processes see either the old value or the new one.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Component, Utf8Path};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::debug;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Key-value storage over a directory of files.
///
/// # Examples
/// ```
/// use frontend::domain::ports::KeyValueStore;
/// use frontend::outbound::storage::DirKeyValueStore;
///
/// let tmp = tempfile::tempdir().unwrap();
/// let path = camino::Utf8Path::from_path(tmp.path()).unwrap();
/// let store = DirKeyValueStore::open(path).unwrap();
/// store.set_item("loginResponse", "{}").unwrap();
/// assert_eq!(store.get_item("loginResponse").unwrap().as_deref(), Some("{}"));
/// ```
#[derive(Debug)]
pub struct DirKeyValueStore {
    dir: Dir,
}

impl DirKeyValueStore {
    /// Open `path`, creating it when missing.
    pub fn open(path: &Utf8Path) -> Result<Self, KeyValueStoreError> {
        std::fs::create_dir_all(path).map_err(|err| unavailable(path, &err))?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(|err| unavailable(path, &err))?;
        debug!(%path, "opened storage directory");
        Ok(Self { dir })
    }

    /// Wrap an already opened directory.
    pub fn from_dir(dir: Dir) -> Self {
        Self { dir }
    }
}

fn unavailable(path: &Utf8Path, err: &io::Error) -> KeyValueStoreError {
    KeyValueStoreError::unavailable(format!("{path}: {err}"))
}

// Keys become file names; anything that could escape the directory or
// collide with temp files is refused.
fn file_name(key: &str) -> Result<&str, KeyValueStoreError> {
    let path = Utf8Path::new(key);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Utf8Component::Normal(name)), None) if !name.starts_with('.') => Ok(name),
        _ => Err(KeyValueStoreError::invalid_key(key)),
    }
}

impl KeyValueStore for DirKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let name = file_name(key)?;
        match self.dir.read_to_string(name) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(KeyValueStoreError::read(key, err.to_string())),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let name = file_name(key)?;
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        let tmp_name = format!(".{name}.tmp.{}.{suffix}.{counter}", std::process::id());

        self.write_temp(&tmp_name, value)
            .and_then(|()| self.dir.rename(&tmp_name, &self.dir, name))
            .map_err(|err| {
                drop(self.dir.remove_file(&tmp_name));
                KeyValueStoreError::write(key, err.to_string())
            })?;
        self.sync();
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let name = file_name(key)?;
        match self.dir.remove_file(name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(KeyValueStoreError::write(key, err.to_string())),
        }
    }
}

impl DirKeyValueStore {
    fn write_temp(&self, tmp_name: &str, value: &str) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = self.dir.open_with(tmp_name, &options)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()
    }

    fn sync(&self) {
        // Best-effort directory sync.
        if self.dir.open(".").and_then(|dir| dir.sync_all()).is_err() {
            debug!("storage directory sync skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn store() -> (tempfile::TempDir, DirKeyValueStore) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = Dir::open_ambient_dir(tmp.path(), ambient_authority()).expect("open dir");
        (tmp, DirKeyValueStore::from_dir(dir))
    }

    #[rstest]
    #[case("")]
    #[case("../escape")]
    #[case("nested/key")]
    #[case("/absolute")]
    #[case(".hidden")]
    fn rejects_keys_that_are_not_plain_names(#[case] key: &str) {
        let (_tmp, store) = store();
        assert_eq!(
            store.set_item(key, "v"),
            Err(KeyValueStoreError::invalid_key(key))
        );
    }

    #[test]
    fn missing_keys_read_as_none() {
        let (_tmp, store) = store();
        assert_eq!(store.get_item("loginResponse").expect("get"), None);
        store.remove_item("loginResponse").expect("remove missing");
    }

    #[test]
    fn overwrite_leaves_no_temp_files() {
        let (tmp, store) = store();
        store.set_item("loginResponse", "one").expect("set");
        store.set_item("loginResponse", "two").expect("set");
        assert_eq!(
            store.get_item("loginResponse").expect("get").as_deref(),
            Some("two")
        );
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .expect("list")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names, ["loginResponse"]);
    }
}
