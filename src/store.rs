use crate::error::StoreError;
use serde_json::Value;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Load a JSON array of identifiers. Missing or malformed files give an empty set.
///
/// Numbers are accepted and stringified so that subscriber files holding
/// numeric user ids keep loading.
pub fn load(path: impl AsRef<Path>) -> HashSet<String> {
    let path = path.as_ref();

    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            debug!("No persisted set at {} ({}), starting empty", path.display(), e);
            return HashSet::new();
        }
    };

    let items: Vec<Value> = match serde_json::from_str(&text) {
        Ok(items) => items,
        Err(e) => {
            warn!("Ignoring malformed set file {}: {}", path.display(), e);
            return HashSet::new();
        }
    };

    let mut set = HashSet::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => {
                set.insert(s);
            }
            Value::Number(n) => {
                set.insert(n.to_string());
            }
            other => {
                warn!("Ignoring malformed set file {}: unexpected element {}", path.display(), other);
                return HashSet::new();
            }
        }
    }
    set
}

/// Overwrite `path` with the set as a sorted JSON array.
///
/// Content goes to a sibling temp file first and is renamed over the target.
pub fn save(set: &HashSet<String>, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();

    let mut items: Vec<&str> = set.iter().map(String::as_str).collect();
    items.sort_unstable();
    let body = serde_json::to_vec(&items)?;

    let tmp = tmp_path(path);
    fs::write(&tmp, body).map_err(|source| io_error(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| io_error(path, source))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// A set bound to its durable file; every mutation is written through.
#[derive(Debug)]
pub struct PersistentSet {
    path: PathBuf,
    items: HashSet<String>,
}

impl PersistentSet {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = load(&path);
        Self { path, items }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add and persist. Returns whether the item was new.
    pub fn insert(&mut self, item: impl Into<String>) -> Result<bool, StoreError> {
        let added = self.items.insert(item.into());
        self.flush()?;
        Ok(added)
    }

    /// Remove and persist. Returns whether the item was present.
    pub fn remove(&mut self, item: &str) -> Result<bool, StoreError> {
        let removed = self.items.remove(item);
        self.flush()?;
        Ok(removed)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        save(&self.items, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn set_of(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        assert!(load(dir.path().join("absent.json")).is_empty());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load(&path).is_empty());

        fs::write(&path, r#"{"a": 1}"#).unwrap();
        assert!(load(&path).is_empty());

        fs::write(&path, r#"["ok", {"nested": true}]"#).unwrap();
        assert!(load(&path).is_empty());
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, r#"[123456789012345678, "42"]"#).unwrap();
        assert_eq!(load(&path), set_of(&["123456789012345678", "42"]));
    }

    #[test]
    fn save_then_load_returns_same_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen.json");
        let set = set_of(&["b_pump", "a_pump", "c_moon"]);

        save(&set, &path).unwrap();
        assert_eq!(load(&path), set);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"["a_pump","b_pump","c_moon"]"#);
    }

    #[test]
    fn resaving_loaded_set_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen.json");
        save(&set_of(&["x", "y", "z"]), &path).unwrap();
        let first = fs::read(&path).unwrap();

        save(&load(&path), &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seen.json");
        save(&set_of(&["x"]), &path).unwrap();
        assert!(!dir.path().join("seen.json.tmp").exists());
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("seen.json");
        assert!(matches!(save(&set_of(&["x"]), &path), Err(StoreError::Io { .. })));
    }

    #[test]
    fn persistent_set_writes_through() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");

        let mut users = PersistentSet::open(&path);
        assert!(users.is_empty());
        assert!(users.insert("1").unwrap());
        assert!(!users.insert("1").unwrap());
        assert!(users.insert("2").unwrap());
        assert_eq!(load(&path), set_of(&["1", "2"]));

        assert!(users.remove("1").unwrap());
        assert!(!users.remove("1").unwrap());
        assert_eq!(load(&path), set_of(&["2"]));

        let reopened = PersistentSet::open(&path);
        assert!(reopened.contains("2"));
        assert_eq!(reopened.len(), 1);
    }
}
