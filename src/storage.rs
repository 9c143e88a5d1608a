use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::ports::storage::{KeyValueStore, StorageError};

const PROFILE_FILE: &str = "profile.toml";

/// Key-value store persisted as a flat TOML table under the profile
/// directory. Writes go through a temp file plus rename so a crash never
/// leaves a half-written profile behind.
#[derive(Clone)]
pub struct ProfileStore {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl ProfileStore {
    pub fn open(profile_dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(profile_dir).map_err(StorageError::Io)?;
        Ok(Self {
            path: Arc::new(profile_dir.join(PROFILE_FILE)),
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match std::fs::read_to_string(self.path.as_ref()) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(StorageError::Io(err)),
        };
        toml::from_str(&contents).map_err(|err| StorageError::Corrupt(err.to_string()))
    }

    // A corrupt profile file is dropped and rebuilt from the incoming write.
    fn read_table_or_reset(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_table() {
            Ok(table) => Ok(table),
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!("profile file is corrupt, rewriting it: {reason}");
                Ok(BTreeMap::new())
            }
            Err(err) => Err(err),
        }
    }

    fn write_table(&self, table: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let serialized = toml::to_string(table).expect("string table serializes");
        atomic_write(&self.path, &serialized).map_err(StorageError::Io)
    }
}

impl KeyValueStore for ProfileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().expect("profile lock");
        Ok(self.read_table()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().expect("profile lock");
        let mut table = self.read_table_or_reset()?;
        table.insert(key.to_string(), value.to_string());
        self.write_table(&table)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().expect("profile lock");
        let mut table = self.read_table_or_reset()?;
        table.remove(key);
        if !self.path.as_ref().exists() {
            return Ok(());
        }
        self.write_table(&table)
    }
}

/// In-memory store for tests and throwaway profiles.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().expect("memory store lock").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .expect("memory store lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().expect("memory store lock").remove(key);
        Ok(())
    }
}

fn atomic_write(path: &Path, contents: &str) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("missing parent directory"))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(PROFILE_FILE);
    let pid = std::process::id();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    for attempt in 0..10u32 {
        let temp_name = format!(".{}.tmp-{}-{}-{}", file_name, pid, nanos, attempt);
        let temp_path = parent.join(temp_name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())?;
                file.flush()?;
                std::fs::rename(&temp_path, path)?;
                return Ok(());
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to create temp file",
    ))
}
