use anyhow::Context;
use indexmap::IndexMap;
use log::info;
use std::{
    cell::RefCell,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Durable key-value storage for client-side preferences. Values are plain
/// strings, and nothing expires.
pub trait Storage {
    /// Get the value stored under a key. `Ok(None)` means the key has never
    /// been written, while an error means the storage itself is unusable.
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Store a value, overwriting anything already under the key
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Storage backed by a single JSON object on disk. The whole file is read on
/// every get and rewritten on every set. There's only ever one key in it, so
/// this is fine.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> anyhow::Result<IndexMap<String, String>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            // Nothing saved yet
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(IndexMap::new())
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!(
                        "Error reading storage file {}",
                        self.path.display()
                    )
                })
            }
        };
        serde_json::from_slice(&contents).with_context(|| {
            format!("Error parsing storage file {}", self.path.display())
        })
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.load()?.shift_remove(key))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value.to_owned());
        info!("Saving `{key}={value}` to {}", self.path.display());
        let serialized = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, serialized).with_context(|| {
            format!("Error saving storage file {}", self.path.display())
        })?;
        Ok(())
    }
}

/// Storage that lives only as long as the process. Used when nothing should
/// touch the disk
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<IndexMap<String, String>>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
