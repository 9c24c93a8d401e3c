//! Contact persistence: append-only `name,number` records.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{Result, VoxcallError};

/// Persists one (name, number) pair per saved contact.
pub trait ContactStore: Send + Sync {
    fn store(&self, name: &str, number: &str) -> Result<()>;
}

/// Appends `name,number` lines to a text file.
pub struct FileContactStore {
    path: PathBuf,
}

impl FileContactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContactStore for FileContactStore {
    fn store(&self, name: &str, number: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| VoxcallError::ContactStore {
                name: name.to_string(),
                message: format!("{}: {e}", self.path.display()),
            })?;
        writeln!(file, "{name},{number}").map_err(|e| VoxcallError::ContactStore {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// Keeps contacts in memory. Test double.
#[derive(Default)]
pub struct MemoryContactStore {
    records: Mutex<Vec<(String, String)>>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, String)> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl ContactStore for MemoryContactStore {
    fn store(&self, name: &str, number: &str) -> Result<()> {
        if let Ok(mut records) = self.records.lock() {
            records.push((name.to_string(), number.to_string()));
        }
        Ok(())
    }
}
