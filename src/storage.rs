//! Storage layer for bcstart
//!
//! All local state lives in one data directory:
//!
//! ```text
//! <data-dir>/
//!   .bcstart.toml        # Configuration
//!   session.json         # Persisted local session
//!   businesses.jsonl     # Business profiles
//!   todos.jsonl          # Todo rows (soft-deleted rows included)
//!   sub_areas.jsonl      # Sub-area groupings
//!   task_files.jsonl     # Task-file mappings
//!   files.jsonl          # Uploaded file records
//!   files/<id>           # Uploaded file content
//!   *.lock               # Per-table advisory locks
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock::{lock_path_for, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = ".bcstart.toml";

/// Table names (file stem of the JSONL file)
pub mod tables {
    pub const BUSINESSES: &str = "businesses";
    pub const TODOS: &str = "todos";
    pub const SUB_AREAS: &str = "sub_areas";
    pub const TASK_FILES: &str = "task_files";
    pub const FILES: &str = "files";
}

/// Storage manager rooted at a data directory
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Storage in the platform data directory (e.g. `~/.local/share/bcstart`).
    pub fn default_location() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("ai", "bcstart", "bcstart").ok_or_else(|| {
            Error::InvalidConfig("could not determine a data directory; pass --data-dir".to_string())
        })?;
        Ok(Self::new(dirs.data_dir().to_path_buf()))
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{table}.jsonl"))
    }

    pub fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }

    pub fn file_blob(&self, file_id: &str) -> PathBuf {
        self.files_dir().join(file_id)
    }

    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.files_dir())?;
        Ok(())
    }

    // =========================================================================
    // File I/O helpers (atomic writes)
    // =========================================================================

    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.write_atomic(path, json.as_bytes())
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write via a temp file in the same directory, then rename over `path`.
    /// Readers see either the old content or the new content, never a mix.
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
        temp.write_all(data)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|err| Error::Io(err.error))?;
        Ok(())
    }

    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    pub fn write_jsonl<T: Serialize>(&self, path: &Path, records: &[T]) -> Result<()> {
        let mut buffer = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }
        self.write_atomic(path, &buffer)
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Read every row of a table. Missing tables read as empty.
    pub fn read_table<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>> {
        self.read_jsonl(&self.table_path(table))
    }

    /// Read-modify-write a table under its lock.
    ///
    /// The closure's error aborts the write and leaves the table untouched.
    pub fn update_table<T, R, F>(&self, table: &str, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let path = self.table_path(table);
        let _lock = FileLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut rows: Vec<T> = self.read_jsonl(&path)?;
        let result = f(&mut rows)?;
        self.write_jsonl(&path, &rows)?;
        Ok(result)
    }
}
