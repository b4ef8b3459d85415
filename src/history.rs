//! Persistent history of saved results.
//!
//! The [`HistoryRepository`] trait is the only thing the router knows about
//! storage. [`CsvHistoryStore`] keeps the rows in a flat comma-separated file
//! with a fixed `index,name,operation,result` header; [`MemoryHistoryStore`]
//! keeps them in a `Vec` and follows the same contract.

use crate::error::{CalcError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

/// Column names of the history file, in order.
pub const HEADER: [&str; 4] = ["index", "name", "operation", "result"];

/// One saved result.
///
/// `index` is the zero-based position of the row and is rewritten whenever an
/// earlier row is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub index: usize,
    pub name: String,
    pub operation: String,
    pub result: f64,
}

impl HistoryEntry {
    pub fn new(name: impl Into<String>, operation: impl Into<String>, result: f64) -> Self {
        Self {
            index: 0,
            name: name.into(),
            operation: operation.into(),
            result,
        }
    }
}

/// Ordered storage for [`HistoryEntry`] rows.
///
/// Row order is insertion order minus deleted rows, and indices are always
/// contiguous from 0.
pub trait HistoryRepository {
    /// Appends `entry` with its index set to the current row count and returns
    /// the stored row.
    fn save(&mut self, entry: HistoryEntry) -> Result<HistoryEntry>;

    /// All rows in order. A store with no rows yields an empty vector, not an error.
    fn load(&self) -> Result<Vec<HistoryEntry>>;

    /// Removes the row at `position` and renumbers the rest.
    ///
    /// An out-of-range position fails with [`CalcError::IndexOutOfBounds`] and
    /// leaves the store unchanged.
    fn delete(&mut self, position: i64) -> Result<HistoryEntry>;

    /// Drops every row. Clearing an empty store is not an error.
    fn clear(&mut self) -> Result<()>;
}

impl<R: HistoryRepository + ?Sized> HistoryRepository for Box<R> {
    fn save(&mut self, entry: HistoryEntry) -> Result<HistoryEntry> {
        (**self).save(entry)
    }

    fn load(&self) -> Result<Vec<HistoryEntry>> {
        (**self).load()
    }

    fn delete(&mut self, position: i64) -> Result<HistoryEntry> {
        (**self).delete(position)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

/// Converts a user supplied position into a `Vec` index, or reports it.
fn checked_position(position: i64, len: usize) -> Result<usize> {
    match usize::try_from(position) {
        Ok(i) if i < len => Ok(i),
        _ => {
            error!("index {position} is out of bounds, history has {len} entries");
            Err(CalcError::IndexOutOfBounds { position, len })
        }
    }
}

fn renumber(entries: &mut [HistoryEntry]) {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.index = i;
    }
}

/// History kept in a CSV file.
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    /// Creates a store for `path`. No IO happens until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Makes sure the file exists, starts with the header row and ends with a
    /// line break, so the next appended row lands on a line of its own.
    ///
    /// A missing file, or one holding nothing but whitespace, is (re)created
    /// with just the header, together with any missing parent directories.
    pub fn initialize(&self) -> Result<()> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        if !content.trim().is_empty() {
            if !content.ends_with('\n') {
                debug!("terminating last line of {}", self.path.display());
                OpenOptions::new()
                    .append(true)
                    .open(&self.path)?
                    .write_all(b"\n")?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        self.write_all(&[])?;
        info!("initialized {} with headers {:?}", self.path.display(), HEADER);
        Ok(())
    }

    /// Rewrites the whole file: header followed by `entries`.
    ///
    /// The rows go to a temporary file in the same directory which then
    /// replaces the history file, so a failed write leaves the old file intact.
    fn write_all(&self, entries: &[HistoryEntry]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut tmp);
            wtr.write_record(HEADER)?;
            for entry in entries {
                wtr.serialize(entry)?;
            }
            wtr.flush()?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl HistoryRepository for CsvHistoryStore {
    fn save(&mut self, mut entry: HistoryEntry) -> Result<HistoryEntry> {
        self.initialize()?;
        entry.index = self.load()?.len();

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.serialize(&entry)?;
        wtr.flush()?;

        info!("data saved to {}: {:?}", self.path.display(), entry);
        Ok(entry)
    }

    fn load(&self) -> Result<Vec<HistoryEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no history file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(content.as_bytes());
        let headers = rdr.headers()?;
        if !headers.iter().eq(HEADER) {
            return Err(CalcError::MalformedHistory(format!(
                "expected header {:?}, found {:?}",
                HEADER.join(","),
                headers.iter().collect::<Vec<_>>().join(",")
            )));
        }

        let entries = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<HistoryEntry>, _>>()?;
        debug!("loaded {} entries from {}", entries.len(), self.path.display());
        Ok(entries)
    }

    fn delete(&mut self, position: i64) -> Result<HistoryEntry> {
        let mut entries = self.load()?;
        let i = checked_position(position, entries.len())?;

        let removed = entries.remove(i);
        renumber(&mut entries);
        self.write_all(&entries)?;

        info!("record at index {position} deleted from {}", self.path.display());
        Ok(removed)
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("history cleared: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no history file found at {}, nothing to clear", self.path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// History kept in memory for the lifetime of the value.
#[derive(Debug, Default, Clone)]
pub struct MemoryHistoryStore {
    entries: Vec<HistoryEntry>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryRepository for MemoryHistoryStore {
    fn save(&mut self, mut entry: HistoryEntry) -> Result<HistoryEntry> {
        entry.index = self.entries.len();
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn load(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.entries.clone())
    }

    fn delete(&mut self, position: i64) -> Result<HistoryEntry> {
        let i = checked_position(position, self.entries.len())?;
        let removed = self.entries.remove(i);
        renumber(&mut self.entries);
        Ok(removed)
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
