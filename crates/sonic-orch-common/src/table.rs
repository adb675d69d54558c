//! Buffered key/value tables.
//!
//! A [`Table`] queues `hset`/`del` operations and hands them to its
//! [`DbTable`] backend in one [`Table::flush`]. Reads always go to the
//! backend, so they observe committed state only.
//!
//! Backends:
//! - [`MemoryTable`]: process-local rows, shared between clones. Used by
//!   tests and simulation mode.
//! - `RedisTable` (feature `redis`): SONiC `<TABLE>|<key>` hashes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::consumer::FieldValue;

/// Errors from table backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("Connection to {table} failed: {message}")]
    Connection { table: String, message: String },

    #[error("Command on {table} failed: {message}")]
    Command { table: String, message: String },
}

pub type TableResult<T> = Result<T, TableError>;

/// A queued write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOp {
    /// Set fields on a row, creating the row if needed.
    Set { key: String, fvs: Vec<FieldValue> },
    /// Delete the whole row.
    Del { key: String },
}

impl TableOp {
    pub fn key(&self) -> &str {
        match self {
            TableOp::Set { key, .. } | TableOp::Del { key } => key,
        }
    }
}

/// Storage behind a [`Table`].
pub trait DbTable: Send {
    fn table_name(&self) -> &str;

    /// Keys of all committed rows.
    fn get_keys(&mut self) -> TableResult<Vec<String>>;

    /// Committed value of one field.
    fn hget(&mut self, key: &str, field: &str) -> TableResult<Option<String>>;

    /// Applies `ops` in order as a single commit.
    fn apply(&mut self, ops: &[TableOp]) -> TableResult<()>;
}

/// Table with write batching.
pub struct Table {
    backend: Box<dyn DbTable>,
    pending: Vec<TableOp>,
}

impl Table {
    pub fn new(backend: impl DbTable + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            pending: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.backend.table_name()
    }

    /// Queues a field write.
    pub fn hset(&mut self, key: &str, field: &str, value: &str) {
        if let Some(TableOp::Set { key: last, fvs }) = self.pending.last_mut() {
            if last == key {
                fvs.push((field.to_string(), value.to_string()));
                return;
            }
        }
        self.pending.push(TableOp::Set {
            key: key.to_string(),
            fvs: vec![(field.to_string(), value.to_string())],
        });
    }

    /// Queues a row deletion.
    pub fn del(&mut self, key: &str) {
        self.pending.push(TableOp::Del {
            key: key.to_string(),
        });
    }

    pub fn hget(&mut self, key: &str, field: &str) -> TableResult<Option<String>> {
        self.backend.hget(key, field)
    }

    pub fn get_keys(&mut self) -> TableResult<Vec<String>> {
        self.backend.get_keys()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Commits queued writes and returns how many were sent.
    ///
    /// The queue is emptied whether or not the backend accepts it. An
    /// empty queue never reaches the backend.
    pub fn flush(&mut self) -> TableResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let ops = std::mem::take(&mut self.pending);
        self.backend.apply(&ops)?;
        Ok(ops.len())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: BTreeMap<String, BTreeMap<String, String>>,
    commits: usize,
    fail_commits: bool,
}

/// In-memory backend.
///
/// Clones share rows, so a test can keep one clone for inspection while the
/// [`Table`] owns another.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    name: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes a row directly, bypassing batching.
    pub fn insert_row(&self, key: &str, fvs: &[(&str, &str)]) {
        let mut state = self.lock();
        let row = state.rows.entry(key.to_string()).or_default();
        for (field, value) in fvs {
            row.insert(field.to_string(), value.to_string());
        }
    }

    pub fn row(&self, key: &str) -> Option<BTreeMap<String, String>> {
        self.lock().rows.get(key).cloned()
    }

    pub fn field(&self, key: &str, field: &str) -> Option<String> {
        self.lock().rows.get(key).and_then(|row| row.get(field).cloned())
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().rows.keys().cloned().collect()
    }

    /// Number of non-empty commits applied so far.
    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    /// Makes every following commit fail until reset.
    pub fn set_fail_commits(&self, fail: bool) {
        self.lock().fail_commits = fail;
    }
}

impl DbTable for MemoryTable {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn get_keys(&mut self) -> TableResult<Vec<String>> {
        Ok(self.keys())
    }

    fn hget(&mut self, key: &str, field: &str) -> TableResult<Option<String>> {
        Ok(self.field(key, field))
    }

    fn apply(&mut self, ops: &[TableOp]) -> TableResult<()> {
        let mut state = self.lock();
        if state.fail_commits {
            return Err(TableError::Command {
                table: self.name.clone(),
                message: "commit rejected".to_string(),
            });
        }
        for op in ops {
            match op {
                TableOp::Set { key, fvs } => {
                    let row = state.rows.entry(key.clone()).or_default();
                    for (field, value) in fvs {
                        row.insert(field.clone(), value.clone());
                    }
                }
                TableOp::Del { key } => {
                    state.rows.remove(key);
                }
            }
        }
        state.commits += 1;
        Ok(())
    }
}
