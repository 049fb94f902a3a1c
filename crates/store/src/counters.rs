//! The print counter store.
//!
//! One file per counter scope, holding the current value as decimal text.
//! Reads are snapshots; increments take the counter's own mutex, so two
//! print jobs bumping different counters never contend, and two jobs on
//! the same counter serialize. The compiler reads counters through
//! [`CounterSource`] and never writes; the print path calls
//! [`CounterStore::commit_print`] exactly once per successful submission.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use zplgrid_core::{CounterScope, CounterSource};

use crate::{StoreError, atomic_write, sanitize_key};

/// Filesystem-backed counters keyed by [`CounterScope`].
#[derive(Debug)]
pub struct CounterStore {
    root: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CounterStore {
    /// Open (and create if needed) a counter store at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn counter_path(&self, scope: &CounterScope) -> PathBuf {
        self.root.join(sanitize_key(&scope.key()))
    }

    fn lock_for(&self, scope: &CounterScope) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("counter lock registry poisoned");
        Arc::clone(locks.entry(scope.key()).or_default())
    }

    fn read_value(path: &Path) -> Result<u64, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => content.trim().parse::<u64>().map_err(|_| {
                StoreError::CorruptCounter {
                    path: path.to_path_buf(),
                }
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Snapshot read of a counter; missing counters read as 0.
    pub fn peek_value(&self, scope: &CounterScope) -> Result<u64, StoreError> {
        Self::read_value(&self.counter_path(scope))
    }

    /// Increment a counter and persist it, returning the new value.
    pub fn commit(&self, scope: &CounterScope) -> Result<u64, StoreError> {
        let lock = self.lock_for(scope);
        let _guard = lock.lock().expect("counter mutex poisoned");

        let path = self.counter_path(scope);
        let next = Self::read_value(&path)? + 1;
        atomic_write(&path, next.to_string().as_bytes())?;
        tracing::debug!(scope = %scope.key(), value = next, "counter commit");
        Ok(next)
    }

    /// Commit every scope a successful print touches: global, daily, and —
    /// when the respective id is known — printer, printer+daily, template,
    /// template+daily.
    pub fn commit_print(
        &self,
        printer_id: Option<&str>,
        template_name: Option<&str>,
        date: NaiveDate,
    ) -> Result<(), StoreError> {
        self.commit(&CounterScope::Global)?;
        self.commit(&CounterScope::Daily { date })?;
        if let Some(printer_id) = printer_id {
            self.commit(&CounterScope::Printer {
                printer_id: printer_id.to_owned(),
            })?;
            self.commit(&CounterScope::PrinterDaily {
                printer_id: printer_id.to_owned(),
                date,
            })?;
        }
        if let Some(template_name) = template_name {
            self.commit(&CounterScope::Template {
                template_name: template_name.to_owned(),
            })?;
            self.commit(&CounterScope::TemplateDaily {
                template_name: template_name.to_owned(),
                date,
            })?;
        }
        Ok(())
    }
}

impl CounterSource for CounterStore {
    fn peek(&self, scope: &CounterScope) -> u64 {
        self.peek_value(scope).unwrap_or(0)
    }
}
