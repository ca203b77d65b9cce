pub mod column;
pub mod normalizer;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info};

use crate::error::Result;
use crate::schema::{Column, ColumnRegistry};
use column::ColumnIndex;

/// Column indexes of one engine. Workers scan without the lock and take it
/// only to commit a finished index.
pub struct IndexSet {
    inner: Mutex<HashMap<String, ColumnIndex>>, // column name -> index
    optimize: bool,
}

impl IndexSet {
    pub fn new(optimize: bool) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            optimize,
        }
    }

    fn commit(&self, idx: ColumnIndex) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(idx.column().to_string(), idx);
    }

    fn scan<T>(&self, column: &Column<T>, rows: &[T]) -> ColumnIndex {
        let t0 = Instant::now();
        let mut idx = ColumnIndex::build(column, rows);
        if self.optimize {
            idx.optimize();
        }
        debug!(
            column = column.name(),
            rows = rows.len(),
            distinct = idx.distinct_count(),
            elapsed_us = t0.elapsed().as_micros() as u64,
            "column index built"
        );
        idx
    }

    /// Build (or replace) the index of one column.
    pub fn build_column<T>(&self, registry: &ColumnRegistry<T>, name: &str, rows: &[T]) -> Result<()> {
        let column = registry.resolve(name)?;
        let idx = self.scan(column, rows);
        self.commit(idx);
        Ok(())
    }

    /// One task per column on `pool` (or the global rayon pool). All names are
    /// resolved before any scan starts, so a bad name leaves the set untouched.
    pub fn build_parallel<T>(
        &self,
        registry: &ColumnRegistry<T>,
        names: &[String],
        rows: &[T],
        pool: Option<&ThreadPool>,
    ) -> Result<()>
    where
        T: Sync,
    {
        let columns = names
            .iter()
            .map(|n| registry.resolve(n))
            .collect::<Result<Vec<_>>>()?;
        let t0 = Instant::now();
        let run = || {
            columns.par_iter().for_each(|c| {
                let idx = self.scan(c, rows);
                self.commit(idx);
            })
        };
        match pool {
            Some(p) => p.install(run),
            None => run(),
        }
        info!(
            columns = columns.len(),
            rows = rows.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "column indexes built"
        );
        Ok(())
    }

    /// Names of every indexed column, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn contains(&mut self, name: &str) -> bool {
        self.map().contains_key(name)
    }

    /// Lock-free view for the owning thread.
    pub fn map(&mut self) -> &HashMap<String, ColumnIndex> {
        self.inner.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&mut self, name: &str) -> Option<&ColumnIndex> {
        self.map().get(name)
    }
}
