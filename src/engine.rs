use std::cmp::Ordering;
use std::time::Instant;

use croaring::Bitmap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::distinct::{distinct_values, DistinctValue};
use crate::error::{FilterError, Result};
use crate::filter::{all_rows, FilterState};
use crate::index::column::{ColumnIndex, RowId};
use crate::index::normalizer::{normalize, sort_key};
use crate::index::IndexSet;
use crate::schema::ColumnRegistry;
use crate::value::{CellValue, NormalizedValue};

/// Owns a row store, its column indexes and the active filters.
///
/// All mutation goes through `&mut self`; the only parallelism is the
/// per-column fan-out inside [`FilterEngine::build_all_indexes_parallel`].
pub struct FilterEngine<T> {
    rows: Vec<T>,
    registry: ColumnRegistry<T>,
    indexes: IndexSet,
    filters: FilterState,
    visible: Bitmap,        // master visibility
    visible_rows: Vec<RowId>, // materialized from `visible`
    recomputes: u64,
    pool: Option<ThreadPool>,
    config: EngineConfig,
}

impl<T: Sync> FilterEngine<T> {
    pub fn new(rows: Vec<T>, registry: ColumnRegistry<T>) -> Result<Self> {
        Self::with_config(rows, registry, EngineConfig::default())
    }

    pub fn with_config(
        rows: Vec<T>,
        registry: ColumnRegistry<T>,
        config: EngineConfig,
    ) -> Result<Self> {
        check_row_limit(rows.len())?;
        let pool = match config.parallelism {
            0 => None,
            n => match ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(p) => Some(p),
                Err(err) => {
                    warn!(threads = n, error = %err, "index pool unavailable, using global pool");
                    None
                }
            },
        };
        let n = rows.len();
        Ok(Self {
            rows,
            registry,
            indexes: IndexSet::new(config.optimize_bitmaps),
            filters: FilterState::new(),
            visible: all_rows(n),
            visible_rows: (0..n as RowId).collect(),
            recomputes: 0,
            pool,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ColumnRegistry<T> {
        &self.registry
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    // ---- index building ----

    pub fn build_index(&mut self, column: &str) -> Result<()> {
        self.indexes.build_column(&self.registry, column, &self.rows)
    }

    pub fn build_all_indexes_parallel<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<()> {
        let names: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self.indexes
            .build_parallel(&self.registry, &names, &self.rows, self.pool.as_ref())
    }

    /// Re-index every column indexed so far against the current row order.
    pub fn rebuild_all_indexes(&mut self) -> Result<()> {
        let names = self.indexes.names();
        if names.is_empty() {
            return Ok(());
        }
        self.build_all_indexes_parallel(names.as_slice())
    }

    pub fn indexed_columns(&self) -> Vec<String> {
        self.indexes.names()
    }

    /// Read-only snapshot of one column's index.
    pub fn column_index(&mut self, column: &str) -> Option<ColumnIndex> {
        self.indexes.get(column).cloned()
    }

    fn ensure_index(&mut self, column: &str) -> Result<()> {
        if !self.indexes.contains(column) {
            self.build_index(column)?;
        }
        Ok(())
    }

    // ---- filters ----

    /// Select `values` for `column` (OR within the column). An empty selection
    /// is the same as [`FilterEngine::remove_filter`].
    pub fn set_filter<I, V>(&mut self, column: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.registry.resolve(column)?;
        self.ensure_index(column)?;
        let mut next = self.filters.clone();
        if !next.set(column, values) {
            return Ok(());
        }
        self.recompute(next)
    }

    /// Like [`FilterEngine::set_filter`], but selects values by their display
    /// string (as listed by `distinct_values`), so typed cells can be picked
    /// from text input. A string matching no indexed value is kept as text
    /// and selects nothing.
    pub fn set_filter_display<S: AsRef<str>>(&mut self, column: &str, displays: &[S]) -> Result<()> {
        self.registry.resolve(column)?;
        self.ensure_index(column)?;
        let idx = self
            .indexes
            .get(column)
            .ok_or_else(|| FilterError::configuration(column))?;

        let mut selected: Vec<NormalizedValue> = Vec::with_capacity(displays.len());
        for d in displays {
            let d = d.as_ref();
            let before = selected.len();
            selected.extend(idx.iter().filter(|(v, _)| v.display() == d).map(|(v, _)| v.clone()));
            if selected.len() == before {
                selected.push(NormalizedValue::Value(CellValue::from(d)));
            }
        }
        self.set_filter(column, selected)
    }

    /// Drops the filter on `column`; nothing is recomputed if there was none.
    pub fn remove_filter(&mut self, column: &str) -> Result<()> {
        if self.filters.get(column).is_none() {
            return Ok(());
        }
        let mut next = self.filters.clone();
        next.remove(column);
        self.recompute(next)
    }

    pub fn clear_all_filters(&mut self) {
        self.filters.clear();
        self.show_all();
    }

    pub fn active_filter(&self, column: &str) -> Option<Vec<NormalizedValue>> {
        self.filters.get(column).map(|s| {
            let mut v: Vec<NormalizedValue> = s.iter().cloned().collect();
            v.sort_by(|a, b| a.natural_cmp(b));
            v
        })
    }

    pub fn active_columns(&self) -> Vec<String> {
        self.filters.columns().map(str::to_string).collect()
    }

    pub fn is_filtered(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Number of full visibility recomputes performed so far.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    fn recompute(&mut self, next: FilterState) -> Result<()> {
        let t0 = Instant::now();
        let visible = next.evaluate(self.indexes.map(), self.rows.len())?;
        self.filters = next;
        self.visible_rows = visible.iter().collect();
        self.visible = visible;
        self.recomputes += 1;
        debug!(
            filters = self.filters.len(),
            visible = self.visible_rows.len(),
            rows = self.rows.len(),
            elapsed_us = t0.elapsed().as_micros() as u64,
            "visibility recomputed"
        );
        Ok(())
    }

    fn show_all(&mut self) {
        let n = self.rows.len();
        self.visible = all_rows(n);
        self.visible_rows = (0..n as RowId).collect();
    }

    fn refresh(&mut self) -> Result<()> {
        if self.filters.is_empty() {
            self.show_all();
            Ok(())
        } else {
            let current = self.filters.clone();
            self.recompute(current)
        }
    }

    // ---- results ----

    /// Rows passing every active filter, in store order.
    pub fn filtered_data(&self) -> Vec<&T> {
        self.visible_rows
            .iter()
            .map(|&i| &self.rows[i as usize])
            .collect()
    }

    pub fn filtered_owned(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.filtered_data().into_iter().cloned().collect()
    }

    pub fn filtered_positions(&self) -> &[RowId] {
        &self.visible_rows
    }

    pub fn visible_count(&self) -> usize {
        self.visible_rows.len()
    }

    /// Copy of the master visibility bitmap.
    pub fn visibility(&self) -> Bitmap {
        self.visible.clone()
    }

    /// Selectable values of `column`. With `only_visible`, values without a
    /// visible row are left out; `row_count` is always the full-store count.
    pub fn distinct_values(&mut self, column: &str, only_visible: bool) -> Result<Vec<DistinctValue>> {
        let order = self.registry.resolve(column)?.order();
        self.ensure_index(column)?;
        let visible = if only_visible && !self.filters.is_empty() {
            Some(&self.visible)
        } else {
            None
        };
        let idx = self
            .indexes
            .get(column)
            .ok_or_else(|| FilterError::configuration(column))?;
        idx.check_rows(self.rows.len())?;
        Ok(distinct_values(idx, visible, order))
    }

    // ---- row store ----

    /// Stable sort by `column`: empty first, text case-insensitively, other
    /// values by typed order. Descending reverses the comparison. Indexes and
    /// visibility are rebuilt before returning.
    pub fn sort_by(&mut self, column: &str, ascending: bool) -> Result<()> {
        let col = self.registry.resolve(column)?.clone();
        let t0 = Instant::now();

        let mut keyed: Vec<(SortKey, T)> = std::mem::take(&mut self.rows)
            .into_iter()
            .map(|r| (SortKey::new(col.get(&r)), r))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| {
            let ord = a.cmp(b);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        self.rows = keyed.into_iter().map(|(_, r)| r).collect();

        self.rebuild_all_indexes()?;
        self.refresh()?;
        info!(
            column,
            ascending,
            rows = self.rows.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "rows sorted"
        );
        Ok(())
    }

    /// Swap in a new row store. Indexed columns are re-indexed and the active
    /// filters re-applied to the new rows.
    pub fn replace_data(&mut self, rows: Vec<T>) -> Result<()> {
        check_row_limit(rows.len())?;
        self.rows = rows;
        self.rebuild_all_indexes()?;
        self.refresh()
    }
}

fn check_row_limit(rows: usize) -> Result<()> {
    if rows > RowId::MAX as usize {
        return Err(FilterError::RowLimit { rows });
    }
    Ok(())
}

struct SortKey {
    value: NormalizedValue,
    folded: Option<String>, // case-folded text
}

impl SortKey {
    fn new(cell: CellValue) -> Self {
        let value = normalize(cell);
        let folded = match &value {
            NormalizedValue::Value(CellValue::Text(s)) => Some(sort_key(s)),
            _ => None,
        };
        Self { value, folded }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.folded, &other.folded) {
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.value.natural_cmp(&other.value)),
            _ => self.value.natural_cmp(&other.value),
        }
    }
}
