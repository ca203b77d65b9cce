use std::collections::{BTreeMap, HashMap, HashSet};

use croaring::Bitmap;

use crate::error::{FilterError, Result};
use crate::index::column::{ColumnIndex, RowId};
use crate::index::normalizer::normalize;
use crate::value::{CellValue, NormalizedValue};

/// Selected values per column. A column without an entry is unfiltered; an
/// entry is never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    active: BTreeMap<String, HashSet<NormalizedValue>>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes `values` into the selection for `column`. An empty selection
    /// removes the filter. Returns whether the state changed.
    pub fn set<I, V>(&mut self, column: &str, values: I) -> bool
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let selected: HashSet<NormalizedValue> =
            values.into_iter().map(|v| normalize(v.into())).collect();
        if selected.is_empty() {
            return self.remove(column);
        }
        match self.active.get(column) {
            Some(prev) if *prev == selected => false,
            _ => {
                self.active.insert(column.to_string(), selected);
                true
            }
        }
    }

    pub fn remove(&mut self, column: &str) -> bool {
        self.active.remove(column).is_some()
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn get(&self, column: &str) -> Option<&HashSet<NormalizedValue>> {
        self.active.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.active.keys().map(String::as_str)
    }

    /// AND across columns of (OR within a column). Starts from all rows; a
    /// selection matching nothing in its index empties the result.
    pub fn evaluate(
        &self,
        indexes: &HashMap<String, ColumnIndex>,
        row_count: usize,
    ) -> Result<Bitmap> {
        // validate everything first so failure leaves no partial result
        let mut per_column = Vec::with_capacity(self.active.len());
        for (column, selected) in &self.active {
            let idx = indexes
                .get(column)
                .ok_or_else(|| FilterError::configuration(column))?;
            idx.check_rows(row_count)?;
            per_column.push((idx, selected));
        }

        let mut visible = all_rows(row_count);
        for (idx, selected) in per_column {
            if visible.is_empty() {
                break;
            }
            let column_match = idx.union_of(selected);
            visible.and_inplace(&column_match);
        }
        Ok(visible)
    }
}

/// Bitmap with every row of a `row_count` store set.
pub fn all_rows(row_count: usize) -> Bitmap {
    let mut bm = Bitmap::new();
    if row_count > 0 {
        bm.add_range(0..row_count as RowId);
    }
    bm
}
