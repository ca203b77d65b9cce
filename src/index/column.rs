use croaring::Bitmap;
use std::collections::HashMap;

use crate::error::{FilterError, Result};
use crate::index::normalizer::normalize;
use crate::schema::Column;
use crate::value::NormalizedValue;

pub type RowId = u32;

/// Rows holding one value of a column.
#[derive(Debug, Clone)]
pub struct Posting {
    pub rows: Bitmap,
    pub count: u64,
}

/// value -> rows for one column. Every row of the store sits in exactly one
/// posting.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    column: String,
    row_count: usize,
    postings: HashMap<NormalizedValue, Posting>, // value -> rows + cached popcount
}

impl ColumnIndex {
    /// Single pass over `rows`. Caller guarantees `rows.len() <= u32::MAX`.
    pub fn build<T>(column: &Column<T>, rows: &[T]) -> Self {
        let mut postings: HashMap<NormalizedValue, Posting> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            let key = normalize(column.get(row));
            let p = postings.entry(key).or_insert_with(|| Posting {
                rows: Bitmap::new(),
                count: 0,
            });
            p.rows.add(i as RowId);
            p.count += 1;
        }
        Self {
            column: column.name().to_string(),
            row_count: rows.len(),
            postings,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn distinct_count(&self) -> usize {
        self.postings.len()
    }

    pub fn get(&self, value: &NormalizedValue) -> Option<&Posting> {
        self.postings.get(value)
    }

    pub fn count(&self, value: &NormalizedValue) -> u64 {
        self.postings.get(value).map(|p| p.count).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NormalizedValue, &Posting)> {
        self.postings.iter()
    }

    /// Run-length compress every posting; sorted columns become a handful of runs.
    pub fn optimize(&mut self) {
        for p in self.postings.values_mut() {
            p.rows.run_optimize();
        }
    }

    /// Fails if this index was built over a row store of a different size.
    pub fn check_rows(&self, store_rows: usize) -> Result<()> {
        if self.row_count != store_rows {
            return Err(FilterError::InvariantViolation {
                column: self.column.clone(),
                index_rows: self.row_count,
                store_rows,
            });
        }
        Ok(())
    }

    /// OR of the postings for `values`; values absent from the index add nothing.
    pub fn union_of<'a, I>(&self, values: I) -> Bitmap
    where
        I: IntoIterator<Item = &'a NormalizedValue>,
    {
        let mut acc = Bitmap::new();
        for v in values {
            if let Some(p) = self.postings.get(v) {
                acc.or_inplace(&p.rows);
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    fn type_column() -> Column<Option<&'static str>> {
        Column::new("Type", |r: &Option<&'static str>| CellValue::from(*r))
    }

    fn key(s: &str) -> NormalizedValue {
        NormalizedValue::Value(CellValue::from(s))
    }

    #[test]
    fn builds_postings_and_counts() {
        let rows = vec![
            Some("File"),
            Some("File"),
            Some("Folder"),
            None,
            Some("  "),
            Some(""),
        ];
        let idx = ColumnIndex::build(&type_column(), &rows);
        assert_eq!(idx.row_count(), 6);
        assert_eq!(idx.distinct_count(), 3);
        assert_eq!(idx.count(&key("File")), 2);
        assert_eq!(idx.count(&key("Folder")), 1);
        assert_eq!(idx.count(&NormalizedValue::Empty), 3);
        assert_eq!(
            idx.get(&NormalizedValue::Empty).unwrap().rows.to_vec(),
            vec![3, 4, 5]
        );
        for (_, p) in idx.iter() {
            assert_eq!(p.rows.cardinality(), p.count);
        }
    }

    #[test]
    fn union_skips_unknown_values() {
        let rows = vec![Some("a"), Some("b"), Some("c")];
        let idx = ColumnIndex::build(&type_column(), &rows);
        let bm = idx.union_of(&[key("a"), key("zzz"), key("c")]);
        assert_eq!(bm.to_vec(), vec![0, 2]);
        assert!(idx.union_of(&[key("zzz")]).is_empty());
    }

    #[test]
    fn empty_store() {
        let idx = ColumnIndex::build(&type_column(), &[]);
        assert_eq!(idx.distinct_count(), 0);
        assert!(idx.check_rows(0).is_ok());
    }

    #[test]
    fn row_count_mismatch_is_reported() {
        let idx = ColumnIndex::build(&type_column(), &[Some("a")]);
        assert_eq!(
            idx.check_rows(2),
            Err(FilterError::InvariantViolation {
                column: "Type".into(),
                index_rows: 1,
                store_rows: 2,
            })
        );
    }
}
