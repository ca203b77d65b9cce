use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{FilterError, Result};
use crate::value::CellValue;

type Accessor<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;

/// How distinct values of a column are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnOrder {
    /// Case-insensitive by display string.
    #[default]
    Lexical,
    /// By typed value (numbers numerically, booleans false < true).
    Natural,
}

/// A named, pure projection of a row onto one cell.
pub struct Column<T> {
    name: String,
    order: ColumnOrder,
    accessor: Accessor<T>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            order: self.order,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<T> Column<T> {
    pub fn new<F>(name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            order: ColumnOrder::Lexical,
            accessor: Arc::new(accessor),
        }
    }

    pub fn with_order(mut self, order: ColumnOrder) -> Self {
        self.order = order;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> ColumnOrder {
        self.order
    }

    #[inline]
    pub fn get(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }
}

/// Column name -> accessor map, fixed for the lifetime of an engine.
pub struct ColumnRegistry<T> {
    columns: HashMap<String, Column<T>>,
}

impl<T> Default for ColumnRegistry<T> {
    fn default() -> Self {
        Self {
            columns: HashMap::new(),
        }
    }
}

impl<T> Clone for ColumnRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            columns: self.columns.clone(),
        }
    }
}

impl<T> ColumnRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a column; a later registration under the same name wins.
    pub fn register(&mut self, column: Column<T>) -> &mut Self {
        self.columns.insert(column.name.clone(), column);
        self
    }

    pub fn with(mut self, column: Column<T>) -> Self {
        self.register(column);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<&Column<T>> {
        self.columns
            .get(name)
            .ok_or_else(|| FilterError::configuration(name))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.columns.keys().cloned().collect();
        names.sort();
        names
    }
}

impl ColumnRegistry<Value> {
    /// One column per top-level JSON field; `natural` lists the fields whose
    /// distinct values are ordered by typed value.
    pub fn json_fields<S: AsRef<str>>(fields: &[S], natural: &[S]) -> Self {
        let mut reg = Self::new();
        for f in fields {
            let key = f.as_ref().to_string();
            let order = if natural.iter().any(|n| n.as_ref() == key) {
                ColumnOrder::Natural
            } else {
                ColumnOrder::Lexical
            };
            let field = key.clone();
            reg.register(
                Column::new(key, move |row: &Value| CellValue::from_json(row.get(&field)))
                    .with_order(order),
            );
        }
        reg
    }
}
