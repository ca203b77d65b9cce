use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Column name has no registered accessor.
    #[error("column `{column}` has no registered accessor")]
    Configuration { column: String },

    /// An index was built over a different row store than the one queried.
    #[error(
        "index for column `{column}` covers {index_rows} rows, row store has {store_rows}"
    )]
    InvariantViolation {
        column: String,
        index_rows: usize,
        store_rows: usize,
    },

    /// Row positions are u32; larger stores cannot be addressed.
    #[error("row store of {rows} rows exceeds the addressable limit")]
    RowLimit { rows: usize },
}

impl FilterError {
    pub fn configuration(column: &str) -> Self {
        Self::Configuration {
            column: column.to_string(),
        }
    }
}
