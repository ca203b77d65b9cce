//! Bitmap-indexed filtering over an in-memory row store.
//!
//! Each indexed column maps its normalized values to the bitmap of row
//! positions holding them. Active filters are OR'd within a column and AND'd
//! across columns into one master visibility bitmap.

pub mod config;
pub mod distinct;
pub mod engine;
pub mod error;
pub mod filter;
pub mod index;
pub mod schema;
pub mod value;

pub use config::EngineConfig;
pub use distinct::DistinctValue;
pub use engine::FilterEngine;
pub use error::{FilterError, Result};
pub use schema::{Column, ColumnOrder, ColumnRegistry};
pub use value::{CellValue, NormalizedValue, EMPTY_DISPLAY};
