//! Partial-result decode pipeline for the brook client core: merges values
//! chunked across message boundaries and regroups the flat value stream
//! into typed rows.

pub mod error;
mod merge;
pub mod message;
pub mod source;

pub use error::StreamError;
pub use message::{
    ColumnInfo, PartialResultSet, ResultMetadata, ResultStats, ResultStream, RowCount,
};
pub use source::{PartialResultSource, Row};
