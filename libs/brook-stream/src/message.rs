use brook_api::TypeDesc;
use serde_json::Value as Json;

use crate::error::StreamError;

/// One result column: display name plus wire type.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub ty: TypeDesc,
}

/// Result metadata delivered with the first partial result message.
/// The ordered column list fixes the row arity for the whole stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMetadata {
    pub columns: Vec<ColumnInfo>,
}

/// Row-modification count reported by the terminal message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCount {
    Exact(i64),
    /// Lower bound only; partitioned DML reports these.
    LowerBound(i64),
}

/// Statistics carried by the terminal partial result message.
///
/// `query_plan` and `query_stats` are opaque server payloads, passed through
/// without interpretation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultStats {
    pub row_count: Option<RowCount>,
    pub query_plan: Option<Json>,
    pub query_stats: Option<Json>,
}

/// One unit of a streaming query response.
///
/// `values` is a flat, row-major list of encoded column values; rows may
/// straddle message boundaries. `chunked_value` marks the last value as
/// incomplete; its remainder leads the next message. A message carrying
/// `stats` is the terminal message of the stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialResultSet {
    pub metadata: Option<ResultMetadata>,
    pub values: Vec<Json>,
    pub chunked_value: bool,
    pub stats: Option<ResultStats>,
}

/// Pull-style transport seam delivering partial result messages.
///
/// The implementor owns all I/O, cancellation and deadline concerns; its
/// `next_chunk` is the decode pipeline's only suspension point. `Ok(None)`
/// signals a clean end of stream.
pub trait ResultStream {
    fn next_chunk(&mut self) -> Result<Option<PartialResultSet>, StreamError>;
}
