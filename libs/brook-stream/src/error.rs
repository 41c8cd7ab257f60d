/// Stream decoding error.
///
/// `MissingMetadata`, `InvalidChunk`, `ArityMismatch` and `Transport`
/// permanently poison a `PartialResultSource`: the error is cloned back to
/// the caller on every subsequent pull. Partial-result streams are not
/// self-healing; the caller must re-issue the query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StreamError {
    #[error("first partial result carries no metadata")]
    MissingMetadata,

    #[error("invalid chunk: {0}")]
    InvalidChunk(String),

    #[error("arity mismatch: {0}")]
    ArityMismatch(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("value error: {0}")]
    Value(#[from] brook_api::Error),
}
