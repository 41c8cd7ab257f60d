use std::fmt;

/// Error kind for value-layer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Extraction requested a type whose shape does not match the stored descriptor.
    TypeMismatch,
    /// Non-optional extraction from a typed null.
    NullValue,
    /// Malformed wire scalar (non-base64 bytes, unparsable int64 string, etc.).
    Decode,
    /// Corrupt or version-incompatible opaque partition string.
    Deserialization,
}

/// Value-layer error returned by extraction, decoding, and partition
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::TypeMismatch, message: msg.into() }
    }

    pub fn null_value(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::NullValue, message: msg.into() }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Decode, message: msg.into() }
    }

    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Deserialization, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}
