use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::Value;

/// Format version of the opaque partition string. Bump only together with a
/// decoder that still accepts every previous version.
const PARTITION_FORMAT_VERSION: u32 = 1;

/// A single slice of a partitioned read: the server-issued partition token
/// plus the row-filter parameters the query must be re-issued with.
///
/// Partitions are created on one machine, serialized with
/// [`serialize_partition`], transmitted or persisted as an opaque string,
/// and reconstructed elsewhere with [`deserialize_partition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPartition {
    pub partition_token: String,
    pub table: String,
    pub columns: Vec<String>,
    pub filter_params: BTreeMap<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    partition: QueryPartition,
}

/// Serialize a partition into an opaque string, stable byte-for-byte across
/// library versions.
pub fn serialize_partition(partition: &QueryPartition) -> Result<String, Error> {
    let envelope = Envelope {
        version: PARTITION_FORMAT_VERSION,
        partition: partition.clone(),
    };
    let json = serde_json::to_vec(&envelope)
        .map_err(|e| Error::deserialization(format!("partition encoding failed: {e}")))?;
    Ok(BASE64.encode(json))
}

/// Reconstruct a partition from an opaque string.
///
/// Corrupt or version-incompatible input fails with a `Deserialization`
/// error; it is never misread as a different valid partition.
pub fn deserialize_partition(serialized: &str) -> Result<QueryPartition, Error> {
    let json = BASE64
        .decode(serialized)
        .map_err(|e| Error::deserialization(format!("invalid partition encoding: {e}")))?;
    let envelope: Envelope = serde_json::from_slice(&json)
        .map_err(|e| Error::deserialization(format!("invalid partition payload: {e}")))?;
    if envelope.version != PARTITION_FORMAT_VERSION {
        return Err(Error::deserialization(format!(
            "unsupported partition format version {}",
            envelope.version
        )));
    }
    Ok(envelope.partition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use base64::Engine as _;

    fn sample() -> QueryPartition {
        let mut params = BTreeMap::new();
        params.insert("min_id".to_string(), Value::new(42i64));
        params.insert("prefix".to_string(), Value::new("abc".to_string()));
        params.insert("flags".to_string(), Value::new((true, 7i64)));
        QueryPartition {
            partition_token: "token-0042".to_string(),
            table: "Users".to_string(),
            columns: vec!["id".to_string(), "name".to_string()],
            filter_params: params,
        }
    }

    #[test]
    fn round_trip() {
        let p = sample();
        let s = serialize_partition(&p).unwrap();
        assert_eq!(deserialize_partition(&s).unwrap(), p);
        // Serialization is deterministic.
        assert_eq!(s, serialize_partition(&p).unwrap());
    }

    #[test]
    fn corrupt_input_fails() {
        for bad in ["", "!!!not base64!!!", "AAAA", "e30="] {
            let err = deserialize_partition(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Deserialization, "input {bad:?}");
        }
    }

    #[test]
    fn truncated_payload_fails() {
        let s = serialize_partition(&sample()).unwrap();
        let truncated = &s[..s.len() / 2];
        assert!(deserialize_partition(truncated).is_err());
    }

    #[test]
    fn unknown_version_fails() {
        let json = serde_json::to_vec(&serde_json::json!({
            "version": 99,
            "partition": {
                "partition_token": "t",
                "table": "T",
                "columns": [],
                "filter_params": {},
            },
        }))
        .unwrap();
        let s = base64::engine::general_purpose::STANDARD.encode(json);
        let err = deserialize_partition(&s).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Deserialization);
        assert!(err.message.contains("version"));
    }
}
