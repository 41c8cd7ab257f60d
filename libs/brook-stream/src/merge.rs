use brook_api::TypeDesc;
use serde_json::Value as Json;

use crate::error::StreamError;

/// Whether a value of this type may be split across partial result messages.
///
/// Strings and bytes split mid-content; arrays and structs split between or
/// inside their elements. Scalars never split: a chunked bool, int64,
/// float64, timestamp or date is a protocol violation.
pub(crate) fn splittable(ty: &TypeDesc) -> bool {
    matches!(
        ty,
        TypeDesc::String | TypeDesc::Bytes | TypeDesc::Array(_) | TypeDesc::Struct(_)
    )
}

/// Merge a pending incomplete value with the chunk that continues it.
///
/// Pure and total over the closed type set, dispatched on the pending
/// value's declared type rather than the runtime tree kind: int64 elements
/// encode as JSON strings too, and only the declared type tells a split
/// string apart from two adjacent complete integers.
///
/// For list kinds the boundary pair (last element of `pending`, first
/// element of `chunk`) is merged recursively when the boundary element's own
/// type is splittable; otherwise the split fell between elements and the
/// lists simply concatenate.
pub(crate) fn merge_chunk(ty: &TypeDesc, pending: Json, chunk: Json) -> Result<Json, StreamError> {
    match ty {
        TypeDesc::String | TypeDesc::Bytes => match (pending, chunk) {
            (Json::String(mut a), Json::String(b)) => {
                a.push_str(&b);
                Ok(Json::String(a))
            }
            (a, b) => Err(StreamError::InvalidChunk(format!(
                "cannot merge {ty:?} halves {a} and {b}: expected two strings"
            ))),
        },
        TypeDesc::Array(elem) => merge_lists(ty, pending, chunk, |_| Ok(elem.as_ref())),
        TypeDesc::Struct(fields) => merge_lists(ty, pending, chunk, |boundary| {
            fields
                .get(boundary - 1)
                .map(|f| &f.ty)
                .ok_or_else(|| {
                    StreamError::InvalidChunk(format!(
                        "struct chunk has more elements than the {} declared fields",
                        fields.len()
                    ))
                })
        }),
        other => Err(StreamError::InvalidChunk(format!(
            "{other:?} values must never be chunked"
        ))),
    }
}

/// Shared list-merging logic for arrays and structs. `boundary_type` maps
/// the pending list's length to the declared type of its last element.
fn merge_lists<'a>(
    ty: &TypeDesc,
    pending: Json,
    chunk: Json,
    boundary_type: impl FnOnce(usize) -> Result<&'a TypeDesc, StreamError>,
) -> Result<Json, StreamError> {
    let (mut a, mut b) = match (pending, chunk) {
        (Json::Array(a), Json::Array(b)) => (a, b),
        (a, b) => {
            return Err(StreamError::InvalidChunk(format!(
                "cannot merge {ty:?} halves {a} and {b}: expected two lists"
            )));
        }
    };
    if a.is_empty() {
        return Ok(Json::Array(b));
    }
    if b.is_empty() {
        return Ok(Json::Array(a));
    }
    let elem_ty = boundary_type(a.len())?;
    if splittable(elem_ty) {
        let last = a.pop().unwrap_or(Json::Null);
        let first = b.remove(0);
        a.push(merge_chunk(elem_ty, last, first)?);
    }
    if let TypeDesc::Struct(fields) = ty {
        if a.len() + b.len() > fields.len() {
            return Err(StreamError::InvalidChunk(format!(
                "struct chunk merges to {} elements, more than the {} declared fields",
                a.len() + b.len(),
                fields.len()
            )));
        }
    }
    a.append(&mut b);
    Ok(Json::Array(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_api::StructField;
    use serde_json::json;

    fn array_of(elem: TypeDesc) -> TypeDesc {
        TypeDesc::Array(Box::new(elem))
    }

    fn struct_of(fields: Vec<TypeDesc>) -> TypeDesc {
        TypeDesc::Struct(
            fields
                .into_iter()
                .map(|ty| StructField { name: None, ty })
                .collect(),
        )
    }

    #[test]
    fn strings_concatenate() {
        let merged = merge_chunk(&TypeDesc::String, json!("ab"), json!("cd")).unwrap();
        assert_eq!(merged, json!("abcd"));

        // Bytes halves are base64 fragments; they concatenate the same way.
        let merged = merge_chunk(&TypeDesc::Bytes, json!("Zm9v"), json!("YmFy")).unwrap();
        assert_eq!(merged, json!("Zm9vYmFy"));
    }

    #[test]
    fn scalar_chunking_is_a_protocol_violation() {
        for ty in [TypeDesc::Bool, TypeDesc::Int64, TypeDesc::Float64, TypeDesc::Date] {
            let err = merge_chunk(&ty, json!("1"), json!("2")).unwrap_err();
            assert!(matches!(err, StreamError::InvalidChunk(_)), "{ty:?}");
        }
    }

    #[test]
    fn int_array_concatenates_without_boundary_merge() {
        // Int64 encodes as a string, but the declared element type says the
        // boundary elements are two complete integers, not one split string.
        let merged = merge_chunk(
            &array_of(TypeDesc::Int64),
            json!(["1", "2"]),
            json!(["3"]),
        )
        .unwrap();
        assert_eq!(merged, json!(["1", "2", "3"]));
    }

    #[test]
    fn string_array_merges_boundary_elements() {
        let merged = merge_chunk(
            &array_of(TypeDesc::String),
            json!(["Hello", "W"]),
            json!(["orld"]),
        )
        .unwrap();
        assert_eq!(merged, json!(["Hello", "World"]));
    }

    #[test]
    fn nested_arrays_merge_recursively() {
        let ty = array_of(array_of(TypeDesc::String));
        let merged = merge_chunk(&ty, json!([["a", "b"], ["c"]]), json!([["d"], ["e"]])).unwrap();
        assert_eq!(merged, json!([["a", "b"], ["cd"], ["e"]]));
    }

    #[test]
    fn empty_side_yields_the_other() {
        let ty = array_of(TypeDesc::String);
        assert_eq!(
            merge_chunk(&ty, json!([]), json!(["x"])).unwrap(),
            json!(["x"])
        );
        assert_eq!(
            merge_chunk(&ty, json!(["x"]), json!([])).unwrap(),
            json!(["x"])
        );
    }

    #[test]
    fn struct_merges_on_field_type() {
        // Split mid-way through the string field at index 1.
        let ty = struct_of(vec![TypeDesc::Int64, TypeDesc::String]);
        let merged = merge_chunk(&ty, json!(["7", "he"]), json!(["llo"])).unwrap();
        assert_eq!(merged, json!(["7", "hello"]));

        // Split between two int fields: plain concatenation.
        let ty = struct_of(vec![TypeDesc::Int64, TypeDesc::Int64]);
        let merged = merge_chunk(&ty, json!(["1"]), json!(["2"])).unwrap();
        assert_eq!(merged, json!(["1", "2"]));
    }

    #[test]
    fn struct_overflow_is_invalid() {
        let ty = struct_of(vec![TypeDesc::Int64, TypeDesc::Int64]);
        let err = merge_chunk(&ty, json!(["1", "2"]), json!(["3"])).unwrap_err();
        assert!(matches!(err, StreamError::InvalidChunk(_)));
    }

    #[test]
    fn mismatched_tree_kinds_are_invalid() {
        let err = merge_chunk(&TypeDesc::String, json!("a"), json!(["b"])).unwrap_err();
        assert!(matches!(err, StreamError::InvalidChunk(_)));

        let err =
            merge_chunk(&array_of(TypeDesc::String), json!("a"), json!(["b"])).unwrap_err();
        assert!(matches!(err, StreamError::InvalidChunk(_)));
    }
}
