use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value as Json;

use crate::error::Error;
use crate::type_desc::TypeDesc;

/// Database bytes scalar. A wrapper so byte columns stay distinct from
/// strings. Comparison is unsigned bytewise regardless of the platform's
/// native char signedness.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Bytes(data.into())
    }
}

/// Conversion contract between a native Rust type and its wire form.
///
/// `type_desc` gives the wire type shape; `encode`/`decode` convert to and
/// from the JSON-like wire tree. `decode` is handed a non-null tree unless
/// `NULLABLE` is set; only `Option<T>` sets it.
pub trait ValueType: Sized {
    const NULLABLE: bool = false;

    fn type_desc() -> TypeDesc;
    fn encode(&self) -> Json;
    fn decode(tree: &Json) -> Result<Self, Error>;
}

/// Decode one wire tree, applying the null policy for `T`.
pub fn decode_checked<T: ValueType>(tree: &Json) -> Result<T, Error> {
    if tree.is_null() && !T::NULLABLE {
        return Err(Error::null_value("value is null"));
    }
    T::decode(tree)
}

/// Dynamically typed, type-checked container for a single database value.
///
/// A `Value` owns exactly one `(TypeDesc, wire tree)` pair; the pair is the
/// canonical representation: every constructor produces it and every
/// extraction reads it. A null of type `T` is `(desc(T), Null)`: nulls carry
/// type identity, so a null Int64 is not equal to a null String.
///
/// Equality compares descriptor (field names included) and tree, with one
/// exception: a value holding an IEEE-754 NaN anywhere compares unequal to
/// everything, itself included.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Value {
    ty: TypeDesc,
    tree: Json,
}

impl Value {
    pub fn new<T: ValueType>(v: T) -> Value {
        Value { ty: T::type_desc(), tree: v.encode() }
    }

    /// A typed null.
    pub fn null<T: ValueType>() -> Value {
        Value { ty: T::type_desc(), tree: Json::Null }
    }

    pub fn type_desc(&self) -> &TypeDesc {
        &self.ty
    }

    pub fn is_null(&self) -> bool {
        self.tree.is_null()
    }

    /// Type-checked extraction.
    ///
    /// Fails with `TypeMismatch` when the stored descriptor's shape does not
    /// match `T`'s shape. Shape matching is positional: struct field names
    /// are ignored, so a value written with named fields extracts into an
    /// unnamed tuple and vice versa. Fails with `NullValue` when `T` is
    /// non-optional and the tree is null, and with `Decode` when the tree
    /// holds a malformed scalar encoding.
    pub fn get<T: ValueType>(&self) -> Result<T, Error> {
        if !T::type_desc().shape_eq(&self.ty) {
            return Err(Error::type_mismatch(format!(
                "requested {:?}, stored {:?}",
                T::type_desc(),
                self.ty
            )));
        }
        decode_checked(&self.tree)
    }

    /// Lossless conversion to the generic `(descriptor, tree)` wire pair.
    pub fn to_wire(&self) -> (TypeDesc, Json) {
        (self.ty.clone(), self.tree.clone())
    }

    /// Rebuild a `Value` from a wire pair.
    ///
    /// Infallible by design: an inconsistency between descriptor and tree
    /// surfaces as a typed failure at extraction time, not here.
    pub fn from_wire(ty: TypeDesc, tree: Json) -> Value {
        Value { ty, tree }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        if contains_nan(&self.ty, &self.tree) || contains_nan(&other.ty, &other.tree) {
            return false;
        }
        self.ty == other.ty && self.tree == other.tree
    }
}

/// NaN propagates through equality: true if any Float64 leaf holds the NaN
/// token.
fn contains_nan(ty: &TypeDesc, tree: &Json) -> bool {
    match (ty, tree) {
        (TypeDesc::Float64, Json::String(s)) => s == "NaN",
        (TypeDesc::Array(elem), Json::Array(items)) => {
            items.iter().any(|t| contains_nan(elem, t))
        }
        (TypeDesc::Struct(fields), Json::Array(items)) => fields
            .iter()
            .zip(items)
            .any(|(f, t)| contains_nan(&f.ty, t)),
        _ => false,
    }
}

impl ValueType for bool {
    fn type_desc() -> TypeDesc {
        TypeDesc::Bool
    }

    fn encode(&self) -> Json {
        Json::Bool(*self)
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        tree.as_bool()
            .ok_or_else(|| Error::decode("expected bool"))
    }
}

impl ValueType for i64 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Int64
    }

    // Encoded as a decimal string: JSON numbers lose precision past 2^53.
    fn encode(&self) -> Json {
        Json::String(self.to_string())
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        let s = tree
            .as_str()
            .ok_or_else(|| Error::decode("int64 must be encoded as a decimal string"))?;
        s.parse()
            .map_err(|e| Error::decode(format!("invalid int64 {s:?}: {e}")))
    }
}

impl ValueType for f64 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Float64
    }

    fn encode(&self) -> Json {
        if self.is_nan() {
            Json::String("NaN".into())
        } else if *self == f64::INFINITY {
            Json::String("Infinity".into())
        } else if *self == f64::NEG_INFINITY {
            Json::String("-Infinity".into())
        } else {
            // Finite by the guards above, so from_f64 cannot reject it.
            match serde_json::Number::from_f64(*self) {
                Some(n) => Json::Number(n),
                None => Json::String("NaN".into()),
            }
        }
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        match tree {
            Json::Number(n) => n
                .as_f64()
                .ok_or_else(|| Error::decode("float64 out of range")),
            Json::String(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(Error::decode(format!("invalid float64 token {other:?}"))),
            },
            _ => Err(Error::decode("expected float64")),
        }
    }
}

impl ValueType for String {
    fn type_desc() -> TypeDesc {
        TypeDesc::String
    }

    fn encode(&self) -> Json {
        Json::String(self.clone())
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        tree.as_str()
            .map(str::to_owned)
            .ok_or_else(|| Error::decode("expected string"))
    }
}

impl ValueType for Bytes {
    fn type_desc() -> TypeDesc {
        TypeDesc::Bytes
    }

    fn encode(&self) -> Json {
        Json::String(BASE64.encode(&self.0))
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        let s = tree
            .as_str()
            .ok_or_else(|| Error::decode("bytes must be encoded as a base64 string"))?;
        BASE64
            .decode(s)
            .map(Bytes)
            .map_err(|e| Error::decode(format!("invalid base64: {e}")))
    }
}

impl ValueType for DateTime<Utc> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Timestamp
    }

    fn encode(&self) -> Json {
        Json::String(self.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        let s = tree
            .as_str()
            .ok_or_else(|| Error::decode("timestamp must be encoded as an RFC 3339 string"))?;
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::decode(format!("invalid timestamp {s:?}: {e}")))
    }
}

impl ValueType for NaiveDate {
    fn type_desc() -> TypeDesc {
        TypeDesc::Date
    }

    fn encode(&self) -> Json {
        Json::String(self.format("%Y-%m-%d").to_string())
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        let s = tree
            .as_str()
            .ok_or_else(|| Error::decode("date must be encoded as YYYY-MM-DD"))?;
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| Error::decode(format!("invalid date {s:?}: {e}")))
    }
}

impl<T: ValueType> ValueType for Option<T> {
    const NULLABLE: bool = true;

    fn type_desc() -> TypeDesc {
        T::type_desc()
    }

    fn encode(&self) -> Json {
        match self {
            Some(v) => v.encode(),
            None => Json::Null,
        }
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        if tree.is_null() {
            Ok(None)
        } else {
            T::decode(tree).map(Some)
        }
    }
}

impl<T: ValueType> ValueType for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Array(Box::new(T::type_desc()))
    }

    fn encode(&self) -> Json {
        Json::Array(self.iter().map(ValueType::encode).collect())
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        let items = tree
            .as_array()
            .ok_or_else(|| Error::decode("expected array"))?;
        items
            .iter()
            .enumerate()
            .map(|(i, t)| {
                decode_checked(t).map_err(|e| e.with_context(format!("array element {i}")))
            })
            .collect()
    }
}

macro_rules! impl_from_scalar {
    ($($t:ty),* $(,)?) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Value {
                Value::new(v)
            }
        }
    )*};
}

impl_from_scalar!(bool, i64, f64, String, Bytes, DateTime<Utc>, NaiveDate);

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::new(v.to_owned())
    }
}
