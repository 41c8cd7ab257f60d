/// Wire type descriptor: the recursive type metadata describing the shape
/// of a column value independent of its data.
///
/// Scalars encode by kind alone; `Array` carries its element type and
/// `Struct` an ordered field list. Field names are descriptive metadata:
/// they are preserved through wire round-trips and participate in derived
/// equality, but extraction matches on shape only (see [`shape_eq`]).
///
/// [`shape_eq`]: TypeDesc::shape_eq
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TypeDesc {
    Bool,
    Int64,
    Float64,
    String,
    Bytes,
    Timestamp,
    Date,
    Array(Box<TypeDesc>),
    Struct(Vec<StructField>),
}

/// A single struct field: optional declarative name plus element type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StructField {
    pub name: Option<String>,
    pub ty: TypeDesc,
}

impl TypeDesc {
    /// Structural shape comparison, ignoring struct field names.
    ///
    /// This is the matching relation used by `Value::get`: a value written
    /// with named fields must be extractable into an unnamed tuple of the
    /// same positional shape, and vice versa.
    pub fn shape_eq(&self, other: &TypeDesc) -> bool {
        match (self, other) {
            (TypeDesc::Array(a), TypeDesc::Array(b)) => a.shape_eq(b),
            (TypeDesc::Struct(a), TypeDesc::Struct(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.ty.shape_eq(&y.ty))
            }
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}
