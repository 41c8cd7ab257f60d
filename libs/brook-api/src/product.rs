use serde_json::Value as Json;

use crate::error::Error;
use crate::type_desc::{StructField, TypeDesc};
use crate::value::{ValueType, decode_checked};

/// Capability contract letting a fixed-arity heterogeneous product type be
/// encoded as a struct value.
///
/// `Value`'s struct handling is written purely in terms of this trait and
/// the free functions below, so supporting a new product type means
/// implementing the capability, never modifying `Value`. Tuples up to arity
/// eight come with impls; anything else (typically a named record) supplies
/// its own and delegates its [`ValueType`] impl to [`struct_type`],
/// [`struct_tree`] and [`from_struct_tree`].
///
/// Naming policy: a struct type is named only if *every* element index
/// supplies a name. A partially named product is treated as fully unnamed,
/// to avoid inconsistent metadata.
pub trait ProductAccess: Sized {
    /// Fixed number of elements.
    fn element_count() -> usize;

    /// Wire type of the element at `index`.
    fn element_type(index: usize) -> TypeDesc;

    /// Declarative field name of the element at `index`, if any.
    fn element_name(_index: usize) -> Option<&'static str> {
        None
    }

    /// Encoded wire tree of the element at `index`.
    fn element(&self, index: usize) -> Json;

    /// Rebuild the product from one wire tree per element.
    fn assemble(elements: &[Json]) -> Result<Self, Error>;
}

/// Struct descriptor for `P`, applying the all-or-nothing naming policy.
pub fn struct_type<P: ProductAccess>() -> TypeDesc {
    let count = P::element_count();
    let fully_named = count > 0 && (0..count).all(|i| P::element_name(i).is_some());
    TypeDesc::Struct(
        (0..count)
            .map(|i| StructField {
                name: if fully_named {
                    P::element_name(i).map(str::to_owned)
                } else {
                    None
                },
                ty: P::element_type(i),
            })
            .collect(),
    )
}

/// Wire tree for a product value: an ordered list, element order matching
/// the descriptor's field order.
pub fn struct_tree<P: ProductAccess>(p: &P) -> Json {
    Json::Array((0..P::element_count()).map(|i| p.element(i)).collect())
}

/// Decode a struct wire tree back into `P`.
pub fn from_struct_tree<P: ProductAccess>(tree: &Json) -> Result<P, Error> {
    let items = tree
        .as_array()
        .ok_or_else(|| Error::decode("expected struct encoded as a list"))?;
    if items.len() != P::element_count() {
        return Err(Error::decode(format!(
            "struct field count mismatch: expected {}, got {}",
            P::element_count(),
            items.len()
        )));
    }
    P::assemble(items)
}

impl ProductAccess for () {
    fn element_count() -> usize {
        0
    }

    fn element_type(_index: usize) -> TypeDesc {
        unreachable!("unit struct has no elements")
    }

    fn element(&self, _index: usize) -> Json {
        unreachable!("unit struct has no elements")
    }

    fn assemble(_elements: &[Json]) -> Result<Self, Error> {
        Ok(())
    }
}

impl ValueType for () {
    fn type_desc() -> TypeDesc {
        struct_type::<Self>()
    }

    fn encode(&self) -> Json {
        struct_tree(self)
    }

    fn decode(tree: &Json) -> Result<Self, Error> {
        from_struct_tree(tree)
    }
}

macro_rules! impl_product_tuple {
    ($count:expr => $($T:ident $idx:tt),+) => {
        impl<$($T: ValueType),+> ProductAccess for ($($T,)+) {
            fn element_count() -> usize {
                $count
            }

            fn element_type(index: usize) -> TypeDesc {
                match index {
                    $($idx => $T::type_desc(),)+
                    _ => unreachable!("tuple element index out of range"),
                }
            }

            fn element(&self, index: usize) -> Json {
                match index {
                    $($idx => self.$idx.encode(),)+
                    _ => unreachable!("tuple element index out of range"),
                }
            }

            fn assemble(elements: &[Json]) -> Result<Self, Error> {
                Ok(($(decode_checked::<$T>(&elements[$idx])
                    .map_err(|e| e.with_context(format!("struct field {}", $idx)))?,)+))
            }
        }

        impl<$($T: ValueType),+> ValueType for ($($T,)+) {
            fn type_desc() -> TypeDesc {
                struct_type::<Self>()
            }

            fn encode(&self) -> Json {
                struct_tree(self)
            }

            fn decode(tree: &Json) -> Result<Self, Error> {
                from_struct_tree(tree)
            }
        }
    };
}

impl_product_tuple!(1 => A 0);
impl_product_tuple!(2 => A 0, B 1);
impl_product_tuple!(3 => A 0, B 1, C 2);
impl_product_tuple!(4 => A 0, B 1, C 2, D 3);
impl_product_tuple!(5 => A 0, B 1, C 2, D 3, E 4);
impl_product_tuple!(6 => A 0, B 1, C 2, D 3, E 4, F 5);
impl_product_tuple!(7 => A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_product_tuple!(8 => A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
