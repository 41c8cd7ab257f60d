//! Value model for the brook client core: the wire type descriptor, the
//! dynamically typed `Value` container, the `ProductAccess` reflection
//! bridge for struct encoding, and the opaque partition serialization.

pub mod error;
pub mod partition;
pub mod product;
pub mod type_desc;
pub mod value;

pub use error::{Error, ErrorKind};
pub use partition::{QueryPartition, deserialize_partition, serialize_partition};
pub use product::{ProductAccess, from_struct_tree, struct_tree, struct_type};
pub use type_desc::{StructField, TypeDesc};
pub use value::{Bytes, Value, ValueType, decode_checked};
