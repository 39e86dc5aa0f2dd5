mod array_value;
mod bytes_value;
mod json;
mod map_value;
mod value;
pub mod values;

pub use array_value::ArrayValue;
pub use bytes_value::BytesValue;
pub use json::map_from_json;
pub use map_value::MapValue;
pub use value::{FirestoreValue, ValueKind};
