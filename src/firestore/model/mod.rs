mod document;
mod document_key;
mod document_set;
mod field_path;
mod geo_point;
mod resource_path;
mod snapshot_version;
mod timestamp;

pub use document::{Document, DocumentState, MaybeDocument};
pub use document_key::DocumentKey;
pub use document_set::DocumentSet;
pub use field_path::{FieldPath, IntoFieldPath};
pub use geo_point::GeoPoint;
pub use resource_path::ResourcePath;
pub use snapshot_version::SnapshotVersion;
pub use timestamp::Timestamp;
