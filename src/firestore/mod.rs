pub mod collection;
pub mod core;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod value;

pub use self::core::{
    changes_from_snapshot, DocumentChange, DocumentChangeType, ListenOptions, MetadataChanges,
    OnlineState, Query, QueryListener, View, ViewChange, ViewSnapshot,
};
pub use error::{FirestoreError, FirestoreErrorCode, FirestoreResult};
pub use model::{Document, DocumentKey, FieldPath, MaybeDocument, SnapshotVersion, Timestamp};
pub use pipeline::{constant, field, EvaluateResult, EvaluationContext, Expr};
pub use value::FirestoreValue;
