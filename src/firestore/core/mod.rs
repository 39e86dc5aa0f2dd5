//! Query matching, incremental view maintenance, and listener event filtering.

mod document_change;
mod online_state;
pub mod query;
mod query_listener;
mod target_change;
mod view;
mod view_snapshot;

pub use document_change::{
    changes_from_snapshot, DocumentChange, DocumentChangeType, MetadataChanges,
};
pub use online_state::OnlineState;
pub use query::{
    field_filter, Direction, FieldFilter, FilterOperator, LimitType, OrderBy, Query,
};
pub use query_listener::{ListenOptions, QueryListener, SnapshotCallback};
pub use target_change::TargetChange;
pub use view::{
    DocumentChanges, LimboDocumentChange, LimboDocumentChangeType, View, ViewChange,
};
pub use view_snapshot::{
    DocumentViewChange, DocumentViewChangeSet, DocumentViewChangeType, SnapshotMetadata,
    SyncState, ViewSnapshot,
};
