use std::collections::BTreeMap;

use crate::firestore::collection::DocumentKeySet;
use crate::firestore::core::Query;
use crate::firestore::model::{Document, DocumentKey, DocumentSet};
use crate::util::hard_assert;

/// Kinds of per-document changes inside a view. Variants are listed in the order a view emits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentViewChangeType {
    Removed,
    Added,
    Modified,
    /// Same data, but the pending-write state changed.
    Metadata,
}

impl DocumentViewChangeType {
    /// Sort rank used when emitting changes: removals first, then additions, then the rest.
    pub(crate) fn emit_order(&self) -> u8 {
        match self {
            DocumentViewChangeType::Removed => 0,
            DocumentViewChangeType::Added => 1,
            DocumentViewChangeType::Modified | DocumentViewChangeType::Metadata => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DocumentViewChange {
    change_type: DocumentViewChangeType,
    document: Document,
}

impl DocumentViewChange {
    pub fn new(change_type: DocumentViewChangeType, document: Document) -> Self {
        Self {
            change_type,
            document,
        }
    }

    pub fn change_type(&self) -> DocumentViewChangeType {
        self.change_type
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

/// Accumulates at most one change per key, folding repeated changes together.
#[derive(Clone, Debug, Default)]
pub struct DocumentViewChangeSet {
    changes: BTreeMap<DocumentKey, DocumentViewChange>,
}

impl DocumentViewChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_change(&mut self, change: DocumentViewChange) {
        use DocumentViewChangeType::{Added, Metadata, Modified, Removed};

        let key = change.document().key().clone();
        let Some(old) = self.changes.get(&key) else {
            self.changes.insert(key, change);
            return;
        };

        let merged = match (old.change_type(), change.change_type()) {
            (Metadata, new_type) if new_type != Added => Some(change),
            (old_type, Metadata) if old_type != Removed => {
                Some(DocumentViewChange::new(old_type, change.document))
            }
            (Modified, Modified) => Some(DocumentViewChange::new(Modified, change.document)),
            (Added, Modified) => Some(DocumentViewChange::new(Added, change.document)),
            (Added, Removed) => None,
            (Modified, Removed) => Some(DocumentViewChange::new(Removed, old.document.clone())),
            (Removed, Added) => Some(DocumentViewChange::new(Modified, change.document)),
            (old_type, new_type) => {
                hard_assert(
                    false,
                    format!("Unsupported combination of changes {new_type:?} after {old_type:?}"),
                );
                return;
            }
        };

        match merged {
            Some(merged) => {
                self.changes.insert(key, merged);
            }
            None => {
                self.changes.remove(&key);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The folded changes in key order.
    pub fn changes(&self) -> Vec<DocumentViewChange> {
        self.changes.values().cloned().collect()
    }
}

/// Whether a view has caught up with the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SyncState {
    #[default]
    None,
    Local,
    Synced,
}

/// An immutable picture of a query's results plus what changed since the previous picture.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewSnapshot {
    query: Query,
    documents: DocumentSet,
    old_documents: DocumentSet,
    changes: Vec<DocumentViewChange>,
    from_cache: bool,
    mutated_keys: DocumentKeySet,
    did_sync_state_change: bool,
    excludes_metadata_changes: bool,
}

impl ViewSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        query: Query,
        documents: DocumentSet,
        old_documents: DocumentSet,
        changes: Vec<DocumentViewChange>,
        from_cache: bool,
        mutated_keys: DocumentKeySet,
        did_sync_state_change: bool,
        excludes_metadata_changes: bool,
    ) -> Self {
        Self {
            query,
            documents,
            old_documents,
            changes,
            from_cache,
            mutated_keys,
            did_sync_state_change,
            excludes_metadata_changes,
        }
    }

    /// A first snapshot in which every current document shows up as added.
    pub fn from_initial_documents(
        query: Query,
        documents: DocumentSet,
        mutated_keys: DocumentKeySet,
        from_cache: bool,
        excludes_metadata_changes: bool,
    ) -> Self {
        let changes = documents
            .iter()
            .map(|document| DocumentViewChange::new(DocumentViewChangeType::Added, document.clone()))
            .collect();
        let old_documents = DocumentSet::new(query.comparator());
        Self::new(
            query,
            documents,
            old_documents,
            changes,
            from_cache,
            mutated_keys,
            true,
            excludes_metadata_changes,
        )
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn documents(&self) -> &DocumentSet {
        &self.documents
    }

    pub fn old_documents(&self) -> &DocumentSet {
        &self.old_documents
    }

    pub fn changes(&self) -> &[DocumentViewChange] {
        &self.changes
    }

    pub fn is_from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn mutated_keys(&self) -> &DocumentKeySet {
        &self.mutated_keys
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.mutated_keys.is_empty()
    }

    pub fn did_sync_state_change(&self) -> bool {
        self.did_sync_state_change
    }

    pub fn excludes_metadata_changes(&self) -> bool {
        self.excludes_metadata_changes
    }

    pub fn metadata(&self) -> SnapshotMetadata {
        SnapshotMetadata::new(self.from_cache, self.has_pending_writes())
    }

    /// The same snapshot with a different change list and metadata-exclusion flag.
    pub(crate) fn with_changes(
        &self,
        changes: Vec<DocumentViewChange>,
        excludes_metadata_changes: bool,
    ) -> Self {
        Self {
            changes,
            excludes_metadata_changes,
            ..self.clone()
        }
    }
}

/// Metadata about the state of a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotMetadata {
    from_cache: bool,
    has_pending_writes: bool,
}

impl SnapshotMetadata {
    pub fn new(from_cache: bool, has_pending_writes: bool) -> Self {
        Self {
            from_cache,
            has_pending_writes,
        }
    }

    /// Indicates whether the snapshot was served from a local cache.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Indicates whether the snapshot contains uncommitted local mutations.
    pub fn has_pending_writes(&self) -> bool {
        self.has_pending_writes
    }
}
