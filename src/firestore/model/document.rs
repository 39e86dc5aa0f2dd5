use std::sync::Arc;

use crate::firestore::model::{DocumentKey, FieldPath, SnapshotVersion};
use crate::firestore::value::{FirestoreValue, MapValue};

/// Whether a document carries writes that the backend has not fully confirmed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DocumentState {
    /// Matches the backend state at `version`.
    #[default]
    Synced,
    /// Has local writes that were not yet sent or acknowledged.
    LocalMutations,
    /// Has writes acknowledged by the backend but not yet seen on the watch stream.
    CommittedMutations,
}

/// An existing document as seen by a view.
///
/// Documents are immutable; a new version of the same key is a new `Document`. Field data sits
/// behind an `Arc` so documents are cheap to clone into document sets and snapshots.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    key: DocumentKey,
    version: SnapshotVersion,
    data: Arc<MapValue>,
    state: DocumentState,
}

impl Document {
    pub fn new(key: DocumentKey, version: SnapshotVersion, data: MapValue) -> Self {
        Self {
            key,
            version,
            data: Arc::new(data),
            state: DocumentState::Synced,
        }
    }

    pub fn with_state(mut self, state: DocumentState) -> Self {
        self.state = state;
        self
    }

    pub fn with_local_mutations(self) -> Self {
        self.with_state(DocumentState::LocalMutations)
    }

    pub fn with_committed_mutations(self) -> Self {
        self.with_state(DocumentState::CommittedMutations)
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    pub fn data(&self) -> &MapValue {
        &self.data
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn has_local_mutations(&self) -> bool {
        self.state == DocumentState::LocalMutations
    }

    pub fn has_committed_mutations(&self) -> bool {
        self.state == DocumentState::CommittedMutations
    }

    pub fn has_pending_writes(&self) -> bool {
        self.state != DocumentState::Synced
    }

    /// Looks up a (possibly nested) field. The document-id path resolves to a reference value
    /// built from the key.
    pub fn field(&self, path: &FieldPath) -> Option<FirestoreValue> {
        if path.is_key_field() {
            return Some(FirestoreValue::from_reference(
                self.key.path().canonical_string(),
            ));
        }
        self.data.get_path(path.segments()).cloned()
    }
}

/// Either a document or a tombstone recording that the key has no document at `version`.
#[derive(Clone, Debug, PartialEq)]
pub enum MaybeDocument {
    Document(Document),
    NoDocument {
        key: DocumentKey,
        version: SnapshotVersion,
    },
}

impl MaybeDocument {
    pub fn key(&self) -> &DocumentKey {
        match self {
            MaybeDocument::Document(document) => document.key(),
            MaybeDocument::NoDocument { key, .. } => key,
        }
    }

    pub fn version(&self) -> SnapshotVersion {
        match self {
            MaybeDocument::Document(document) => document.version(),
            MaybeDocument::NoDocument { version, .. } => *version,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            MaybeDocument::Document(document) => Some(document),
            MaybeDocument::NoDocument { .. } => None,
        }
    }
}

impl From<Document> for MaybeDocument {
    fn from(document: Document) -> Self {
        MaybeDocument::Document(document)
    }
}
