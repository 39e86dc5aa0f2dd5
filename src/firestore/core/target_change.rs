use bytes::Bytes;

use crate::firestore::collection::DocumentKeySet;
use crate::firestore::model::DocumentKey;

/// What the watch stream reported for one query target since the last event.
///
/// `current` means the backend has sent every document matching the target as of the resume
/// token; a view only becomes synced once its target is current.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetChange {
    resume_token: Bytes,
    current: bool,
    added_documents: DocumentKeySet,
    modified_documents: DocumentKeySet,
    removed_documents: DocumentKeySet,
}

impl TargetChange {
    pub fn new(
        resume_token: Bytes,
        current: bool,
        added_documents: DocumentKeySet,
        modified_documents: DocumentKeySet,
        removed_documents: DocumentKeySet,
    ) -> Self {
        Self {
            resume_token,
            current,
            added_documents,
            modified_documents,
            removed_documents,
        }
    }

    /// A change that only marks the target current, optionally adding synced keys.
    pub fn acknowledge<I>(current: bool, added: I) -> Self
    where
        I: IntoIterator<Item = DocumentKey>,
    {
        Self {
            current,
            added_documents: added.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn resume_token(&self) -> &Bytes {
        &self.resume_token
    }

    pub fn is_current(&self) -> bool {
        self.current
    }

    pub fn added_documents(&self) -> &DocumentKeySet {
        &self.added_documents
    }

    pub fn modified_documents(&self) -> &DocumentKeySet {
        &self.modified_documents
    }

    pub fn removed_documents(&self) -> &DocumentKeySet {
        &self.removed_documents
    }
}
