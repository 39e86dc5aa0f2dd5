use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::firestore::core::view_snapshot::{DocumentViewChangeType, ViewSnapshot};
use crate::firestore::model::Document;
use crate::util::hard_assert;

/// Whether metadata-only changes show up as `Modified` document changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataChanges {
    Include,
    #[default]
    Exclude,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentChangeType {
    Added,
    Modified,
    Removed,
}

/// A change to one document, with its position before and after the change.
///
/// Applying a snapshot's changes in order to an array holding the old results (remove at
/// `old_index`, then insert at `new_index`) yields exactly the new results.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentChange {
    change_type: DocumentChangeType,
    document: Document,
    old_index: Option<usize>,
    new_index: Option<usize>,
}

impl DocumentChange {
    pub fn change_type(&self) -> DocumentChangeType {
        self.change_type
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Position in the previous results; `None` for added documents.
    pub fn old_index(&self) -> Option<usize> {
        self.old_index
    }

    /// Position in the new results; `None` for removed documents.
    pub fn new_index(&self) -> Option<usize> {
        self.new_index
    }
}

/// Converts a snapshot's view changes into indexed document changes.
pub fn changes_from_snapshot(
    snapshot: &ViewSnapshot,
    metadata_changes: MetadataChanges,
) -> Vec<DocumentChange> {
    let mut document_changes = Vec::with_capacity(snapshot.changes().len());

    if snapshot.old_documents().is_empty() {
        // Every change of a first snapshot is an addition, already in query order.
        let comparator = snapshot.query().comparator();
        let mut last_document: Option<&Document> = None;
        for change in snapshot.changes() {
            let document = change.document();
            if !hard_assert(
                change.change_type() == DocumentViewChangeType::Added,
                "Invalid event type for first snapshot",
            ) {
                continue;
            }
            hard_assert(
                last_document.map_or(true, |last| comparator(last, document) == Ordering::Less),
                "Got added events in wrong order",
            );
            document_changes.push(DocumentChange {
                change_type: DocumentChangeType::Added,
                document: document.clone(),
                old_index: None,
                new_index: Some(document_changes.len()),
            });
            last_document = Some(document);
        }
        return document_changes;
    }

    let mut index_tracker = snapshot.old_documents().clone();
    for change in snapshot.changes() {
        let change_type = match change.change_type() {
            DocumentViewChangeType::Metadata if metadata_changes == MetadataChanges::Exclude => {
                continue;
            }
            DocumentViewChangeType::Added => DocumentChangeType::Added,
            DocumentViewChangeType::Modified | DocumentViewChangeType::Metadata => {
                DocumentChangeType::Modified
            }
            DocumentViewChangeType::Removed => DocumentChangeType::Removed,
        };
        let document = change.document();

        let old_index = if change_type != DocumentChangeType::Added {
            let index = index_tracker.index_of(document.key());
            if !hard_assert(index.is_some(), "Index for document not found") {
                continue;
            }
            index_tracker = index_tracker.remove(document.key());
            index
        } else {
            None
        };

        let new_index = if change_type != DocumentChangeType::Removed {
            index_tracker = index_tracker.insert(document.clone());
            let index = index_tracker.index_of(document.key());
            hard_assert(index.is_some(), "Index for document not found");
            index
        } else {
            None
        };

        document_changes.push(DocumentChange {
            change_type,
            document: document.clone(),
            old_index,
            new_index,
        });
    }
    document_changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::collection::DocumentKeySet;
    use crate::firestore::core::query::OrderBy;
    use crate::firestore::core::View;
    use crate::firestore::model::{FieldPath, MaybeDocument};
    use crate::test_support::{deleted_doc, doc, doc_updates, query};

    fn apply(view: &mut View, docs: &[MaybeDocument]) -> ViewSnapshot {
        let changes = view.compute_doc_changes(&doc_updates(docs), None);
        view.apply_changes(&changes, None).into_snapshot().unwrap()
    }

    fn replay(old: &[Document], changes: &[DocumentChange]) -> Vec<Document> {
        let mut documents = old.to_vec();
        for change in changes {
            if let Some(index) = change.old_index() {
                documents.remove(index);
            }
            if let Some(index) = change.new_index() {
                documents.insert(index, change.document().clone());
            }
        }
        documents
    }

    #[test]
    fn first_snapshot_indexes_in_order() {
        let mut view = View::new(query("c"), DocumentKeySet::new());
        let snapshot = apply(
            &mut view,
            &[doc("c/b", 1, &[]).into(), doc("c/a", 1, &[]).into()],
        );
        let changes = changes_from_snapshot(&snapshot, MetadataChanges::Exclude);
        let indices: Vec<_> = changes
            .iter()
            .map(|change| (change.document().key().id().to_string(), change.new_index()))
            .collect();
        assert_eq!(
            indices,
            vec![("a".to_string(), Some(0)), ("b".to_string(), Some(1))]
        );
        assert!(changes.iter().all(|change| change.old_index().is_none()));
    }

    #[test]
    fn replaying_changes_reproduces_new_results() {
        let sorted = query("c").order_by(OrderBy::ascending(
            FieldPath::from_dot_separated("sort").unwrap(),
        ));
        let mut view = View::new(sorted, DocumentKeySet::new());
        let initial: Vec<MaybeDocument> = (0..6)
            .map(|i| doc(&format!("c/{i}"), 1, &[("sort", (i * 10).into())]).into())
            .collect();
        apply(&mut view, &initial);

        let snapshot = apply(
            &mut view,
            &[
                deleted_doc("c/0", 2),
                doc("c/5", 2, &[("sort", (-1).into())]).into(),
                doc("c/2", 2, &[("sort", 45.into())]).into(),
                doc("c/9", 2, &[("sort", 15.into())]).into(),
            ],
        );
        let changes = changes_from_snapshot(&snapshot, MetadataChanges::Exclude);
        assert_eq!(
            replay(&snapshot.old_documents().to_vec(), &changes),
            snapshot.documents().to_vec()
        );
        assert_eq!(changes[0].change_type(), DocumentChangeType::Removed);
        assert_eq!(changes[0].old_index(), Some(0));
    }

    #[test]
    fn metadata_changes_follow_the_option() {
        let mut view = View::new(query("c"), DocumentKeySet::new());
        apply(
            &mut view,
            &[
                doc("c/a", 1, &[]).with_local_mutations().into(),
                doc("c/b", 1, &[]).into(),
            ],
        );
        let snapshot = apply(&mut view, &[doc("c/a", 1, &[]).into()]);

        assert!(changes_from_snapshot(&snapshot, MetadataChanges::Exclude).is_empty());
        let included = changes_from_snapshot(&snapshot, MetadataChanges::Include);
        assert_eq!(included.len(), 1);
        assert_eq!(included[0].change_type(), DocumentChangeType::Modified);
        assert_eq!((included[0].old_index(), included[0].new_index()), (Some(0), Some(0)));
    }
}
