use std::cmp::Ordering;

use once_cell::sync::Lazy;

use crate::firestore::collection::DocumentKeySet;
use crate::firestore::core::view_snapshot::{
    DocumentViewChange, DocumentViewChangeSet, DocumentViewChangeType, SyncState, ViewSnapshot,
};
use crate::firestore::core::{OnlineState, Query, TargetChange};
use crate::firestore::model::{Document, DocumentKey, DocumentSet, MaybeDocument};
use crate::logger::Logger;
use crate::util::hard_assert;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("@firebase/firestore"));

/// The result of folding a batch of document updates into a view, before it is applied.
#[derive(Clone, Debug)]
pub struct DocumentChanges {
    document_set: DocumentSet,
    change_set: DocumentViewChangeSet,
    mutated_keys: DocumentKeySet,
    needs_refill: bool,
}

impl DocumentChanges {
    pub fn document_set(&self) -> &DocumentSet {
        &self.document_set
    }

    pub fn change_set(&self) -> &DocumentViewChangeSet {
        &self.change_set
    }

    pub fn mutated_keys(&self) -> &DocumentKeySet {
        &self.mutated_keys
    }

    /// True when a limit query lost a document at its edge and must be recomputed from the full
    /// local result set before it can be applied.
    pub fn needs_refill(&self) -> bool {
        self.needs_refill
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimboDocumentChangeType {
    Added,
    Removed,
}

/// A document entering or leaving limbo: present locally but not confirmed by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LimboDocumentChange {
    change_type: LimboDocumentChangeType,
    key: DocumentKey,
}

impl LimboDocumentChange {
    pub fn new(change_type: LimboDocumentChangeType, key: DocumentKey) -> Self {
        Self { change_type, key }
    }

    pub fn change_type(&self) -> LimboDocumentChangeType {
        self.change_type
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }
}

/// What [`View::apply_changes`] produced.
#[derive(Clone, Debug, Default)]
pub struct ViewChange {
    snapshot: Option<ViewSnapshot>,
    limbo_changes: Vec<LimboDocumentChange>,
}

impl ViewChange {
    pub fn snapshot(&self) -> Option<&ViewSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn into_snapshot(self) -> Option<ViewSnapshot> {
        self.snapshot
    }

    pub fn limbo_changes(&self) -> &[LimboDocumentChange] {
        &self.limbo_changes
    }
}

/// Turns document updates for one query into snapshots with minimal change lists.
///
/// A view is driven by a single writer. Every intermediate [`DocumentSet`] it produces is
/// persistent, so snapshots already handed out are never affected by later updates.
#[derive(Debug)]
pub struct View {
    query: Query,
    sync_state: SyncState,
    current: bool,
    document_set: DocumentSet,
    synced_documents: DocumentKeySet,
    limbo_documents: DocumentKeySet,
    mutated_keys: DocumentKeySet,
}

impl View {
    /// `remote_documents` are the keys the backend last reported for this query, if resuming.
    pub fn new(query: Query, remote_documents: DocumentKeySet) -> Self {
        let document_set = DocumentSet::new(query.comparator());
        Self {
            query,
            sync_state: SyncState::None,
            current: false,
            document_set,
            synced_documents: remote_documents,
            limbo_documents: DocumentKeySet::new(),
            mutated_keys: DocumentKeySet::new(),
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    pub fn is_current(&self) -> bool {
        self.current
    }

    pub fn documents(&self) -> &DocumentSet {
        &self.document_set
    }

    pub fn limbo_documents(&self) -> &DocumentKeySet {
        &self.limbo_documents
    }

    pub fn synced_documents(&self) -> &DocumentKeySet {
        &self.synced_documents
    }

    /// Classifies `updates` against the view's current documents (or against `previous`, when
    /// refilling a limit query) without changing the view.
    pub fn compute_doc_changes<'a, I>(
        &self,
        updates: I,
        previous: Option<&DocumentChanges>,
    ) -> DocumentChanges
    where
        I: IntoIterator<Item = (&'a DocumentKey, &'a MaybeDocument)>,
    {
        let mut change_set = previous
            .map(|changes| changes.change_set.clone())
            .unwrap_or_default();
        let old_document_set = previous.map_or(&self.document_set, |changes| &changes.document_set);
        let mut new_mutated_keys = previous
            .map_or(&self.mutated_keys, |changes| &changes.mutated_keys)
            .clone();
        let mut new_document_set = old_document_set.clone();
        let mut needs_refill = false;

        let comparator = self.query.comparator();
        let limit = self.query.limit();
        let last_doc_in_limit = match limit {
            Some(limit) if self.query.has_limit_to_first() && old_document_set.len() == limit => {
                old_document_set.last().cloned()
            }
            _ => None,
        };
        let first_doc_in_limit = match limit {
            Some(limit) if self.query.has_limit_to_last() && old_document_set.len() == limit => {
                old_document_set.first().cloned()
            }
            _ => None,
        };

        for (key, maybe_document) in updates {
            let old_doc = old_document_set.get(key);
            let mut new_doc = maybe_document.as_document();

            if let Some(document) = new_doc {
                if !hard_assert(
                    key == document.key(),
                    format!("Mismatching key in doc change {key} != {}", document.key()),
                ) {
                    continue;
                }
                if !self.query.matches(document) {
                    new_doc = None;
                }
            }

            let old_doc_had_pending_mutations =
                old_doc.is_some_and(|doc| self.mutated_keys.contains(doc.key()));
            let new_doc_has_pending_mutations = new_doc.is_some_and(|doc| {
                doc.has_local_mutations()
                    || (self.mutated_keys.contains(doc.key()) && doc.has_committed_mutations())
            });

            let mut change_applied = false;
            match (old_doc, new_doc) {
                (Some(old), Some(new)) => {
                    if old.data() != new.data() {
                        if !should_wait_for_synced_document(old, new) {
                            change_set.add_change(DocumentViewChange::new(
                                DocumentViewChangeType::Modified,
                                new.clone(),
                            ));
                            change_applied = true;

                            let past_last = last_doc_in_limit
                                .as_ref()
                                .is_some_and(|last| comparator(new, last) == Ordering::Greater);
                            let before_first = first_doc_in_limit
                                .as_ref()
                                .is_some_and(|first| comparator(new, first) == Ordering::Less);
                            if past_last || before_first {
                                needs_refill = true;
                            }
                        }
                    } else if old_doc_had_pending_mutations != new_doc_has_pending_mutations {
                        change_set.add_change(DocumentViewChange::new(
                            DocumentViewChangeType::Metadata,
                            new.clone(),
                        ));
                        change_applied = true;
                    }
                }
                (None, Some(new)) => {
                    change_set.add_change(DocumentViewChange::new(
                        DocumentViewChangeType::Added,
                        new.clone(),
                    ));
                    change_applied = true;
                }
                (Some(old), None) => {
                    change_set.add_change(DocumentViewChange::new(
                        DocumentViewChangeType::Removed,
                        old.clone(),
                    ));
                    change_applied = true;
                    if last_doc_in_limit.is_some() || first_doc_in_limit.is_some() {
                        needs_refill = true;
                    }
                }
                (None, None) => {}
            }

            if change_applied {
                match new_doc {
                    Some(new) => {
                        new_document_set = new_document_set.insert(new.clone());
                        new_mutated_keys = if new.has_local_mutations() {
                            new_mutated_keys.insert(new.key().clone())
                        } else {
                            new_mutated_keys.remove(new.key())
                        };
                    }
                    None => {
                        new_document_set = new_document_set.remove(key);
                        new_mutated_keys = new_mutated_keys.remove(key);
                    }
                }
            }
        }

        if let Some(limit) = limit {
            while new_document_set.len() > limit {
                let excess = if self.query.has_limit_to_first() {
                    new_document_set.last()
                } else {
                    new_document_set.first()
                };
                let Some(excess) = excess.cloned() else {
                    break;
                };
                new_document_set = new_document_set.remove(excess.key());
                new_mutated_keys = new_mutated_keys.remove(excess.key());
                change_set.add_change(DocumentViewChange::new(
                    DocumentViewChangeType::Removed,
                    excess,
                ));
            }
        }

        hard_assert(
            !needs_refill || previous.is_none(),
            "View was refilled using docs that themselves needed refilling.",
        );

        DocumentChanges {
            document_set: new_document_set,
            change_set,
            mutated_keys: new_mutated_keys,
            needs_refill,
        }
    }

    /// Applies computed changes (and the watch stream's view of the target, if any), returning
    /// a snapshot when something observable changed.
    pub fn apply_changes(
        &mut self,
        doc_changes: &DocumentChanges,
        target_change: Option<&TargetChange>,
    ) -> ViewChange {
        if !hard_assert(
            !doc_changes.needs_refill,
            "Cannot apply changes that need a refill",
        ) {
            return ViewChange::default();
        }

        let old_document_set =
            std::mem::replace(&mut self.document_set, doc_changes.document_set.clone());
        let old_mutated_keys =
            std::mem::replace(&mut self.mutated_keys, doc_changes.mutated_keys.clone());

        let comparator = self.query.comparator();
        let mut view_changes = doc_changes.change_set.changes();
        view_changes.sort_by(|left, right| {
            left.change_type()
                .emit_order()
                .cmp(&right.change_type().emit_order())
                .then_with(|| comparator(left.document(), right.document()))
        });

        if let Some(target_change) = target_change {
            self.apply_target_change(target_change);
        }
        let limbo_changes = self.update_limbo_documents();

        let synced = self.limbo_documents.is_empty() && self.current;
        let new_sync_state = if synced {
            SyncState::Synced
        } else {
            SyncState::Local
        };
        let sync_state_changed = new_sync_state != self.sync_state;
        self.sync_state = new_sync_state;

        let mutated_keys_changed = old_mutated_keys != self.mutated_keys;
        let snapshot = if !view_changes.is_empty() || sync_state_changed || mutated_keys_changed {
            Some(ViewSnapshot::new(
                self.query.clone(),
                self.document_set.clone(),
                old_document_set,
                view_changes,
                new_sync_state == SyncState::Local,
                self.mutated_keys.clone(),
                sync_state_changed,
                false,
            ))
        } else {
            None
        };

        ViewChange {
            snapshot,
            limbo_changes,
        }
    }

    /// Going offline makes a current view non-current, which surfaces as a from-cache snapshot.
    pub fn apply_online_state_change(&mut self, online_state: OnlineState) -> ViewChange {
        if self.current && online_state == OnlineState::Offline {
            self.current = false;
            let unchanged = DocumentChanges {
                document_set: self.document_set.clone(),
                change_set: DocumentViewChangeSet::new(),
                mutated_keys: self.mutated_keys.clone(),
                needs_refill: false,
            };
            self.apply_changes(&unchanged, None)
        } else {
            ViewChange::default()
        }
    }

    fn apply_target_change(&mut self, target_change: &TargetChange) {
        for key in target_change.added_documents().iter() {
            self.synced_documents = self.synced_documents.insert(key.clone());
        }
        for key in target_change.modified_documents().iter() {
            hard_assert(
                self.synced_documents.contains(key),
                format!("Modified document {key} not found in view."),
            );
        }
        for key in target_change.removed_documents().iter() {
            self.synced_documents = self.synced_documents.remove(key);
        }
        self.current = target_change.is_current();
    }

    fn update_limbo_documents(&mut self) -> Vec<LimboDocumentChange> {
        if !self.current {
            return Vec::new();
        }

        let old_limbo_documents = std::mem::take(&mut self.limbo_documents);
        self.limbo_documents = self
            .document_set
            .iter()
            .filter(|doc| self.should_be_limbo_doc(doc))
            .map(|doc| doc.key().clone())
            .collect();

        let mut changes = Vec::new();
        for key in old_limbo_documents.iter() {
            if !self.limbo_documents.contains(key) {
                changes.push(LimboDocumentChange::new(
                    LimboDocumentChangeType::Removed,
                    key.clone(),
                ));
            }
        }
        for key in self.limbo_documents.iter() {
            if !old_limbo_documents.contains(key) {
                changes.push(LimboDocumentChange::new(
                    LimboDocumentChangeType::Added,
                    key.clone(),
                ));
            }
        }
        if !changes.is_empty() {
            LOGGER.debug(format_args!(
                "{}: {} document(s) now in limbo, {} limbo change(s)",
                self.query,
                self.limbo_documents.len(),
                changes.len()
            ));
        }
        changes
    }

    fn should_be_limbo_doc(&self, document: &Document) -> bool {
        !self.synced_documents.contains(document.key()) && !document.has_local_mutations()
    }
}

/// The write acknowledgement arrives before watch catches up: hold the event until it does.
fn should_wait_for_synced_document(old_doc: &Document, new_doc: &Document) -> bool {
    old_doc.has_local_mutations() && new_doc.has_committed_mutations() && !new_doc.has_local_mutations()
}
