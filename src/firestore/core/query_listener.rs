use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::firestore::core::view_snapshot::{DocumentViewChangeType, ViewSnapshot};
use crate::firestore::core::{OnlineState, Query};
use crate::firestore::error::{FirestoreError, FirestoreResult};
use crate::logger::Logger;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("@firebase/firestore"));

/// Receives raised snapshots, or the single terminal error.
pub type SnapshotCallback = Arc<dyn Fn(FirestoreResult<ViewSnapshot>) + Send + Sync>;

/// Per-listener switches controlling which metadata-only events are surfaced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListenOptions {
    /// Raise snapshots whose only change is a document's pending-write state.
    pub include_document_metadata_changes: bool,
    /// Raise snapshots whose only change is the query's from-cache or pending-writes state.
    pub include_query_metadata_changes: bool,
    /// Hold the first event until the view is synced, unless the client is offline.
    pub wait_for_sync_when_online: bool,
}

impl ListenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_document_metadata_changes(mut self, include: bool) -> Self {
        self.include_document_metadata_changes = include;
        self
    }

    pub fn include_query_metadata_changes(mut self, include: bool) -> Self {
        self.include_query_metadata_changes = include;
        self
    }

    pub fn wait_for_sync_when_online(mut self, wait: bool) -> Self {
        self.wait_for_sync_when_online = wait;
        self
    }

    /// Both metadata switches on.
    pub fn include_all_metadata() -> Self {
        Self::new()
            .include_document_metadata_changes(true)
            .include_query_metadata_changes(true)
    }
}

/// Decides, snapshot by snapshot, what one registered listener gets to see.
///
/// Entry points must be called serially; the listener does no locking of its own.
pub struct QueryListener {
    query: Query,
    options: ListenOptions,
    callback: SnapshotCallback,
    online_state: OnlineState,
    snapshot: Option<ViewSnapshot>,
    raised_initial_event: bool,
    terminated: bool,
}

impl QueryListener {
    pub fn new(query: Query, options: ListenOptions, callback: SnapshotCallback) -> Self {
        Self {
            query,
            options,
            callback,
            online_state: OnlineState::Unknown,
            snapshot: None,
            raised_initial_event: false,
            terminated: false,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn options(&self) -> ListenOptions {
        self.options
    }

    /// Feeds a snapshot from the view. Returns whether the callback was invoked.
    pub fn on_view_snapshot(&mut self, snapshot: ViewSnapshot) -> bool {
        if self.terminated {
            LOGGER.debug(format_args!("{}: dropping snapshot after error", self.query));
            return false;
        }

        let snapshot = if self.options.include_document_metadata_changes {
            snapshot
        } else {
            let changes = snapshot
                .changes()
                .iter()
                .filter(|change| change.change_type() != DocumentViewChangeType::Metadata)
                .cloned()
                .collect();
            snapshot.with_changes(changes, true)
        };

        let mut raised_event = false;
        if !self.raised_initial_event {
            if self.should_raise_initial_event(&snapshot, self.online_state) {
                self.raise_initial_event(&snapshot);
                raised_event = true;
            }
        } else if self.should_raise_event(&snapshot) {
            LOGGER.debug(format_args!(
                "{}: raising snapshot with {} change(s)",
                self.query,
                snapshot.changes().len()
            ));
            (self.callback)(Ok(snapshot.clone()));
            raised_event = true;
        }

        if !raised_event {
            LOGGER.debug(format_args!("{}: withholding snapshot", self.query));
        }
        self.snapshot = Some(snapshot);
        raised_event
    }

    /// Delivers `error` once; every later call on this listener is ignored.
    pub fn on_error(&mut self, error: FirestoreError) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        LOGGER.debug(format_args!("{}: listen failed: {error}", self.query));
        (self.callback)(Err(error));
    }

    /// Going offline may release an initial event that was waiting for sync.
    pub fn on_online_state_changed(&mut self, online_state: OnlineState) -> bool {
        self.online_state = online_state;
        if self.terminated || self.raised_initial_event {
            return false;
        }
        let Some(snapshot) = self.snapshot.clone() else {
            return false;
        };
        if self.should_raise_initial_event(&snapshot, online_state) {
            self.raise_initial_event(&snapshot);
            return true;
        }
        false
    }

    fn should_raise_initial_event(&self, snapshot: &ViewSnapshot, online_state: OnlineState) -> bool {
        if !snapshot.is_from_cache() {
            return true;
        }

        let maybe_online = online_state != OnlineState::Offline;
        if self.options.wait_for_sync_when_online && maybe_online {
            return false;
        }

        !snapshot.documents().is_empty() || online_state == OnlineState::Offline
    }

    fn should_raise_event(&self, snapshot: &ViewSnapshot) -> bool {
        if !snapshot.changes().is_empty() {
            return true;
        }

        let has_pending_writes_changed = self
            .snapshot
            .as_ref()
            .is_some_and(|last| last.has_pending_writes() != snapshot.has_pending_writes());
        if snapshot.did_sync_state_change() || has_pending_writes_changed {
            return self.options.include_query_metadata_changes;
        }
        false
    }

    fn raise_initial_event(&mut self, snapshot: &ViewSnapshot) {
        let initial = ViewSnapshot::from_initial_documents(
            snapshot.query().clone(),
            snapshot.documents().clone(),
            snapshot.mutated_keys().clone(),
            snapshot.is_from_cache(),
            snapshot.excludes_metadata_changes(),
        );
        self.raised_initial_event = true;
        LOGGER.debug(format_args!(
            "{}: raising initial snapshot with {} document(s)",
            self.query,
            initial.documents().len()
        ));
        (self.callback)(Ok(initial));
    }
}

impl fmt::Debug for QueryListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryListener")
            .field("query", &self.query)
            .field("options", &self.options)
            .field("online_state", &self.online_state)
            .field("raised_initial_event", &self.raised_initial_event)
            .field("terminated", &self.terminated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::firestore::collection::DocumentKeySet;
    use crate::firestore::core::view::View;
    use crate::firestore::core::view_snapshot::DocumentViewChange;
    use crate::firestore::error::unavailable;
    use crate::firestore::model::{Document, DocumentSet, MaybeDocument};
    use crate::test_support::{ack_target, doc, doc_updates, query};
    use DocumentViewChangeType::{Added, Metadata, Modified};

    type Events = Arc<Mutex<Vec<FirestoreResult<ViewSnapshot>>>>;

    fn listener(query: &Query, options: ListenOptions) -> (QueryListener, Events) {
        let events: Events = Arc::default();
        let sink = Arc::clone(&events);
        let callback: SnapshotCallback = Arc::new(move |event| sink.lock().unwrap().push(event));
        (QueryListener::new(query.clone(), options, callback), events)
    }

    fn snapshots(events: &Events) -> Vec<ViewSnapshot> {
        events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.clone().expect("unexpected error event"))
            .collect()
    }

    fn apply(view: &mut View, docs: &[Document]) -> ViewSnapshot {
        let docs: Vec<MaybeDocument> = docs.iter().cloned().map(Into::into).collect();
        let changes = view.compute_doc_changes(&doc_updates(&docs), None);
        view.apply_changes(&changes, None).into_snapshot().unwrap()
    }

    fn change(kind: DocumentViewChangeType, document: &Document) -> DocumentViewChange {
        DocumentViewChange::new(kind, document.clone())
    }

    fn excluding_metadata(snapshot: &ViewSnapshot) -> ViewSnapshot {
        let changes = snapshot
            .changes()
            .iter()
            .filter(|change| change.change_type() != Metadata)
            .cloned()
            .collect();
        snapshot.with_changes(changes, true)
    }

    fn named(path: &str, version: i64, name: &str) -> Document {
        doc(path, version, &[("name", name.into())])
    }

    #[test]
    fn raises_collection_events() {
        let rooms = query("rooms");
        let (mut first, events) = listener(&rooms, ListenOptions::include_all_metadata());
        let (mut second, other_events) = listener(&rooms, ListenOptions::include_all_metadata());
        let doc1 = named("rooms/Eros", 1, "Eros");
        let doc2 = named("rooms/Hades", 2, "Hades");
        let doc2_prime = doc(
            "rooms/Hades",
            3,
            &[("name", "Hades".into()), ("owner", "Jonny".into())],
        );

        let mut view = View::new(rooms.clone(), DocumentKeySet::new());
        let snap1 = apply(&mut view, &[doc1.clone(), doc2.clone()]);
        let snap2 = apply(&mut view, &[doc2_prime.clone()]);

        assert!(first.on_view_snapshot(snap1.clone()));
        assert!(first.on_view_snapshot(snap2.clone()));
        assert!(second.on_view_snapshot(snap2.clone()));

        let raised = snapshots(&events);
        assert_eq!(raised, vec![snap1, snap2.clone()]);
        assert_eq!(raised[0].changes(), &[change(Added, &doc1), change(Added, &doc2)]);
        assert_eq!(raised[1].changes(), &[change(Modified, &doc2_prime)]);

        // A late listener sees the current state as one batch of additions.
        let expected = ViewSnapshot::new(
            rooms.clone(),
            snap2.documents().clone(),
            DocumentSet::new(rooms.comparator()),
            vec![change(Added, &doc1), change(Added, &doc2_prime)],
            snap2.is_from_cache(),
            snap2.mutated_keys().clone(),
            true,
            false,
        );
        assert_eq!(snapshots(&other_events), vec![expected]);
    }

    #[test]
    fn raises_error_event_once() {
        let rooms = query("rooms/Eros/messages");
        let (mut listener, events) = listener(&rooms, ListenOptions::default());
        listener.on_error(unavailable("watch stream closed"));
        listener.on_error(unavailable("again"));

        let mut view = View::new(rooms, DocumentKeySet::new());
        let snapshot = apply(&mut view, &[named("rooms/Eros/messages/1", 1, "a")]);
        assert!(!listener.on_view_snapshot(snapshot));
        assert!(!listener.on_online_state_changed(OnlineState::Offline));

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let error = events[0].as_ref().unwrap_err();
        assert_eq!(error.message(), "watch stream closed");
    }

    #[test]
    fn raises_event_for_empty_collection_after_sync() {
        let rooms = query("rooms");
        let (mut listener, events) = listener(&rooms, ListenOptions::include_all_metadata());
        let mut view = View::new(rooms, DocumentKeySet::new());
        let snap1 = apply(&mut view, &[]);
        let empty = view.compute_doc_changes(&doc_updates(&[]), None);
        let snap2 = view
            .apply_changes(&empty, Some(&ack_target(&[])))
            .into_snapshot()
            .unwrap();

        assert!(!listener.on_view_snapshot(snap1));
        assert!(snapshots(&events).is_empty());
        assert!(listener.on_view_snapshot(snap2.clone()));
        assert_eq!(snapshots(&events), vec![snap2]);
    }

    #[test]
    fn does_not_raise_metadata_events_unless_asked() {
        let rooms = query("rooms");
        let (mut filtered, filtered_events) = listener(&rooms, ListenOptions::default());
        let (mut full, full_events) = listener(&rooms, ListenOptions::include_all_metadata());
        let doc1 = named("rooms/Eros", 1, "Eros");
        let doc2 = named("rooms/Hades", 2, "Hades");

        let mut view = View::new(rooms, DocumentKeySet::new());
        let snap1 = apply(&mut view, &[doc1.clone()]);
        let empty = view.compute_doc_changes(&doc_updates(&[]), None);
        let snap2 = view
            .apply_changes(&empty, Some(&ack_target(&[&doc1])))
            .into_snapshot()
            .unwrap();
        let snap3 = apply(&mut view, &[doc2]);

        filtered.on_view_snapshot(snap1.clone());
        assert!(!filtered.on_view_snapshot(snap2.clone()));
        filtered.on_view_snapshot(snap3.clone());
        full.on_view_snapshot(snap1.clone());
        assert!(full.on_view_snapshot(snap2.clone()));
        full.on_view_snapshot(snap3.clone());

        assert_eq!(
            snapshots(&filtered_events),
            vec![excluding_metadata(&snap1), excluding_metadata(&snap3)]
        );
        assert_eq!(snapshots(&full_events), vec![snap1, snap2, snap3]);
    }

    #[test]
    fn raises_document_metadata_events_only_when_asked() {
        let rooms = query("rooms");
        let (mut filtered, filtered_events) = listener(&rooms, ListenOptions::default());
        let (mut full, full_events) = listener(
            &rooms,
            ListenOptions::new().include_document_metadata_changes(true),
        );
        let doc1 = named("rooms/Eros", 1, "Eros").with_local_mutations();
        let doc2 = named("rooms/Hades", 2, "Hades");
        let doc1_prime = named("rooms/Eros", 1, "Eros");
        let doc3 = named("rooms/Other", 3, "Other");

        let mut view = View::new(rooms, DocumentKeySet::new());
        let snap1 = apply(&mut view, &[doc1.clone(), doc2.clone()]);
        let snap2 = apply(&mut view, &[doc1_prime.clone()]);
        let snap3 = apply(&mut view, &[doc3.clone()]);

        for snapshot in [&snap1, &snap2, &snap3] {
            filtered.on_view_snapshot(snapshot.clone());
            full.on_view_snapshot(snapshot.clone());
        }

        let filtered_raised = snapshots(&filtered_events);
        assert_eq!(
            filtered_raised,
            vec![excluding_metadata(&snap1), excluding_metadata(&snap3)]
        );
        assert_eq!(filtered_raised[0].changes(), &[change(Added, &doc1), change(Added, &doc2)]);
        assert_eq!(filtered_raised[1].changes(), &[change(Added, &doc3)]);

        let full_raised = snapshots(&full_events);
        assert_eq!(full_raised, vec![snap1, snap2, snap3]);
        assert_eq!(full_raised[1].changes(), &[change(Metadata, &doc1_prime)]);
    }

    #[test]
    fn raises_query_metadata_event_when_pending_writes_clear() {
        let rooms = query("rooms");
        let (mut listener, events) = listener(
            &rooms,
            ListenOptions::new().include_query_metadata_changes(true),
        );
        let doc1 = named("rooms/Eros", 1, "Eros").with_local_mutations();
        let doc2 = named("rooms/Hades", 2, "Hades").with_local_mutations();
        let doc1_prime = named("rooms/Eros", 1, "Eros");
        let doc2_prime = named("rooms/Hades", 2, "Hades");
        let doc3 = named("rooms/Other", 3, "Other");

        let mut view = View::new(rooms, DocumentKeySet::new());
        let snap1 = apply(&mut view, &[doc1, doc2]);
        let snap2 = apply(&mut view, &[doc1_prime]);
        let snap3 = apply(&mut view, &[doc3]);
        let snap4 = apply(&mut view, &[doc2_prime]);

        assert!(listener.on_view_snapshot(snap1.clone()));
        // doc2 still has pending writes, so nothing observable changed.
        assert!(!listener.on_view_snapshot(snap2));
        assert!(listener.on_view_snapshot(snap3.clone()));
        assert!(listener.on_view_snapshot(snap4.clone()));

        let expected_snap4 = ViewSnapshot::new(
            snap4.query().clone(),
            snap4.documents().clone(),
            snap3.documents().clone(),
            Vec::new(),
            snap4.is_from_cache(),
            snap4.mutated_keys().clone(),
            snap4.did_sync_state_change(),
            true,
        );
        assert_eq!(
            snapshots(&events),
            vec![excluding_metadata(&snap1), excluding_metadata(&snap3), expected_snap4]
        );
    }

    #[test]
    fn metadata_only_changes_are_filtered_from_mixed_snapshots() {
        let rooms = query("rooms");
        let (mut listener, events) = listener(&rooms, ListenOptions::default());
        let doc1 = named("rooms/Eros", 1, "Eros").with_local_mutations();
        let doc2 = named("rooms/Hades", 2, "Hades");
        let doc1_prime = named("rooms/Eros", 1, "Eros");
        let doc3 = named("rooms/Other", 3, "Other");

        let mut view = View::new(rooms, DocumentKeySet::new());
        let snap1 = apply(&mut view, &[doc1, doc2]);
        let snap2 = apply(&mut view, &[doc1_prime, doc3.clone()]);
        listener.on_view_snapshot(snap1.clone());
        listener.on_view_snapshot(snap2.clone());

        let expected_snap2 = ViewSnapshot::new(
            snap2.query().clone(),
            snap2.documents().clone(),
            snap1.documents().clone(),
            vec![change(Added, &doc3)],
            snap2.is_from_cache(),
            snap2.mutated_keys().clone(),
            snap2.did_sync_state_change(),
            true,
        );
        assert_eq!(snapshots(&events), vec![excluding_metadata(&snap1), expected_snap2]);
    }

    #[test]
    fn waits_for_sync_when_online() {
        let rooms = query("rooms");
        let (mut listener, events) = listener(
            &rooms,
            ListenOptions::new().wait_for_sync_when_online(true),
        );
        let doc1 = named("rooms/Eros", 1, "Eros");
        let doc2 = named("rooms/Hades", 2, "Hades");

        let mut view = View::new(rooms.clone(), DocumentKeySet::new());
        let snap1 = apply(&mut view, &[doc1.clone()]);
        let snap2 = apply(&mut view, &[doc2.clone()]);
        let empty = view.compute_doc_changes(&doc_updates(&[]), None);
        let snap3 = view
            .apply_changes(&empty, Some(&ack_target(&[&doc1, &doc2])))
            .into_snapshot()
            .unwrap();

        assert!(!listener.on_online_state_changed(OnlineState::Online));
        assert!(!listener.on_view_snapshot(snap1));
        assert!(!listener.on_view_snapshot(snap2));
        assert!(listener.on_view_snapshot(snap3.clone()));

        let expected = ViewSnapshot::new(
            rooms.clone(),
            snap3.documents().clone(),
            DocumentSet::new(rooms.comparator()),
            vec![change(Added, &doc1), change(Added, &doc2)],
            false,
            snap3.mutated_keys().clone(),
            true,
            true,
        );
        assert_eq!(snapshots(&events), vec![expected]);
    }

    #[test]
    fn raises_initial_event_when_going_offline() {
        let rooms = query("rooms");
        let (mut listener, events) = listener(
            &rooms,
            ListenOptions::new().wait_for_sync_when_online(true),
        );
        let doc1 = named("rooms/Eros", 1, "Eros");
        let doc2 = named("rooms/Hades", 2, "Hades");

        let mut view = View::new(rooms.clone(), DocumentKeySet::new());
        let snap1 = apply(&mut view, &[doc1.clone()]);
        let snap2 = apply(&mut view, &[doc2.clone()]);

        assert!(!listener.on_online_state_changed(OnlineState::Online));
        assert!(!listener.on_view_snapshot(snap1.clone()));
        assert!(listener.on_online_state_changed(OnlineState::Offline));
        assert!(!listener.on_online_state_changed(OnlineState::Unknown));
        assert!(!listener.on_online_state_changed(OnlineState::Offline));
        assert!(listener.on_view_snapshot(snap2.clone()));

        let expected_snap1 = ViewSnapshot::new(
            rooms.clone(),
            snap1.documents().clone(),
            DocumentSet::new(rooms.comparator()),
            vec![change(Added, &doc1)],
            true,
            snap1.mutated_keys().clone(),
            true,
            true,
        );
        let expected_snap2 = ViewSnapshot::new(
            rooms.clone(),
            snap2.documents().clone(),
            snap1.documents().clone(),
            vec![change(Added, &doc2)],
            true,
            snap2.mutated_keys().clone(),
            false,
            true,
        );
        assert_eq!(snapshots(&events), vec![expected_snap1, expected_snap2]);
    }

    fn empty_offline_snapshot(rooms: &Query, snapshot: &ViewSnapshot) -> ViewSnapshot {
        ViewSnapshot::new(
            rooms.clone(),
            snapshot.documents().clone(),
            DocumentSet::new(rooms.comparator()),
            Vec::new(),
            true,
            snapshot.mutated_keys().clone(),
            true,
            true,
        )
    }

    #[test]
    fn raises_initial_event_when_going_offline_without_documents() {
        let rooms = query("rooms");
        let (mut listener, events) = listener(&rooms, ListenOptions::default());
        let mut view = View::new(rooms.clone(), DocumentKeySet::new());
        let snap1 = apply(&mut view, &[]);

        assert!(!listener.on_online_state_changed(OnlineState::Online));
        assert!(!listener.on_view_snapshot(snap1.clone()));
        assert!(listener.on_online_state_changed(OnlineState::Offline));
        assert_eq!(snapshots(&events), vec![empty_offline_snapshot(&rooms, &snap1)]);
    }

    #[test]
    fn raises_initial_event_when_starting_offline_without_documents() {
        let rooms = query("rooms");
        let (mut listener, events) = listener(&rooms, ListenOptions::default());
        let mut view = View::new(rooms.clone(), DocumentKeySet::new());
        let snap1 = apply(&mut view, &[]);

        assert!(!listener.on_online_state_changed(OnlineState::Offline));
        assert!(listener.on_view_snapshot(snap1.clone()));
        assert_eq!(snapshots(&events), vec![empty_offline_snapshot(&rooms, &snap1)]);
    }

    #[test]
    fn listen_options_read_from_config() {
        let options: ListenOptions =
            serde_json::from_str(r#"{"includeDocumentMetadataChanges": true}"#).unwrap();
        assert_eq!(
            options,
            ListenOptions::new().include_document_metadata_changes(true)
        );
        assert_eq!(serde_json::from_str::<ListenOptions>("{}").unwrap(), ListenOptions::default());
    }
}
