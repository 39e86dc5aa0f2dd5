//! Builders shared by the crate's unit tests.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::firestore::collection::DocumentKeySet;
use crate::firestore::core::{Query, TargetChange};
use crate::firestore::model::{Document, DocumentKey, MaybeDocument, SnapshotVersion};
use crate::firestore::value::{FirestoreValue, MapValue};

pub fn key(path: &str) -> DocumentKey {
    DocumentKey::from_string(path).unwrap()
}

/// A synced document at `path` whose version is `version` microseconds past the epoch.
pub fn doc(path: &str, version: i64, fields: &[(&str, FirestoreValue)]) -> Document {
    let data: MapValue = fields
        .iter()
        .map(|(name, value)| (*name, value.clone()))
        .collect();
    Document::new(key(path), SnapshotVersion::from_micros(version), data)
}

pub fn deleted_doc(path: &str, version: i64) -> MaybeDocument {
    MaybeDocument::NoDocument {
        key: key(path),
        version: SnapshotVersion::from_micros(version),
    }
}

pub fn doc_updates(docs: &[MaybeDocument]) -> BTreeMap<DocumentKey, MaybeDocument> {
    docs.iter()
        .map(|doc| (doc.key().clone(), doc.clone()))
        .collect()
}

pub fn key_set(docs: &[&Document]) -> DocumentKeySet {
    docs.iter().map(|doc| doc.key().clone()).collect()
}

/// A current target change that reports `docs` as added.
pub fn ack_target(docs: &[&Document]) -> TargetChange {
    target_change(true, docs)
}

pub fn target_change(current: bool, added: &[&Document]) -> TargetChange {
    TargetChange::new(
        Bytes::new(),
        current,
        key_set(added),
        DocumentKeySet::new(),
        DocumentKeySet::new(),
    )
}

pub fn query(path: &str) -> Query {
    Query::from_path(path).unwrap()
}

pub fn map(fields: &[(&str, FirestoreValue)]) -> FirestoreValue {
    FirestoreValue::from_map_value(
        fields
            .iter()
            .map(|(name, value)| (*name, value.clone()))
            .collect(),
    )
}
