use std::fmt::{Display, Formatter};

use crate::firestore::model::Timestamp;

/// The backend read time at which a document version was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotVersion {
    timestamp: Timestamp,
}

impl SnapshotVersion {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// The version of a document that has never been read from the backend.
    pub fn none() -> Self {
        Self::new(Timestamp::new(0, 0))
    }

    /// Convenience for tests and local bookkeeping that count versions as microseconds.
    pub fn from_micros(micros: i64) -> Self {
        Self::new(Timestamp::new(
            micros.div_euclid(1_000_000),
            (micros.rem_euclid(1_000_000) * 1_000) as i32,
        ))
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl Default for SnapshotVersion {
    fn default() -> Self {
        Self::none()
    }
}

impl Display for SnapshotVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SnapshotVersion({}, {})",
            self.timestamp.seconds, self.timestamp.nanos
        )
    }
}
