use serde::{Deserialize, Serialize};

/// The client's best guess about whether it can reach the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlineState {
    /// No connection attempt has settled yet.
    #[default]
    Unknown,
    Online,
    /// Connection attempts failed; results may only come from cache.
    Offline,
}
