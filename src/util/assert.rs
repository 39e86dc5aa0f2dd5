use once_cell::sync::Lazy;

use crate::logger::Logger;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("@firebase/firestore"));

/// Checks an internal invariant.
///
/// Debug builds panic with an `INTERNAL ASSERT FAILED` message. Release builds log the message
/// at warn level and return `false`, letting the caller skip the offending input instead of
/// corrupting state.
pub fn hard_assert(condition: bool, message: impl AsRef<str>) -> bool {
    if condition {
        return true;
    }
    let message = assertion_error(message);
    if cfg!(debug_assertions) {
        panic!("{message}");
    }
    LOGGER.warn(&message);
    false
}

/// Build the message used for failed internal assertions.
pub fn assertion_error(message: impl AsRef<str>) -> String {
    format!(
        "FIRESTORE ({}) INTERNAL ASSERT FAILED: {}",
        env!("CARGO_PKG_VERSION"),
        message.as_ref()
    )
}
