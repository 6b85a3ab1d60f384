//! Wall-clock access for record timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as Unix seconds.
///
/// Clamps to 0 if the system clock reads before the epoch.
pub(crate) fn now_unix() -> i64 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    i64::try_from(secs).unwrap_or(i64::MAX)
}
