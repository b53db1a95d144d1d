//! Deduplicated pipeline warnings.
//!
//! Tolerated misuse (an unrecognized paint shape, a lease dropped without
//! being released, an automatic layout that gave up) is reported once per
//! unique message instead of once per frame.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about tolerated misuse (emits once per unique message).
///
/// Returns `true` if the warning was emitted, `false` if it had already been
/// reported.
///
/// # Example
/// ```ignore
/// warn_once("Paint", "unrecognized paint token 'context-fill', passing through");
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let should_emit = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_emit {
        tracing::warn!(component, "{message}");
    }
    should_emit
}

/// Clear all recorded warnings (call when tearing down a surface)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
