//! Keys external writes must never patch into the cache.

use std::collections::BTreeSet;

use crate::cache::{ITEM_CACHE_KEY, OPTIONS_CACHE_KEY};
use crate::host::is_hidden_key;

/// Bookkeeping keys that are never field data: the cache's own records and
/// the host's edit-lock markers.
pub const BUILTIN_IGNORED_KEYS: [&str; 4] =
    [ITEM_CACHE_KEY, OPTIONS_CACHE_KEY, "_edit_lock", "_edit_last"];

#[derive(Debug, Clone)]
pub struct IgnoreList {
    keys: BTreeSet<String>,
}

impl IgnoreList {
    /// Built-in keys plus `extra`.
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: BTreeSet<String> =
            BUILTIN_IGNORED_KEYS.iter().map(|k| k.to_string()).collect();
        keys.extend(extra.into_iter().map(Into::into));
        Self { keys }
    }

    /// Listed keys and hidden (underscore-prefixed) keys are ignored.
    pub fn is_ignored(&self, key: &str) -> bool {
        is_hidden_key(key) || self.keys.contains(key)
    }
}

impl Default for IgnoreList {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}
