//! Storage for the search id that correlates consecutive searches.

use parking_lot::Mutex;

/// Single-slot key-value store for the current search id.
///
/// Implementations decide their own concurrency story; the client only ever
/// calls `set_search_id` once per search.
pub trait SessionStore: Send + Sync {
    /// Store the id of the latest search; `None` when the server sent none.
    fn set_search_id(&self, value: Option<&str>);

    fn search_id(&self) -> Option<String>;
}

/// Process-local [`SessionStore`].
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    search_id: Mutex<Option<String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn set_search_id(&self, value: Option<&str>) {
        *self.search_id.lock() = value.map(str::to_string);
    }

    fn search_id(&self) -> Option<String> {
        self.search_id.lock().clone()
    }
}
