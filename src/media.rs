//! The shared upload list: media the user picked during this app session.
//! Append-only, in memory only — deliberately lost on process exit.

use log::debug;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

/// An opaque reference to a piece of user-selected media (a URI string;
/// nothing here interprets it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef(pub String);

#[derive(Default)]
pub struct MediaLibrary {
    items: Mutex<Vec<MediaRef>>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reference. No dedup: picking the same media twice lists it
    /// twice.
    pub fn add(&self, uri: &str) {
        debug!("media added: {uri}");
        self.lock_items().push(MediaRef(uri.to_string()));
    }

    /// Snapshot of the list in insertion order.
    pub fn all(&self) -> Vec<MediaRef> {
        self.lock_items().clone()
    }

    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_items().is_empty()
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<MediaRef>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let library = MediaLibrary::new();
        assert!(library.is_empty());
        assert_eq!(library.all(), Vec::<MediaRef>::new());
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let library = MediaLibrary::new();
        library.add("content://video/1");
        library.add("content://video/2");
        library.add("content://video/3");

        let items = library.all();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], MediaRef("content://video/1".to_string()));
        assert_eq!(items[2], MediaRef("content://video/3".to_string()));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let library = MediaLibrary::new();
        library.add("content://video/1");
        library.add("content://video/1");
        assert_eq!(library.len(), 2);
    }
}
