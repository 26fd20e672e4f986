//! # Collection Module
//!
//! Filterable, query-backed result sets.
//!
//! ## Collection Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.layout_update_collection()      fresh Select, join flags cleared   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  filter_by_theme(3)                 mutate the Select                  │
//! │  filter_by_store(1)                 (joins added at most once)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load()  ──► observers: <prefix>_load_before                           │
//! │       │      execute Select                                            │
//! │       │  ──► observers: <prefix>_load_after                            │
//! │       ▼                                                                 │
//! │  items() / delete_all()                                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Collections
//!
//! - [`LayoutUpdateCollection`](layout_update::LayoutUpdateCollection)

pub mod layout_update;
pub mod select;

use std::fmt;
use std::sync::Arc;

/// Point in the load cycle an event is emitted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Before,
    After,
}

impl LoadPhase {
    fn suffix(self) -> &'static str {
        match self {
            LoadPhase::Before => "load_before",
            LoadPhase::After => "load_after",
        }
    }
}

/// Event delivered to collection observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEvent {
    /// Collection event prefix, e.g. `layout_update_collection`.
    pub prefix: &'static str,
    pub phase: LoadPhase,
    /// Rows loaded; `0` before the query runs.
    pub item_count: usize,
}

impl CollectionEvent {
    /// Full event name, e.g. `layout_update_collection_load_after`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.prefix, self.phase.suffix())
    }
}

impl fmt::Display for CollectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} items)", self.name(), self.item_count)
    }
}

/// Receives collection load events.
///
/// Observers run inline on the loading task and cannot fail the load.
pub trait CollectionObserver: Send + Sync {
    fn on_event(&self, event: &CollectionEvent);
}

impl<F> CollectionObserver for F
where
    F: Fn(&CollectionEvent) + Send + Sync,
{
    fn on_event(&self, event: &CollectionEvent) {
        self(event)
    }
}

/// Ordered observer list owned by a collection.
#[derive(Clone, Default)]
pub struct Observers {
    observers: Vec<Arc<dyn CollectionObserver>>,
}

impl Observers {
    pub fn push(&mut self, observer: Arc<dyn CollectionObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Delivers `event` to every observer in registration order.
    pub fn dispatch(&self, event: &CollectionEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.observers.len())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_event_names() {
        let before = CollectionEvent {
            prefix: "layout_update_collection",
            phase: LoadPhase::Before,
            item_count: 0,
        };
        assert_eq!(before.name(), "layout_update_collection_load_before");

        let after = CollectionEvent {
            phase: LoadPhase::After,
            item_count: 4,
            ..before
        };
        assert_eq!(after.name(), "layout_update_collection_load_after");
        assert_eq!(after.to_string(), "layout_update_collection_load_after (4 items)");
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut observers = Observers::default();

        for tag in ["first", "second"] {
            let seen = seen.clone();
            observers.push(Arc::new(move |_: &CollectionEvent| {
                seen.lock().unwrap().push(tag);
            }));
        }

        observers.dispatch(&CollectionEvent {
            prefix: "layout_update_collection",
            phase: LoadPhase::Before,
            item_count: 0,
        });

        assert_eq!(observers.len(), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }
}
