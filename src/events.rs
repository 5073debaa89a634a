//! Typed document-unit event bus.
//!
//! A closed event union with a discriminant-keyed subscription table:
//! delivery is synchronous, in subscription order, to every handler
//! registered for the event's exact kind, and completes before the
//! triggering use case returns.

use crate::tree::HierarchyNode;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Events published by the use-case layer.
#[derive(Debug, Clone)]
pub enum DocUnitEvent {
    HierarchyLoaded {
        unit_id: String,
        root: HierarchyNode,
    },
    HierarchyUpdated {
        unit_id: String,
        root: HierarchyNode,
        /// Minimal set of node ids an operation reports as affected,
        /// used for incremental UI refresh.
        changed_node_ids: Vec<String>,
    },
    HierarchySelectionChanged {
        unit_id: String,
        primary_node_id: Option<String>,
        selected_node_ids: Vec<String>,
    },
    DocUnitListUpdated {
        unit_ids: Vec<String>,
    },
    ActiveDocUnitChanged {
        unit_id: Option<String>,
    },
    ProjectDirtyStateChanged {
        is_dirty: bool,
    },
}

/// Subscription key: one discriminant per event variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    HierarchyLoaded,
    HierarchyUpdated,
    HierarchySelectionChanged,
    DocUnitListUpdated,
    ActiveDocUnitChanged,
    ProjectDirtyStateChanged,
}

impl DocUnitEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DocUnitEvent::HierarchyLoaded { .. } => EventKind::HierarchyLoaded,
            DocUnitEvent::HierarchyUpdated { .. } => EventKind::HierarchyUpdated,
            DocUnitEvent::HierarchySelectionChanged { .. } => EventKind::HierarchySelectionChanged,
            DocUnitEvent::DocUnitListUpdated { .. } => EventKind::DocUnitListUpdated,
            DocUnitEvent::ActiveDocUnitChanged { .. } => EventKind::ActiveDocUnitChanged,
            DocUnitEvent::ProjectDirtyStateChanged { .. } => EventKind::ProjectDirtyStateChanged,
        }
    }
}

type Handler = Arc<dyn Fn(&DocUnitEvent) + Send + Sync>;

/// Publish/subscribe bus decoupling orchestration from presentation.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&DocUnitEvent) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .entry(kind)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Deliver `event` to every handler registered for its kind.
    ///
    /// The handler list is snapshotted before delivery, so a panicking
    /// subscriber cannot corrupt the registry and handlers may subscribe
    /// re-entrantly without deadlocking the table lock.
    pub fn publish(&self, event: &DocUnitEvent) {
        let snapshot: Vec<Handler> = self
            .handlers
            .read()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();
        for handler in snapshot {
            handler(event);
        }
    }
}
