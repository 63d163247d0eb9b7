//! Invalidation notifications
//!
//! Host-originated scene events reach the controller as [`HostEvent`]s; the
//! controller turns them into [`Outliner::invalidate`] calls, which notify the
//! listeners registered on the outliner's [`InvalidationBus`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::outliner::Outliner;

/// Handle returned when registering a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

type Listener = Box<dyn FnMut(&Outliner) + Send>;

/// Listeners notified when an outliner becomes obsolete
#[derive(Default)]
pub struct InvalidationBus {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for InvalidationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidationBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl InvalidationBus {
    /// Register a listener
    pub fn subscribe(&mut self, listener: impl FnMut(&Outliner) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener, returning whether it was registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Call every listener in registration order
    pub(crate) fn notify(&mut self, outliner: &Outliner) {
        for (_, listener) in &mut self.listeners {
            listener(outliner);
        }
    }
}

/// Scene events raised by the host application
///
/// Each one makes the current outliner obsolete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEvent {
    NewModel,
    OpenModel,
    ActivateModel,
    LayerChanged,
    LayerRemoved,
    LayersFolderChanged,
    LayersFolderRemoved,
    RemoveAllLayers,
    SelectionBulkChange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsubscribe() {
        let mut bus = InvalidationBus::default();
        let first = bus.subscribe(|_| {});
        let second = bus.subscribe(|_| {});
        assert_ne!(first, second);
        assert_eq!(bus.len(), 2);

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_host_event_names() {
        let event: HostEvent = serde_json::from_str("\"layers_folder_removed\"").unwrap();
        assert_eq!(event, HostEvent::LayersFolderRemoved);
        assert_eq!(
            serde_json::to_string(&HostEvent::SelectionBulkChange).unwrap(),
            "\"selection_bulk_change\""
        );
    }
}
