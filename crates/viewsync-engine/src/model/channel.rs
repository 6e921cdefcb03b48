//! Publish/subscribe fan-out of applied edits.
//!
//! Every snapshot transition produced through [`EditChannel::apply`] is
//! published to all live listeners. Listeners are held weakly, so a listener
//! that is dropped without unsubscribing simply stops receiving edits.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::mapping::Mapping;
use super::state::{Snapshot, Transaction};
use crate::ModelError;

/// Receives every `(old, transformation, new)` triple published on a channel.
///
/// `mapping` is `None` for transitions that did not change the document.
pub trait EditListener {
    fn on_edit(&mut self, old: &Snapshot, mapping: Option<&Mapping>, new: &Snapshot);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Weak<RefCell<dyn EditListener>>)>,
}

/// The edit-broadcast channel shared by a document's producers and
/// observers. Cloning yields another handle to the same channel.
#[derive(Clone, Default)]
pub struct EditChannel {
    registry: Rc<RefCell<Registry>>,
}

impl EditChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Weak<RefCell<dyn EditListener>>) -> SubscriptionId {
        let mut registry = self.registry.borrow_mut();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.push((id, listener));
        id
    }

    /// Remove a subscription. Returns whether it was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.listeners.len();
        registry.listeners.retain(|(sub, _)| *sub != id);
        registry.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .borrow()
            .listeners
            .iter()
            .filter(|(_, listener)| listener.strong_count() > 0)
            .count()
    }

    pub fn publish(&self, old: &Snapshot, mapping: Option<&Mapping>, new: &Snapshot) {
        let live: Vec<Rc<RefCell<dyn EditListener>>> = {
            let mut registry = self.registry.borrow_mut();
            registry.listeners.retain(|(_, listener)| listener.strong_count() > 0);
            registry
                .listeners
                .iter()
                .filter_map(|(_, listener)| listener.upgrade())
                .collect()
        };
        for listener in live {
            listener.borrow_mut().on_edit(old, mapping, new);
        }
    }

    /// Apply `tr` to `state` and publish the transition.
    pub fn apply(&self, state: &Snapshot, tr: &Transaction) -> Result<Snapshot, ModelError> {
        let next = state.apply(tr)?;
        let mapping = tr.doc_changed().then(|| tr.mapping());
        self.publish(state, mapping, &next);
        Ok(next)
    }
}
