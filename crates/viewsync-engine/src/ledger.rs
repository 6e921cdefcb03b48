//! Mapping ledger: answers "how do positions captured against snapshot S
//! translate to the snapshot I hold now?"
//!
//! A ledger subscribes to an [`EditChannel`] and records every transition
//! whose old snapshot it has already seen, forming a chain rooted at the
//! snapshot it was created for.

use std::cell::RefCell;
use std::rc::Rc;

use crate::model::{EditChannel, EditListener, Mapping, Snapshot, SubscriptionId};

/// Records kept before a ledger stops tracking.
pub const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug)]
struct LedgerRecord {
    previous: Option<usize>,
    /// `None` for transitions that did not move any position.
    transformation: Option<Mapping>,
    snapshot: Snapshot,
}

#[derive(Debug)]
struct LedgerLog {
    records: Vec<LedgerRecord>,
    capacity: usize,
    overflowed: bool,
}

impl LedgerLog {
    fn find(&self, snapshot: &Snapshot) -> Option<usize> {
        self.records
            .iter()
            .rposition(|record| record.snapshot.same(snapshot))
    }
}

impl EditListener for LedgerLog {
    fn on_edit(&mut self, old: &Snapshot, mapping: Option<&Mapping>, new: &Snapshot) {
        if self.records.len() >= self.capacity {
            if !self.overflowed {
                log::debug!(
                    "mapping ledger reached {} records, ignoring further edits",
                    self.capacity
                );
                self.overflowed = true;
            }
            return;
        }
        if let Some(previous) = self.find(old) {
            self.records.push(LedgerRecord {
                previous: Some(previous),
                transformation: mapping.cloned(),
                snapshot: new.clone(),
            });
        }
    }
}

/// A live subscription tracking mappings from its root snapshot.
///
/// Dropping the ledger (or calling [`MappingLedger::destroy`]) removes its
/// subscription.
pub struct MappingLedger {
    log: Rc<RefCell<LedgerLog>>,
    channel: EditChannel,
    subscription: SubscriptionId,
}

impl MappingLedger {
    pub fn create(root: &Snapshot, channel: &EditChannel, capacity: usize) -> Self {
        let log = Rc::new(RefCell::new(LedgerLog {
            records: vec![LedgerRecord {
                previous: None,
                transformation: None,
                snapshot: root.clone(),
            }],
            capacity,
            overflowed: false,
        }));
        let listener: Rc<RefCell<dyn EditListener>> = log.clone();
        let subscription = channel.subscribe(Rc::downgrade(&listener));
        Self {
            log,
            channel: channel.clone(),
            subscription,
        }
    }

    pub fn root(&self) -> Snapshot {
        self.log.borrow().records[0].snapshot.clone()
    }

    pub fn len(&self) -> usize {
        self.log.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compose the transformations from the root to `target`, or `None` if
    /// `target` was never observed.
    pub fn get_mapping(&self, target: &Snapshot) -> Option<Mapping> {
        let log = self.log.borrow();
        let found = log.find(target)?;
        let mut chain = Vec::new();
        let mut cursor = Some(found);
        while let Some(index) = cursor {
            let record = &log.records[index];
            if let Some(mapping) = &record.transformation {
                chain.push(mapping);
            }
            cursor = record.previous;
        }
        let mut result = Mapping::new();
        for mapping in chain.into_iter().rev() {
            result.append(mapping);
        }
        Some(result)
    }

    /// Stop tracking. Equivalent to dropping the ledger.
    pub fn destroy(self) {}
}

impl Drop for MappingLedger {
    fn drop(&mut self) {
        self.channel.unsubscribe(self.subscription);
    }
}

impl std::fmt::Debug for MappingLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingLedger")
            .field("records", &self.len())
            .field("subscription", &self.subscription)
            .finish()
    }
}
