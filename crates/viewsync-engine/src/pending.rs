//! The debounced change aggregator.
//!
//! Host mutation notifications arrive in bursts, one per affected node. A
//! [`PendingChange`] collects them into one dirty range and settles once,
//! after a short delay, when a composition ends, or when forced.
//!
//! ```text
//! Idle --start--> Open { composing } --settle--> Settling --> Idle
//!                   |  ^
//!                   +--+ start(composing) upgrades in place
//! ```

use uuid::Uuid;
use viewsync_config::SyncConfig;

use crate::ModelError;
use crate::ledger::MappingLedger;
use crate::model::{EditChannel, Node, ResolvedPos, Selection, Snapshot};
use crate::timer::{TimerHandle, TimerQueue, TimerTask};

/// Bounds of a provisionally dirty span. Only ever widens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRange {
    pub from: usize,
    pub to: usize,
}

impl ChangeRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn widen(&mut self, from: usize, to: usize) {
        self.from = self.from.min(from);
        self.to = self.to.max(to);
    }
}

/// An open change: the snapshot the host was showing when it started, what
/// has been reported dirty since, and the ledger tracking edits applied
/// meanwhile.
#[derive(Debug)]
pub struct OpenChange {
    pub id: Uuid,
    pub origin: Snapshot,
    pub range: Option<ChangeRange>,
    pub composing: bool,
    ledger: MappingLedger,
    timer: Option<TimerHandle>,
}

impl OpenChange {
    pub fn ledger(&self) -> &MappingLedger {
        &self.ledger
    }

    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    /// The range to re-read, widened to whole nodes at the depth shared by
    /// both ends. Without a recorded range it is derived from the selection.
    pub fn changed_range(&self) -> Result<ChangeRange, ModelError> {
        let doc = self.origin.doc();
        let selection = self.origin.selection();
        let Some(range) = self.range else {
            return range_around_selection(doc, &selection);
        };
        let from = doc.resolve(range.from.min(selection.from()))?;
        let to = doc.resolve(range.to)?;
        let shared = from.shared_depth(range.to);
        Ok(ChangeRange::new(from.before(shared + 1), to.after(shared + 1)))
    }
}

#[derive(Debug, Default)]
pub enum PendingChange {
    #[default]
    Idle,
    Open(OpenChange),
    /// The change was taken for reconciliation and no longer accepts input.
    Settling,
}

impl PendingChange {
    pub fn is_open(&self) -> bool {
        matches!(self, PendingChange::Open(_))
    }

    pub fn open_change(&self) -> Option<&OpenChange> {
        match self {
            PendingChange::Open(change) => Some(change),
            _ => None,
        }
    }

    pub fn is_composing(&self) -> bool {
        self.open_change().is_some_and(|change| change.composing)
    }

    /// Open a change bound to `state`, or upgrade the open one when a
    /// composition starts.
    pub fn start(
        self,
        composing: bool,
        state: &Snapshot,
        channel: &EditChannel,
        timers: &mut TimerQueue,
        config: &SyncConfig,
    ) -> Self {
        match self {
            PendingChange::Open(mut change) => {
                if composing {
                    if let Some(timer) = change.timer.take() {
                        timers.cancel(timer);
                    }
                    if !change.composing {
                        log::debug!("pending change {} upgraded to composing", change.id);
                    }
                    change.composing = true;
                }
                PendingChange::Open(change)
            }
            PendingChange::Idle | PendingChange::Settling => {
                let id = Uuid::new_v4();
                let timer = (!composing)
                    .then(|| timers.arm(config.settle_delay(), TimerTask::SettleChange(id)));
                log::debug!("opened pending change {} (composing: {})", id, composing);
                PendingChange::Open(OpenChange {
                    id,
                    origin: state.clone(),
                    range: None,
                    composing,
                    ledger: MappingLedger::create(state, channel, config.ledger_capacity),
                    timer,
                })
            }
        }
    }

    /// Widen the dirty range. Leaves the settle timer alone.
    pub fn add_range(&mut self, from: usize, to: usize) {
        if let PendingChange::Open(change) = self {
            match &mut change.range {
                Some(range) => range.widen(from, to),
                None => change.range = Some(ChangeRange::new(from, to)),
            }
        }
    }

    /// Leave composition mode and settle after the grace window, in case
    /// another composition follows straight away.
    pub fn composition_end(&mut self, timers: &mut TimerQueue, config: &SyncConfig) {
        if let PendingChange::Open(change) = self {
            if change.composing {
                change.composing = false;
                change.timer = Some(timers.arm(
                    config.composition_grace(),
                    TimerTask::SettleChange(change.id),
                ));
                log::debug!("composition ended for pending change {}", change.id);
            }
        }
    }

    /// Take the open change for reconciliation. A composing change is only
    /// taken when `force` is set; otherwise it stays open with its timer
    /// cancelled.
    pub fn settle(self, force: bool, timers: &mut TimerQueue) -> (Self, Option<OpenChange>) {
        match self {
            PendingChange::Open(mut change) => {
                if let Some(timer) = change.timer.take() {
                    timers.cancel(timer);
                }
                if change.composing && !force {
                    return (PendingChange::Open(change), None);
                }
                log::debug!("settling pending change {} (forced: {})", change.id, force);
                (PendingChange::Settling, Some(change))
            }
            other => (other, None),
        }
    }
}

/// A range around `selection` that is safe to re-parse: whole inline nodes
/// inside one textblock, or whole blocks with one extra sibling on each
/// side the selection touches.
pub fn range_around_selection(
    doc: &Node,
    selection: &Selection,
) -> Result<ChangeRange, ModelError> {
    let from = doc.resolve(selection.from())?;
    let to = doc.resolve(selection.to())?;

    if from.same_parent(&to)
        && from.parent().is_textblock()
        && from.parent_offset() > 0
        && to.parent_offset() < to.parent().content_size()
    {
        let parent = from.parent();
        let size = parent.content_size();
        let mut start_off = from.parent_offset();
        let mut end_off = to.parent_offset().min(size);
        if start_off > 0 {
            start_off = parent.content().child_before(start_off)?.offset;
        }
        if end_off < size {
            let after = parent.content().child_after(end_off)?;
            end_off = after.offset + after.node.map_or(0, Node::node_size);
        }
        let node_start = from.start(from.depth());
        return Ok(ChangeRange::new(node_start + start_off, node_start + end_off));
    }

    for depth in 0..=from.depth().min(to.depth()) {
        let from_start = is_at_start(&from, depth + 1);
        let to_end = is_at_end(&to, depth + 1);
        if from_start
            || to_end
            || from.index(depth) != to.index(depth)
            || to.node(depth).is_textblock()
        {
            let mut start = from.before(depth + 1);
            let mut end = to.after(depth + 1);
            if from_start && from.index(depth) > 0 {
                start -= from.node(depth).child(from.index(depth) - 1).node_size();
            }
            if to_end && to.index(depth) + 1 < to.node(depth).child_count() {
                end += to.node(depth).child(to.index(depth) + 1).node_size();
            }
            return Ok(ChangeRange::new(start, end));
        }
    }
    Ok(ChangeRange::new(0, doc.content_size()))
}

fn is_at_start(rp: &ResolvedPos, depth: usize) -> bool {
    (depth..rp.depth()).all(|d| rp.index(d) == 0) && rp.parent_offset() == 0
}

fn is_at_end(rp: &ResolvedPos, depth: usize) -> bool {
    (depth..rp.depth()).all(|d| rp.index(d) + 1 >= rp.node(d).child_count())
        && rp.parent_offset() == rp.parent().content_size()
}
