//! Keeps the host selection and the model selection in step.
//!
//! Hosts offer no reliable "selection changed" notification, so the reader
//! polls: either on a host-level hint signal while focused, or on a
//! recurring timer. Reads compare the host selection against the last one
//! stored and only resolve a model selection when it moved.

use std::time::Duration;

use viewsync_config::{SelectionStrategy, SyncConfig};

use crate::host::{HostSelection, PresentationAdapter};
use crate::model::{Bias, Selection, SelectionOrigin, Snapshot, Transaction};
use crate::timer::{TimerHandle, TimerQueue, TimerTask};

#[derive(Debug, Clone, PartialEq)]
enum Poller {
    /// Reads on the host's selection hint while listening. The origin of the
    /// most recent `poll` applies for a short window.
    Event {
        listening: bool,
        origin: Option<(Option<SelectionOrigin>, Duration)>,
    },
    /// Reads on a recurring timer.
    Timer { polling: Option<TimerHandle> },
}

#[derive(Debug)]
pub struct SelectionReader {
    last_host: Option<HostSelection>,
    last_selection: Option<Selection>,
    poller: Poller,
    interval: Duration,
    origin_window: Duration,
}

impl SelectionReader {
    pub fn new(config: &SyncConfig, selection: Selection) -> Self {
        let poller = match config.selection_strategy {
            SelectionStrategy::Event => Poller::Event {
                listening: false,
                origin: None,
            },
            SelectionStrategy::Timer => Poller::Timer { polling: None },
        };
        Self {
            last_host: None,
            last_selection: Some(selection),
            poller,
            interval: config.poll_interval(),
            origin_window: config.origin_window(),
        }
    }

    pub fn last_selection(&self) -> Option<Selection> {
        self.last_selection
    }

    pub fn is_active(&self) -> bool {
        match &self.poller {
            Poller::Event { listening, .. } => *listening,
            Poller::Timer { polling } => polling.is_some(),
        }
    }

    /// Whether the host selection differs from the one last stored.
    pub fn host_changed<A: PresentationAdapter + ?Sized>(&self, adapter: &A) -> bool {
        adapter.host_selection() != self.last_host
    }

    pub fn store<A: PresentationAdapter + ?Sized>(
        &mut self,
        adapter: &A,
        selection: Option<Selection>,
    ) {
        self.last_host = adapter.host_selection();
        self.last_selection = selection;
    }

    /// Request a read tagged with `origin`.
    pub fn poll(&mut self, origin: Option<SelectionOrigin>, timers: &mut TimerQueue) {
        match &mut self.poller {
            Poller::Event { origin: current, .. } => {
                *current = Some((origin, timers.now()));
            }
            Poller::Timer { polling } => {
                if let Some(handle) = polling.take() {
                    timers.cancel(handle);
                }
                *polling = Some(timers.arm(Duration::ZERO, TimerTask::PollSelection(origin)));
            }
        }
    }

    /// Start polling. Returns true when the caller should read right away.
    pub fn start(&mut self, has_focus: bool, timers: &mut TimerQueue) -> bool {
        match &mut self.poller {
            Poller::Event { listening, .. } => {
                if *listening {
                    return false;
                }
                *listening = true;
                has_focus
            }
            Poller::Timer { polling } => {
                if polling.is_none() {
                    self.poll(None, timers);
                }
                false
            }
        }
    }

    pub fn stop(&mut self, timers: &mut TimerQueue) {
        match &mut self.poller {
            Poller::Event { listening, .. } => *listening = false,
            Poller::Timer { polling } => {
                if let Some(handle) = polling.take() {
                    timers.cancel(handle);
                }
            }
        }
    }

    /// The host hinted that its selection may have changed. Returns the
    /// origin to read with, or `None` when not listening.
    pub fn on_signal(&self, now: Duration) -> Option<Option<SelectionOrigin>> {
        match &self.poller {
            Poller::Event {
                listening: true,
                origin,
            } => Some(match origin {
                Some((origin, at)) if now < *at + self.origin_window => *origin,
                _ => None,
            }),
            _ => None,
        }
    }

    /// A poll timer fired. Re-arms while focused or not editable and
    /// returns the origin to read with; otherwise polling lapses.
    pub fn poll_fired(
        &mut self,
        handle: TimerHandle,
        origin: Option<SelectionOrigin>,
        focused: bool,
        editable: bool,
        timers: &mut TimerQueue,
    ) -> Option<Option<SelectionOrigin>> {
        let interval = self.interval;
        let Poller::Timer { polling } = &mut self.poller else {
            return None;
        };
        if *polling != Some(handle) {
            return None;
        }
        if focused || !editable {
            *polling = Some(timers.arm(interval, TimerTask::PollSelection(None)));
            Some(origin)
        } else {
            *polling = None;
            None
        }
    }

    /// Keep polling while the surface is read-only so the selection stays
    /// observable without focus. Returns true when the caller should read
    /// right away.
    pub fn editable_changed(
        &mut self,
        editable: bool,
        has_focus: bool,
        timers: &mut TimerQueue,
    ) -> bool {
        if !editable {
            self.start(has_focus, timers)
        } else {
            if !has_focus {
                self.stop(timers);
            }
            false
        }
    }
}

/// Resolve the host selection to a model selection. Returns a
/// selection-only transaction when it differs from the selection of
/// `state`.
pub fn read_from_host<A: PresentationAdapter + ?Sized>(
    adapter: &A,
    state: &Snapshot,
    reader: &mut SelectionReader,
    origin: Option<SelectionOrigin>,
) -> Option<Transaction> {
    if !adapter.has_focus() || !reader.host_changed(adapter) {
        return None;
    }
    let host = adapter.host_selection()?;
    let doc = state.doc();
    let descriptor = adapter
        .nearest_addressable(host.head.node)
        .filter(|descriptor| descriptor.size > 0);
    let Some(descriptor) = descriptor else {
        // outside the document
        reader.store(adapter, None);
        return None;
    };
    let rhead = doc
        .resolve(adapter.model_pos_at(&host.head, Bias::Forward)?)
        .ok()?;

    let mut node_selection = None;
    let ranchor = if host.is_collapsed() {
        if let Some(node) = &descriptor.node {
            if node.is_leaf() && node.is_selectable() {
                node_selection = Selection::node(doc, descriptor.pos_at_start).ok();
            }
        }
        rhead.clone()
    } else {
        doc.resolve(adapter.model_pos_at(&host.anchor, Bias::Forward)?)
            .ok()?
    };

    let selection = node_selection.unwrap_or_else(|| {
        let bias = if state.selection().head() < rhead.pos() {
            Bias::Forward
        } else {
            Bias::Backward
        };
        let selection = Selection::between(&ranchor, &rhead, Some(bias));
        if bias == Bias::Backward && selection.is_node() {
            Selection::between(&ranchor, &rhead, Some(Bias::Forward))
        } else {
            selection
        }
    });

    if rhead.pos() == selection.head() && ranchor.pos() == selection.anchor() {
        reader.store(adapter, Some(selection));
    }
    if state.selection() == selection {
        return None;
    }
    log::trace!("host selection moved to {:?} (origin {:?})", selection, origin);
    let mut tr = state.tr();
    tr.set_selection(selection);
    if origin == Some(SelectionOrigin::Pointer) {
        tr.set_origin(SelectionOrigin::Pointer);
    }
    Some(tr)
}

/// Push `selection` into the host unless it is already there.
pub fn selection_to_host<A: PresentationAdapter + ?Sized>(
    adapter: &mut A,
    reader: &mut SelectionReader,
    selection: Selection,
    take_focus: bool,
) {
    adapter.sync_node_selection(selection.is_node().then(|| selection.from()));
    if !adapter.has_focus() && !take_focus {
        return;
    }
    if reader.last_selection == Some(selection) && !reader.host_changed(adapter) {
        return;
    }
    adapter.set_host_selection(selection.anchor(), selection.head());
    reader.store(adapter, Some(selection));
}
