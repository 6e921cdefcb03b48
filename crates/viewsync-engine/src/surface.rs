use std::time::Duration;

use viewsync_config::SyncConfig;

use crate::ReconcileError;
use crate::drag::Dragging;
use crate::host::Host;
use crate::model::{EditChannel, SelectionOrigin, Snapshot, Transaction};
use crate::pending::{OpenChange, PendingChange};
use crate::reconcile::{Reconciled, read_change};
use crate::selection_sync::{SelectionReader, read_from_host, selection_to_host};
use crate::timer::{TimerHandle, TimerQueue, TimerTask};

/// One editable presentation surface: the live snapshot, the host showing
/// it, and the machinery keeping the two in step.
///
/// All host events enter through the `on_*` methods. Time only moves
/// through [`EditorSurface::advance`].
pub struct EditorSurface<H: Host> {
    pub(crate) host: H,
    pub(crate) state: Snapshot,
    pub(crate) channel: EditChannel,
    pub(crate) timers: TimerQueue,
    pub(crate) pending: PendingChange,
    pub(crate) selection: SelectionReader,
    pub(crate) config: SyncConfig,
    pub(crate) editable: bool,
    pub(crate) focused: bool,
    pub(crate) dragging: Option<Dragging>,
    last_transaction: Option<Transaction>,
}

impl<H: Host> EditorSurface<H> {
    pub fn new(host: H, state: Snapshot, config: SyncConfig) -> Self {
        Self::with_channel(host, state, EditChannel::new(), config)
    }

    /// A surface publishing its edits on an existing channel.
    pub fn with_channel(host: H, state: Snapshot, channel: EditChannel, config: SyncConfig) -> Self {
        let selection = SelectionReader::new(&config, state.selection());
        Self {
            host,
            state,
            channel,
            timers: TimerQueue::new(),
            pending: PendingChange::Idle,
            selection,
            config,
            editable: true,
            focused: false,
            dragging: None,
            last_transaction: None,
        }
    }

    pub fn state(&self) -> &Snapshot {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn channel(&self) -> &EditChannel {
        &self.channel
    }

    pub fn pending(&self) -> &PendingChange {
        &self.pending
    }

    pub fn selection_reader(&self) -> &SelectionReader {
        &self.selection
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// The most recent transaction applied through this surface.
    pub fn last_transaction(&self) -> Option<&Transaction> {
        self.last_transaction.as_ref()
    }

    fn start_change(&mut self, composing: bool) {
        self.pending = std::mem::take(&mut self.pending).start(
            composing,
            &self.state,
            &self.channel,
            &mut self.timers,
            &self.config,
        );
    }

    /// The host reported that `from..to` may no longer match the model.
    pub fn on_dirty(&mut self, from: usize, to: usize) {
        if !self.editable {
            return;
        }
        log::trace!("dirty range {}..{}", from, to);
        self.start_change(false);
        self.pending.add_range(from, to);
    }

    pub fn on_input(&mut self) {
        if self.editable {
            self.start_change(false);
        }
    }

    pub fn on_composition_start(&mut self) {
        if !self.editable {
            return;
        }
        self.start_change(true);
        if self.state.stored_marks().is_some() {
            self.finish(true);
        }
    }

    pub fn on_composition_update(&mut self) {
        self.on_composition_start();
    }

    /// A composition ended. Without a pending change, one is only opened
    /// when the event carries data.
    pub fn on_composition_end(&mut self, data: &str) {
        if !self.editable {
            return;
        }
        if !self.pending.is_open() {
            if data.is_empty() {
                return;
            }
            self.start_change(true);
        }
        self.pending.composition_end(&mut self.timers, &self.config);
    }

    pub fn on_key_down(&mut self) {
        if !self.editable || self.pending.is_open() {
            return;
        }
        self.selection.poll(None, &mut self.timers);
    }

    pub fn on_pointer_down(&mut self) {
        if self.pending.is_open() {
            self.finish(true);
        }
        self.selection
            .poll(Some(SelectionOrigin::Pointer), &mut self.timers);
    }

    pub fn on_focus(&mut self) {
        self.focused = true;
        if self.selection.start(self.host.has_focus(), &mut self.timers) {
            self.read_selection(None);
        }
    }

    pub fn on_blur(&mut self) {
        self.focused = false;
        if self.editable {
            self.selection.stop(&mut self.timers);
        }
    }

    /// The host hinted that its selection may have changed.
    pub fn on_selection_change(&mut self) {
        if let Some(origin) = self.selection.on_signal(self.timers.now()) {
            self.read_selection(origin);
        }
    }

    pub fn set_editable(&mut self, editable: bool) {
        if editable == self.editable {
            return;
        }
        self.editable = editable;
        let has_focus = self.host.has_focus();
        if self
            .selection
            .editable_changed(editable, has_focus, &mut self.timers)
        {
            self.read_selection(None);
        }
    }

    /// Advance the clock by `elapsed`, firing due timers in deadline order.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.timers.now() + elapsed;
        while let Some((handle, task)) = self.timers.pop_due(until) {
            self.run_task(handle, task);
        }
        self.timers.advance_to(until);
    }

    fn run_task(&mut self, handle: TimerHandle, task: TimerTask) {
        match task {
            TimerTask::SettleChange(id) => {
                let current = self.pending.open_change().map(|change| change.id);
                if current == Some(id) {
                    self.finish(false);
                }
            }
            TimerTask::PollSelection(origin) => {
                if let Some(origin) = self.selection.poll_fired(
                    handle,
                    origin,
                    self.focused,
                    self.editable,
                    &mut self.timers,
                ) {
                    self.read_selection(origin);
                }
            }
        }
    }

    /// Settle any open change now, composing or not.
    pub fn flush(&mut self) {
        self.finish(true);
    }

    fn finish(&mut self, force: bool) {
        let (next, taken) = std::mem::take(&mut self.pending).settle(force, &mut self.timers);
        self.pending = next;
        if let Some(change) = taken {
            self.settle_change(change);
            self.pending = PendingChange::Idle;
        }
    }

    fn settle_change(&mut self, change: OpenChange) {
        let id = change.id;
        let range = match change.changed_range() {
            Ok(range) => range,
            Err(err) => {
                log::warn!("pending change {} has an invalid range: {}", id, err);
                self.host.resync(&self.state);
                return;
            }
        };
        let redisplay = change.range.unwrap_or(range);
        self.host.mark_needs_redisplay(redisplay.from, redisplay.to);

        let mapping = change.ledger().get_mapping(&self.state);
        let origin = change.origin.clone();
        drop(change);

        match mapping {
            None => log::debug!("pending change {}: {}", id, ReconcileError::StaleMapping),
            Some(mapping) => {
                match read_change(&mut self.host, &self.state, &mapping, &origin, range) {
                    Ok(Reconciled::Unchanged) => {
                        log::trace!("pending change {} left the document unchanged", id);
                    }
                    Ok(Reconciled::Dispatch(tr)) => self.dispatch(tr),
                    Ok(Reconciled::HandedOff(transactions)) => {
                        for tr in transactions {
                            self.dispatch(tr);
                        }
                    }
                    Err(err) => log::warn!("reconciling pending change {} failed: {}", id, err),
                }
            }
        }

        if self.host.is_dirty() {
            log::debug!("resyncing host after pending change {}", id);
            self.update_state(self.state.clone());
        }
    }

    /// Apply `tr` to the live snapshot and bring the host up to date.
    pub fn dispatch(&mut self, tr: Transaction) {
        match self.channel.apply(&self.state, &tr) {
            Ok(next) => {
                self.last_transaction = Some(tr);
                self.update_state(next);
            }
            Err(err) => log::warn!("dropping transaction: {}", err),
        }
    }

    /// Replace the live snapshot. The host is left alone while a change is
    /// open, since its content is ahead of the model.
    pub fn update_state(&mut self, state: Snapshot) {
        let prev = std::mem::replace(&mut self.state, state);
        if self.pending.is_open() {
            return;
        }
        let update_doc = !prev.doc().ptr_eq(self.state.doc()) || self.host.is_dirty();
        let update_selection = update_doc
            || prev.selection() != self.state.selection()
            || self.selection.host_changed(&self.host);
        if update_selection {
            if update_doc {
                self.host.resync(&self.state);
            }
            selection_to_host(
                &mut self.host,
                &mut self.selection,
                self.state.selection(),
                false,
            );
        }
    }

    /// Write the model selection into the host, even if it lacks focus.
    pub fn focus(&mut self) {
        selection_to_host(
            &mut self.host,
            &mut self.selection,
            self.state.selection(),
            true,
        );
    }

    /// Read the host selection back into the model.
    pub fn read_selection(&mut self, origin: Option<SelectionOrigin>) {
        if !self.pending.is_open() {
            for (from, to) in self.host.take_dirty_ranges() {
                self.on_dirty(from, to);
            }
        }
        if self.pending.is_open() {
            return;
        }
        if let Some(tr) = read_from_host(&self.host, &self.state, &mut self.selection, origin) {
            self.dispatch(tr);
        }
    }
}

impl<H: Host + std::fmt::Debug> std::fmt::Debug for EditorSurface<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSurface")
            .field("host", &self.host)
            .field("state", &self.state)
            .field("pending", &self.pending)
            .field("editable", &self.editable)
            .field("focused", &self.focused)
            .finish()
    }
}
