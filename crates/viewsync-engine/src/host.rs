//! Contracts the host environment implements for the engine.
//!
//! The engine never touches the presentation tree directly. It talks to a
//! [`PresentationAdapter`] for positions, dirtiness and selection, to a
//! [`ContentParser`] to read host content back into the model, and offers
//! [`EditorHooks`] the chance to take over edits it recognises.

use crate::model::{Bias, Node, Snapshot, Transaction};

/// Opaque identity of a node in the presentation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostNodeId(pub u64);

/// A location in the presentation tree: a node and an offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPoint {
    pub node: HostNodeId,
    pub offset: usize,
}

impl HostPoint {
    pub fn new(node: HostNodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// The host's live selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSelection {
    pub anchor: HostPoint,
    pub head: HostPoint,
}

impl HostSelection {
    pub fn collapsed(point: HostPoint) -> Self {
        Self {
            anchor: point,
            head: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }
}

/// The nearest part of the presentation tree that corresponds to document
/// content.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescriptor {
    pub pos_at_start: usize,
    /// Zero for parts of the tree outside the document.
    pub size: usize,
    /// The nearest model node at or above the described host node.
    pub node: Option<Node>,
}

/// A single host container covering a model range, with the range's
/// offsets inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSpan {
    pub container: HostNodeId,
    pub from_offset: usize,
    pub to_offset: usize,
}

pub trait PresentationAdapter {
    fn host_point_at(&self, pos: usize, bias: Bias) -> Option<HostPoint>;

    fn model_pos_at(&self, point: &HostPoint, bias: Bias) -> Option<usize>;

    fn nearest_addressable(&self, node: HostNodeId) -> Option<NodeDescriptor>;

    /// Regions the engine must never parse, such as widgets.
    fn is_foreign(&self, node: HostNodeId) -> bool;

    /// Whether content the adapter does not manage follows `point` before
    /// the next managed node.
    fn foreign_content_after(&self, point: &HostPoint) -> bool;

    fn mark_needs_redisplay(&mut self, from: usize, to: usize);

    fn is_dirty(&self) -> bool;

    fn host_selection(&self) -> Option<HostSelection>;

    fn set_host_selection(&mut self, anchor: usize, head: usize);

    /// Highlight (or clear, with `None`) the node selected at a position.
    fn sync_node_selection(&mut self, _selected: Option<usize>) {}

    fn has_focus(&self) -> bool;

    /// Re-render from `snapshot`, clearing any dirty state.
    fn resync(&mut self, snapshot: &Snapshot);

    /// Queued mutation notifications not yet delivered as dirty ranges.
    fn take_dirty_ranges(&mut self) -> Vec<(usize, usize)> {
        Vec::new()
    }

    /// The one container spanning `from..to`, or `None` when the range
    /// crosses a boundary that cannot be addressed as a unit.
    fn container_spanning(&self, from: usize, to: usize) -> Option<HostSpan> {
        let start = self.host_point_at(from, Bias::Backward)?;
        let end = self.host_point_at(to, Bias::Forward)?;
        if start.node != end.node || self.is_foreign(start.node) {
            return None;
        }
        if self.foreign_content_after(&end) {
            return None;
        }
        Some(HostSpan {
            container: start.node,
            from_offset: start.offset,
            to_offset: end.offset,
        })
    }
}

/// What to parse and where to look for the selection.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    /// Node whose markup wraps the parsed content.
    pub top: Node,
    /// Child index in the old parent where parsing starts.
    pub top_start: usize,
    pub from_offset: usize,
    pub to_offset: usize,
    /// Host points whose model positions should be reported.
    pub find_targets: Vec<HostPoint>,
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// `top` with the parsed content.
    pub node: Node,
    /// Position of each find target relative to the start of the parsed
    /// content, `None` when it fell outside.
    pub found: Vec<Option<usize>>,
}

pub trait ContentParser {
    /// Best-effort parse of `container` between the requested offsets.
    /// Malformed content must degrade, not fail.
    fn parse(&self, container: HostNodeId, request: &ParseRequest) -> ParseOutcome;
}

/// Key presses the engine synthesises when a change looks like one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticKey {
    Enter,
    Backspace,
}

impl SyntheticKey {
    pub fn name(self) -> &'static str {
        match self {
            SyntheticKey::Enter => "Enter",
            SyntheticKey::Backspace => "Backspace",
        }
    }
}

/// The live state handed to a hook, plus a place for the hook to queue its
/// own transactions.
#[derive(Debug)]
pub struct HookContext {
    pub state: Snapshot,
    pub dispatched: Vec<Transaction>,
}

impl HookContext {
    pub fn new(state: Snapshot) -> Self {
        Self {
            state,
            dispatched: Vec::new(),
        }
    }

    pub fn dispatch(&mut self, tr: Transaction) {
        self.dispatched.push(tr);
    }
}

/// Override points. Returning `true` accepts the event; the engine then
/// builds no edit of its own and dispatches whatever the hook queued.
pub trait EditorHooks {
    fn handle_key_down(&mut self, _ctx: &mut HookContext, _key: SyntheticKey) -> bool {
        false
    }

    fn handle_text_input(
        &mut self,
        _ctx: &mut HookContext,
        _from: usize,
        _to: usize,
        _text: &str,
    ) -> bool {
        false
    }
}

/// Everything an editor surface needs from its host.
pub trait Host: PresentationAdapter + ContentParser + EditorHooks {}

impl<T: PresentationAdapter + ContentParser + EditorHooks> Host for T {}
