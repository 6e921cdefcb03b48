// Shared by several test files; each one only uses part of it.
#![allow(dead_code)]

use std::time::Duration;

use viewsync_engine::host::{
    ContentParser, EditorHooks, HookContext, HostNodeId, HostPoint, HostSelection,
    NodeDescriptor, ParseOutcome, ParseRequest, PresentationAdapter, SyntheticKey,
};
use viewsync_engine::{Bias, EditorSurface, Node, Selection, Snapshot, SyncConfig};

/// Points in the root container carry absolute document positions.
pub const ROOT: HostNodeId = HostNodeId(0);

const LEAF_BIT: u64 = 1 << 32;

pub type KeyHandler = Box<dyn FnMut(&mut HookContext, SyntheticKey) -> bool>;
pub type TextHandler = Box<dyn FnMut(&mut HookContext, usize, usize, &str) -> bool>;

/// An in-memory host.
///
/// `rendered` is what the host last drew from a snapshot and is what host
/// points are measured against. `dom` is the live host content that tests
/// mutate to simulate typing. Containers are identified by the position
/// where their content starts in `rendered`; leaves by their position with
/// `LEAF_BIT` set.
pub struct FakeHost {
    pub rendered: Node,
    pub dom: Node,
    pub selection: Option<HostSelection>,
    pub focused: bool,
    pub dirty: bool,
    pub resyncs: usize,
    pub redisplayed: Vec<(usize, usize)>,
    pub selection_writes: Vec<(usize, usize)>,
    pub node_highlight: Option<usize>,
    /// Mutation notifications not yet delivered as dirty ranges.
    pub queued: Vec<(usize, usize)>,
    /// Positions followed by content the host does not manage.
    pub foreign_after: Vec<usize>,
    pub keys_offered: Vec<SyntheticKey>,
    pub key_handler: Option<KeyHandler>,
    pub text_handler: Option<TextHandler>,
}

impl FakeHost {
    pub fn new(doc: Node) -> Self {
        Self {
            rendered: doc.clone(),
            dom: doc,
            selection: None,
            focused: true,
            dirty: false,
            resyncs: 0,
            redisplayed: Vec::new(),
            selection_writes: Vec::new(),
            node_highlight: None,
            queued: Vec::new(),
            foreign_after: Vec::new(),
            keys_offered: Vec::new(),
            key_handler: None,
            text_handler: None,
        }
    }

    pub fn caret(&mut self, pos: usize) {
        self.selection = Some(HostSelection::collapsed(HostPoint::new(ROOT, pos)));
    }

    pub fn select(&mut self, anchor: usize, head: usize) {
        self.selection = Some(HostSelection {
            anchor: HostPoint::new(ROOT, anchor),
            head: HostPoint::new(ROOT, head),
        });
    }

    /// Put the caret on the leaf node starting at `pos`.
    pub fn leaf_caret(&mut self, pos: usize) {
        let leaf = HostNodeId(LEAF_BIT | pos as u64);
        self.selection = Some(HostSelection::collapsed(HostPoint::new(leaf, 0)));
    }

    fn absolute(point: &HostPoint) -> usize {
        if point.node.0 & LEAF_BIT != 0 {
            (point.node.0 & !LEAF_BIT) as usize
        } else {
            point.node.0 as usize + point.offset
        }
    }

    fn container_path(&self, container: HostNodeId) -> Option<Vec<usize>> {
        let start = container.0 as usize;
        let rp = self.rendered.resolve(start).ok()?;
        if rp.start(rp.depth()) != start {
            return None;
        }
        Some((0..rp.depth()).map(|d| rp.index(d)).collect())
    }
}

fn node_at(doc: &Node, path: &[usize]) -> Option<Node> {
    let mut node = doc.clone();
    for &index in path {
        node = node.maybe_child(index)?.clone();
    }
    Some(node)
}

impl PresentationAdapter for FakeHost {
    fn host_point_at(&self, pos: usize, _bias: Bias) -> Option<HostPoint> {
        let rp = self.rendered.resolve(pos).ok()?;
        let container = HostNodeId(rp.start(rp.depth()) as u64);
        Some(HostPoint::new(container, rp.parent_offset()))
    }

    fn model_pos_at(&self, point: &HostPoint, _bias: Bias) -> Option<usize> {
        Some(Self::absolute(point))
    }

    fn nearest_addressable(&self, node: HostNodeId) -> Option<NodeDescriptor> {
        if node.0 & LEAF_BIT != 0 {
            let pos = (node.0 & !LEAF_BIT) as usize;
            let leaf = self.rendered.resolve(pos).ok()?.node_after()?;
            return Some(NodeDescriptor {
                pos_at_start: pos,
                size: leaf.node_size(),
                node: Some(leaf),
            });
        }
        if node == ROOT {
            return Some(NodeDescriptor {
                pos_at_start: 0,
                size: self.rendered.content_size(),
                node: Some(self.rendered.clone()),
            });
        }
        let container = node_at(&self.rendered, &self.container_path(node)?)?;
        Some(NodeDescriptor {
            pos_at_start: node.0 as usize - 1,
            size: container.node_size(),
            node: Some(container),
        })
    }

    fn is_foreign(&self, _node: HostNodeId) -> bool {
        false
    }

    fn foreign_content_after(&self, point: &HostPoint) -> bool {
        self.foreign_after.contains(&Self::absolute(point))
    }

    fn mark_needs_redisplay(&mut self, from: usize, to: usize) {
        self.dirty = true;
        self.redisplayed.push((from, to));
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn host_selection(&self) -> Option<HostSelection> {
        self.selection
    }

    fn set_host_selection(&mut self, anchor: usize, head: usize) {
        self.select(anchor, head);
        self.selection_writes.push((anchor, head));
    }

    fn sync_node_selection(&mut self, selected: Option<usize>) {
        self.node_highlight = selected;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn resync(&mut self, snapshot: &Snapshot) {
        self.rendered = snapshot.doc().clone();
        self.dom = snapshot.doc().clone();
        self.dirty = false;
        self.resyncs += 1;
    }

    fn take_dirty_ranges(&mut self) -> Vec<(usize, usize)> {
        std::mem::take(&mut self.queued)
    }
}

impl ContentParser for FakeHost {
    fn parse(&self, container: HostNodeId, request: &ParseRequest) -> ParseOutcome {
        let path = self.container_path(container);
        let rendered = path.as_deref().and_then(|path| node_at(&self.rendered, path));
        let live = path.as_deref().and_then(|path| node_at(&self.dom, path));
        let (Some(rendered), Some(live)) = (rendered, live) else {
            return ParseOutcome {
                node: request.top.clone(),
                found: vec![None; request.find_targets.len()],
            };
        };

        // the container grew or shrank by however much the host content did
        let grown = live.content_size() as isize - rendered.content_size() as isize;
        let to = (request.to_offset as isize + grown).max(request.from_offset as isize) as usize;
        let to = to.min(live.content_size());
        let content = live.content().cut(request.from_offset, to);

        let start = container.0 as usize + request.from_offset;
        let end = container.0 as usize + to;
        let found = request
            .find_targets
            .iter()
            .map(|point| {
                let pos = Self::absolute(point);
                (start..=end).contains(&pos).then(|| pos - start)
            })
            .collect();
        ParseOutcome {
            node: request.top.copy(content),
            found,
        }
    }
}

impl EditorHooks for FakeHost {
    fn handle_key_down(&mut self, ctx: &mut HookContext, key: SyntheticKey) -> bool {
        self.keys_offered.push(key);
        match &mut self.key_handler {
            Some(handler) => handler(ctx, key),
            None => false,
        }
    }

    fn handle_text_input(&mut self, ctx: &mut HookContext, from: usize, to: usize, text: &str) -> bool {
        match &mut self.text_handler {
            Some(handler) => handler(ctx, from, to, text),
            None => false,
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// A focused surface showing `doc`.
pub fn surface_with(doc: Node, selection: Selection, config: SyncConfig) -> EditorSurface<FakeHost> {
    init_logging();
    let state = Snapshot::new(doc.clone(), selection);
    let mut surface = EditorSurface::new(FakeHost::new(doc), state, config);
    surface.on_focus();
    surface
}

pub fn surface(doc: Node, selection: Selection) -> EditorSurface<FakeHost> {
    surface_with(doc, selection, SyncConfig::default())
}
