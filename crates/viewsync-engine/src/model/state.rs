use std::sync::Arc;

use super::fragment::Fragment;
use super::mapping::{Mapping, StepMap};
use super::mark::Mark;
use super::node::Node;
use super::replace::Slice;
use super::selection::Selection;
use crate::ModelError;

/// Tag attached to selection-only transactions read back from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    Pointer,
}

#[derive(Debug)]
struct EditorState {
    doc: Node,
    selection: Selection,
    stored_marks: Option<Vec<Mark>>,
}

/// An immutable editor state.
///
/// Snapshots compare by identity: two snapshots are the same only when they
/// are clones of one value, even if their contents are equal.
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<EditorState>);

impl Snapshot {
    pub fn new(doc: Node, selection: Selection) -> Self {
        Snapshot(Arc::new(EditorState {
            doc,
            selection,
            stored_marks: None,
        }))
    }

    pub fn doc(&self) -> &Node {
        &self.0.doc
    }

    pub fn selection(&self) -> Selection {
        self.0.selection
    }

    /// Marks to apply to the next typed character, if any were set.
    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.0.stored_marks.as_deref()
    }

    pub fn same(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Start a transaction on this snapshot.
    pub fn tr(&self) -> Transaction {
        Transaction {
            before: self.clone(),
            doc: self.0.doc.clone(),
            mapping: Mapping::new(),
            selection: None,
            stored_marks: None,
            origin: None,
            scroll: false,
            doc_changed: false,
        }
    }

    /// Produce the next snapshot. The old selection is mapped through the
    /// transaction when none was set explicitly.
    pub fn apply(&self, tr: &Transaction) -> Result<Snapshot, ModelError> {
        if !tr.before.same(self) {
            return Err(ModelError::MismatchedTransaction);
        }
        let selection = match tr.selection {
            Some(selection) => selection,
            None => self.0.selection.map(&tr.doc, &tr.mapping)?,
        };
        let stored_marks = match &tr.stored_marks {
            Some(marks) => marks.clone(),
            None if tr.selection.is_some() || tr.doc_changed => None,
            None => self.0.stored_marks.clone(),
        };
        Ok(Snapshot(Arc::new(EditorState {
            doc: tr.doc.clone(),
            selection,
            stored_marks,
        })))
    }
}

/// An edit under construction, accumulating steps against one snapshot.
#[derive(Debug, Clone)]
pub struct Transaction {
    before: Snapshot,
    doc: Node,
    mapping: Mapping,
    selection: Option<Selection>,
    stored_marks: Option<Option<Vec<Mark>>>,
    origin: Option<SelectionOrigin>,
    scroll: bool,
    doc_changed: bool,
}

impl Transaction {
    pub fn before(&self) -> &Snapshot {
        &self.before
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn stored_marks(&self) -> Option<Option<&[Mark]>> {
        self.stored_marks.as_ref().map(|marks| marks.as_deref())
    }

    pub fn origin(&self) -> Option<SelectionOrigin> {
        self.origin
    }

    pub fn scrolled_into_view(&self) -> bool {
        self.scroll
    }

    pub fn doc_changed(&self) -> bool {
        self.doc_changed
    }

    pub fn replace(&mut self, from: usize, to: usize, slice: Slice) -> Result<&mut Self, ModelError> {
        let doc = self.doc.replace(from, to, &slice)?;
        if let Some(step) = StepMap::replace(self.doc.content_size(), from, to, slice.size()) {
            self.mapping.push(step);
        }
        self.doc = doc;
        self.doc_changed = true;
        Ok(self)
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, ModelError> {
        self.replace(from, to, Slice::empty())
    }

    /// Replace `from..to` with `text`, carrying the marks active at `from`
    /// unless stored marks are set.
    pub fn insert_text(&mut self, text: &str, from: usize, to: usize) -> Result<&mut Self, ModelError> {
        if text.is_empty() {
            return self.delete(from, to);
        }
        let marks = match (&self.stored_marks, self.before.stored_marks()) {
            (Some(Some(marks)), _) => marks.clone(),
            (None, Some(marks)) => marks.to_vec(),
            _ => {
                let rfrom = self.doc.resolve(from)?;
                match rfrom.node_after() {
                    Some(after) if to > from && after.is_inline() => after.marks().to_vec(),
                    _ => rfrom.marks(false),
                }
            }
        };
        self.replace(from, to, Slice::new(Fragment::from(Node::text(text, marks)), 0, 0))
    }

    pub fn add_mark(&mut self, from: usize, to: usize, mark: &Mark) -> &mut Self {
        self.doc = map_inline_marks(&self.doc, 0, from, to, &|marks| mark.add_to_set(marks));
        self.doc_changed = true;
        self
    }

    pub fn remove_mark(&mut self, from: usize, to: usize, mark: &Mark) -> &mut Self {
        self.doc = map_inline_marks(&self.doc, 0, from, to, &|marks| mark.remove_from_set(marks));
        self.doc_changed = true;
        self
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = Some(selection);
        self
    }

    pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
        self.stored_marks = Some(marks);
        self
    }

    pub fn set_origin(&mut self, origin: SelectionOrigin) -> &mut Self {
        self.origin = Some(origin);
        self
    }

    pub fn scroll_into_view(&mut self) -> &mut Self {
        self.scroll = true;
        self
    }
}

/// Rewrite the marks of inline content overlapping `from..to`. `start` is
/// the absolute position where `node`'s content begins.
fn map_inline_marks(
    node: &Node,
    start: usize,
    from: usize,
    to: usize,
    update: &dyn Fn(&[Mark]) -> Vec<Mark>,
) -> Node {
    let mut children = Vec::with_capacity(node.child_count());
    let mut pos = start;
    for child in node.content().iter() {
        let end = pos + child.node_size();
        if end <= from || pos >= to {
            children.push(child.clone());
        } else if child.is_inline() {
            let lo = from.max(pos) - pos;
            let hi = to.min(end) - pos;
            if child.is_text() {
                children.push(child.cut(0, lo));
                let middle = child.cut(lo, hi);
                children.push(middle.with_marks(update(middle.marks())));
                children.push(child.cut(hi, child.node_size()));
            } else {
                children.push(child.with_marks(update(child.marks())));
            }
        } else if !child.is_leaf() {
            children.push(map_inline_marks(child, pos + 1, from, to, update));
        } else {
            children.push(child.clone());
        }
        pos = end;
    }
    node.copy(Fragment::from_nodes(children))
}
