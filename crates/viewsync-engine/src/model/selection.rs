use super::mapping::{Bias, Mapping};
use super::node::Node;
use super::resolved::ResolvedPos;
use crate::ModelError;

/// A model selection: a text range (possibly collapsed) or a whole node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Text { anchor: usize, head: usize },
    Node { from: usize, to: usize },
}

impl Selection {
    pub fn caret(pos: usize) -> Self {
        Selection::Text {
            anchor: pos,
            head: pos,
        }
    }

    pub fn text(anchor: usize, head: usize) -> Self {
        Selection::Text { anchor, head }
    }

    /// Select the node that starts at `pos`.
    pub fn node(doc: &Node, pos: usize) -> Result<Self, ModelError> {
        let node = doc
            .resolve(pos)?
            .node_after()
            .ok_or(ModelError::PositionOutOfRange {
                pos,
                size: doc.content_size(),
            })?;
        Ok(Selection::Node {
            from: pos,
            to: pos + node.node_size(),
        })
    }

    pub fn anchor(&self) -> usize {
        match *self {
            Selection::Text { anchor, .. } => anchor,
            Selection::Node { from, .. } => from,
        }
    }

    pub fn head(&self) -> usize {
        match *self {
            Selection::Text { head, .. } => head,
            Selection::Node { to, .. } => to,
        }
    }

    pub fn from(&self) -> usize {
        self.anchor().min(self.head())
    }

    pub fn to(&self) -> usize {
        self.anchor().max(self.head())
    }

    pub fn is_empty(&self) -> bool {
        self.anchor() == self.head()
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Selection::Node { .. })
    }

    /// Nearest valid selection starting at `rp` and moving in `dir`.
    pub fn find_from(rp: &ResolvedPos, dir: Bias, text_only: bool) -> Option<Selection> {
        if rp.parent().is_textblock() {
            return Some(Selection::caret(rp.pos()));
        }
        if let Some(found) =
            find_selection_in(rp.parent(), rp.pos(), rp.index(rp.depth()), dir, text_only)
        {
            return Some(found);
        }
        (0..rp.depth()).rev().find_map(|depth| match dir {
            Bias::Backward => find_selection_in(
                rp.node(depth),
                rp.before(depth + 1),
                rp.index(depth),
                dir,
                text_only,
            ),
            Bias::Forward => find_selection_in(
                rp.node(depth),
                rp.after(depth + 1),
                rp.index(depth) + 1,
                dir,
                text_only,
            ),
        })
    }

    /// A selection near `rp`, trying `bias` first. Falls back to selecting
    /// the whole document when nothing is selectable.
    pub fn near(rp: &ResolvedPos, bias: Bias) -> Selection {
        Selection::find_from(rp, bias, false)
            .or_else(|| Selection::find_from(rp, bias.reverse(), false))
            .unwrap_or(Selection::Text {
                anchor: 0,
                head: rp.root().content_size(),
            })
    }

    /// A text selection between two resolved positions, moving either end
    /// into the nearest textblock when it does not sit in one.
    pub fn between(anchor: &ResolvedPos, head: &ResolvedPos, bias: Option<Bias>) -> Selection {
        let d_pos = anchor.pos() as isize - head.pos() as isize;
        let bias = match bias {
            Some(bias) if d_pos == 0 => bias,
            _ if d_pos >= 0 => Bias::Forward,
            _ => Bias::Backward,
        };
        let mut head_pos = head.pos();
        if !head.parent().is_textblock() {
            match Selection::find_from(head, bias, true)
                .or_else(|| Selection::find_from(head, bias.reverse(), true))
            {
                Some(found) => head_pos = found.head(),
                None => return Selection::near(head, bias),
            }
        }
        let mut anchor_pos = anchor.pos();
        if !anchor.parent().is_textblock() {
            if d_pos == 0 {
                anchor_pos = head_pos;
            } else {
                anchor_pos = Selection::find_from(anchor, bias.reverse(), true)
                    .or_else(|| Selection::find_from(anchor, bias, true))
                    .map_or(head_pos, |found| found.anchor());
                if (anchor_pos < head_pos) != (d_pos < 0) {
                    anchor_pos = head_pos;
                }
            }
        }
        Selection::text(anchor_pos, head_pos)
    }

    /// Map through `mapping` onto `doc`, the document the mapping produces.
    pub fn map(&self, doc: &Node, mapping: &Mapping) -> Result<Selection, ModelError> {
        let clamp = |pos: usize| pos.min(doc.content_size());
        match *self {
            Selection::Text { anchor, head } => {
                let rhead = doc.resolve(clamp(mapping.map_forward(head)))?;
                if !rhead.parent().is_textblock() {
                    return Ok(Selection::near(&rhead, Bias::Forward));
                }
                let ranchor = doc.resolve(clamp(mapping.map_forward(anchor)))?;
                let anchor = if ranchor.parent().is_textblock() {
                    ranchor.pos()
                } else {
                    rhead.pos()
                };
                Ok(Selection::text(anchor, rhead.pos()))
            }
            Selection::Node { from, .. } => {
                let rp = doc.resolve(clamp(mapping.map_forward(from)))?;
                if mapping.deletes(from, Bias::Forward) {
                    return Ok(Selection::near(&rp, Bias::Forward));
                }
                match rp.node_after() {
                    Some(node) if node.is_selectable() => Ok(Selection::Node {
                        from: rp.pos(),
                        to: rp.pos() + node.node_size(),
                    }),
                    _ => Ok(Selection::near(&rp, Bias::Forward)),
                }
            }
        }
    }
}

fn find_selection_in(
    node: &Node,
    pos: usize,
    index: usize,
    dir: Bias,
    text_only: bool,
) -> Option<Selection> {
    if node.is_textblock() {
        return Some(Selection::caret(pos));
    }
    let indices: Vec<usize> = match dir {
        Bias::Forward => (index..node.child_count()).collect(),
        Bias::Backward => (0..index).rev().collect(),
    };
    let mut pos = pos;
    for i in indices {
        let child = node.child(i);
        let size = child.node_size();
        if !child.is_leaf() {
            let inner = match dir {
                Bias::Forward => find_selection_in(child, pos + 1, 0, dir, text_only),
                Bias::Backward => {
                    find_selection_in(child, pos - 1, child.child_count(), dir, text_only)
                }
            };
            if inner.is_some() {
                return inner;
            }
        } else if !text_only && child.is_selectable() {
            let from = match dir {
                Bias::Forward => pos,
                Bias::Backward => pos - size,
            };
            return Some(Selection::Node {
                from,
                to: from + size,
            });
        }
        pos = match dir {
            Bias::Forward => pos + size,
            Bias::Backward => pos - size,
        };
    }
    None
}
