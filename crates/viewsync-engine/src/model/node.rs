use std::fmt;
use std::sync::Arc;

use super::fragment::Fragment;
use super::mark::Mark;

/// The node types understood by the reference model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading { level: u8 },
    Blockquote,
    HorizontalRule,
    Image { src: String },
    HardBreak,
    Text,
}

/// What a node accepts as children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Blocks,
    Inline,
    Nothing,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::Blockquote => "blockquote",
            NodeKind::HorizontalRule => "horizontal_rule",
            NodeKind::Image { .. } => "image",
            NodeKind::HardBreak => "hard_break",
            NodeKind::Text => "text",
        }
    }

    pub fn content_class(&self) -> ContentClass {
        match self {
            NodeKind::Doc | NodeKind::Blockquote => ContentClass::Blocks,
            NodeKind::Paragraph | NodeKind::Heading { .. } => ContentClass::Inline,
            _ => ContentClass::Nothing,
        }
    }

    pub fn is_textblock(&self) -> bool {
        self.content_class() == ContentClass::Inline
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text | NodeKind::Image { .. } | NodeKind::HardBreak
        )
    }

    pub fn is_leaf(&self) -> bool {
        self.content_class() == ContentClass::Nothing
    }

    /// Whether a node of this kind can be the target of a node selection.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, NodeKind::Doc | NodeKind::Text | NodeKind::HardBreak)
    }

    /// Whether `child` may appear in this node's content.
    pub fn allows(&self, child: &NodeKind) -> bool {
        match self.content_class() {
            ContentClass::Blocks => !child.is_inline(),
            ContentClass::Inline => child.is_inline(),
            ContentClass::Nothing => false,
        }
    }

    /// Whether content of `other` could be joined onto a node of this kind.
    pub fn compatible_content(&self, other: &NodeKind) -> bool {
        self == other
            || (self.content_class() == other.content_class()
                && self.content_class() != ContentClass::Nothing)
    }
}

struct NodeData {
    kind: NodeKind,
    content: Fragment,
    text: String,
    text_len: usize,
    marks: Vec<Mark>,
}

/// An immutable, cheaply clonable document node.
///
/// Sizes follow the usual token counting: a text node counts one unit per
/// character, a leaf counts one, and any other node counts its content plus
/// an opening and a closing token.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub fn new(kind: NodeKind, content: Fragment, marks: Vec<Mark>) -> Self {
        Node(Arc::new(NodeData {
            kind,
            content,
            text: String::new(),
            text_len: 0,
            marks,
        }))
    }

    pub fn branch(kind: NodeKind, children: impl IntoIterator<Item = Node>) -> Self {
        Self::new(kind, Fragment::from_nodes(children), Vec::new())
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Self::new(kind, Fragment::empty(), Vec::new())
    }

    pub fn text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        let text = text.into();
        let text_len = text.chars().count();
        Node(Arc::new(NodeData {
            kind: NodeKind::Text,
            content: Fragment::empty(),
            text,
            text_len,
            marks,
        }))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub fn content(&self) -> &Fragment {
        &self.0.content
    }

    pub fn marks(&self) -> &[Mark] {
        &self.0.marks
    }

    /// Text of a text node, empty for every other kind.
    pub fn text_content(&self) -> &str {
        &self.0.text
    }

    pub fn text_len(&self) -> usize {
        self.0.text_len
    }

    pub fn is_text(&self) -> bool {
        self.0.kind == NodeKind::Text
    }

    pub fn is_textblock(&self) -> bool {
        self.0.kind.is_textblock()
    }

    pub fn is_inline(&self) -> bool {
        self.0.kind.is_inline()
    }

    pub fn is_leaf(&self) -> bool {
        self.0.kind.is_leaf()
    }

    /// Leaf nodes other than text.
    pub fn is_atom(&self) -> bool {
        self.is_leaf() && !self.is_text()
    }

    pub fn is_selectable(&self) -> bool {
        self.0.kind.is_selectable()
    }

    pub fn node_size(&self) -> usize {
        if self.is_text() {
            self.0.text_len
        } else if self.is_leaf() {
            1
        } else {
            self.0.content.size() + 2
        }
    }

    pub fn content_size(&self) -> usize {
        self.0.content.size()
    }

    pub fn child_count(&self) -> usize {
        self.0.content.child_count()
    }

    pub fn child(&self, index: usize) -> &Node {
        self.0.content.child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.0.content.maybe_child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.0.content.first_child()
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Same kind and marks, ignoring content.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.0.kind == other.0.kind && self.0.marks == other.0.marks
    }

    /// A node with the same markup and different content.
    pub fn copy(&self, content: Fragment) -> Node {
        Node::new(self.0.kind.clone(), content, self.0.marks.clone())
    }

    /// A node with the same kind and content and a different mark set.
    pub fn with_marks(&self, marks: Vec<Mark>) -> Node {
        if self.is_text() {
            Node::text(self.0.text.clone(), marks)
        } else {
            Node::new(self.0.kind.clone(), self.0.content.clone(), marks)
        }
    }

    /// Cut the node down to the content between `from` and `to`.
    pub fn cut(&self, from: usize, to: usize) -> Node {
        if self.is_text() {
            let to = to.min(self.0.text_len);
            if from == 0 && to == self.0.text_len {
                return self.clone();
            }
            return Node::text(char_slice(&self.0.text, from, to), self.0.marks.clone());
        }
        let to = to.min(self.content_size());
        if from == 0 && to == self.content_size() {
            return self.clone();
        }
        self.copy(self.0.content.cut(from, to))
    }

    /// Concatenated text of the inline content between two content offsets.
    pub fn text_between(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        self.0.content.for_each_child(|child, pos| {
            let end = pos + child.node_size();
            if child.is_text() && end > from && pos < to {
                let start = from.saturating_sub(pos);
                let stop = (to - pos).min(child.text_len());
                out.push_str(char_slice(child.text_content(), start, stop));
            } else if !child.is_leaf() && end > from && pos < to {
                let inner_from = from.saturating_sub(pos + 1);
                let inner_to = (to - pos - 1).min(child.content_size());
                out.push_str(&child.text_between(inner_from, inner_to));
            }
        });
        out
    }

    /// Check this node's content against its kind and return it.
    pub(crate) fn checked(self) -> Result<Node, crate::ModelError> {
        let kind = self.kind();
        if self.0.content.iter().all(|child| kind.allows(child.kind())) {
            Ok(self)
        } else {
            Err(crate::ModelError::InvalidContent(kind.name()))
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.ptr_eq(other)
            || (self.same_markup(other)
                && self.0.text == other.0.text
                && self.0.content == other.0.content)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut closing = 0;
        for mark in self.marks() {
            write!(f, "{mark:?}(")?;
            closing += 1;
        }
        match self.kind() {
            NodeKind::Text => write!(f, "{:?}", self.0.text)?,
            kind if kind.is_leaf() => f.write_str(kind.name())?,
            kind => {
                write!(f, "{}(", kind.name())?;
                for (i, child) in self.0.content.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child:?}")?;
                }
                f.write_str(")")?;
            }
        }
        for _ in 0..closing {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Slice a string by character offsets.
pub(crate) fn char_slice(s: &str, from: usize, to: usize) -> &str {
    let mut indices = s.char_indices().map(|(i, _)| i).chain(std::iter::once(s.len()));
    let start = indices.nth(from).unwrap_or(s.len());
    let end = if to > from {
        indices.nth(to - from - 1).unwrap_or(s.len())
    } else {
        start
    };
    &s[start..end]
}
