//! Terse constructors for documents, used by tests and host parsers.

use super::mark::{Mark, mark_set};
use super::node::{Node, NodeKind};

pub fn doc(children: impl IntoIterator<Item = Node>) -> Node {
    Node::branch(NodeKind::Doc, children)
}

pub fn p(children: impl IntoIterator<Item = Node>) -> Node {
    Node::branch(NodeKind::Paragraph, children)
}

pub fn h(level: u8, children: impl IntoIterator<Item = Node>) -> Node {
    Node::branch(NodeKind::Heading { level }, children)
}

pub fn blockquote(children: impl IntoIterator<Item = Node>) -> Node {
    Node::branch(NodeKind::Blockquote, children)
}

pub fn hr() -> Node {
    Node::leaf(NodeKind::HorizontalRule)
}

pub fn img(src: &str) -> Node {
    Node::leaf(NodeKind::Image {
        src: src.to_string(),
    })
}

pub fn br() -> Node {
    Node::leaf(NodeKind::HardBreak)
}

pub fn text(s: &str) -> Node {
    Node::text(s, Vec::new())
}

/// A text node carrying the named marks.
pub fn marked(s: &str, marks: &[&str]) -> Node {
    Node::text(s, mark_set(marks.iter().map(|name| Mark::new(*name))))
}
