use super::mark::Mark;
use super::node::Node;
use crate::ModelError;

#[derive(Clone)]
struct PathEntry {
    node: Node,
    /// Index of the child the position points into or before.
    index: usize,
    /// Absolute position where that child starts.
    offset: usize,
}

/// A position resolved against a root node, with the full ancestor path.
///
/// Depth 0 is the root. `before`/`after` at depth 0 return the bounds of the
/// root's content.
#[derive(Clone)]
pub struct ResolvedPos {
    pos: usize,
    path: Vec<PathEntry>,
    parent_offset: usize,
}

impl Node {
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, ModelError> {
        if pos > self.content_size() {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.content_size(),
            });
        }
        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = self.clone();
        loop {
            let (index, offset) = node.content().find_index(parent_offset, false)?;
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node: node.clone(),
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            let child = node.child(index).clone();
            if child.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }
        Ok(ResolvedPos {
            pos,
            path,
            parent_offset,
        })
    }
}

impl ResolvedPos {
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth].node
    }

    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    pub fn root(&self) -> &Node {
        self.node(0)
    }

    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth() && self.text_offset() == 0 {
            index
        } else {
            index + 1
        }
    }

    /// Start of the content of the ancestor at `depth`.
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content_size()
    }

    /// Position directly before the ancestor at `depth`.
    pub fn before(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset
        }
    }

    /// Position directly after the ancestor at `depth`.
    pub fn after(&self, depth: usize) -> usize {
        if depth == 0 {
            self.root().content_size()
        } else if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset + self.node(depth).node_size()
        }
    }

    /// Offset into the text node the position points into, zero between
    /// nodes.
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let child = parent.maybe_child(index)?;
        let d_off = self.text_offset();
        if d_off > 0 {
            Some(child.cut(d_off, child.node_size()))
        } else {
            Some(child.clone())
        }
    }

    pub fn node_before(&self) -> Option<Node> {
        let index = self.index(self.depth());
        let d_off = self.text_offset();
        if d_off > 0 {
            return Some(self.parent().child(index).cut(0, d_off));
        }
        if index == 0 {
            None
        } else {
            Some(self.parent().child(index - 1).clone())
        }
    }

    /// Marks active at this position. Between two nodes the marks of the
    /// node before win unless `after` is set or there is no node before.
    pub fn marks(&self, after: bool) -> Vec<Mark> {
        let parent = self.parent();
        let index = self.index(self.depth());
        if parent.content_size() == 0 {
            return Vec::new();
        }
        if self.text_offset() > 0 {
            return parent.child(index).marks().to_vec();
        }
        let before = index.checked_sub(1).and_then(|i| parent.maybe_child(i));
        let next = parent.maybe_child(index);
        let main = match (before, next) {
            (Some(b), Some(n)) => {
                if after {
                    n
                } else {
                    b
                }
            }
            (Some(b), None) => b,
            (None, Some(n)) => n,
            (None, None) => return Vec::new(),
        };
        main.marks().to_vec()
    }

    /// Deepest depth whose node contains both this position and `pos`.
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|&depth| self.start(depth) <= pos && self.end(depth) >= pos)
            .unwrap_or(0)
    }

    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.pos - self.parent_offset == other.pos - other.parent_offset
    }
}

impl std::fmt::Debug for ResolvedPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path: Vec<String> = self
            .path
            .iter()
            .skip(1)
            .map(|entry| format!("{}_{}", entry.node.kind().name(), entry.index))
            .collect();
        write!(f, "{}:{}", path.join("/"), self.parent_offset)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::builders::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // blockquote spans 0..6, the second paragraph 6..10, the rule 10..11
    fn sample() -> crate::model::Node {
        doc([blockquote([p([text("ab")])]), p([text("cd")]), hr()])
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(2, 2, 0)]
    #[case(3, 2, 1)]
    #[case(5, 1, 4)]
    #[case(8, 1, 1)]
    #[case(11, 0, 11)]
    fn test_resolve_depth_and_offset(
        #[case] pos: usize,
        #[case] depth: usize,
        #[case] parent_offset: usize,
    ) {
        let rp = sample().resolve(pos).unwrap();

        assert_eq!(rp.depth(), depth);
        assert_eq!(rp.parent_offset(), parent_offset);
    }

    #[test]
    fn test_before_after_start_end() {
        let rp = sample().resolve(3).unwrap();

        assert_eq!(rp.start(2), 2);
        assert_eq!(rp.end(2), 4);
        assert_eq!(rp.before(1), 0);
        assert_eq!(rp.after(1), 6);
        assert_eq!(rp.before(2), 1);
        assert_eq!(rp.after(2), 5);
        assert_eq!(rp.before(3), 3);
    }

    #[test]
    fn test_nodes_around_position() {
        let rp = sample().resolve(3).unwrap();

        assert_eq!(rp.node_before(), Some(text("a")));
        assert_eq!(rp.node_after(), Some(text("b")));
        assert_eq!(rp.text_offset(), 1);
    }

    #[test]
    fn test_shared_depth_and_same_parent() {
        let d = sample();
        let a = d.resolve(2).unwrap();
        let b = d.resolve(4).unwrap();
        let c = d.resolve(8).unwrap();

        assert!(a.same_parent(&b));
        assert!(!a.same_parent(&c));
        assert_eq!(a.shared_depth(4), 2);
        assert_eq!(a.shared_depth(8), 0);
    }

    #[test]
    fn test_marks_prefer_node_before() {
        let d = doc([p([marked("ab", &["strong"]), text("cd")])]);
        let at_boundary = d.resolve(3).unwrap();

        assert_eq!(at_boundary.marks(false), vec![crate::model::Mark::new("strong")]);
        assert!(at_boundary.marks(true).is_empty());
    }

    #[test]
    fn test_resolve_out_of_range() {
        assert!(sample().resolve(12).is_err());
    }
}
