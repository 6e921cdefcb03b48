use super::node::Node;
use crate::ModelError;

/// A normalised, immutable list of child nodes.
///
/// Adjacent text nodes with the same marks are merged and empty text nodes
/// are dropped on construction, so structurally equal content always has
/// the same child list.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    children: Vec<Node>,
    size: usize,
}

/// A child located by offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildAt<'a> {
    pub node: Option<&'a Node>,
    pub index: usize,
    pub offset: usize,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut children: Vec<Node> = Vec::new();
        for node in nodes {
            if node.is_text() && node.text_len() == 0 {
                continue;
            }
            match children.last_mut() {
                Some(last) if node.is_text() && last.is_text() && last.marks() == node.marks() => {
                    let merged = format!("{}{}", last.text_content(), node.text_content());
                    *last = Node::text(merged, node.marks().to_vec());
                }
                _ => children.push(node),
            }
        }
        let size = children.iter().map(Node::node_size).sum();
        Self { children, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> &Node {
        &self.children[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.children.iter()
    }

    /// Call `f` with every child and its start offset.
    pub fn for_each_child(&self, mut f: impl FnMut(&Node, usize)) {
        let mut pos = 0;
        for child in &self.children {
            f(child, pos);
            pos += child.node_size();
        }
    }

    pub fn to_vec(&self) -> Vec<Node> {
        self.children.clone()
    }

    /// The content between two offsets, cutting partially covered children.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to >= self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        let mut pos = 0;
        for child in &self.children {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from {
                let piece = if pos < from || end > to {
                    if child.is_text() {
                        child.cut(from.saturating_sub(pos), to - pos)
                    } else {
                        child.cut(from.saturating_sub(pos + 1), (to - pos).saturating_sub(1))
                    }
                } else {
                    child.clone()
                };
                result.push(piece);
            }
            pos = end;
        }
        Fragment::from_nodes(result)
    }

    /// Copy with the child at `index` replaced.
    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut children = self.children.clone();
        children[index] = node;
        Fragment::from_nodes(children)
    }

    /// Index of the child at `pos` and that child's start offset.
    ///
    /// With `round_up`, a position inside a child resolves to the index after
    /// it.
    pub fn find_index(&self, pos: usize, round_up: bool) -> Result<(usize, usize), ModelError> {
        if pos == 0 {
            return Ok((0, 0));
        }
        if pos == self.size {
            return Ok((self.children.len(), self.size));
        }
        if pos > self.size {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.size,
            });
        }
        let mut cur = 0;
        for (i, child) in self.children.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos || round_up {
                    return Ok((i + 1, end));
                }
                return Ok((i, cur));
            }
            cur = end;
        }
        Ok((self.children.len(), self.size))
    }

    pub fn child_after(&self, pos: usize) -> Result<ChildAt<'_>, ModelError> {
        let (index, offset) = self.find_index(pos, false)?;
        Ok(ChildAt {
            node: self.maybe_child(index),
            index,
            offset,
        })
    }

    pub fn child_before(&self, pos: usize) -> Result<ChildAt<'_>, ModelError> {
        if pos == 0 {
            return Ok(ChildAt {
                node: None,
                index: 0,
                offset: 0,
            });
        }
        let (index, offset) = self.find_index(pos, false)?;
        if offset < pos {
            return Ok(ChildAt {
                node: self.maybe_child(index),
                index,
                offset,
            });
        }
        let node = self.child(index - 1);
        Ok(ChildAt {
            node: Some(node),
            index: index - 1,
            offset: offset - node.node_size(),
        })
    }

    /// First position, counting from `pos`, where this fragment and `other`
    /// differ. `None` when they are identical.
    pub fn find_diff_start(&self, other: &Fragment, pos: usize) -> Option<usize> {
        let mut pos = pos;
        for i in 0.. {
            if i == self.child_count() || i == other.child_count() {
                return if self.child_count() == other.child_count() {
                    None
                } else {
                    Some(pos)
                };
            }
            let (a, b) = (self.child(i), other.child(i));
            if a.ptr_eq(b) {
                pos += a.node_size();
                continue;
            }
            if !a.same_markup(b) {
                return Some(pos);
            }
            if a.is_text() && a.text_content() != b.text_content() {
                let same = a
                    .text_content()
                    .chars()
                    .zip(b.text_content().chars())
                    .take_while(|(x, y)| x == y)
                    .count();
                return Some(pos + same);
            }
            if a.content_size() > 0 || b.content_size() > 0 {
                if let Some(inner) = a.content().find_diff_start(b.content(), pos + 1) {
                    return Some(inner);
                }
            }
            pos += a.node_size();
        }
        None
    }

    /// Last positions, scanning back from `pos_a` in this fragment and
    /// `pos_b` in `other`, where the two differ.
    pub fn find_diff_end(
        &self,
        other: &Fragment,
        pos_a: usize,
        pos_b: usize,
    ) -> Option<(usize, usize)> {
        let (mut pos_a, mut pos_b) = (pos_a, pos_b);
        let (mut i_a, mut i_b) = (self.child_count(), other.child_count());
        loop {
            if i_a == 0 || i_b == 0 {
                return if i_a == i_b { None } else { Some((pos_a, pos_b)) };
            }
            i_a -= 1;
            i_b -= 1;
            let (a, b) = (self.child(i_a), other.child(i_b));
            let size = a.node_size();
            if a.ptr_eq(b) {
                pos_a -= size;
                pos_b -= size;
                continue;
            }
            if !a.same_markup(b) {
                return Some((pos_a, pos_b));
            }
            if a.is_text() && a.text_content() != b.text_content() {
                let same = a
                    .text_content()
                    .chars()
                    .rev()
                    .zip(b.text_content().chars().rev())
                    .take_while(|(x, y)| x == y)
                    .count();
                return Some((pos_a - same, pos_b - same));
            }
            if a.content_size() > 0 || b.content_size() > 0 {
                if let Some(inner) = a.content().find_diff_end(b.content(), pos_a - 1, pos_b - 1) {
                    return Some(inner);
                }
            }
            pos_a -= size;
            pos_b -= size;
        }
    }
}

impl std::fmt::Debug for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.children.iter()).finish()
    }
}

impl From<Node> for Fragment {
    fn from(node: Node) -> Self {
        Fragment::from_nodes([node])
    }
}
