use super::fragment::Fragment;
use super::node::Node;
use super::resolved::ResolvedPos;
use crate::ModelError;

/// A piece of document content, possibly open (cut through) at either side.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Slice {
    pub content: Fragment,
    pub open_start: usize,
    pub open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of positions the slice occupies once inserted.
    pub fn size(&self) -> usize {
        self.content.size() - self.open_start - self.open_end
    }
}

impl Node {
    /// The content between two positions, open as deep as the positions sit
    /// below their shared ancestor.
    pub fn slice(&self, from: usize, to: usize) -> Result<Slice, ModelError> {
        if from == to {
            return Ok(Slice::empty());
        }
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        let depth = rfrom.shared_depth(to);
        let start = rfrom.start(depth);
        let content = rfrom.node(depth).content().cut(from - start, to - start);
        Ok(Slice::new(
            content,
            rfrom.depth() - depth,
            rto.depth() - depth,
        ))
    }

    /// Replace the content between `from` and `to` with `slice`, joining open
    /// nodes on either side.
    pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> Result<Node, ModelError> {
        let rfrom = self.resolve(from)?;
        let rto = self.resolve(to)?;
        if slice.open_start > rfrom.depth() {
            return Err(ModelError::InsertTooDeep);
        }
        if slice.open_end > rto.depth()
            || rfrom.depth() - slice.open_start != rto.depth() - slice.open_end
        {
            return Err(ModelError::InconsistentOpenDepths);
        }
        replace_outer(&rfrom, &rto, slice, 0)
    }
}

fn replace_outer(
    rfrom: &ResolvedPos,
    rto: &ResolvedPos,
    slice: &Slice,
    depth: usize,
) -> Result<Node, ModelError> {
    let index = rfrom.index(depth);
    let node = rfrom.node(depth);
    if index == rto.index(depth) && depth < rfrom.depth() - slice.open_start {
        let inner = replace_outer(rfrom, rto, slice, depth + 1)?;
        return Ok(node.copy(node.content().replace_child(index, inner)));
    }
    if slice.content.size() == 0 {
        return close(node, replace_two_way(rfrom, rto, depth)?);
    }
    if slice.open_start == 0
        && slice.open_end == 0
        && rfrom.depth() == depth
        && rto.depth() == depth
    {
        let parent = rfrom.parent();
        let content = parent.content();
        let mut children = content.cut(0, rfrom.parent_offset()).to_vec();
        children.extend(slice.content.iter().cloned());
        children.extend(content.cut(rto.parent_offset(), content.size()).iter().cloned());
        return close(parent, children);
    }
    let (start, end) = prepare_slice_for_replace(slice, rfrom)?;
    close(node, replace_three_way(rfrom, &start, &end, rto, depth)?)
}

fn check_join(main: &Node, sub: &Node) -> Result<(), ModelError> {
    if sub.kind().compatible_content(main.kind()) {
        Ok(())
    } else {
        Err(ModelError::CannotJoin {
            main: main.kind().name(),
            sub: sub.kind().name(),
        })
    }
}

fn joinable(before: &ResolvedPos, after: &ResolvedPos, depth: usize) -> Result<Node, ModelError> {
    let node = before.node(depth);
    check_join(node, after.node(depth))?;
    Ok(node.clone())
}

/// Push the children between two resolved positions at `depth`.
fn add_range(
    start: Option<&ResolvedPos>,
    end: Option<&ResolvedPos>,
    depth: usize,
    target: &mut Vec<Node>,
) {
    let Some(node) = end.or(start).map(|rp| rp.node(depth)) else {
        return;
    };
    let mut start_index = 0;
    let end_index = end.map_or(node.child_count(), |rp| rp.index(depth));
    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            if let Some(after) = start.node_after() {
                target.push(after);
            }
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        target.push(node.child(i).clone());
    }
    if let Some(end) = end.filter(|rp| rp.depth() == depth && rp.text_offset() > 0) {
        target.extend(end.node_before());
    }
}

fn close(node: &Node, children: Vec<Node>) -> Result<Node, ModelError> {
    node.copy(Fragment::from_nodes(children)).checked()
}

fn replace_three_way(
    rfrom: &ResolvedPos,
    start: &ResolvedPos,
    end: &ResolvedPos,
    rto: &ResolvedPos,
    depth: usize,
) -> Result<Vec<Node>, ModelError> {
    let open_start = if rfrom.depth() > depth {
        Some(joinable(rfrom, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if rto.depth() > depth {
        Some(joinable(end, rto, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(rfrom), depth, &mut content);
    match (&open_start, &open_end) {
        (Some(os), Some(oe)) if start.index(depth) == end.index(depth) => {
            check_join(os, oe)?;
            let inner = replace_three_way(rfrom, start, end, rto, depth + 1)?;
            content.push(close(os, inner)?);
        }
        _ => {
            if let Some(os) = &open_start {
                content.push(close(os, replace_two_way(rfrom, start, depth + 1)?)?);
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(oe) = &open_end {
                content.push(close(oe, replace_two_way(end, rto, depth + 1)?)?);
            }
        }
    }
    add_range(Some(rto), None, depth, &mut content);
    Ok(content)
}

fn replace_two_way(
    rfrom: &ResolvedPos,
    rto: &ResolvedPos,
    depth: usize,
) -> Result<Vec<Node>, ModelError> {
    let mut content = Vec::new();
    add_range(None, Some(rfrom), depth, &mut content);
    if rfrom.depth() > depth {
        let kind = joinable(rfrom, rto, depth + 1)?;
        content.push(close(&kind, replace_two_way(rfrom, rto, depth + 1)?)?);
    }
    add_range(Some(rto), None, depth, &mut content);
    Ok(content)
}

/// Wrap the slice in copies of the ancestors of `along` so its open sides
/// can be resolved like ordinary positions.
fn prepare_slice_for_replace(
    slice: &Slice,
    along: &ResolvedPos,
) -> Result<(ResolvedPos, ResolvedPos), ModelError> {
    let extra = along.depth() - slice.open_start;
    let mut node = along.node(extra).copy(slice.content.clone());
    for i in (0..extra).rev() {
        node = along.node(i).copy(Fragment::from(node));
    }
    let start = node.resolve(slice.open_start + extra)?;
    let end = node.resolve(node.content_size() - slice.open_end - extra)?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builders::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slice_inside_textblock_is_closed() {
        let d = doc([p([text("hello")])]);

        let slice = d.slice(2, 4).unwrap();

        assert_eq!(slice, Slice::new(Fragment::from(text("el")), 0, 0));
    }

    #[test]
    fn test_slice_across_blocks_is_open() {
        let d = doc([p([text("ab")]), p([text("cd")])]);

        let slice = d.slice(2, 6).unwrap();

        assert_eq!(slice.open_start, 1);
        assert_eq!(slice.open_end, 1);
        assert_eq!(slice.content, Fragment::from_nodes([p([text("b")]), p([text("c")])]));
        assert_eq!(slice.size(), 4);
    }

    #[test]
    fn test_flat_text_replace() {
        let d = doc([p([text("hello")])]);
        let slice = Slice::new(Fragment::from(text("ipp")), 0, 0);

        let out = d.replace(2, 5, &slice).unwrap();

        assert_eq!(out, doc([p([text("hippo")])]));
    }

    #[test]
    fn test_delete_joins_blocks() {
        let d = doc([p([text("foo")]), p([text("bar")])]);

        let out = d.replace(4, 6, &Slice::empty()).unwrap();

        assert_eq!(out, doc([p([text("foobar")])]));
    }

    #[test]
    fn test_insert_open_slice_splits_block() {
        let d = doc([p([text("foobar")])]);
        let split = Slice::new(Fragment::from_nodes([p([]), p([])]), 1, 1);

        let out = d.replace(4, 4, &split).unwrap();

        assert_eq!(out, doc([p([text("foo")]), p([text("bar")])]));
    }

    #[test]
    fn test_replace_rejects_inline_at_block_level() {
        let d = doc([p([text("a")]), hr()]);
        let slice = Slice::new(Fragment::from(text("x")), 0, 0);

        assert_eq!(
            d.replace(3, 3, &slice),
            Err(ModelError::InvalidContent("doc"))
        );
    }

    #[test]
    fn test_cannot_join_textblock_with_blockquote() {
        let d = doc([p([text("a")]), blockquote([p([text("b")])])]);

        let err = d.replace(2, 4, &Slice::empty()).unwrap_err();

        assert!(matches!(err, ModelError::CannotJoin { .. }));
    }
}
