//! Turns a diff span into an edit intent.
//!
//! The classifier looks at the old document and the freshly parsed host
//! content around a [`DiffSpan`] and decides what the user most likely did:
//! split a block, join two blocks, toggle a mark, type or delete text, or
//! something that can only be expressed as a generic replace.

use crate::ModelError;
use crate::diff::DiffSpan;
use crate::model::{Bias, Fragment, Mark, Node, ResolvedPos, Selection, Slice};

/// The edit a diff span should become, before it is mapped onto the live
/// snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum EditKind {
    /// Text was removed inside a textblock. `carry_marks` holds the marks
    /// active at the deletion point, to be stored for the next typed
    /// character.
    Delete { carry_marks: Option<Vec<Mark>> },
    ToggleMark { mark: Mark, add: bool },
    InsertText { text: String },
    Replace { slice: Slice },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The change looks like a block split at the new cursor position.
    pub split_like: bool,
    /// The change looks like two adjacent blocks were merged.
    pub join_like: bool,
    pub kind: EditKind,
}

/// Classify `span`, found by comparing `old_doc` from `range_from` against
/// `parsed`, whose content starts at `range_from`. `old_anchor` is the
/// selection anchor of the snapshot the host content was rendered from.
pub fn classify(
    old_doc: &Node,
    parsed: &Node,
    span: &DiffSpan,
    range_from: usize,
    old_anchor: usize,
) -> Result<Classification, ModelError> {
    let new_from = parsed.resolve(span.start - range_from)?;
    let new_to = parsed.resolve(span.end_new - range_from)?;

    let split_like = !new_from.same_parent(&new_to)
        && new_from.pos() < parsed.content_size()
        && parsed
            .resolve(new_from.pos() + 1)
            .ok()
            .and_then(|rp| Selection::find_from(&rp, Bias::Forward, true))
            .is_some_and(|next| next.head() == new_to.pos());

    let join_like = old_anchor > span.start
        && looks_like_join(old_doc, span.start, span.end_old, &new_from, &new_to);

    let kind = match inline_edit(old_doc, span, &new_from, &new_to)? {
        Some(kind) => kind,
        None => EditKind::Replace {
            slice: parsed.slice(span.start - range_from, span.end_new - range_from)?,
        },
    };
    log::trace!(
        "classified {:?}: split_like={} join_like={} kind={:?}",
        span,
        split_like,
        join_like,
        kind
    );
    Ok(Classification {
        split_like,
        join_like,
        kind,
    })
}

/// Edits confined to a single textblock of the parsed content.
fn inline_edit(
    old_doc: &Node,
    span: &DiffSpan,
    new_from: &ResolvedPos,
    new_to: &ResolvedPos,
) -> Result<Option<EditKind>, ModelError> {
    if !new_from.same_parent(new_to) || !new_from.parent().is_textblock() {
        return Ok(None);
    }
    if new_from.pos() == new_to.pos() {
        let start = old_doc.resolve(span.start)?;
        let carry_marks =
            (start.parent_offset() < start.parent().content_size()).then(|| start.marks(true));
        return Ok(Some(EditKind::Delete { carry_marks }));
    }
    if span.end_old == span.end_new {
        let old_from = old_doc.resolve(span.start)?;
        let cur = new_from
            .parent()
            .content()
            .cut(new_from.parent_offset(), new_to.parent_offset());
        let prev = old_from.parent().content().cut(
            old_from.parent_offset(),
            span.end_old - old_from.start(old_from.depth()),
        );
        if let Some((mark, add)) = is_mark_change(&cur, &prev) {
            return Ok(Some(EditKind::ToggleMark { mark, add }));
        }
    }
    let index = new_from.index(new_from.depth());
    let single_text_run = new_from
        .parent()
        .maybe_child(index)
        .is_some_and(Node::is_text)
        && index + usize::from(new_to.text_offset() == 0) == new_to.index(new_to.depth());
    if single_text_run {
        let text = new_from
            .parent()
            .text_between(new_from.parent_offset(), new_to.parent_offset());
        return Ok(Some(EditKind::InsertText { text }));
    }
    Ok(None)
}

/// Whether `cur` could be produced from `prev` by adding or removing a
/// single mark on every node. Returns the mark and whether it was added.
pub fn is_mark_change(cur: &Fragment, prev: &Fragment) -> Option<(Mark, bool)> {
    let cur_marks = cur.first_child()?.marks();
    let prev_marks = prev.first_child()?.marks();
    let added = prev_marks
        .iter()
        .fold(cur_marks.to_vec(), |set, mark| mark.remove_from_set(&set));
    let removed = cur_marks
        .iter()
        .fold(prev_marks.to_vec(), |set, mark| mark.remove_from_set(&set));

    let (mark, add) = match (added.as_slice(), removed.as_slice()) {
        ([mark], []) => (mark.clone(), true),
        ([], [mark]) => (mark.clone(), false),
        _ => return None,
    };
    let updated = Fragment::from_nodes(prev.iter().map(|node| {
        let marks = if add {
            mark.add_to_set(node.marks())
        } else {
            mark.remove_from_set(node.marks())
        };
        node.with_marks(marks)
    }));
    (updated == *cur).then_some((mark, add))
}

/// Whether replacing `start..end` of `old` with the parsed content between
/// `new_start` and `new_end` looks like the join of two adjacent
/// textblocks.
pub fn looks_like_join(
    old: &Node,
    start: usize,
    end: usize,
    new_start: &ResolvedPos,
    new_end: &ResolvedPos,
) -> bool {
    if !new_start.parent().is_textblock()
        || end - start <= new_end.pos().saturating_sub(new_start.pos())
        || skip_closing_and_opening(new_start, true, false) < new_end.pos()
    {
        return false;
    }
    let Ok(old_start) = old.resolve(start) else {
        return false;
    };
    if old_start.parent_offset() < old_start.parent().content_size()
        || !old_start.parent().is_textblock()
    {
        return false;
    }
    let Ok(next) = old.resolve(skip_closing_and_opening(&old_start, true, true)) else {
        return false;
    };
    if !next.parent().is_textblock()
        || next.pos() > end
        || skip_closing_and_opening(&next, true, false) < end
    {
        return false;
    }
    let tail = new_start
        .parent()
        .content()
        .cut(new_start.parent_offset(), new_start.parent().content_size());
    tail == *next.parent().content()
}

/// Step over closing tokens (from the end of the parent when `from_end`)
/// and, with `may_open`, over the opening tokens that follow.
pub fn skip_closing_and_opening(rp: &ResolvedPos, from_end: bool, may_open: bool) -> usize {
    let mut depth = rp.depth();
    let mut end = if from_end { rp.end(depth) } else { rp.pos() };
    let mut from_end = from_end;
    while depth > 0 && (from_end || rp.index_after(depth) == rp.node(depth).child_count()) {
        depth -= 1;
        end += 1;
        from_end = false;
    }
    if may_open {
        let mut next = rp.node(depth).maybe_child(rp.index_after(depth));
        while let Some(node) = next {
            if node.is_leaf() {
                break;
            }
            next = node.first_child();
            end += 1;
        }
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::find_diff;
    use crate::model::builders::*;
    use pretty_assertions::assert_eq;

    /// Diff and classify the whole document content.
    fn classify_docs(old: &Node, new: &Node, anchor: usize) -> Classification {
        let span = find_diff(old.content(), new.content(), 0, anchor).unwrap();
        classify(old, new, &span, 0, anchor).unwrap()
    }

    #[test]
    fn test_typed_character_is_text_insert() {
        let old = doc([p([])]);
        let new = doc([p([text("a")])]);

        let result = classify_docs(&old, &new, 1);

        assert_eq!(
            result.kind,
            EditKind::InsertText {
                text: "a".to_string()
            }
        );
        assert!(!result.split_like);
        assert!(!result.join_like);
    }

    #[test]
    fn test_deletion_carries_marks_of_following_text() {
        let old = doc([p([text("a"), marked("bc", &["em"])])]);
        let new = doc([p([text("a"), marked("c", &["em"])])]);

        let result = classify_docs(&old, &new, 3);

        assert_eq!(
            result.kind,
            EditKind::Delete {
                carry_marks: Some(vec![Mark::new("em")])
            }
        );
    }

    #[test]
    fn test_deletion_in_plain_text_stores_empty_marks() {
        let old = doc([p([text("ab")])]);
        let new = doc([p([text("a")])]);

        let result = classify_docs(&old, &new, 3);

        assert_eq!(
            result.kind,
            EditKind::Delete {
                carry_marks: Some(Vec::new())
            }
        );
    }

    #[test]
    fn test_mark_added_to_one_unit() {
        let old = doc([p([marked("abc", &["strong"]), text("d")])]);
        let new = doc([p([marked("abcd", &["strong"])])]);

        let span = find_diff(old.content(), new.content(), 0, 0).unwrap();
        let result = classify(&old, &new, &span, 0, 0).unwrap();

        assert_eq!((span.start, span.end_old, span.end_new), (4, 5, 5));
        assert_eq!(
            result.kind,
            EditKind::ToggleMark {
                mark: Mark::new("strong"),
                add: true
            }
        );
    }

    #[test]
    fn test_mark_removed() {
        let old = doc([p([marked("ab", &["em"])])]);
        let new = doc([p([text("ab")])]);

        let result = classify_docs(&old, &new, 0);

        assert_eq!(
            result.kind,
            EditKind::ToggleMark {
                mark: Mark::new("em"),
                add: false
            }
        );
    }

    #[test]
    fn test_split_is_flagged() {
        let old = doc([p([text("abcd")])]);
        let new = doc([p([text("ab")]), p([text("cd")])]);

        let result = classify_docs(&old, &new, 3);

        assert!(result.split_like);
        assert!(matches!(result.kind, EditKind::Replace { .. }));
    }

    #[test]
    fn test_join_is_flagged_and_deletes_the_boundary() {
        let old = doc([p([text("foo")]), p([text("bar")])]);
        let new = doc([p([text("foobar")])]);

        let result = classify_docs(&old, &new, 6);

        assert!(result.join_like);
        assert!(!result.split_like);
        // the boundary sits at the end of "foo", so there is nothing to carry
        assert_eq!(result.kind, EditKind::Delete { carry_marks: None });
        assert_eq!(old.replace(4, 6, &Slice::empty()).unwrap(), new);
    }

    #[test]
    fn test_join_needs_anchor_after_change() {
        let old = doc([p([text("foo")]), p([text("bar")])]);
        let new = doc([p([text("foobar")])]);

        assert!(!classify_docs(&old, &new, 2).join_like);
    }

    #[test]
    fn test_is_mark_change_rejects_text_difference() {
        let cur = Fragment::from(marked("ab", &["em"]));
        let prev = Fragment::from(text("xy"));

        assert_eq!(is_mark_change(&cur, &prev), None);
    }

    #[test]
    fn test_skip_closing_and_opening() {
        let d = doc([p([text("foo")]), p([text("bar")])]);
        let end_of_first = d.resolve(4).unwrap();

        assert_eq!(skip_closing_and_opening(&end_of_first, true, false), 5);
        assert_eq!(skip_closing_and_opening(&end_of_first, true, true), 6);
    }
}
