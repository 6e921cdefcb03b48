//! Reads a settled change back from the host and turns it into an edit.
//!
//! All reading is done against the snapshot the host was rendered from,
//! since that is what its content represents. The resulting edit is mapped
//! through whatever was applied since, then built on the live snapshot.

use crate::ReconcileError;
use crate::classify::{EditKind, classify};
use crate::diff::find_diff;
use crate::host::{Host, HookContext, ParseRequest, SyntheticKey};
use crate::model::{Bias, Fragment, Mapping, Node, Selection, Snapshot, Transaction};
use crate::pending::ChangeRange;

/// What reading a change produced.
#[derive(Debug)]
pub enum Reconciled {
    /// The host content matches the model and the selection did not move.
    Unchanged,
    Dispatch(Transaction),
    /// A hook accepted a synthesised event and queued its own transactions.
    HandedOff(Vec<Transaction>),
}

/// Host content parsed between two positions of the old document.
#[derive(Debug, Clone)]
pub struct ParsedRange {
    pub node: Node,
    /// Host selection found in the parsed content, as old-document
    /// positions `(anchor, head)`.
    pub selection: Option<(usize, usize)>,
}

/// Parse the host content covering `from..to` of `old`. `None` when no
/// single host container spans the range.
pub fn parse_between<H: Host + ?Sized>(
    host: &H,
    old: &Snapshot,
    from: usize,
    to: usize,
) -> Result<Option<ParsedRange>, ReconcileError> {
    let Some(span) = host.container_spanning(from, to) else {
        return Ok(None);
    };
    let find_targets = match host.host_selection() {
        Some(sel) if sel.is_collapsed() => vec![sel.anchor],
        Some(sel) => vec![sel.anchor, sel.head],
        None => Vec::new(),
    };
    let rfrom = old.doc().resolve(from)?;
    let request = ParseRequest {
        top: rfrom.parent().copy(Fragment::empty()),
        top_start: rfrom.index(rfrom.depth()),
        from_offset: span.from_offset,
        to_offset: span.to_offset,
        find_targets,
    };
    let outcome = host.parse(span.container, &request);
    let selection = match outcome.found.first().copied().flatten() {
        Some(anchor) => {
            let head = outcome.found.get(1).copied().flatten().unwrap_or(anchor);
            Some((anchor + from, head + from))
        }
        None => None,
    };
    Ok(Some(ParsedRange {
        node: outcome.node,
        selection,
    }))
}

/// Map a parsed selection through `mapping` onto `doc`.
pub fn resolve_selection(
    doc: &Node,
    mapping: &Mapping,
    (anchor, head): (usize, usize),
) -> Result<Selection, ReconcileError> {
    let size = doc.content_size();
    let out_of_bounds = |anchor: usize, head: usize| ReconcileError::SelectionOutOfBounds {
        anchor,
        head,
        size,
    };
    if anchor.max(head) > size {
        return Err(out_of_bounds(anchor, head));
    }
    let (anchor, head) = (mapping.map_forward(anchor), mapping.map_forward(head));
    if anchor.max(head) > size {
        return Err(out_of_bounds(anchor, head));
    }
    Ok(Selection::between(
        &doc.resolve(anchor)?,
        &doc.resolve(head)?,
        None,
    ))
}

/// Read the change covering `range` of `old` and build the edit for
/// `live`, mapping positions through `mapping`.
pub fn read_change<H: Host + ?Sized>(
    host: &mut H,
    live: &Snapshot,
    mapping: &Mapping,
    old: &Snapshot,
    range: ChangeRange,
) -> Result<Reconciled, ReconcileError> {
    let doc = old.doc();
    let mut range = range;
    let parsed = loop {
        if let Some(parsed) = parse_between(host, old, range.from, range.to)? {
            break parsed;
        }
        let rfrom = doc.resolve(range.from)?;
        let rto = doc.resolve(range.to)?;
        let wider = ChangeRange::new(
            if rfrom.depth() > 0 {
                rfrom.before(rfrom.depth())
            } else {
                0
            },
            if rto.depth() > 0 {
                rto.after(rto.depth())
            } else {
                doc.content_size()
            },
        );
        if wider == range {
            return Err(ReconcileError::UnaddressableRange {
                from: range.from,
                to: range.to,
            });
        }
        log::debug!("widened unaddressable range {:?} to {:?}", range, wider);
        range = wider;
    };

    let compare = doc.slice(range.from, range.to)?;
    let Some(change) = find_diff(
        &compare.content,
        parsed.node.content(),
        range.from,
        old.selection().from(),
    ) else {
        return Ok(selection_only(live, mapping, parsed.selection));
    };

    let classification = classify(doc, &parsed.node, &change, range.from, old.selection().anchor())?;
    if classification.split_like {
        if let Some(handed_off) = offer_key(host, live, SyntheticKey::Enter) {
            return Ok(handed_off);
        }
    }
    if classification.join_like {
        if let Some(handed_off) = offer_key(host, live, SyntheticKey::Backspace) {
            return Ok(handed_off);
        }
    }

    let from = mapping.map(change.start, Bias::Forward);
    let to = mapping.map(change.end_old, Bias::Backward).max(from);
    let mut tr = live.tr();
    let mut carry_marks = None;
    match classification.kind {
        EditKind::Delete {
            carry_marks: marks,
        } => {
            tr.delete(from, to)?;
            carry_marks = marks;
        }
        EditKind::ToggleMark { mark, add: true } => {
            tr.add_mark(from, to, &mark);
        }
        EditKind::ToggleMark { mark, add: false } => {
            tr.remove_mark(from, to, &mark);
        }
        EditKind::InsertText { text } => {
            let mut ctx = HookContext::new(live.clone());
            if host.handle_text_input(&mut ctx, from, to, &text) {
                log::debug!("text input {:?} at {}..{} handled by hook", text, from, to);
                return Ok(Reconciled::HandedOff(ctx.dispatched));
            }
            tr.insert_text(&text, from, to)?;
        }
        EditKind::Replace { slice } => {
            tr.replace(from, to, slice)?;
        }
    }

    if let Some(parsed_selection) = parsed.selection {
        match resolve_selection(tr.doc(), mapping, parsed_selection) {
            Ok(selection) => {
                tr.set_selection(selection);
            }
            Err(err) => log::debug!("dropping parsed selection: {}", err),
        }
    }
    if let Some(marks) = carry_marks {
        tr.set_stored_marks(Some(marks));
    }
    tr.scroll_into_view();
    Ok(Reconciled::Dispatch(tr))
}

fn selection_only(
    live: &Snapshot,
    mapping: &Mapping,
    parsed_selection: Option<(usize, usize)>,
) -> Reconciled {
    let Some(parsed_selection) = parsed_selection else {
        return Reconciled::Unchanged;
    };
    match resolve_selection(live.doc(), mapping, parsed_selection) {
        Ok(selection) if selection != live.selection() => {
            let mut tr = live.tr();
            tr.set_selection(selection);
            Reconciled::Dispatch(tr)
        }
        Ok(_) => Reconciled::Unchanged,
        Err(err) => {
            log::debug!("dropping parsed selection: {}", err);
            Reconciled::Unchanged
        }
    }
}

fn offer_key<H: Host + ?Sized>(host: &mut H, live: &Snapshot, key: SyntheticKey) -> Option<Reconciled> {
    let mut ctx = HookContext::new(live.clone());
    if host.handle_key_down(&mut ctx, key) {
        log::debug!("change handed off to {} hook", key.name());
        Some(Reconciled::HandedOff(ctx.dispatched))
    } else {
        None
    }
}
