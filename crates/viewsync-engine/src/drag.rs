//! Dragging content out of the surface and dropping it back in.
//!
//! A move records where its content came from with a [`MappingLedger`], so
//! the source can still be deleted correctly after edits made mid-drag.

use crate::host::Host;
use crate::ledger::MappingLedger;
use crate::model::{Bias, ResolvedPos, Selection, Slice};
use crate::surface::EditorSurface;

/// Content being dragged.
#[derive(Debug)]
pub struct Dragging {
    pub slice: Slice,
    /// Source range in the snapshot the drag started on.
    pub from: usize,
    pub to: usize,
    ledger: Option<MappingLedger>,
}

impl Dragging {
    pub fn is_move(&self) -> bool {
        self.ledger.is_some()
    }
}

/// Where to insert `slice` when it is dropped at `rp`: the innermost
/// ancestor that accepts its content, leaving deeper nodes on the side
/// nearest the drop point.
pub fn drop_pos(slice: &Slice, rp: &ResolvedPos) -> usize {
    let mut content = slice.content.clone();
    if content.size() == 0 {
        return rp.pos();
    }
    for _ in 0..slice.open_start {
        let Some(first) = content.first_child() else {
            break;
        };
        content = first.content().clone();
    }
    for d in (0..=rp.depth()).rev() {
        let bias = if d == rp.depth() {
            None
        } else if rp.pos() * 2 <= rp.start(d + 1) + rp.end(d + 1) {
            Some(Bias::Backward)
        } else {
            Some(Bias::Forward)
        };
        let parent = rp.node(d).kind();
        if content.iter().all(|child| parent.allows(child.kind())) {
            return match bias {
                None => rp.pos(),
                Some(Bias::Backward) => rp.before(d + 1),
                Some(Bias::Forward) => rp.after(d + 1),
            };
        }
    }
    rp.pos()
}

impl<H: Host> EditorSurface<H> {
    /// Start dragging the current selection. Returns `false` when it is
    /// empty.
    pub fn start_drag(&mut self, is_move: bool) -> bool {
        self.begin_drag(self.state.selection(), is_move)
    }

    /// Start dragging the node at `pos`.
    pub fn start_node_drag(&mut self, pos: usize, is_move: bool) -> bool {
        match Selection::node(self.state.doc(), pos) {
            Ok(selection) => self.begin_drag(selection, is_move),
            Err(err) => {
                log::debug!("no node to drag at {}: {}", pos, err);
                false
            }
        }
    }

    fn begin_drag(&mut self, selection: Selection, is_move: bool) -> bool {
        if selection.is_empty() {
            return false;
        }
        let (from, to) = (selection.from(), selection.to());
        let slice = match self.state.doc().slice(from, to) {
            Ok(slice) => slice,
            Err(err) => {
                log::warn!("cannot drag {}..{}: {}", from, to, err);
                return false;
            }
        };
        let ledger = is_move
            .then(|| MappingLedger::create(&self.state, &self.channel, self.config.ledger_capacity));
        self.dragging = Some(Dragging {
            slice,
            from,
            to,
            ledger,
        });
        true
    }

    pub fn dragging(&self) -> Option<&Dragging> {
        self.dragging.as_ref()
    }

    pub fn clear_drag(&mut self) {
        self.dragging = None;
    }

    /// Drop the dragged content at `pos` of the live document. A move
    /// deletes the source first; the source is left alone when its mapping
    /// can no longer be resolved.
    pub fn drop_at(&mut self, pos: usize) -> bool {
        let Some(dragging) = self.dragging.take() else {
            return false;
        };
        let Dragging {
            slice,
            from,
            to,
            ledger,
        } = dragging;
        let insert_pos = match self.state.doc().resolve(pos) {
            Ok(rp) => drop_pos(&slice, &rp),
            Err(err) => {
                log::warn!("invalid drop position {}: {}", pos, err);
                return false;
            }
        };

        let mut tr = self.state.tr();
        if let Some(ledger) = ledger {
            match ledger.get_mapping(&self.state) {
                Some(mapping) => {
                    let from = mapping.map(from, Bias::Forward);
                    let to = mapping.map(to, Bias::Backward);
                    if to > from {
                        if let Err(err) = tr.delete(from, to) {
                            log::warn!("cannot delete drag source {}..{}: {}", from, to, err);
                            return false;
                        }
                    }
                }
                None => log::debug!("drag source mapping is stale, keeping the source"),
            }
        }

        let single_node = slice.open_start == 0
            && slice.open_end == 0
            && slice.content.child_count() == 1;
        let first = slice.content.first_child().cloned();
        let pos = tr.mapping().map_forward(insert_pos);
        if let Err(err) = tr.replace(pos, pos, slice) {
            log::warn!("cannot drop at {}: {}", pos, err);
            return false;
        }

        let end = tr.mapping().map_forward(insert_pos);
        let selection = {
            let doc = tr.doc();
            let rpos = match doc.resolve(pos) {
                Ok(rpos) => rpos,
                Err(err) => {
                    log::warn!("drop position {} did not survive: {}", pos, err);
                    return false;
                }
            };
            let node_selection = match (&first, rpos.node_after()) {
                (Some(first), Some(after))
                    if single_node && first.is_selectable() && after.same_markup(first) =>
                {
                    Selection::node(doc, pos).ok()
                }
                _ => None,
            };
            match node_selection {
                Some(selection) => selection,
                None => match doc.resolve(end) {
                    Ok(rend) => Selection::between(&rpos, &rend, None),
                    Err(_) => Selection::caret(pos),
                },
            }
        };
        tr.set_selection(selection);
        self.focus();
        self.dispatch(tr);
        true
    }
}
