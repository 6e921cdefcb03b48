//! Dragging content within one surface.

mod common;

use common::{surface, surface_with};
use pretty_assertions::assert_eq;
use viewsync_engine::model::builders::{doc, hr, p, text};
use viewsync_engine::{Selection, SyncConfig};

#[test]
fn test_move_deletes_source_and_selects_dropped_text() {
    let mut s = surface(
        doc([p([text("abc")]), p([text("def")])]),
        Selection::text(2, 3),
    );
    assert!(s.start_drag(true));
    assert!(s.drop_at(8));

    assert_eq!(s.state().doc(), &doc([p([text("ac")]), p([text("debf")])]));
    assert_eq!(s.state().selection(), Selection::text(7, 8));
    assert!(s.dragging().is_none());
}

#[test]
fn test_copy_keeps_source() {
    let mut s = surface(
        doc([p([text("abc")]), p([text("def")])]),
        Selection::text(2, 3),
    );
    assert!(s.start_drag(false));
    assert!(!s.dragging().unwrap().is_move());
    assert!(s.drop_at(8));

    assert_eq!(s.state().doc(), &doc([p([text("abc")]), p([text("debf")])]));
    assert_eq!(s.state().selection(), Selection::text(8, 9));
}

#[test]
fn test_source_follows_edits_made_mid_drag() {
    let mut s = surface(
        doc([p([text("abc")]), p([text("def")])]),
        Selection::text(2, 3),
    );
    assert!(s.start_drag(true));

    let mut tr = s.state().tr();
    tr.insert_text("X", 1, 1).unwrap();
    s.dispatch(tr);

    assert!(s.drop_at(9));
    assert_eq!(s.state().doc(), &doc([p([text("Xac")]), p([text("debf")])]));
    assert_eq!(s.state().selection(), Selection::text(8, 9));
}

#[test]
fn test_stale_source_is_kept() {
    let config = SyncConfig {
        ledger_capacity: 1,
        ..SyncConfig::default()
    };
    let mut s = surface_with(
        doc([p([text("abc")]), p([text("def")])]),
        Selection::text(2, 3),
        config,
    );
    assert!(s.start_drag(true));

    let mut tr = s.state().tr();
    tr.insert_text("X", 1, 1).unwrap();
    s.dispatch(tr);

    assert!(s.drop_at(9));
    assert_eq!(s.state().doc(), &doc([p([text("Xabc")]), p([text("debf")])]));
}

#[test]
fn test_dropped_node_is_node_selected() {
    let mut s = surface(
        doc([p([text("ab")]), hr(), p([text("cd")])]),
        Selection::caret(1),
    );
    assert!(s.start_node_drag(4, true));
    assert!(s.drop_at(2));

    assert_eq!(
        s.state().doc(),
        &doc([hr(), p([text("ab")]), p([text("cd")])])
    );
    assert_eq!(s.state().selection(), Selection::Node { from: 0, to: 1 });
}

#[test]
fn test_nothing_to_drag_or_drop() {
    let mut s = surface(doc([p([text("ab")])]), Selection::caret(2));
    assert!(!s.start_drag(true));
    assert!(s.dragging().is_none());
    assert!(!s.drop_at(1));
    assert_eq!(s.state().doc(), &doc([p([text("ab")])]));
}

#[test]
fn test_cleared_drag_drops_nothing() {
    let mut s = surface(doc([p([text("ab")])]), Selection::text(1, 2));
    assert!(s.start_drag(true));
    s.clear_drag();
    assert!(!s.drop_at(3));
    assert_eq!(s.state().doc(), &doc([p([text("ab")])]));
}
