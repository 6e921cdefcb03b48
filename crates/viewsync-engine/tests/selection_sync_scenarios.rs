//! Selection flowing between the host and the model through a surface.

mod common;

use common::{ms, surface, surface_with};
use pretty_assertions::assert_eq;
use viewsync_engine::model::builders::{doc, hr, p, text};
use viewsync_engine::{SelectionStrategy, Selection, SyncConfig};

fn timer_config() -> SyncConfig {
    SyncConfig {
        selection_strategy: SelectionStrategy::Timer,
        ..SyncConfig::default()
    }
}

#[test]
fn test_selection_hint_reads_host_selection() {
    let mut s = surface(doc([p([text("abc")])]), Selection::caret(1));
    s.host_mut().select(2, 4);
    s.on_selection_change();

    assert_eq!(s.state().selection(), Selection::text(2, 4));
    assert_eq!(s.last_transaction().unwrap().origin(), None);
    // reading back does not echo the selection into the host
    assert!(s.host().selection_writes.is_empty());
}

#[test]
fn test_key_down_reads_are_not_tagged() {
    let mut s = surface(doc([p([text("abc")])]), Selection::caret(1));
    s.on_key_down();
    s.host_mut().caret(3);
    s.on_selection_change();

    assert_eq!(s.state().selection(), Selection::caret(3));
    assert_eq!(s.last_transaction().unwrap().origin(), None);
}

#[test]
fn test_pointer_origin_expires() {
    let mut s = surface(doc([p([text("abc")])]), Selection::caret(1));
    s.on_pointer_down();
    s.advance(ms(60));
    s.host_mut().caret(3);
    s.on_selection_change();

    assert_eq!(s.state().selection(), Selection::caret(3));
    assert_eq!(s.last_transaction().unwrap().origin(), None);
}

#[test]
fn test_timer_strategy_polls_while_focused() {
    let mut s = surface_with(doc([p([text("abc")])]), Selection::caret(1), timer_config());
    s.host_mut().caret(2);
    s.advance(ms(0));
    assert_eq!(s.state().selection(), Selection::caret(2));

    s.host_mut().caret(3);
    s.advance(ms(99));
    assert_eq!(s.state().selection(), Selection::caret(2));
    s.advance(ms(1));
    assert_eq!(s.state().selection(), Selection::caret(3));
}

#[test]
fn test_blur_stops_polling() {
    let mut s = surface_with(doc([p([text("abc")])]), Selection::caret(1), timer_config());
    s.on_blur();
    assert!(!s.selection_reader().is_active());

    s.host_mut().caret(3);
    s.advance(ms(500));
    assert_eq!(s.state().selection(), Selection::caret(1));
}

#[test]
fn test_read_only_surface_keeps_polling_without_focus() {
    let mut s = surface_with(doc([p([text("abc")])]), Selection::caret(1), timer_config());
    s.set_editable(false);
    s.on_blur();
    s.advance(ms(300));
    assert!(s.selection_reader().is_active());

    s.host_mut().focused = false;
    s.set_editable(true);
    assert!(!s.selection_reader().is_active());
}

#[test]
fn test_reads_wait_for_open_change() {
    let mut s = surface(doc([p([text("abc")])]), Selection::caret(1));
    s.on_dirty(1, 4);
    s.host_mut().caret(3);
    s.on_selection_change();
    assert_eq!(s.state().selection(), Selection::caret(1));

    s.advance(ms(20));
    assert_eq!(s.state().selection(), Selection::caret(3));
}

#[test]
fn test_queued_mutations_are_flushed_before_reading() {
    let mut s = surface(doc([p([text("ab")])]), Selection::caret(3));
    s.host_mut().dom = doc([p([text("abc")])]);
    s.host_mut().caret(4);
    s.host_mut().queued = vec![(1, 3)];
    s.on_selection_change();

    assert!(s.pending().is_open());
    assert_eq!(s.state().doc(), &doc([p([text("ab")])]));

    s.advance(ms(20));
    assert_eq!(s.state().doc(), &doc([p([text("abc")])]));
    assert_eq!(s.state().selection(), Selection::caret(4));
}

#[test]
fn test_caret_on_leaf_selects_it() {
    let mut s = surface(
        doc([p([text("ab")]), hr(), p([text("cd")])]),
        Selection::caret(1),
    );
    s.host_mut().leaf_caret(4);
    s.on_selection_change();

    assert_eq!(s.state().selection(), Selection::Node { from: 4, to: 5 });
    assert_eq!(s.host().node_highlight, Some(4));
}

#[test]
fn test_model_selection_is_pushed_to_host() {
    let mut s = surface(doc([p([text("abc")])]), Selection::caret(1));
    let mut tr = s.state().tr();
    tr.set_selection(Selection::text(1, 3));
    s.dispatch(tr);
    assert_eq!(s.host().selection_writes, vec![(1, 3)]);

    // unchanged selection is not written again
    let mut tr = s.state().tr();
    tr.insert_text("x", 4, 4).unwrap();
    s.dispatch(tr);
    assert_eq!(s.host().selection_writes, vec![(1, 3)]);
}

#[test]
fn test_focus_writes_selection_into_unfocused_host() {
    let mut s = surface(doc([p([text("abc")])]), Selection::caret(2));
    s.host_mut().focused = false;
    let mut tr = s.state().tr();
    tr.set_selection(Selection::caret(3));
    s.dispatch(tr);
    assert!(s.host().selection_writes.is_empty());

    s.focus();
    assert_eq!(s.host().selection_writes, vec![(3, 3)]);
}
