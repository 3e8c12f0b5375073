use opsdeck_reorder::{
    resolve_destination, DragReorderEngine, DropPosition, DropTarget, ReorderConfig,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: u32,
    name: String,
}

fn rows(n: u32) -> Vec<Row> {
    (1..=n)
        .map(|id| Row {
            id,
            name: format!("Item {id}"),
        })
        .collect()
}

fn ids(items: &[Row]) -> Vec<u32> {
    items.iter().map(|r| r.id).collect()
}

/// Shared log of callback invocations.
#[derive(Clone, Default)]
struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

fn engine_with(items: Vec<Row>, config: ReorderConfig, events: &Events) -> DragReorderEngine<Row> {
    let (start, end, reorder) = (events.clone(), events.clone(), events.clone());
    DragReorderEngine::new(items, config)
        .on_drag_start(move |row: &Row| start.push(format!("start:{}", row.id)))
        .on_drag_end(move |row: &Row| end.push(format!("end:{}", row.id)))
        .on_reorder(move |items: &[Row]| reorder.push(format!("reorder:{:?}", ids(items))))
}

fn engine(n: u32, events: &Events) -> DragReorderEngine<Row> {
    engine_with(rows(n), ReorderConfig::default(), events)
}

// ── start_drag ───────────────────────────────────────────────────

#[test]
fn start_drag_records_session_and_fires_callback() {
    let events = Events::default();
    let mut e = engine(10, &events);
    let item = e.items()[2].clone();

    e.start_drag(item.clone(), 2);

    assert!(e.is_dragging());
    let session = e.dragged_item().unwrap();
    assert_eq!(session.item, item);
    assert_eq!(session.origin, 2);
    assert_eq!(events.take(), vec!["start:3"]);
}

#[test]
fn start_drag_is_ignored_when_disabled() {
    let events = Events::default();
    let mut e = engine_with(
        rows(10),
        ReorderConfig {
            enabled: false,
            ..Default::default()
        },
        &events,
    );

    e.start_drag(rows(1)[0].clone(), 0);

    assert!(!e.is_dragging());
    assert!(events.take().is_empty());
}

#[test]
fn start_drag_is_ignored_on_empty_list() {
    let events = Events::default();
    let mut e = engine_with(Vec::new(), ReorderConfig::default(), &events);

    e.start_drag(rows(1)[0].clone(), 0);

    assert!(!e.is_dragging());
    assert!(events.take().is_empty());
}

#[test]
fn start_drag_rejects_out_of_range_origin() {
    let events = Events::default();
    let mut e = engine(3, &events);

    e.start_drag(rows(1)[0].clone(), 3);

    assert!(!e.is_dragging());
}

#[test]
fn new_drag_replaces_active_session() {
    let events = Events::default();
    let mut e = engine(5, &events);

    e.start_drag(e.items()[0].clone(), 0);
    let first = e.dragged_item().unwrap().id;
    e.handle_drag_over(3, DropPosition::Before);
    e.start_drag(e.items()[1].clone(), 1);

    let session = e.dragged_item().unwrap();
    assert_eq!(session.origin, 1);
    assert_ne!(session.id, first);
    assert_eq!(e.drop_target(), None);
}

// ── handle_drag_over ─────────────────────────────────────────────

#[test]
fn drag_over_records_target() {
    let events = Events::default();
    let mut e = engine(10, &events);
    e.start_drag(e.items()[0].clone(), 0);

    e.handle_drag_over(5, DropPosition::After);
    assert_eq!(
        e.drop_target(),
        Some(DropTarget {
            index: 5,
            position: DropPosition::After
        })
    );

    e.handle_drag_over(2, DropPosition::Before);
    assert_eq!(e.drop_target().unwrap().position, DropPosition::Before);
    assert!(events.take().iter().all(|ev| !ev.starts_with("reorder")));
}

#[test]
fn drag_over_without_drag_is_ignored() {
    let events = Events::default();
    let mut e = engine(10, &events);

    e.handle_drag_over(5, DropPosition::After);

    assert_eq!(e.drop_target(), None);
}

// ── handle_drop ──────────────────────────────────────────────────

#[test]
fn drop_after_moves_item_forward() {
    let events = Events::default();
    let mut e = engine(10, &events);
    e.start_drag(e.items()[0].clone(), 0);
    e.handle_drag_over(5, DropPosition::After);

    assert!(e.handle_drop());

    assert_eq!(ids(e.items()), vec![2, 3, 4, 5, 6, 1, 7, 8, 9, 10]);
    assert_eq!(
        events.take(),
        vec![
            "start:1",
            "reorder:[2, 3, 4, 5, 6, 1, 7, 8, 9, 10]",
            "end:1"
        ]
    );
    assert!(!e.is_dragging());
    assert_eq!(e.drop_target(), None);
}

#[test]
fn drop_before_moves_item_backward() {
    let events = Events::default();
    let mut e = engine(6, &events);
    e.start_drag(e.items()[4].clone(), 4);
    e.handle_drag_over(1, DropPosition::Before);

    assert!(e.handle_drop());

    assert_eq!(ids(e.items()), vec![1, 5, 2, 3, 4, 6]);
}

#[test]
fn drop_after_moves_item_backward() {
    let events = Events::default();
    let mut e = engine(6, &events);
    e.start_drag(e.items()[4].clone(), 4);
    e.handle_drag_over(1, DropPosition::After);

    e.handle_drop();

    assert_eq!(ids(e.items()), vec![1, 2, 5, 3, 4, 6]);
}

#[test]
fn drop_before_moves_item_forward() {
    let events = Events::default();
    let mut e = engine(6, &events);
    e.start_drag(e.items()[0].clone(), 0);
    e.handle_drag_over(3, DropPosition::Before);

    e.handle_drop();

    assert_eq!(ids(e.items()), vec![2, 3, 1, 4, 5, 6]);
}

#[test]
fn drop_on_origin_does_not_reorder() {
    let events = Events::default();
    let mut e = engine(5, &events);
    e.start_drag(e.items()[2].clone(), 2);
    e.handle_drag_over(2, DropPosition::After);

    assert!(!e.handle_drop());

    assert_eq!(ids(e.items()), vec![1, 2, 3, 4, 5]);
    assert_eq!(events.take(), vec!["start:3", "end:3"]);
    assert!(!e.is_dragging());
}

#[test]
fn drop_just_before_next_row_does_not_reorder() {
    let events = Events::default();
    let mut e = engine(5, &events);
    e.start_drag(e.items()[2].clone(), 2);
    e.handle_drag_over(3, DropPosition::Before);

    assert!(!e.handle_drop());
    assert_eq!(events.take(), vec!["start:3", "end:3"]);
}

#[test]
fn drop_without_target_only_ends_drag() {
    let events = Events::default();
    let mut e = engine(5, &events);
    e.start_drag(e.items()[0].clone(), 0);

    assert!(!e.handle_drop());

    assert_eq!(events.take(), vec!["start:1", "end:1"]);
    assert!(!e.is_dragging());
}

#[test]
fn drop_without_drag_does_nothing() {
    let events = Events::default();
    let mut e = engine(5, &events);

    assert!(!e.handle_drop());
    assert!(events.take().is_empty());
}

#[test]
fn drop_past_the_end_lands_last() {
    let events = Events::default();
    let mut e = engine(4, &events);
    e.start_drag(e.items()[0].clone(), 0);
    e.handle_drag_over(10, DropPosition::After);

    e.handle_drop();

    assert_eq!(ids(e.items()), vec![2, 3, 4, 1]);
}

// ── cancel_drag ──────────────────────────────────────────────────

#[test]
fn cancel_ends_drag_without_reorder() {
    let events = Events::default();
    let mut e = engine(5, &events);
    e.start_drag(e.items()[1].clone(), 1);
    e.handle_drag_over(4, DropPosition::After);

    e.cancel_drag();

    assert!(!e.is_dragging());
    assert_eq!(e.drop_target(), None);
    assert_eq!(ids(e.items()), vec![1, 2, 3, 4, 5]);
    assert_eq!(events.take(), vec!["start:2", "end:2"]);
}

#[test]
fn cancel_when_idle_fires_nothing() {
    let events = Events::default();
    let mut e = engine(5, &events);

    e.cancel_drag();

    assert!(events.take().is_empty());
}

// ── can_drop_at / enable / disable ───────────────────────────────

#[test]
fn can_drop_at_excludes_origin() {
    let events = Events::default();
    let mut e = engine(5, &events);
    assert!(!e.can_drop_at(1));

    e.start_drag(e.items()[2].clone(), 2);

    assert!(e.can_drop_at(0));
    assert!(e.can_drop_at(4));
    assert!(!e.can_drop_at(2));
}

#[test]
fn disable_mid_drag_suppresses_side_effects_but_keeps_session() {
    let events = Events::default();
    let mut e = engine(5, &events);
    e.start_drag(e.items()[0].clone(), 0);
    e.handle_drag_over(3, DropPosition::After);
    events.take();

    e.disable();
    assert!(!e.can_drop_at(3));
    e.handle_drag_over(1, DropPosition::Before);
    assert!(!e.handle_drop());
    e.cancel_drag();

    assert!(events.take().is_empty());
    assert!(e.is_dragging());
    assert_eq!(e.drop_target().unwrap().index, 3);

    e.enable();
    assert!(e.handle_drop());
    assert_eq!(ids(e.items()), vec![2, 3, 4, 1, 5]);
}

// ── update_items / cross_list ────────────────────────────────────

#[test]
fn update_items_replaces_backing_list() {
    let events = Events::default();
    let mut e = engine(3, &events);

    e.update_items(rows(6));
    e.start_drag(e.items()[5].clone(), 5);
    e.handle_drag_over(0, DropPosition::Before);
    e.handle_drop();

    assert_eq!(ids(e.items()), vec![6, 1, 2, 3, 4, 5]);
}

#[test]
fn update_items_mid_drag_uses_new_list() {
    let events = Events::default();
    let mut e = engine(3, &events);
    e.start_drag(e.items()[0].clone(), 0);

    e.update_items(rows(5));
    e.handle_drag_over(4, DropPosition::After);
    e.handle_drop();

    assert_eq!(ids(e.items()), vec![2, 3, 4, 5, 1]);
}

#[test]
fn drop_after_list_shrinks_past_origin_keeps_list() {
    let events = Events::default();
    let mut e = engine(3, &events);
    e.start_drag(e.items()[2].clone(), 2);

    e.update_items(rows(2));
    e.handle_drag_over(0, DropPosition::Before);

    assert!(!e.handle_drop());
    assert_eq!(ids(e.items()), vec![1, 2]);
    assert_eq!(events.take(), vec!["start:3", "end:3"]);
    assert!(!e.is_dragging());
    assert_eq!(e.drop_target(), None);
}

#[test]
fn cross_list_drag_inserts_foreign_item() {
    let events = Events::default();
    let mut e = engine_with(
        rows(3),
        ReorderConfig {
            cross_list: true,
            ..Default::default()
        },
        &events,
    );
    let foreign = Row {
        id: 99,
        name: "From another list".to_string(),
    };

    e.start_drag(foreign, 7);
    e.handle_drag_over(0, DropPosition::After);

    assert!(e.handle_drop());
    assert_eq!(ids(e.items()), vec![1, 99, 2, 3]);
    assert_eq!(events.take(), vec!["start:99", "reorder:[1, 99, 2, 3]", "end:99"]);
}

#[test]
fn cross_list_in_range_origin_reorders_normally() {
    let events = Events::default();
    let mut e = engine_with(
        rows(4),
        ReorderConfig {
            cross_list: true,
            ..Default::default()
        },
        &events,
    );

    e.start_drag(e.items()[3].clone(), 3);
    e.handle_drag_over(0, DropPosition::Before);
    e.handle_drop();

    assert_eq!(ids(e.items()), vec![4, 1, 2, 3]);
}

#[test]
fn into_items_returns_final_order() {
    let events = Events::default();
    let mut e = engine(3, &events);
    e.start_drag(e.items()[2].clone(), 2);
    e.handle_drag_over(0, DropPosition::Before);
    e.handle_drop();

    assert_eq!(ids(&e.into_items()), vec![3, 1, 2]);
}

#[test]
fn config_round_trips_through_json() {
    let config: ReorderConfig = serde_json::from_str(r#"{"cross_list":true}"#).unwrap();
    assert!(config.enabled);
    assert!(config.cross_list);
}

// ── Properties ───────────────────────────────────────────────────

fn position() -> impl Strategy<Value = DropPosition> {
    prop_oneof![Just(DropPosition::Before), Just(DropPosition::After)]
}

proptest! {
    #[test]
    fn drop_is_a_permutation_placing_item_at_destination(
        (len, origin, target) in (1usize..30).prop_flat_map(|len| (Just(len), 0..len, 0..len)),
        position in position(),
    ) {
        let items: Vec<usize> = (0..len).collect();
        let mut e = DragReorderEngine::new(items.clone(), ReorderConfig::default());

        e.start_drag(origin, origin);
        e.handle_drag_over(target, position);
        let moved = e.handle_drop();

        let dest = resolve_destination(origin, DropTarget { index: target, position }, len);
        prop_assert_eq!(moved, dest != origin);
        prop_assert_eq!(e.items()[dest], origin);

        let mut sorted = e.items().to_vec();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, items);
    }

    #[test]
    fn untouched_rows_keep_relative_order(
        (len, origin, target) in (2usize..30).prop_flat_map(|len| (Just(len), 0..len, 0..len)),
        position in position(),
    ) {
        let mut e = DragReorderEngine::new((0..len).collect::<Vec<usize>>(), ReorderConfig::default());

        e.start_drag(origin, origin);
        e.handle_drag_over(target, position);
        e.handle_drop();

        let others: Vec<usize> = e.items().iter().copied().filter(|&v| v != origin).collect();
        let expected: Vec<usize> = (0..len).filter(|&v| v != origin).collect();
        prop_assert_eq!(others, expected);
    }
}
