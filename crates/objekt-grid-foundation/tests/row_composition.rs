use std::rc::Rc;

use objekt_grid_foundation::{compose_rows, ComposeOptions, ItemKey, RowCompositor};
use objekt_grid_testing::prelude::*;

fn labels(rows: &[objekt_grid_foundation::Row<TestPin, TestItem>]) -> Vec<Vec<String>> {
    row_labels(rows)
}

#[test]
fn seven_items_three_columns() {
    let rows = compose_rows::<TestPin, TestItem>(&[], &items(1, 7), 3, &ComposeOptions::default());
    assert_eq!(
        labels(&rows),
        vec![
            vec!["i1", "i2", "i3"],
            vec!["i4", "i5", "i6"],
            vec!["i7"],
        ]
    );
}

#[test]
fn pins_lead_the_first_row() {
    let rows = compose_rows(
        &pins(&[101, 102]),
        &items(1, 3),
        2,
        &ComposeOptions::default(),
    );
    assert_eq!(
        labels(&rows),
        vec![vec!["p101", "p102"], vec!["i1", "i2"], vec!["i3"]]
    );
}

#[test]
fn hidden_pins_are_skipped() {
    let rows = compose_rows(
        &pins(&[101, 102]),
        &items(1, 3),
        2,
        &ComposeOptions::default().with_hide_pins(true),
    );
    assert_eq!(labels(&rows), vec![vec!["i1", "i2"], vec!["i3"]]);
}

#[test]
fn locked_items_filtered_by_predicate() {
    let source = vec![TestItem::locked(1), TestItem::new(2), TestItem::locked(3)];
    let options = ComposeOptions::default().with_should_render(|item: &TestItem| !item.locked);
    let rows = compose_rows::<TestPin, TestItem>(&[], &source, 2, &options);
    assert_eq!(labels(&rows), vec![vec!["i2"]]);
}

#[test]
fn output_order_is_pins_then_rendered_items() {
    let pin_list = pins(&[40, 41, 42]);
    let mut stream = items(1, 23);
    stream[4].locked = true;
    stream[17].locked = true;
    let options = ComposeOptions::default().with_should_render(|item: &TestItem| !item.locked);

    for column_count in 1..=7 {
        let rows = compose_rows(&pin_list, &stream, column_count, &options);

        let mut expected: Vec<ItemKey> = pin_list.iter().map(|pin| pin.token_id.into()).collect();
        expected.extend(
            stream
                .iter()
                .filter(|item| !item.locked)
                .map(|item| ItemKey::from(item.id)),
        );
        assert_eq!(flat_keys(&rows), expected, "columns = {column_count}");
        assert_row_shape(&rows, column_count, "composed rows");
    }
}

#[test]
fn empty_inputs_compose_to_no_rows() {
    for column_count in 1..=4 {
        let rows = compose_rows::<TestPin, TestItem>(&[], &[], column_count, &ComposeOptions::default());
        assert!(rows.is_empty());
    }
    let hidden = compose_rows::<TestPin, TestItem>(
        &pins(&[1]),
        &[],
        3,
        &ComposeOptions::default().with_hide_pins(true),
    );
    assert!(hidden.is_empty());
}

#[test]
fn recomposing_identical_inputs_is_stable() {
    let pin_list = pins(&[9]);
    let stream = items(1, 10);
    let options = ComposeOptions::default();
    let first = compose_rows(&pin_list, &stream, 4, &options);
    let second = compose_rows(&pin_list, &stream, 4, &options);
    assert_eq!(first, second);
}

#[test]
fn compositor_rechunks_on_column_change() {
    let pin_list: Rc<[TestPin]> = Rc::from(pins(&[9]));
    let stream: Rc<[TestItem]> = Rc::from(items(1, 9));
    let options = ComposeOptions::default();
    let mut compositor = RowCompositor::new();

    compositor.compose(&pin_list, &stream, 5, &options);
    assert_eq!(compositor.row_count(), 2);

    assert!(compositor.compose(&pin_list, &stream, 2, &options));
    assert_eq!(compositor.row_count(), 5);
    assert_row_shape(compositor.rows(), 2, "after column change");
}
