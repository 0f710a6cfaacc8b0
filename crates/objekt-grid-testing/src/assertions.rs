//! Assertion helpers for grid tests.

use objekt_grid_foundation::{GridItem, ItemKey, PinnedItem, Row, RowEntry};

/// Assert that a value is within `tolerance` of the expected one.
pub fn assert_approx_eq(actual: f32, expected: f32, tolerance: f32, msg: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{}: expected {} (±{}), got {} (diff: {})",
        msg,
        expected,
        tolerance,
        actual,
        diff
    );
}

/// Assert that a collection has an expected count.
pub fn assert_count<T>(items: &[T], expected: usize, msg: &str) {
    assert_eq!(
        items.len(),
        expected,
        "{}: expected {} items, got {}",
        msg,
        expected,
        items.len()
    );
}

/// Row contents as `p<id>` / `i<id>` labels, for compact comparisons.
pub fn row_labels<P: PinnedItem, I: GridItem>(rows: &[Row<P, I>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|entry| {
                    let prefix = match entry {
                        RowEntry::Pin(_) => "p",
                        RowEntry::Item(_) => "i",
                    };
                    format!("{prefix}{}", entry.key())
                })
                .collect()
        })
        .collect()
}

/// Assert every row but the last is full and the last is non-empty.
pub fn assert_row_shape<P, I>(rows: &[Row<P, I>], column_count: usize, msg: &str) {
    let Some((last, full)) = rows.split_last() else {
        return;
    };
    for (index, row) in full.iter().enumerate() {
        assert_eq!(
            row.len(),
            column_count,
            "{}: row {} has {} entries",
            msg,
            index,
            row.len()
        );
    }
    assert!(
        !last.is_empty() && last.len() <= column_count,
        "{}: final row has {} entries",
        msg,
        last.len()
    );
}

/// Keys read left-to-right, top-to-bottom.
pub fn flat_keys<P: PinnedItem, I: GridItem>(rows: &[Row<P, I>]) -> Vec<ItemKey> {
    rows.iter().flat_map(|row| row.iter().map(RowEntry::key)).collect()
}
