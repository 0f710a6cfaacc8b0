//! Hands materialized rows to an item renderer.

use super::row_entry::{GridItem, ItemKey, PinnedItem, Row, RowEntry};
use super::window_virtualizer::{EdgePadding, VirtualRow, VirtualWindow};
use crate::paging::scroll_trigger::FetchAffordance;

/// Default number of leading rows whose images load eagerly.
pub const DEFAULT_PRIORITY_ROWS: usize = 4;

/// Where a row goes inside the scroll container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowPlacement {
    pub row: VirtualRow,
    /// Offset from the container top (the virtual start minus scroll margin).
    pub translate_y: f32,
    /// Extra space above row 0; zero elsewhere.
    pub padding_top: f32,
    /// Extra space below the final row; zero elsewhere.
    pub padding_bottom: f32,
}

/// One cell handed to [`ItemRenderer::render_entry`].
#[derive(Debug)]
pub struct EntryContext<'a, P, I> {
    pub id: ItemKey,
    pub entry: &'a RowEntry<P, I>,
    pub is_pin: bool,
    /// Within the first few screens: load the image eagerly.
    pub priority: bool,
    pub column: usize,
}

/// Receives the grid one row at a time.
pub trait ItemRenderer<P, I> {
    fn begin_grid(&mut self, _total_height: f32) {}

    fn begin_row(&mut self, _placement: &RowPlacement) {}

    fn render_entry(&mut self, entry: EntryContext<'_, P, I>);

    fn end_row(&mut self, _placement: &RowPlacement) {}

    /// Called after the final row once it is materialized, or alone when
    /// there are no rows.
    fn render_footer(&mut self, _affordance: FetchAffordance) {}
}

/// Walks a [`VirtualWindow`] and emits rows with their entries.
#[derive(Clone, Debug)]
pub struct GridRenderer {
    priority_rows: usize,
    padding: EdgePadding,
}

impl Default for GridRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PRIORITY_ROWS, EdgePadding::default())
    }
}

impl GridRenderer {
    pub fn new(priority_rows: usize, padding: EdgePadding) -> Self {
        Self {
            priority_rows,
            padding,
        }
    }

    /// Entries before this flat index are priority.
    pub fn priority_budget(&self, column_count: usize) -> usize {
        self.priority_rows * column_count.max(1)
    }

    pub fn render<P, I, R>(
        &self,
        rows: &[Row<P, I>],
        window: &VirtualWindow,
        scroll_margin: f32,
        column_count: usize,
        affordance: FetchAffordance,
        renderer: &mut R,
    ) where
        P: PinnedItem,
        I: GridItem,
        R: ItemRenderer<P, I> + ?Sized,
    {
        let column_count = column_count.max(1);
        let budget = self.priority_budget(column_count);
        let last_index = rows.len().checked_sub(1);
        renderer.begin_grid(window.total_size);

        for virtual_row in &window.virtual_rows {
            let Some(row) = rows.get(virtual_row.index) else {
                log::warn!(
                    "virtual row {} outside {} composed rows",
                    virtual_row.index,
                    rows.len()
                );
                continue;
            };
            let placement = RowPlacement {
                row: *virtual_row,
                translate_y: virtual_row.start - scroll_margin,
                padding_top: if virtual_row.index == 0 {
                    self.padding.before
                } else {
                    0.0
                },
                padding_bottom: if Some(virtual_row.index) == last_index {
                    self.padding.after
                } else {
                    0.0
                },
            };
            renderer.begin_row(&placement);
            for (column, entry) in row.iter().enumerate() {
                let flat_index = virtual_row.index * column_count + column;
                renderer.render_entry(EntryContext {
                    id: entry.key(),
                    entry,
                    is_pin: entry.is_pin(),
                    priority: flat_index < budget,
                    column,
                });
            }
            renderer.end_row(&placement);
        }

        let footer_due = match last_index {
            None => true,
            Some(last) => window.last_materialized_index() == Some(last),
        };
        if footer_due {
            renderer.render_footer(affordance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::measured_sizes::RowKey;
    use smallvec::smallvec;

    #[derive(Clone, Debug, PartialEq)]
    struct Card(u64);

    impl GridItem for Card {
        fn item_key(&self) -> ItemKey {
            ItemKey::Number(self.0)
        }
    }

    impl PinnedItem for Card {
        fn token_key(&self) -> ItemKey {
            ItemKey::Number(self.0)
        }
    }

    #[derive(Default)]
    struct Log {
        entries: Vec<(ItemKey, bool, bool, usize)>,
        rows: Vec<RowPlacement>,
        footer: Option<FetchAffordance>,
    }

    impl ItemRenderer<Card, Card> for Log {
        fn begin_row(&mut self, placement: &RowPlacement) {
            self.rows.push(*placement);
        }

        fn render_entry(&mut self, entry: EntryContext<'_, Card, Card>) {
            self.entries
                .push((entry.id, entry.is_pin, entry.priority, entry.column));
        }

        fn render_footer(&mut self, affordance: FetchAffordance) {
            self.footer = Some(affordance);
        }
    }

    fn virtual_row(index: usize, start: f32) -> VirtualRow {
        VirtualRow {
            index,
            start,
            size_estimate: 50.0,
            key: RowKey {
                generation: 0,
                index,
            },
        }
    }

    #[test]
    fn test_priority_and_padding() {
        let rows: Vec<Row<Card, Card>> = vec![
            smallvec![RowEntry::Pin(Card(1)), RowEntry::Item(Card(2))],
            smallvec![RowEntry::Item(Card(3)), RowEntry::Item(Card(4))],
            smallvec![RowEntry::Item(Card(5))],
        ];
        let window = VirtualWindow {
            virtual_rows: vec![
                virtual_row(0, 102.0),
                virtual_row(1, 152.0),
                virtual_row(2, 202.0),
            ],
            total_size: 154.0,
            visible: 0..3,
        };
        let renderer = GridRenderer::new(1, EdgePadding::default());
        let mut log = Log::default();
        renderer.render(&rows, &window, 100.0, 2, FetchAffordance::Exhausted, &mut log);

        assert_eq!(log.entries.len(), 5);
        assert_eq!(log.entries[0], (ItemKey::Number(1), true, true, 0));
        assert_eq!(log.entries[1], (ItemKey::Number(2), false, true, 1));
        assert_eq!(log.entries[2], (ItemKey::Number(3), false, false, 0));
        assert_eq!(log.rows[0].translate_y, 2.0);
        assert_eq!(log.rows[0].padding_top, 2.0);
        assert_eq!(log.rows[1].padding_top, 0.0);
        assert_eq!(log.rows[2].padding_bottom, 2.0);
        assert_eq!(log.footer, Some(FetchAffordance::Exhausted));
    }

    #[test]
    fn test_footer_waits_for_final_row() {
        let rows: Vec<Row<Card, Card>> = vec![
            smallvec![RowEntry::Item(Card(1))],
            smallvec![RowEntry::Item(Card(2))],
        ];
        let window = VirtualWindow {
            virtual_rows: vec![virtual_row(0, 0.0)],
            total_size: 100.0,
            visible: 0..1,
        };
        let mut log = Log::default();
        GridRenderer::default().render(
            &rows,
            &window,
            0.0,
            1,
            FetchAffordance::ReadyToFetch,
            &mut log,
        );
        assert_eq!(log.footer, None);
    }
}
