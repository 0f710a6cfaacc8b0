//! Renderer that records what it was asked to paint.

use objekt_grid_foundation::{EntryContext, FetchAffordance, ItemKey, ItemRenderer, RowPlacement};

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedEntry {
    pub id: ItemKey,
    pub is_pin: bool,
    pub priority: bool,
    pub column: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedRow {
    pub placement: RowPlacement,
    pub entries: Vec<RenderedEntry>,
}

impl RenderedRow {
    pub fn index(&self) -> usize {
        self.placement.row.index
    }

    pub fn ids(&self) -> Vec<ItemKey> {
        self.entries.iter().map(|entry| entry.id.clone()).collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct RecordingRenderer {
    pub total_height: f32,
    pub rows: Vec<RenderedRow>,
    pub footer: Option<FetchAffordance>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RenderedEntry> {
        self.rows.iter().flat_map(|row| row.entries.iter())
    }

    pub fn row_indices(&self) -> Vec<usize> {
        self.rows.iter().map(RenderedRow::index).collect()
    }
}

impl<P, I> ItemRenderer<P, I> for RecordingRenderer {
    fn begin_grid(&mut self, total_height: f32) {
        self.total_height = total_height;
        self.rows.clear();
        self.footer = None;
    }

    fn begin_row(&mut self, placement: &RowPlacement) {
        self.rows.push(RenderedRow {
            placement: *placement,
            entries: Vec::new(),
        });
    }

    fn render_entry(&mut self, entry: EntryContext<'_, P, I>) {
        if let Some(row) = self.rows.last_mut() {
            row.entries.push(RenderedEntry {
                id: entry.id,
                is_pin: entry.is_pin,
                priority: entry.priority,
                column: entry.column,
            });
        }
    }

    fn render_footer(&mut self, affordance: FetchAffordance) {
        self.footer = Some(affordance);
    }
}
