//! A pretend browser window and a card renderer that logs instead of painting.

use std::cell::Cell;

use objekt_grid_foundation::{
    EntryContext, FetchAffordance, ItemRenderer, LayoutHost, RowEntry, RowKey, RowPlacement,
};

use crate::catalog::{Objekt, PinnedObjekt};

/// Height of a card caption line.
const CAPTION_LINE: f32 = 18.0;
/// Captions longer than this wrap onto a second line.
const CAPTION_WRAP: usize = 18;

/// Document with a fixed header above the grid container.
#[derive(Debug)]
pub struct SimulatedWindow {
    width: Cell<f32>,
    viewport_height: f32,
    header_height: f32,
    scroll_offset: Cell<f32>,
}

impl SimulatedWindow {
    pub fn new(width: f32, viewport_height: f32, header_height: f32) -> Self {
        Self {
            width: Cell::new(width),
            viewport_height,
            header_height,
            scroll_offset: Cell::new(0.0),
        }
    }

    pub fn resize(&self, width: f32) {
        self.width.set(width);
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset.get()
    }

    pub fn scroll_to(&self, offset: f32) {
        self.scroll_offset.set(offset.max(0.0));
    }

    /// Scrolls by `delta`, stopping at the bottom of a grid `grid_height` tall.
    pub fn scroll_by(&self, delta: f32, grid_height: f32) {
        let max = (self.header_height + grid_height - self.viewport_height).max(0.0);
        self.scroll_offset
            .set((self.scroll_offset.get() + delta).clamp(0.0, max));
    }
}

impl LayoutHost for SimulatedWindow {
    fn container_width(&self) -> Option<f32> {
        Some(self.width.get())
    }

    fn container_offset_top(&self) -> Option<f32> {
        Some(self.header_height)
    }

    fn viewport_height(&self) -> Option<f32> {
        Some(self.viewport_height)
    }

    fn scroll_offset(&self) -> Option<f32> {
        Some(self.scroll_offset.get())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub rows: usize,
    pub cards: usize,
    pub pins: usize,
    pub priority: usize,
}

/// Logs each materialized row and works out how tall it "really" is.
///
/// A row is the estimated card height plus its tallest caption, so rows with
/// wrapping captions measure taller than the estimate.
#[derive(Debug, Default)]
pub struct LoggingRenderer {
    stats: RenderStats,
    caption_lines: usize,
    measurements: Vec<(RowKey, f32)>,
    footer: Option<FetchAffordance>,
}

impl LoggingRenderer {
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn measurements(&self) -> &[(RowKey, f32)] {
        &self.measurements
    }

    pub fn footer(&self) -> Option<FetchAffordance> {
        self.footer
    }
}

fn caption_lines(label: &str) -> usize {
    if label.len() > CAPTION_WRAP {
        2
    } else {
        1
    }
}

impl ItemRenderer<PinnedObjekt, Objekt> for LoggingRenderer {
    fn begin_grid(&mut self, total_height: f32) {
        log::trace!("grid container {total_height:.0}px tall");
    }

    fn begin_row(&mut self, _placement: &RowPlacement) {
        self.caption_lines = 0;
    }

    fn render_entry(&mut self, context: EntryContext<'_, PinnedObjekt, Objekt>) {
        let (label, pin_order) = match context.entry {
            RowEntry::Pin(pin) => (pin.objekt.label(), Some(pin.order)),
            RowEntry::Item(objekt) => (objekt.label(), None),
        };
        self.caption_lines = self.caption_lines.max(caption_lines(&label));
        self.stats.cards += 1;
        if context.is_pin {
            self.stats.pins += 1;
        }
        if context.priority {
            self.stats.priority += 1;
        }
        match pin_order {
            Some(order) => log::trace!("  [{}] pin #{order} {label}", context.column),
            None => log::trace!("  [{}] {} {label}", context.column, context.id),
        }
    }

    fn end_row(&mut self, placement: &RowPlacement) {
        self.stats.rows += 1;
        let height = placement.row.size_estimate + CAPTION_LINE * self.caption_lines as f32;
        log::trace!(
            "row {} at {:.0}px, {:.0}px tall",
            placement.row.index,
            placement.translate_y,
            height
        );
        self.measurements.push((placement.row.key, height));
    }

    fn render_footer(&mut self, affordance: FetchAffordance) {
        self.footer = Some(affordance);
    }
}
