//! Window virtualization over grid rows.
//!
//! Row offsets are kept as a prefix sum over each row's best-known height
//! (measured when available, estimated otherwise). Changes repair the prefix
//! from the first affected row only, so appending a page leaves every earlier
//! row where it was. Range lookup is a binary search over the prefix.

use std::ops::Range;

use super::measured_sizes::{MeasuredSizes, RowKey};
use super::metrics::CardMetrics;

/// Default number of rows materialized past each edge of the viewport.
pub const DEFAULT_OVERSCAN: usize = 3;

/// Content padding outside every row's size.
///
/// `before` sits above row 0 and `after` below the last row. Neither is ever
/// part of a measured or estimated row height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgePadding {
    pub before: f32,
    pub after: f32,
}

impl Default for EdgePadding {
    fn default() -> Self {
        Self {
            before: 2.0,
            after: 2.0,
        }
    }
}

impl EdgePadding {
    pub const ZERO: EdgePadding = EdgePadding {
        before: 0.0,
        after: 0.0,
    };
}

#[derive(Clone, Debug)]
pub struct VirtualizerConfig {
    pub metrics: CardMetrics,
    pub overscan: usize,
    pub padding: EdgePadding,
}

impl Default for VirtualizerConfig {
    fn default() -> Self {
        Self {
            metrics: CardMetrics::default(),
            overscan: DEFAULT_OVERSCAN,
            padding: EdgePadding::default(),
        }
    }
}

/// Inputs for one virtualization pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VirtualizeInput {
    /// Number of composed rows.
    pub count: usize,
    pub column_count: usize,
    pub container_width: f32,
    /// Container offset from the document top.
    pub scroll_margin: f32,
    /// Document scroll offset.
    pub scroll_offset: f32,
    pub viewport_height: f32,
}

/// A materialized row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VirtualRow {
    pub index: usize,
    /// Document-relative top of the row (scroll margin and leading padding
    /// included).
    pub start: f32,
    /// Best-known height: measured if available, else estimated.
    pub size_estimate: f32,
    pub key: RowKey,
}

impl VirtualRow {
    pub fn end(&self) -> f32 {
        self.start + self.size_estimate
    }
}

/// Output of [`WindowVirtualizer::virtualize`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VirtualWindow {
    /// Ascending by index, starts non-decreasing.
    pub virtual_rows: Vec<VirtualRow>,
    /// Sum of every row's best-known size plus edge padding; 0 with no rows.
    pub total_size: f32,
    /// Rows intersecting the viewport, overscan excluded.
    pub visible: Range<usize>,
}

impl VirtualWindow {
    pub fn last_materialized_index(&self) -> Option<usize> {
        self.virtual_rows.last().map(|row| row.index)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SizingKey {
    column_count: usize,
    container_width: f32,
}

/// Turns a row count plus viewport geometry into the rows worth rendering.
#[derive(Debug)]
pub struct WindowVirtualizer {
    config: VirtualizerConfig,
    sizing: Option<SizingKey>,
    estimate: f32,
    count: usize,
    /// `starts[i]` is the content-relative top of row `i`; `starts[count]` is
    /// the sum of every row size.
    starts: Vec<f32>,
    measured: MeasuredSizes,
    dirty_from: Option<usize>,
    scroll_margin: f32,
    scroll_offset: f32,
    viewport_height: f32,
    visible: Range<usize>,
}

impl Default for WindowVirtualizer {
    fn default() -> Self {
        Self::new(VirtualizerConfig::default())
    }
}

impl WindowVirtualizer {
    pub fn new(config: VirtualizerConfig) -> Self {
        let estimate = config.metrics.estimate_row_height(0.0, 1);
        Self {
            config,
            sizing: None,
            estimate,
            count: 0,
            starts: vec![0.0],
            measured: MeasuredSizes::new(),
            dirty_from: None,
            scroll_margin: 0.0,
            scroll_offset: 0.0,
            viewport_height: 0.0,
            visible: 0..0,
        }
    }

    pub fn config(&self) -> &VirtualizerConfig {
        &self.config
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        self.config.overscan = overscan;
    }

    pub fn row_count(&self) -> usize {
        self.count
    }

    /// Current estimate used for unmeasured rows.
    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    pub fn measured_sizes(&self) -> &MeasuredSizes {
        &self.measured
    }

    /// Runs one pass: applies sizing/count changes, repairs offsets, and
    /// returns the rows to materialize.
    pub fn virtualize(&mut self, input: VirtualizeInput) -> VirtualWindow {
        self.apply_sizing(input.column_count.max(1), input.container_width);
        self.apply_count(input.count);
        if let Some(from) = self.measured.take_dirty_from() {
            self.mark_dirty(from);
        }
        self.repair();

        self.scroll_margin = finite_or_zero(input.scroll_margin);
        self.scroll_offset = finite_or_zero(input.scroll_offset);
        self.viewport_height = finite_or_zero(input.viewport_height).max(0.0);
        self.visible = self.compute_visible();

        let overscan = self.config.overscan;
        let first = self.visible.start.saturating_sub(overscan);
        let end = (self.visible.end + overscan).min(self.count);
        let virtual_rows = (first..end)
            .map(|index| VirtualRow {
                index,
                start: self.content_origin() + self.starts[index],
                size_estimate: self.size_of(index),
                key: self.measured.key_for(index),
            })
            .collect();

        VirtualWindow {
            virtual_rows,
            total_size: self.total_size(),
            visible: self.visible.clone(),
        }
    }

    /// Records a rendered row's real height.
    ///
    /// Returns the scroll adjustment the host should apply when the row sits
    /// above the viewport top, so content under the user's eye stays put.
    /// Offsets are repaired on the next [`virtualize`](Self::virtualize).
    pub fn measure_element(&mut self, key: RowKey, size: f32) -> Option<f32> {
        if key.index >= self.count {
            return None;
        }
        let before = self.size_of(key.index);
        self.measured.record(key, size).ok()?;
        let delta = size - before;
        let row_top = self.starts[key.index];
        if delta != 0.0 && row_top < self.viewport_top() {
            Some(delta)
        } else {
            None
        }
    }

    pub fn total_size(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        let padding = self.config.padding;
        padding.before + self.starts[self.count] + padding.after
    }

    /// Rows intersecting the viewport as of the last pass, overscan excluded.
    pub fn visible_range(&self) -> Range<usize> {
        self.visible.clone()
    }

    /// Document-relative top of `index`, for scroll-to-row.
    pub fn offset_for_row(&self, index: usize) -> Option<f32> {
        (index < self.count).then(|| self.content_origin() + self.starts[index])
    }

    /// Whether the final row intersects the viewport.
    pub fn is_scrolled_to_end(&self) -> bool {
        self.count == 0 || self.visible.end >= self.count
    }

    fn apply_sizing(&mut self, column_count: usize, container_width: f32) {
        let next = SizingKey {
            column_count,
            container_width,
        };
        let previous = self.sizing.replace(next);
        let Some(previous) = previous else {
            self.estimate = self
                .config
                .metrics
                .estimate_row_height(container_width, column_count);
            self.mark_dirty(0);
            return;
        };
        if previous == next {
            return;
        }
        if previous.column_count != column_count {
            log::debug!(
                "column count {} -> {}: dropping {} measured rows",
                previous.column_count,
                column_count,
                self.measured.measured_count()
            );
            self.measured.invalidate();
            self.measured.take_dirty_from();
        }
        let estimate = self
            .config
            .metrics
            .estimate_row_height(container_width, column_count);
        if estimate != self.estimate || previous.column_count != column_count {
            self.estimate = estimate;
            self.mark_dirty(0);
        }
    }

    fn apply_count(&mut self, count: usize) {
        if count == self.count {
            return;
        }
        if count < self.count {
            // Pending measurement repairs are picked up by `virtualize`.
            self.measured.truncate(count);
            self.starts.truncate(count + 1);
            if let Some(from) = self.dirty_from {
                if from > count {
                    self.dirty_from = if count == 0 { None } else { Some(count) };
                }
            }
        } else {
            self.starts.resize(count + 1, 0.0);
            self.mark_dirty(self.count);
        }
        self.count = count;
    }

    fn mark_dirty(&mut self, index: usize) {
        self.dirty_from = Some(self.dirty_from.map_or(index, |from| from.min(index)));
    }

    fn repair(&mut self) {
        let Some(from) = self.dirty_from.take() else {
            return;
        };
        for index in from.min(self.count)..self.count {
            self.starts[index + 1] = self.starts[index] + self.size_of(index);
        }
    }

    fn size_of(&self, index: usize) -> f32 {
        self.measured.get(index).unwrap_or(self.estimate)
    }

    fn content_origin(&self) -> f32 {
        self.scroll_margin + self.config.padding.before
    }

    /// Viewport top in content coordinates.
    fn viewport_top(&self) -> f32 {
        self.scroll_offset - self.content_origin()
    }

    fn compute_visible(&self) -> Range<usize> {
        if self.count == 0 {
            return 0..0;
        }
        let top = self.viewport_top();
        let bottom = top + self.viewport_height;
        let ends = &self.starts[1..=self.count];
        let first = ends.partition_point(|end| *end <= top).min(self.count - 1);
        let starts = &self.starts[..self.count];
        let end = starts.partition_point(|start| *start < bottom);
        first..end.max(first + 1)
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
