//! Card sizing and the responsive column policy.

use smallvec::SmallVec;

/// Horizontal gap between cards, in pixels.
pub const DEFAULT_GAP: f32 = 8.0;

/// Card height over card width. Objekt cards are 5.5 x 8.5 portrait.
pub const DEFAULT_ASPECT_RATIO: f32 = 8.5 / 5.5;

/// Row height reported while the container width is still unknown.
///
/// Small but non-zero: the scrollbar neither collapses nor becomes infinite
/// before the first real width arrives.
pub const PLACEHOLDER_ROW_ESTIMATE: f32 = 1.0;

/// Fixed card geometry used to estimate unmeasured row heights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardMetrics {
    pub gap: f32,
    pub aspect_ratio: f32,
}

impl Default for CardMetrics {
    fn default() -> Self {
        Self {
            gap: DEFAULT_GAP,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
        }
    }
}

impl CardMetrics {
    /// Width of one card for the given container width and column count.
    pub fn item_width(&self, container_width: f32, column_count: usize) -> f32 {
        let columns = column_count.max(1) as f32;
        let width = if container_width.is_finite() {
            container_width
        } else {
            0.0
        };
        ((width - self.gap * (columns - 1.0)) / columns).max(0.0)
    }

    /// `item_width * aspect_ratio`, never below [`PLACEHOLDER_ROW_ESTIMATE`].
    pub fn estimate_row_height(&self, container_width: f32, column_count: usize) -> f32 {
        let estimate = self.item_width(container_width, column_count) * self.aspect_ratio;
        if estimate.is_finite() && estimate > PLACEHOLDER_ROW_ESTIMATE {
            estimate
        } else {
            PLACEHOLDER_ROW_ESTIMATE
        }
    }
}

/// Width thresholds mapping a container width to a column count.
///
/// Each step `(max_width, columns)` applies to widths strictly below
/// `max_width`; widths past every step use `widest`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnBreakpoints {
    steps: SmallVec<[(f32, usize); 6]>,
    widest: usize,
}

impl Default for ColumnBreakpoints {
    fn default() -> Self {
        Self::new(&[(640.0, 3), (1024.0, 4), (1280.0, 5)], 6)
    }
}

impl ColumnBreakpoints {
    pub fn new(steps: &[(f32, usize)], widest: usize) -> Self {
        let mut steps: SmallVec<[(f32, usize); 6]> = steps
            .iter()
            .map(|&(width, columns)| (width, columns.max(1)))
            .collect();
        steps.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            steps,
            widest: widest.max(1),
        }
    }

    pub fn columns_for(&self, container_width: f32) -> usize {
        self.steps
            .iter()
            .find(|(max_width, _)| container_width < *max_width)
            .map_or(self.widest, |&(_, columns)| columns)
    }
}

/// How the grid decides its column count.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnPolicy {
    Fixed(usize),
    Responsive(ColumnBreakpoints),
}

impl Default for ColumnPolicy {
    fn default() -> Self {
        ColumnPolicy::Responsive(ColumnBreakpoints::default())
    }
}

impl ColumnPolicy {
    /// Resolves the column count for a width; always at least 1.
    pub fn resolve(&self, container_width: f32) -> usize {
        match self {
            ColumnPolicy::Fixed(columns) => (*columns).max(1),
            ColumnPolicy::Responsive(breakpoints) => breakpoints.columns_for(container_width),
        }
    }
}
