//! Row composition, viewport measurement and window virtualization.

pub mod grid_renderer;
pub mod grid_state;
pub mod measured_sizes;
pub mod metrics;
pub mod row_compositor;
pub mod row_entry;
pub mod viewport;
pub mod window_virtualizer;

pub use grid_renderer::{EntryContext, GridRenderer, ItemRenderer, RowPlacement};
pub use grid_state::{GridConfig, GridFrame, ObjektGridState};
pub use measured_sizes::{MeasuredSizes, Rejected, RowKey};
pub use metrics::{CardMetrics, ColumnBreakpoints, ColumnPolicy};
pub use row_compositor::{compose_rows, ComposeOptions, RowCompositor, ShouldRender};
pub use row_entry::{GridItem, ItemKey, PinnedItem, Row, RowEntry};
pub use viewport::{LayoutHost, ViewportChange, ViewportConfig, ViewportMeasurer, ViewportSnapshot};
pub use window_virtualizer::{
    EdgePadding, VirtualRow, VirtualWindow, VirtualizeInput, VirtualizerConfig, WindowVirtualizer,
    DEFAULT_OVERSCAN,
};
