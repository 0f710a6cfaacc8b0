//! Windowed grid virtualization and pagination merging for the objekt catalog.
//!
//! Pins and a cursor-paginated item stream are merged into fixed-width rows,
//! only the rows near the viewport are materialized, and the next page is
//! requested as the end of the grid scrolls into view. Everything runs on the
//! UI thread of an [`objekt_grid_core::Runtime`].

pub mod grid;
pub mod paging;

pub use grid::*;
pub use paging::*;

pub mod prelude {
    pub use crate::grid::{
        ColumnPolicy, EntryContext, GridConfig, GridFrame, GridItem, ItemKey, ItemRenderer,
        LayoutHost, ObjektGridState, PinnedItem, Row, RowEntry, RowPlacement, VirtualRow,
    };
    pub use crate::paging::{
        FetchAffordance, FetchError, PageFuture, PageSource, PaginationState, PaginationStatus,
    };
}
