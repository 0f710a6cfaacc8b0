//! Cursor pagination and the scroll-driven next-page trigger.

pub mod page_source;
pub mod pagination_driver;
pub mod scroll_trigger;

pub use page_source::{FetchError, PageFuture, PageSource};
pub use pagination_driver::{PaginationConfig, PaginationDriver, PaginationState, PaginationStatus};
pub use scroll_trigger::{
    can_fetch_more, sentinel_visible, FetchAffordance, NextPageFetcher, ScrollProximityTrigger,
};
