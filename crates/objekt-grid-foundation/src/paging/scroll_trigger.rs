//! Fetches the next page when the end-of-rows sentinel nears the viewport.

use crate::grid::window_virtualizer::VirtualWindow;

use super::page_source::PageSource;
use super::pagination_driver::{PaginationDriver, PaginationState, PaginationStatus};

/// Default distance below the viewport at which the sentinel counts as visible.
pub const DEFAULT_TRIGGER_MARGIN: f32 = 400.0;

/// What the trigger needs from pagination.
pub trait NextPageFetcher {
    fn pagination_state(&self) -> PaginationState;
    fn fetch_next_page(&self) -> bool;
}

impl<S: PageSource> NextPageFetcher for PaginationDriver<S> {
    fn pagination_state(&self) -> PaginationState {
        self.state()
    }

    fn fetch_next_page(&self) -> bool {
        PaginationDriver::fetch_next_page(self)
    }
}

/// Footer state shown to the user. A pure projection of [`PaginationState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchAffordance {
    ReadyToFetch,
    Fetching,
    Exhausted,
    Error,
}

impl FetchAffordance {
    pub fn from_state(state: &PaginationState) -> Self {
        match state.status {
            PaginationStatus::Error => FetchAffordance::Error,
            PaginationStatus::Idle | PaginationStatus::Loading => FetchAffordance::Fetching,
            PaginationStatus::Success if state.has_next_page => FetchAffordance::ReadyToFetch,
            PaginationStatus::Success => FetchAffordance::Exhausted,
        }
    }
}

/// `status == Success && has_next_page && !is_fetching_next_page`.
pub fn can_fetch_more(state: &PaginationState) -> bool {
    state.status == PaginationStatus::Success && state.has_next_page && !state.is_fetching_next_page
}

/// Whether the sentinel after the last row is within `margin` of the viewport.
///
/// The sentinel exists only while the final row is materialized; with no rows
/// it sits at the container top.
pub fn sentinel_visible(
    window: &VirtualWindow,
    row_count: usize,
    scroll_margin: f32,
    scroll_offset: f32,
    viewport_height: f32,
    margin: f32,
) -> bool {
    let sentinel_y = if row_count == 0 {
        scroll_margin
    } else {
        match window.virtual_rows.last() {
            Some(row) if row.index + 1 == row_count => row.end(),
            _ => return false,
        }
    };
    let top = scroll_offset - margin;
    let bottom = scroll_offset + viewport_height + margin;
    sentinel_y >= top && sentinel_y <= bottom
}

/// Fires `fetch_next_page` once per sentinel visibility episode, plus once per
/// newly loaded page while the sentinel stays in view.
#[derive(Debug, Default)]
pub struct ScrollProximityTrigger {
    sentinel_visible: bool,
    /// Page count at the last fire during the current episode.
    fired_for: Option<usize>,
}

impl ScrollProximityTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sentinel_visible(&self) -> bool {
        self.sentinel_visible
    }

    /// Feeds one visibility observation. Returns whether a fetch was issued.
    pub fn observe(&mut self, sentinel_visible: bool, fetcher: &dyn NextPageFetcher) -> bool {
        if !sentinel_visible {
            self.sentinel_visible = false;
            self.fired_for = None;
            return false;
        }
        self.sentinel_visible = true;

        let state = fetcher.pagination_state();
        if !can_fetch_more(&state) {
            return false;
        }
        if self.fired_for.is_some_and(|pages| pages >= state.page_count) {
            return false;
        }
        if !fetcher.fetch_next_page() {
            return false;
        }
        log::trace!(
            "sentinel visible at {} pages: fetching next page",
            state.page_count
        );
        self.fired_for = Some(state.page_count);
        true
    }

    /// Explicit user request for more. Guarded by the same pagination
    /// condition but not by the visibility episode.
    pub fn request_manually(&mut self, fetcher: &dyn NextPageFetcher) -> bool {
        let state = fetcher.pagination_state();
        if !can_fetch_more(&state) || !fetcher.fetch_next_page() {
            return false;
        }
        if self.sentinel_visible {
            self.fired_for = Some(state.page_count);
        }
        true
    }

    /// Forgets the current episode, e.g. when the query changes.
    pub fn reset(&mut self) {
        self.sentinel_visible = false;
        self.fired_for = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct FakeFetcher {
        state: RefCell<PaginationState>,
        calls: Cell<usize>,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                state: RefCell::new(PaginationState {
                    status: PaginationStatus::Success,
                    has_next_page: true,
                    is_fetching_next_page: false,
                    page_count: 1,
                    item_count: 20,
                    total: Some(100),
                    generation: 0,
                    revision: 0,
                }),
                calls: Cell::new(0),
            }
        }

        fn finish_page(&self) {
            let mut state = self.state.borrow_mut();
            state.status = PaginationStatus::Success;
            state.is_fetching_next_page = false;
            state.page_count += 1;
        }
    }

    impl NextPageFetcher for FakeFetcher {
        fn pagination_state(&self) -> PaginationState {
            *self.state.borrow()
        }

        fn fetch_next_page(&self) -> bool {
            self.calls.set(self.calls.get() + 1);
            let mut state = self.state.borrow_mut();
            state.status = PaginationStatus::Loading;
            state.is_fetching_next_page = true;
            true
        }
    }

    #[test]
    fn test_affordance_projection() {
        let fetcher = FakeFetcher::new();
        let mut state = fetcher.pagination_state();
        assert_eq!(FetchAffordance::from_state(&state), FetchAffordance::ReadyToFetch);
        state.has_next_page = false;
        assert_eq!(FetchAffordance::from_state(&state), FetchAffordance::Exhausted);
        state.status = PaginationStatus::Loading;
        assert_eq!(FetchAffordance::from_state(&state), FetchAffordance::Fetching);
        state.status = PaginationStatus::Error;
        assert_eq!(FetchAffordance::from_state(&state), FetchAffordance::Error);
    }

    #[test]
    fn test_fires_once_while_fetch_pending() {
        let fetcher = FakeFetcher::new();
        let mut trigger = ScrollProximityTrigger::new();

        assert!(trigger.observe(true, &fetcher));
        assert!(!trigger.observe(true, &fetcher));
        assert!(!trigger.observe(false, &fetcher));
        assert!(!trigger.observe(true, &fetcher));
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn test_refires_after_sentinel_leaves_and_returns() {
        let fetcher = FakeFetcher::new();
        let mut trigger = ScrollProximityTrigger::new();

        assert!(trigger.observe(true, &fetcher));
        fetcher.finish_page();
        assert!(!trigger.observe(false, &fetcher));
        assert!(trigger.observe(true, &fetcher));
        assert_eq!(fetcher.calls.get(), 2);
    }

    #[test]
    fn test_refires_when_page_lands_while_visible() {
        let fetcher = FakeFetcher::new();
        let mut trigger = ScrollProximityTrigger::new();

        assert!(trigger.observe(true, &fetcher));
        fetcher.finish_page();
        assert!(trigger.observe(true, &fetcher));
    }

    #[test]
    fn test_manual_request_respects_pagination_guard() {
        let fetcher = FakeFetcher::new();
        let mut trigger = ScrollProximityTrigger::new();

        assert!(trigger.request_manually(&fetcher));
        assert!(!trigger.request_manually(&fetcher));
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn test_sentinel_requires_final_row() {
        use crate::grid::measured_sizes::RowKey;
        use crate::grid::window_virtualizer::VirtualRow;

        let row = |index: usize, start: f32| VirtualRow {
            index,
            start,
            size_estimate: 100.0,
            key: RowKey {
                generation: 0,
                index,
            },
        };
        let window = VirtualWindow {
            virtual_rows: vec![row(3, 300.0), row(4, 400.0)],
            total_size: 500.0,
            visible: 3..5,
        };
        assert!(sentinel_visible(&window, 5, 0.0, 0.0, 200.0, 400.0));
        assert!(!sentinel_visible(&window, 5, 0.0, 0.0, 50.0, 100.0));
        assert!(!sentinel_visible(&window, 9, 0.0, 0.0, 2000.0, 400.0));
        assert!(sentinel_visible(&VirtualWindow::default(), 0, 0.0, 0.0, 800.0, 0.0));
    }
}
