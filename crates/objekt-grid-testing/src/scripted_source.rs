//! A page source whose responses are scripted by the test.
//!
//! In catalog mode pages are cut from a fixed item list and resolve as soon as
//! they are polled. In manual mode every fetch stays pending until the test
//! resolves it, which is how ordering and stale-response cases are driven.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use objekt_grid_foundation::{FetchError, PageFuture, PageSource};

use crate::fixtures::TestItem;

/// One response page.
#[derive(Clone, Debug, PartialEq)]
pub struct TestPage {
    pub items: Vec<TestItem>,
    pub next_cursor: Option<u32>,
    pub total: Option<usize>,
    /// Makes `page_items` fail for this page.
    pub malformed: bool,
}

impl TestPage {
    pub fn new(items: Vec<TestItem>, next_cursor: Option<u32>) -> Self {
        Self {
            items,
            next_cursor,
            total: None,
            malformed: false,
        }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn malformed() -> Self {
        Self {
            malformed: true,
            ..Self::new(Vec::new(), None)
        }
    }
}

#[derive(Default)]
struct FetchSlot {
    result: Option<Result<TestPage, FetchError>>,
    waker: Option<Waker>,
    delivered: bool,
    dropped: bool,
}

struct PendingFetch {
    cursor: Option<u32>,
    slot: Rc<RefCell<FetchSlot>>,
}

enum Mode {
    Manual,
    Catalog { items: Vec<TestItem>, page_size: usize },
}

struct ScriptState {
    mode: Mode,
    calls: Vec<Option<u32>>,
    pending: VecDeque<PendingFetch>,
    failures: VecDeque<FetchError>,
    malformed: VecDeque<u32>,
}

/// Scripted stand-in for the paged-data collaborator.
///
/// Cloning shares the script, so a test keeps one clone to drive responses
/// after handing another to the grid.
#[derive(Clone)]
pub struct ScriptedPageSource {
    state: Rc<RefCell<ScriptState>>,
}

impl std::fmt::Debug for ScriptedPageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ScriptedPageSource")
            .field("calls", &state.calls)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl ScriptedPageSource {
    fn with_mode(mode: Mode) -> Self {
        Self {
            state: Rc::new(RefCell::new(ScriptState {
                mode,
                calls: Vec::new(),
                pending: VecDeque::new(),
                failures: VecDeque::new(),
                malformed: VecDeque::new(),
            })),
        }
    }

    /// Every fetch waits for [`resolve_next`](Self::resolve_next).
    pub fn manual() -> Self {
        Self::with_mode(Mode::Manual)
    }

    /// Serves `items` in pages of `page_size`; cursor `n` is page `n`.
    pub fn catalog(items: Vec<TestItem>, page_size: usize) -> Self {
        Self::with_mode(Mode::Catalog {
            items,
            page_size: page_size.max(1),
        })
    }

    /// The next catalog fetch fails with `error`.
    pub fn fail_next(&self, error: FetchError) {
        self.state.borrow_mut().failures.push_back(error);
    }

    /// The catalog page at `cursor` comes back malformed once.
    pub fn malform_page(&self, cursor: u32) {
        self.state.borrow_mut().malformed.push_back(cursor);
    }

    /// Cursors requested so far, in order.
    pub fn calls(&self) -> Vec<Option<u32>> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    /// Manual fetches not yet resolved.
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Manual fetches whose future was dropped before it saw a result.
    pub fn dropped_count(&self) -> usize {
        self.state
            .borrow()
            .pending
            .iter()
            .filter(|fetch| fetch.slot.borrow().dropped)
            .count()
    }

    /// Cursor of the oldest pending manual fetch.
    pub fn pending_cursor(&self) -> Option<Option<u32>> {
        self.state.borrow().pending.front().map(|fetch| fetch.cursor)
    }

    /// Resolves the oldest pending manual fetch. Returns false if none.
    pub fn resolve_next(&self, result: Result<TestPage, FetchError>) -> bool {
        let Some(fetch) = self.state.borrow_mut().pending.pop_front() else {
            return false;
        };
        let waker = {
            let mut slot = fetch.slot.borrow_mut();
            slot.result = Some(result);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    /// Resolves the oldest pending fetch with a page of `items`.
    pub fn resolve_page(&self, items: Vec<TestItem>, next_cursor: Option<u32>) -> bool {
        self.resolve_next(Ok(TestPage::new(items, next_cursor)))
    }

    fn catalog_page(items: &[TestItem], page_size: usize, cursor: u32) -> TestPage {
        let start = (cursor as usize).saturating_mul(page_size).min(items.len());
        let end = (start + page_size).min(items.len());
        let next_cursor = (end < items.len()).then_some(cursor + 1);
        TestPage::new(items[start..end].to_vec(), next_cursor).with_total(items.len())
    }
}

impl PageSource for ScriptedPageSource {
    type Page = TestPage;
    type Item = TestItem;
    type Cursor = u32;

    fn fetch_page(&self, cursor: Option<u32>) -> PageFuture<TestPage> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.calls.push(cursor);
        log::trace!("scripted fetch #{} cursor {:?}", state.calls.len(), cursor);

        let slot = Rc::new(RefCell::new(FetchSlot::default()));
        match &state.mode {
            Mode::Manual => {
                state.pending.push_back(PendingFetch {
                    cursor,
                    slot: Rc::clone(&slot),
                });
            }
            Mode::Catalog { items, page_size } => {
                let page_index = cursor.unwrap_or(0);
                let mut page = Self::catalog_page(items, *page_size, page_index);
                if let Some(position) = state.malformed.iter().position(|&c| c == page_index) {
                    state.malformed.remove(position);
                    page.malformed = true;
                }
                let result = match state.failures.pop_front() {
                    Some(error) => Err(error),
                    None => Ok(page),
                };
                slot.borrow_mut().result = Some(result);
            }
        }
        Box::pin(ScriptedFetch { slot })
    }

    fn page_items(&self, page: &TestPage) -> Result<Vec<TestItem>, FetchError> {
        if page.malformed {
            return Err(FetchError::MalformedPage("items field missing".into()));
        }
        Ok(page.items.clone())
    }

    fn next_cursor(&self, page: &TestPage) -> Option<u32> {
        page.next_cursor
    }

    fn total(&self, first_page: &TestPage) -> Option<usize> {
        first_page.total
    }
}

struct ScriptedFetch {
    slot: Rc<RefCell<FetchSlot>>,
}

impl Future for ScriptedFetch {
    type Output = Result<TestPage, FetchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        match slot.result.take() {
            Some(result) => {
                slot.delivered = true;
                Poll::Ready(result)
            }
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl Drop for ScriptedFetch {
    fn drop(&mut self) {
        let mut slot = self.slot.borrow_mut();
        if !slot.delivered {
            slot.dropped = true;
        }
    }
}
