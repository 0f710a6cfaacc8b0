//! Cursor pagination state machine.
//!
//! `Idle → Loading → {Success, Error}`, then `Success → Loading → ...` for each
//! next page and `Error → Loading` on retry. At most one request is in flight
//! per driver. Every request captures the driver's generation and a request
//! id; a completion that no longer matches the in-flight slot is dropped, so a
//! response from a superseded query can never land in the current one.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use objekt_grid_core::{RuntimeHandle, TaskHandle};

use super::page_source::{FetchError, PageSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaginationStatus {
    Idle,
    Loading,
    Error,
    Success,
}

/// Copyable snapshot of a driver's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationState {
    pub status: PaginationStatus,
    /// The most recent page carried a cursor. False before the first page.
    pub has_next_page: bool,
    /// A request for a page after the first is in flight.
    pub is_fetching_next_page: bool,
    pub page_count: usize,
    pub item_count: usize,
    /// Server-reported total, from the first page.
    pub total: Option<usize>,
    pub generation: u64,
    /// Bumped on every state change.
    pub revision: u64,
}

impl PaginationState {
    pub fn is_fetching(&self) -> bool {
        self.status == PaginationStatus::Loading
    }
}

#[derive(Clone, Debug)]
pub struct PaginationConfig {
    /// Cancel the task of a superseded sequence on restart, on top of the
    /// generation check at completion.
    pub cancel_superseded: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            cancel_superseded: true,
        }
    }
}

impl PaginationConfig {
    pub fn with_cancel_superseded(mut self, cancel: bool) -> Self {
        self.cancel_superseded = cancel;
        self
    }
}

struct InFlight {
    generation: u64,
    request_id: u64,
    task: Option<TaskHandle>,
}

struct DriverInner<S: PageSource> {
    source: Rc<S>,
    generation: u64,
    next_request_id: u64,
    pages: Vec<S::Page>,
    items: Rc<[S::Item]>,
    total: Option<usize>,
    next_cursor: Option<S::Cursor>,
    status: PaginationStatus,
    in_flight: Option<InFlight>,
    last_error: Option<FetchError>,
    revision: u64,
}

impl<S: PageSource> DriverInner<S> {
    fn new(source: Rc<S>) -> Self {
        Self {
            source,
            generation: 0,
            next_request_id: 1,
            pages: Vec::new(),
            items: Rc::from(Vec::new()),
            total: None,
            next_cursor: None,
            status: PaginationStatus::Idle,
            in_flight: None,
            last_error: None,
            revision: 0,
        }
    }

    fn has_next_page(&self) -> bool {
        !self.pages.is_empty() && self.next_cursor.is_some()
    }

    fn set_status(&mut self, status: PaginationStatus) {
        if self.status != status {
            log::debug!(
                "pagination gen {}: {:?} -> {:?}",
                self.generation,
                self.status,
                status
            );
            self.status = status;
        }
        self.revision += 1;
    }

    fn snapshot(&self) -> PaginationState {
        PaginationState {
            status: self.status,
            has_next_page: self.has_next_page(),
            is_fetching_next_page: self.in_flight.is_some() && !self.pages.is_empty(),
            page_count: self.pages.len(),
            item_count: self.items.len(),
            total: self.total,
            generation: self.generation,
            revision: self.revision,
        }
    }

    /// Applies a finished request. Returns whether state changed.
    fn complete(&mut self, generation: u64, request_id: u64, result: Result<S::Page, FetchError>) -> bool {
        let matches = self
            .in_flight
            .as_ref()
            .is_some_and(|flight| flight.generation == generation && flight.request_id == request_id);
        if !matches {
            log::debug!(
                "discarding response for gen {} request {} (current gen {})",
                generation,
                request_id,
                self.generation
            );
            return false;
        }
        self.in_flight = None;

        let source = Rc::clone(&self.source);
        let applied = result.and_then(|page| {
            let items = source.page_items(&page)?;
            Ok((page, items))
        });
        match applied {
            Ok((page, items)) => {
                if self.pages.is_empty() {
                    self.total = source.total(&page);
                }
                self.next_cursor = source.next_cursor(&page);
                if !items.is_empty() {
                    self.items = self.items.iter().cloned().chain(items).collect();
                }
                self.pages.push(page);
                self.last_error = None;
                self.set_status(PaginationStatus::Success);
            }
            Err(error) => {
                match &error {
                    FetchError::MalformedPage(reason) => {
                        log::warn!("page {} rejected: {}", self.pages.len() + 1, reason)
                    }
                    other => log::debug!("page {} failed: {}", self.pages.len() + 1, other),
                }
                self.last_error = Some(error);
                self.set_status(PaginationStatus::Error);
            }
        }
        true
    }
}

/// Owns the page list for one query configuration at a time.
///
/// Cloning yields another handle to the same state.
pub struct PaginationDriver<S: PageSource> {
    inner: Rc<RefCell<DriverInner<S>>>,
    runtime: RuntimeHandle,
    config: PaginationConfig,
}

impl<S: PageSource> Clone for PaginationDriver<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            runtime: self.runtime.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: PageSource> fmt::Debug for PaginationDriver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationDriver")
            .field("state", &self.state())
            .finish()
    }
}

impl<S: PageSource> PaginationDriver<S> {
    /// Creates an idle driver; nothing is fetched until
    /// [`fetch_next_page`](Self::fetch_next_page).
    pub fn new(runtime: RuntimeHandle, source: S, config: PaginationConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DriverInner::new(Rc::new(source)))),
            runtime,
            config,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.inner.borrow().snapshot()
    }

    /// Every item fetched so far, page by page in fetch order.
    ///
    /// A new `Rc` is produced each time a page adds items, so identity
    /// comparison detects growth.
    pub fn items(&self) -> Rc<[S::Item]> {
        Rc::clone(&self.inner.borrow().items)
    }

    pub fn total(&self) -> Option<usize> {
        self.inner.borrow().total
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.inner.borrow().last_error.clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    pub fn source(&self) -> Rc<S> {
        Rc::clone(&self.inner.borrow().source)
    }

    pub fn with_pages<R>(&self, f: impl FnOnce(&[S::Page]) -> R) -> R {
        let inner = self.inner.borrow();
        f(&inner.pages)
    }

    /// Borrowed view of the pages. Do not hold across a runtime drain.
    pub fn pages(&self) -> Ref<'_, [S::Page]> {
        Ref::map(self.inner.borrow(), |inner| inner.pages.as_slice())
    }

    /// Requests the next page.
    ///
    /// No-op when a request is in flight or the stream is exhausted. With no
    /// pages yet (fresh driver or failed first page) it requests the first
    /// page; after a failure it re-requests the cursor that failed. Returns
    /// whether a request was dispatched.
    pub fn fetch_next_page(&self) -> bool {
        let cursor = {
            let inner = self.inner.borrow();
            if inner.in_flight.is_some() {
                log::trace!("fetch_next_page ignored: request in flight");
                return false;
            }
            if inner.pages.is_empty() {
                None
            } else {
                match &inner.next_cursor {
                    Some(cursor) => Some(cursor.clone()),
                    None => return false,
                }
            }
        };
        self.dispatch(cursor)
    }

    /// Re-issues the request that failed. No-op unless in the error state.
    pub fn retry(&self) -> bool {
        if self.inner.borrow().status != PaginationStatus::Error {
            return false;
        }
        self.fetch_next_page()
    }

    /// Discards the current sequence and starts a new one over `source`.
    ///
    /// The first page is requested immediately. Returns the new generation.
    pub fn restart_with(&self, source: S) -> u64 {
        let (generation, superseded) = {
            let mut inner = self.inner.borrow_mut();
            let superseded = inner.in_flight.take();
            inner.generation += 1;
            inner.source = Rc::new(source);
            inner.pages.clear();
            inner.items = Rc::from(Vec::new());
            inner.total = None;
            inner.next_cursor = None;
            inner.last_error = None;
            inner.set_status(PaginationStatus::Idle);
            (inner.generation, superseded)
        };
        if let Some(flight) = superseded {
            log::debug!(
                "superseding gen {} request {}",
                flight.generation,
                flight.request_id
            );
            if self.config.cancel_superseded {
                if let Some(task) = flight.task {
                    task.cancel();
                }
            }
        }
        self.fetch_next_page();
        generation
    }

    fn dispatch(&self, cursor: Option<S::Cursor>) -> bool {
        let (source, generation, request_id) = {
            let mut inner = self.inner.borrow_mut();
            let request_id = inner.next_request_id;
            inner.next_request_id += 1;
            (Rc::clone(&inner.source), inner.generation, request_id)
        };
        log::debug!(
            "gen {} request {}: fetching cursor {:?}",
            generation,
            request_id,
            cursor
        );
        let request = source.fetch_page(cursor);

        let weak: Weak<RefCell<DriverInner<S>>> = Rc::downgrade(&self.inner);
        let runtime = self.runtime.clone();
        let task = self.runtime.spawn_ui(async move {
            let result = request.await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let changed = inner.borrow_mut().complete(generation, request_id, result);
            if changed {
                runtime.schedule();
            }
        });
        if task.is_none() {
            log::warn!("runtime is gone; page request for gen {} dropped", generation);
            return false;
        }

        let mut inner = self.inner.borrow_mut();
        inner.in_flight = Some(InFlight {
            generation,
            request_id,
            task,
        });
        inner.set_status(PaginationStatus::Loading);
        true
    }
}
