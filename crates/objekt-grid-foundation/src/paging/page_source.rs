//! The paged-data collaborator and its failure type.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Why a page could not be applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response.
    Transport(String),
    /// The server answered with a failure status.
    Server { status: u16, message: String },
    /// The response arrived but its items could not be extracted.
    MalformedPage(String),
    /// The source gave up because the request was no longer wanted.
    Cancelled,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(reason) => write!(f, "transport failure: {reason}"),
            FetchError::Server { status, message } => {
                write!(f, "server responded {status}: {message}")
            }
            FetchError::MalformedPage(reason) => write!(f, "malformed page: {reason}"),
            FetchError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Future returned by [`PageSource::fetch_page`]. Polled on the UI thread.
pub type PageFuture<Pg> = Pin<Box<dyn Future<Output = Result<Pg, FetchError>>>>;

/// A filtered, sorted, cursor-paginated item stream.
///
/// One source instance represents one query configuration. Cursors it hands
/// out are only ever passed back to the same instance.
pub trait PageSource: 'static {
    type Page: 'static;
    type Item: Clone + 'static;
    type Cursor: Clone + fmt::Debug + 'static;

    /// Starts fetching the page at `cursor`; `None` is the first page.
    fn fetch_page(&self, cursor: Option<Self::Cursor>) -> PageFuture<Self::Page>;

    /// Extracts the items of one page, in server order.
    ///
    /// An `Err` marks the whole page malformed; none of it is applied.
    fn page_items(&self, page: &Self::Page) -> Result<Vec<Self::Item>, FetchError>;

    /// Cursor for the page after `page`; `None` once the stream is exhausted.
    fn next_cursor(&self, page: &Self::Page) -> Option<Self::Cursor>;

    /// Total item count for the query, read from the first page only.
    fn total(&self, first_page: &Self::Page) -> Option<usize>;
}
