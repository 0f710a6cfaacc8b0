//! Synthetic objekt catalog served page by page from a worker thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use objekt_grid_core::run_in_background;
use objekt_grid_foundation::{FetchError, GridItem, ItemKey, PageFuture, PageSource, PinnedItem};

pub const SEASONS: [&str; 4] = ["Atom01", "Binary01", "Cream01", "Divine01"];
pub const CLASSES: [&str; 4] = ["First", "Double", "Special", "Premier"];
pub const MEMBERS: [&str; 8] = [
    "Aeri", "Bora", "Chae", "Dahye", "Eunji", "Gahyun", "Hana", "Iseul",
];

/// How long a worker sleeps between cancellation checks.
const CANCEL_POLL: Duration = Duration::from_millis(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Objekt {
    pub id: u64,
    pub season: &'static str,
    pub class: &'static str,
    pub member: &'static str,
    pub collection_no: u32,
    pub online: bool,
}

impl Objekt {
    /// Card caption, e.g. `Bora Cream01 204Z`.
    pub fn label(&self) -> String {
        let suffix = if self.online { 'Z' } else { 'A' };
        format!(
            "{} {} {}{}",
            self.member, self.season, self.collection_no, suffix
        )
    }
}

impl GridItem for Objekt {
    fn item_key(&self) -> ItemKey {
        ItemKey::from(self.id)
    }
}

/// An objekt the collector pinned to the front of their profile.
#[derive(Clone, Debug)]
pub struct PinnedObjekt {
    pub objekt: Objekt,
    pub order: usize,
}

impl PinnedItem for PinnedObjekt {
    fn token_key(&self) -> ItemKey {
        self.objekt.item_key()
    }
}

/// Builds `count` objekts in mint order. Ids are stable across runs.
pub fn generate(count: usize) -> Vec<Objekt> {
    (0..count)
        .map(|index| {
            let id = index as u64 + 1;
            Objekt {
                id,
                season: SEASONS[index / 16 % SEASONS.len()],
                class: CLASSES[(index * 7) % CLASSES.len()],
                member: MEMBERS[(index * 3 + index / 5) % MEMBERS.len()],
                collection_no: 100 + (index % 240) as u32,
                online: index % 3 != 0,
            }
        })
        .collect()
}

pub fn pick_pins(catalog: &[Objekt], ids: &[u64]) -> anyhow::Result<Vec<PinnedObjekt>> {
    ids.iter()
        .enumerate()
        .map(|(order, id)| {
            let objekt = catalog
                .iter()
                .find(|objekt| objekt.id == *id)
                .cloned()
                .with_context(|| format!("pinned objekt {id} is not in the catalog"))?;
            Ok(PinnedObjekt { objekt, order })
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    CollectionNo,
}

/// Facet selection plus sort order; one value per pagination sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub season: Option<&'static str>,
    pub class: Option<&'static str>,
    pub member: Option<&'static str>,
    pub online: Option<bool>,
    pub sort: SortOrder,
}

impl CatalogQuery {
    pub fn with_season(mut self, season: &'static str) -> Self {
        self.season = Some(season);
        self
    }

    pub fn with_class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Any facet narrows the stream. Sort order alone does not.
    pub fn is_filtered(&self) -> bool {
        self.season.is_some()
            || self.class.is_some()
            || self.member.is_some()
            || self.online.is_some()
    }

    fn matches(&self, objekt: &Objekt) -> bool {
        self.season.map_or(true, |season| objekt.season == season)
            && self.class.map_or(true, |class| objekt.class == class)
            && self.member.map_or(true, |member| objekt.member == member)
            && self.online.map_or(true, |online| objekt.online == online)
    }
}

/// One response: a slice of the filtered catalog plus the cursor after it.
#[derive(Clone, Debug)]
pub struct CatalogPage {
    pub objekts: Vec<Objekt>,
    pub next_cursor: Option<usize>,
    pub total: usize,
}

/// Serves [`CatalogQuery`] results with simulated network latency.
///
/// The cursor is the offset into the filtered, sorted list.
#[derive(Clone)]
pub struct CatalogSource {
    catalog: Arc<[Objekt]>,
    query: CatalogQuery,
    page_size: usize,
    latency: Duration,
    flaky_cursor: Option<usize>,
    tripped: Arc<AtomicBool>,
}

impl CatalogSource {
    pub fn new(catalog: Arc<[Objekt]>, query: CatalogQuery) -> Self {
        Self {
            catalog,
            query,
            page_size: 60,
            latency: Duration::from_millis(80),
            flaky_cursor: None,
            tripped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The first request for `cursor` answers 503; later ones succeed.
    pub fn with_flaky_cursor(mut self, cursor: usize) -> Self {
        self.flaky_cursor = Some(cursor);
        self
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }
}

struct PageRequest {
    catalog: Arc<[Objekt]>,
    query: CatalogQuery,
    offset: usize,
    page_size: usize,
    latency: Duration,
    fail: bool,
}

impl PageRequest {
    fn serve(self, is_cancelled: impl Fn() -> bool) -> Result<CatalogPage, FetchError> {
        let mut waited = Duration::ZERO;
        while waited < self.latency {
            if is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            std::thread::sleep(CANCEL_POLL);
            waited += CANCEL_POLL;
        }
        if self.fail {
            return Err(FetchError::Server {
                status: 503,
                message: "catalog index warming up".into(),
            });
        }

        let mut matching: Vec<&Objekt> = self
            .catalog
            .iter()
            .filter(|objekt| self.query.matches(objekt))
            .collect();
        match self.query.sort {
            SortOrder::Newest => matching.sort_by(|a, b| b.id.cmp(&a.id)),
            SortOrder::Oldest => matching.sort_by_key(|objekt| objekt.id),
            SortOrder::CollectionNo => {
                matching.sort_by_key(|objekt| (objekt.collection_no, objekt.id))
            }
        }

        let total = matching.len();
        let start = self.offset.min(total);
        let end = (start + self.page_size).min(total);
        Ok(CatalogPage {
            objekts: matching[start..end].iter().map(|objekt| (*objekt).clone()).collect(),
            next_cursor: (end < total).then_some(end),
            total,
        })
    }
}

impl PageSource for CatalogSource {
    type Page = CatalogPage;
    type Item = Objekt;
    type Cursor = usize;

    fn fetch_page(&self, cursor: Option<usize>) -> PageFuture<CatalogPage> {
        let offset = cursor.unwrap_or(0);
        let fail = self.flaky_cursor == Some(offset) && !self.tripped.swap(true, Ordering::SeqCst);
        let request = PageRequest {
            catalog: Arc::clone(&self.catalog),
            query: self.query.clone(),
            offset,
            page_size: self.page_size,
            latency: self.latency,
            fail,
        };
        log::debug!("fetching {} objekts at offset {offset}", self.page_size);

        let task = run_in_background(move |token| request.serve(|| token.is_cancelled()));
        Box::pin(async move {
            match task.await {
                Ok(result) => result,
                Err(lost) => Err(FetchError::Transport(lost.to_string())),
            }
        })
    }

    fn page_items(&self, page: &CatalogPage) -> Result<Vec<Objekt>, FetchError> {
        if page.objekts.len() > self.page_size {
            return Err(FetchError::MalformedPage(format!(
                "{} objekts in a page of {}",
                page.objekts.len(),
                self.page_size
            )));
        }
        Ok(page.objekts.clone())
    }

    fn next_cursor(&self, page: &CatalogPage) -> Option<usize> {
        page.next_cursor
    }

    fn total(&self, first_page: &CatalogPage) -> Option<usize> {
        Some(first_page.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(query: CatalogQuery) -> CatalogSource {
        CatalogSource::new(Arc::from(generate(200)), query)
            .with_page_size(50)
            .with_latency(Duration::ZERO)
    }

    fn request(source: &CatalogSource, offset: usize) -> PageRequest {
        PageRequest {
            catalog: Arc::clone(&source.catalog),
            query: source.query.clone(),
            offset,
            page_size: source.page_size,
            latency: source.latency,
            fail: false,
        }
    }

    fn serve(source: &CatalogSource, offset: usize) -> Result<CatalogPage, FetchError> {
        request(source, offset).serve(|| false)
    }

    #[test]
    fn test_generate_is_deterministic() {
        assert_eq!(generate(64), generate(64));
        assert_eq!(generate(3)[2].id, 3);
    }

    #[test]
    fn test_pages_walk_the_filtered_list() {
        let source = source(CatalogQuery::default().with_sort(SortOrder::Oldest));
        let first = serve(&source, 0).expect("first page");
        assert_eq!(first.total, 200);
        assert_eq!(first.next_cursor, Some(50));
        assert_eq!(first.objekts[0].id, 1);

        let last = serve(&source, 150).expect("last page");
        assert_eq!(last.next_cursor, None);
        assert_eq!(last.objekts.len(), 50);
    }

    #[test]
    fn test_filter_narrows_total() {
        let source = source(CatalogQuery::default().with_season("Binary01"));
        let page = serve(&source, 0).expect("page");
        assert!(page.total < 200);
        assert!(page.objekts.iter().all(|objekt| objekt.season == "Binary01"));
        assert!(source.query().is_filtered());
    }

    #[test]
    fn test_cancelled_request_stops_waiting() {
        let source = source(CatalogQuery::default()).with_latency(Duration::from_secs(30));
        let result = request(&source, 0).serve(|| true);
        assert_eq!(result.map(|page| page.total), Err(FetchError::Cancelled));
    }

    #[test]
    fn test_pick_pins_reports_missing_ids() {
        let catalog = generate(10);
        assert_eq!(pick_pins(&catalog, &[2, 5]).map(|pins| pins.len()).ok(), Some(2));
        assert!(pick_pins(&catalog, &[99]).is_err());
    }
}
