//! One object wiring pagination, composition, measurement and virtualization
//! into a per-frame pass.

use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use objekt_grid_core::RuntimeHandle;
use web_time::Instant;

use super::grid_renderer::{GridRenderer, ItemRenderer, DEFAULT_PRIORITY_ROWS};
use super::measured_sizes::RowKey;
use super::metrics::{CardMetrics, ColumnPolicy, DEFAULT_ASPECT_RATIO, DEFAULT_GAP};
use super::row_compositor::{ComposeOptions, RowCompositor, ShouldRender};
use super::row_entry::{GridItem, PinnedItem, Row};
use super::viewport::{LayoutHost, ViewportConfig, ViewportMeasurer, ViewportSnapshot};
use super::window_virtualizer::{
    EdgePadding, VirtualWindow, VirtualizeInput, VirtualizerConfig, WindowVirtualizer,
    DEFAULT_OVERSCAN,
};
use crate::paging::page_source::PageSource;
use crate::paging::pagination_driver::{PaginationConfig, PaginationDriver, PaginationState};
use crate::paging::scroll_trigger::{
    sentinel_visible, FetchAffordance, ScrollProximityTrigger, DEFAULT_TRIGGER_MARGIN,
};

/// Everything tunable about an [`ObjektGridState`].
#[derive(Clone, Debug)]
pub struct GridConfig {
    /// Horizontal gap between cards, px.
    pub gap: f32,
    /// Card height over card width.
    pub aspect_ratio: f32,
    /// Rows materialized past each viewport edge.
    pub overscan: usize,
    /// Leading rows whose entries are flagged `priority`.
    pub priority_rows: usize,
    pub edge_padding: EdgePadding,
    /// How far below the viewport the end sentinel counts as visible, px.
    pub trigger_margin: f32,
    pub columns: ColumnPolicy,
    pub viewport: ViewportConfig,
    pub pagination: PaginationConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            gap: DEFAULT_GAP,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            overscan: DEFAULT_OVERSCAN,
            priority_rows: DEFAULT_PRIORITY_ROWS,
            edge_padding: EdgePadding::default(),
            trigger_margin: DEFAULT_TRIGGER_MARGIN,
            columns: ColumnPolicy::default(),
            viewport: ViewportConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl GridConfig {
    pub fn with_columns(mut self, columns: ColumnPolicy) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_card_metrics(mut self, gap: f32, aspect_ratio: f32) -> Self {
        self.gap = gap;
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_edge_padding(mut self, padding: EdgePadding) -> Self {
        self.edge_padding = padding;
        self
    }

    pub fn with_trigger_margin(mut self, margin: f32) -> Self {
        self.trigger_margin = margin;
        self
    }

    pub fn with_priority_rows(mut self, rows: usize) -> Self {
        self.priority_rows = rows;
        self
    }

    pub fn with_viewport(mut self, viewport: ViewportConfig) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    fn virtualizer_config(&self) -> VirtualizerConfig {
        VirtualizerConfig {
            metrics: CardMetrics {
                gap: self.gap,
                aspect_ratio: self.aspect_ratio,
            },
            overscan: self.overscan,
            padding: self.edge_padding,
        }
    }
}

/// Result of one [`ObjektGridState::frame`] pass.
pub struct GridFrame<P, I> {
    pub rows: Rc<[Row<P, I>]>,
    pub window: VirtualWindow,
    pub column_count: usize,
    pub viewport: ViewportSnapshot,
    pub pagination: PaginationState,
    pub affordance: FetchAffordance,
    pub sentinel_visible: bool,
    /// The trigger issued a page request during this pass.
    pub fetch_triggered: bool,
    /// Some input is still settling; schedule another frame.
    pub needs_another_frame: bool,
}

impl<P, I> GridFrame<P, I> {
    pub fn total_height(&self) -> f32 {
        self.window.total_size
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl<P, I> fmt::Debug for GridFrame<P, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridFrame")
            .field("rows", &self.rows.len())
            .field("virtual_rows", &self.window.virtual_rows.len())
            .field("total_height", &self.window.total_size)
            .field("column_count", &self.column_count)
            .field("affordance", &self.affordance)
            .finish()
    }
}

/// Catalog grid engine for one scroll container.
pub struct ObjektGridState<S: PageSource, P> {
    runtime: RuntimeHandle,
    driver: PaginationDriver<S>,
    pins: Rc<[P]>,
    options: ComposeOptions<S::Item>,
    compositor: RowCompositor<P, S::Item>,
    measurer: ViewportMeasurer,
    virtualizer: WindowVirtualizer,
    trigger: ScrollProximityTrigger,
    renderer: GridRenderer,
    columns: ColumnPolicy,
    trigger_margin: f32,
    column_count: usize,
}

impl<S: PageSource, P> fmt::Debug for ObjektGridState<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjektGridState")
            .field("pagination", &self.driver.state())
            .field("pins", &self.pins.len())
            .field("rows", &self.compositor.row_count())
            .field("column_count", &self.column_count)
            .finish()
    }
}

impl<S, P> ObjektGridState<S, P>
where
    S: PageSource,
    S::Item: GridItem,
    P: PinnedItem + Clone,
{
    /// Creates the grid and requests the first page of `source`.
    pub fn new(runtime: RuntimeHandle, source: S, config: GridConfig) -> Self {
        let driver = PaginationDriver::new(runtime.clone(), source, config.pagination.clone());
        driver.fetch_next_page();
        let column_count = config.columns.resolve(0.0);
        Self {
            runtime,
            driver,
            pins: Rc::from(Vec::new()),
            options: ComposeOptions::default(),
            compositor: RowCompositor::new(),
            measurer: ViewportMeasurer::new(config.viewport.clone()),
            virtualizer: WindowVirtualizer::new(config.virtualizer_config()),
            trigger: ScrollProximityTrigger::new(),
            renderer: GridRenderer::new(config.priority_rows, config.edge_padding),
            columns: config.columns,
            trigger_margin: config.trigger_margin,
            column_count,
        }
    }

    /// Runs one render pass against the host's current layout.
    pub fn frame(&mut self, host: &dyn LayoutHost) -> GridFrame<P, S::Item> {
        self.frame_at(host, Instant::now())
    }

    /// [`frame`](Self::frame) with an explicit clock, for deterministic hosts.
    pub fn frame_at(&mut self, host: &dyn LayoutHost, now: Instant) -> GridFrame<P, S::Item> {
        let change = self.measurer.sync(host, now);
        let viewport = self.measurer.snapshot();

        let column_count = self.columns.resolve(viewport.width);
        if column_count != self.column_count {
            log::debug!(
                "width {} resolves to {} columns (was {})",
                viewport.width,
                column_count,
                self.column_count
            );
            self.column_count = column_count;
        }

        let items = self.driver.items();
        self.compositor
            .compose(&self.pins, &items, column_count, &self.options);
        let rows = Rc::clone(self.compositor.rows());

        let (window, sentinel) = if viewport.has_width() {
            let window = self.virtualizer.virtualize(VirtualizeInput {
                count: rows.len(),
                column_count,
                container_width: viewport.width,
                scroll_margin: viewport.offset_from_document_top,
                scroll_offset: viewport.scroll_offset,
                viewport_height: viewport.viewport_height,
            });
            let sentinel = sentinel_visible(
                &window,
                rows.len(),
                viewport.offset_from_document_top,
                viewport.scroll_offset,
                viewport.viewport_height,
                self.trigger_margin,
            );
            (window, sentinel)
        } else {
            (VirtualWindow::default(), false)
        };

        let fetch_triggered = self.trigger.observe(sentinel, &self.driver);
        let pagination = self.driver.state();
        if change.width_pending {
            self.runtime.schedule();
        }

        GridFrame {
            rows,
            window,
            column_count,
            viewport,
            pagination,
            affordance: FetchAffordance::from_state(&pagination),
            sentinel_visible: sentinel,
            fetch_triggered,
            needs_another_frame: change.width_pending,
        }
    }

    /// Paints `frame` through `renderer`.
    pub fn render<R>(&self, frame: &GridFrame<P, S::Item>, renderer: &mut R)
    where
        R: ItemRenderer<P, S::Item> + ?Sized,
    {
        self.renderer.render(
            &frame.rows,
            &frame.window,
            frame.viewport.offset_from_document_top,
            frame.column_count,
            frame.affordance,
            renderer,
        );
    }

    /// Starts a fresh pagination sequence for a new query.
    pub fn set_query(&mut self, source: S) -> u64 {
        self.trigger.reset();
        self.driver.restart_with(source)
    }

    /// Replaces the pin list. Always recomposes, even for equal contents.
    pub fn set_pins(&mut self, pins: impl Into<Rc<[P]>>) {
        self.pins = pins.into();
    }

    pub fn set_should_render(&mut self, predicate: Option<ShouldRender<S::Item>>) {
        self.options.should_render = predicate;
    }

    pub fn set_hide_pins(&mut self, hide_pins: bool) {
        self.options.hide_pins = hide_pins;
    }

    /// Reports the painted height of row `index` from the current frame.
    ///
    /// Returns a scroll adjustment when the row sits above the viewport.
    pub fn measure_row(&mut self, index: usize, height: f32) -> Option<f32> {
        let key = self.virtualizer.measured_sizes().key_for(index);
        self.measure_row_key(key, height)
    }

    /// Like [`measure_row`](Self::measure_row) for a key kept from an earlier
    /// frame; dropped if the columns changed since.
    pub fn measure_row_key(&mut self, key: RowKey, height: f32) -> Option<f32> {
        let adjustment = self.virtualizer.measure_element(key, height);
        self.runtime.schedule();
        adjustment
    }

    /// Explicit "load more" from the user.
    pub fn fetch_next_page(&mut self) -> bool {
        self.trigger.request_manually(&self.driver)
    }

    /// Re-issues a failed request.
    pub fn retry(&mut self) -> bool {
        self.driver.retry()
    }

    pub fn driver(&self) -> &PaginationDriver<S> {
        &self.driver
    }

    pub fn pagination_state(&self) -> PaginationState {
        self.driver.state()
    }

    pub fn rows(&self) -> &Rc<[Row<P, S::Item>]> {
        self.compositor.rows()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.virtualizer.visible_range()
    }

    pub fn offset_for_row(&self, index: usize) -> Option<f32> {
        self.virtualizer.offset_for_row(index)
    }

    pub fn is_scrolled_to_end(&self) -> bool {
        self.virtualizer.is_scrolled_to_end()
    }

    pub fn total_height(&self) -> f32 {
        self.virtualizer.total_size()
    }
}
