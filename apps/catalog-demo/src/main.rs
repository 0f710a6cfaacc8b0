mod catalog;
mod host;

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use catalog::{CatalogQuery, CatalogSource, Objekt, PinnedObjekt, SortOrder};
use host::{LoggingRenderer, SimulatedWindow};
use objekt_grid_foundation::{
    FetchAffordance, GridConfig, GridItem, ItemKey, ObjektGridState, PaginationConfig,
    ShouldRender,
};
use objekt_grid_runtime_std::StdRuntime;

type CatalogGrid = ObjektGridState<CatalogSource, PinnedObjekt>;

const CATALOG_SIZE: usize = 2_400;
const PINNED_IDS: [u64; 3] = [1_204, 37, 2_399];
const HEADER_HEIGHT: f32 = 180.0;
const VIEWPORT_HEIGHT: f32 = 900.0;
/// Upper bound on how long one frame waits for a fetch to land.
const FRAME_BUDGET: Duration = Duration::from_millis(16);
const MAX_FRAMES: usize = 2_000;
const MAX_RETRIES: usize = 3;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let catalog: Arc<[Objekt]> = Arc::from(catalog::generate(CATALOG_SIZE));
    let pins = catalog::pick_pins(&catalog, &PINNED_IDS)?;
    let runtime = StdRuntime::new();
    let window = SimulatedWindow::new(1180.0, VIEWPORT_HEIGHT, HEADER_HEIGHT);

    let query = CatalogQuery::default();
    let source = CatalogSource::new(Arc::clone(&catalog), query.clone()).with_flaky_cursor(240);
    let config = GridConfig::default()
        .with_pagination(PaginationConfig::default().with_cancel_superseded(true));
    let mut grid: CatalogGrid = ObjektGridState::new(runtime.runtime_handle(), source, config);
    grid.set_pins(pins.clone());
    apply_pin_visibility(&mut grid, &query, &pins);

    log::info!("browsing {CATALOG_SIZE} objekts with {} pins", pins.len());
    browse(&runtime, &mut grid, &window, "all objekts")?;

    // Narrower window: the column count drops and row sizes are re-measured.
    window.resize(700.0);
    window.scroll_to(0.0);
    let query = CatalogQuery::default()
        .with_season("Cream01")
        .with_class("Special")
        .with_sort(SortOrder::CollectionNo);
    let generation = grid.set_query(
        CatalogSource::new(Arc::clone(&catalog), query.clone())
            .with_page_size(24)
            .with_latency(Duration::from_millis(40)),
    );
    apply_pin_visibility(&mut grid, &query, &pins);
    log::info!("query changed (sequence {generation}): {query:?}");
    browse(&runtime, &mut grid, &window, "filtered")?;

    Ok(())
}

/// Pins lead an unfiltered view, so the stream must not repeat them. A
/// filtered view shows only matching objekts and no pins at all.
fn apply_pin_visibility(grid: &mut CatalogGrid, query: &CatalogQuery, pins: &[PinnedObjekt]) {
    if query.is_filtered() {
        grid.set_hide_pins(true);
        grid.set_should_render(None);
        return;
    }
    let pinned: Rc<[ItemKey]> = pins.iter().map(|pin| pin.objekt.item_key()).collect();
    let predicate: ShouldRender<Objekt> = Rc::new(move |objekt: &Objekt| {
        !pinned.contains(&objekt.item_key())
    });
    grid.set_hide_pins(false);
    grid.set_should_render(Some(predicate));
}

/// Scrolls one screen at a time until every page is loaded and the last row
/// is on screen.
fn browse(
    runtime: &StdRuntime,
    grid: &mut CatalogGrid,
    window: &SimulatedWindow,
    label: &str,
) -> anyhow::Result<()> {
    let mut retries = 0;
    for frame_number in 0..MAX_FRAMES {
        runtime.pump(FRAME_BUDGET);
        let frame = grid.frame(window);
        let mut renderer = LoggingRenderer::default();
        grid.render(&frame, &mut renderer);

        let stats = renderer.stats();
        log::debug!(
            "[{label}] frame {frame_number}: scroll {:.0}, {} of {} rows materialized ({} cards, {} pinned, {} priority), {:.0}px tall, footer {:?}",
            window.scroll_offset(),
            stats.rows,
            frame.row_count(),
            stats.cards,
            stats.pins,
            stats.priority,
            frame.total_height(),
            renderer.footer(),
        );
        if frame.fetch_triggered {
            log::info!(
                "[{label}] near the end at row {:?}: requesting page {}",
                frame.window.last_materialized_index(),
                frame.pagination.page_count + 1
            );
        }

        for (key, height) in renderer.measurements() {
            if let Some(adjustment) = grid.measure_row_key(*key, *height) {
                window.scroll_by(adjustment, grid.total_height());
            }
        }

        match frame.affordance {
            FetchAffordance::Error => {
                retries += 1;
                let error = grid.driver().last_error();
                if retries > MAX_RETRIES {
                    bail!("[{label}] giving up after {MAX_RETRIES} retries: {error:?}");
                }
                log::warn!("[{label}] page failed ({error:?}), retrying");
                grid.retry();
                continue;
            }
            FetchAffordance::Exhausted if grid.is_scrolled_to_end() => {
                let state = grid.pagination_state();
                log::info!(
                    "[{label}] reached the end after {frame_number} frames: {} objekts in {} pages, {} rows x {} columns, {:.0}px",
                    state.item_count,
                    state.page_count,
                    frame.row_count(),
                    frame.column_count,
                    grid.total_height(),
                );
                return Ok(());
            }
            _ => {}
        }

        if frame.needs_another_frame || frame.pagination.is_fetching() {
            continue;
        }
        window.scroll_by(VIEWPORT_HEIGHT, grid.total_height());
    }
    bail!("[{label}] did not reach the end within {MAX_FRAMES} frames")
}
