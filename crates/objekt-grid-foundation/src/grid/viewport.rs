//! Container width and position tracking.
//!
//! The host environment reports raw numbers through [`LayoutHost`]; the
//! [`ViewportMeasurer`] turns them into a stable [`ViewportSnapshot`]:
//! unmounted containers read as zero width, unavailable observations keep the
//! last known value, and width changes are coalesced so a resize drag does not
//! recompute every row estimate on every event.

use web_time::{Duration, Instant};

/// Maximum reasonable viewport height before treating it as unbounded.
const MAX_REASONABLE_VIEWPORT: f32 = 100_000.0;

/// What the host environment can report about the scroll container.
///
/// Every accessor returns `None` when the value cannot be observed right now.
pub trait LayoutHost {
    /// Whether the container element exists yet.
    fn is_mounted(&self) -> bool {
        true
    }

    /// Content width of the container, in px.
    fn container_width(&self) -> Option<f32>;

    /// Distance from the document top to the container top, in px.
    fn container_offset_top(&self) -> Option<f32>;

    /// Height of the visible viewport, in px.
    fn viewport_height(&self) -> Option<f32>;

    /// Current document scroll offset, in px.
    fn scroll_offset(&self) -> Option<f32>;
}

/// Tuning for [`ViewportMeasurer`].
#[derive(Clone, Debug)]
pub struct ViewportConfig {
    /// Width changes smaller than this are ignored.
    pub min_width_delta: f32,
    /// A width change arriving sooner than this after the previous one is held
    /// back and applied once the window has passed.
    pub coalesce_window: Duration,
    /// Used when the host cannot report a usable viewport height.
    pub fallback_viewport_height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_width_delta: 0.5,
            coalesce_window: Duration::from_millis(16),
            fallback_viewport_height: 800.0,
        }
    }
}

impl ViewportConfig {
    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }

    pub fn with_fallback_viewport_height(mut self, height: f32) -> Self {
        self.fallback_viewport_height = height;
        self
    }
}

/// Stable view of the container for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportSnapshot {
    pub width: f32,
    pub offset_from_document_top: f32,
    pub viewport_height: f32,
    pub scroll_offset: f32,
}

impl ViewportSnapshot {
    /// Whether downstream virtualization has anything to work with.
    pub fn has_width(&self) -> bool {
        self.width > 0.0
    }
}

/// What changed during [`ViewportMeasurer::sync`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewportChange {
    pub width_changed: bool,
    pub offset_changed: bool,
    pub scroll_changed: bool,
    /// A coalesced width change is still pending; ask for another frame.
    pub width_pending: bool,
}

impl ViewportChange {
    pub fn any(&self) -> bool {
        self.width_changed || self.offset_changed || self.scroll_changed
    }
}

/// Tracks the scroll container's width and document offset across frames.
#[derive(Debug)]
pub struct ViewportMeasurer {
    config: ViewportConfig,
    snapshot: ViewportSnapshot,
    pending_width: Option<f32>,
    last_width_commit: Option<Instant>,
    warned_degenerate_height: bool,
}

impl Default for ViewportMeasurer {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl ViewportMeasurer {
    pub fn new(config: ViewportConfig) -> Self {
        let snapshot = ViewportSnapshot {
            viewport_height: config.fallback_viewport_height,
            ..ViewportSnapshot::default()
        };
        Self {
            config,
            snapshot,
            pending_width: None,
            last_width_commit: None,
            warned_degenerate_height: false,
        }
    }

    pub fn snapshot(&self) -> ViewportSnapshot {
        self.snapshot
    }

    pub fn width(&self) -> f32 {
        self.snapshot.width
    }

    pub fn offset_from_document_top(&self) -> f32 {
        self.snapshot.offset_from_document_top
    }

    /// Pulls fresh values from the host. Never fails: anything the host cannot
    /// report keeps its previous value.
    pub fn sync(&mut self, host: &dyn LayoutHost, now: Instant) -> ViewportChange {
        let mut change = ViewportChange::default();

        if !host.is_mounted() {
            self.pending_width = None;
            if self.snapshot.width != 0.0 {
                self.snapshot.width = 0.0;
                self.last_width_commit = Some(now);
                change.width_changed = true;
            }
        } else if let Some(width) = host.container_width().filter(|w| w.is_finite()) {
            change.width_changed = self.offer_width(width.max(0.0), now);
        }
        if self.pending_width.is_some() {
            change.width_changed |= self.flush_pending_width(now);
        }
        change.width_pending = self.pending_width.is_some();

        if let Some(offset) = host.container_offset_top().filter(|o| o.is_finite()) {
            if (offset - self.snapshot.offset_from_document_top).abs() > 0.001 {
                self.snapshot.offset_from_document_top = offset;
                change.offset_changed = true;
            }
        }

        let height = self.effective_viewport_height(host.viewport_height());
        if (height - self.snapshot.viewport_height).abs() > 0.001 {
            self.snapshot.viewport_height = height;
            change.scroll_changed = true;
        }

        if let Some(scroll) = host.scroll_offset().filter(|s| s.is_finite()) {
            if (scroll - self.snapshot.scroll_offset).abs() > 0.001 {
                self.snapshot.scroll_offset = scroll;
                change.scroll_changed = true;
            }
        }

        change
    }

    fn offer_width(&mut self, width: f32, now: Instant) -> bool {
        let target = self.pending_width.unwrap_or(self.snapshot.width);
        if (width - target).abs() < self.config.min_width_delta
            && (width - self.snapshot.width).abs() < self.config.min_width_delta
        {
            return false;
        }
        // The first real width is never held back.
        let within_window = self.snapshot.width > 0.0
            && self
                .last_width_commit
                .is_some_and(|at| now.duration_since(at) < self.config.coalesce_window);
        if within_window {
            self.pending_width = Some(width);
            return false;
        }
        self.pending_width = None;
        self.commit_width(width, now)
    }

    fn flush_pending_width(&mut self, now: Instant) -> bool {
        let ready = self
            .last_width_commit
            .map_or(true, |at| now.duration_since(at) >= self.config.coalesce_window);
        if !ready {
            return false;
        }
        match self.pending_width.take() {
            Some(width) => self.commit_width(width, now),
            None => false,
        }
    }

    fn commit_width(&mut self, width: f32, now: Instant) -> bool {
        if (width - self.snapshot.width).abs() < self.config.min_width_delta {
            return false;
        }
        self.snapshot.width = width;
        self.last_width_commit = Some(now);
        true
    }

    fn effective_viewport_height(&mut self, reported: Option<f32>) -> f32 {
        match reported {
            Some(height) if height.is_finite() && height > 0.0 && height <= MAX_REASONABLE_VIEWPORT => {
                self.warned_degenerate_height = false;
                height
            }
            Some(height) => {
                if !self.warned_degenerate_height {
                    log::warn!(
                        "ObjektGrid: degenerate viewport height ({}), using fallback {}",
                        height,
                        self.config.fallback_viewport_height
                    );
                    self.warned_degenerate_height = true;
                }
                self.config.fallback_viewport_height
            }
            None => self.snapshot.viewport_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Host {
        mounted: Cell<bool>,
        width: Cell<Option<f32>>,
        offset: Cell<Option<f32>>,
        height: Cell<Option<f32>>,
        scroll: Cell<Option<f32>>,
    }

    impl Host {
        fn new(width: f32) -> Self {
            Self {
                mounted: Cell::new(true),
                width: Cell::new(Some(width)),
                offset: Cell::new(Some(120.0)),
                height: Cell::new(Some(900.0)),
                scroll: Cell::new(Some(0.0)),
            }
        }
    }

    impl LayoutHost for Host {
        fn is_mounted(&self) -> bool {
            self.mounted.get()
        }
        fn container_width(&self) -> Option<f32> {
            self.width.get()
        }
        fn container_offset_top(&self) -> Option<f32> {
            self.offset.get()
        }
        fn viewport_height(&self) -> Option<f32> {
            self.height.get()
        }
        fn scroll_offset(&self) -> Option<f32> {
            self.scroll.get()
        }
    }

    #[test]
    fn test_unmounted_container_reports_zero_width() {
        let host = Host::new(800.0);
        host.mounted.set(false);
        let mut measurer = ViewportMeasurer::default();

        measurer.sync(&host, Instant::now());
        assert_eq!(measurer.width(), 0.0);
        assert!(!measurer.snapshot().has_width());
    }

    #[test]
    fn test_first_width_applies_immediately() {
        let host = Host::new(800.0);
        let mut measurer = ViewportMeasurer::default();

        let change = measurer.sync(&host, Instant::now());
        assert!(change.width_changed);
        assert!(change.offset_changed);
        assert_eq!(measurer.width(), 800.0);
        assert_eq!(measurer.offset_from_document_top(), 120.0);
    }

    #[test]
    fn test_unavailable_observation_keeps_last_width() {
        let host = Host::new(800.0);
        let mut measurer = ViewportMeasurer::default();
        measurer.sync(&host, Instant::now());

        host.width.set(None);
        host.offset.set(None);
        let change = measurer.sync(&host, Instant::now());
        assert!(!change.width_changed);
        assert_eq!(measurer.width(), 800.0);
        assert_eq!(measurer.offset_from_document_top(), 120.0);
    }

    #[test]
    fn test_sub_pixel_jitter_ignored() {
        let host = Host::new(800.0);
        let mut measurer = ViewportMeasurer::default();
        let start = Instant::now();
        measurer.sync(&host, start);

        host.width.set(Some(800.2));
        let change = measurer.sync(&host, start + Duration::from_millis(100));
        assert!(!change.width_changed);
        assert_eq!(measurer.width(), 800.0);
    }

    #[test]
    fn test_rapid_width_changes_coalesce() {
        let host = Host::new(800.0);
        let mut measurer = ViewportMeasurer::default();
        let start = Instant::now();
        measurer.sync(&host, start);

        host.width.set(Some(780.0));
        let change = measurer.sync(&host, start + Duration::from_millis(4));
        assert!(!change.width_changed);
        assert!(change.width_pending);

        host.width.set(Some(760.0));
        let change = measurer.sync(&host, start + Duration::from_millis(8));
        assert!(change.width_pending);
        assert_eq!(measurer.width(), 800.0);

        // Host stops reporting; the latest pending width lands once the window passes.
        host.width.set(None);
        let change = measurer.sync(&host, start + Duration::from_millis(20));
        assert!(change.width_changed);
        assert!(!change.width_pending);
        assert_eq!(measurer.width(), 760.0);
    }

    #[test]
    fn test_infinite_viewport_falls_back() {
        let host = Host::new(800.0);
        host.height.set(Some(f32::INFINITY));
        let mut measurer =
            ViewportMeasurer::new(ViewportConfig::default().with_fallback_viewport_height(640.0));

        measurer.sync(&host, Instant::now());
        assert_eq!(measurer.snapshot().viewport_height, 640.0);
    }
}
