//! Frame-by-frame driver for an [`ObjektGridState`].

use objekt_grid_core::RuntimeHandle;
use objekt_grid_foundation::{GridConfig, GridFrame, ObjektGridState, PinnedItem};
use objekt_grid_runtime_std::StdRuntime;
use web_time::{Duration, Instant};

use crate::fixtures::{TestItem, TestPin};
use crate::layout_host::ScriptedLayoutHost;
use crate::recording_renderer::RecordingRenderer;
use crate::scripted_source::ScriptedPageSource;

/// Simulated time between frames. Longer than the default width coalescing
/// window so pending widths settle on the next frame.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(20);

/// Owns a runtime, a scripted host and a grid, and pumps them together.
///
/// Similar to a compose test rule: every [`frame`](Self::frame) first drains
/// the runtime (delivering finished page fetches) and then runs one render
/// pass at a simulated clock.
pub struct GridHarness<P = TestPin> {
    runtime: StdRuntime,
    host: ScriptedLayoutHost,
    grid: ObjektGridState<ScriptedPageSource, P>,
    now: Instant,
}

impl<P: PinnedItem + Clone> GridHarness<P> {
    pub fn new(source: ScriptedPageSource, width: f32, viewport_height: f32) -> Self {
        Self::with_config(source, width, viewport_height, GridConfig::default())
    }

    pub fn with_config(
        source: ScriptedPageSource,
        width: f32,
        viewport_height: f32,
        config: GridConfig,
    ) -> Self {
        let runtime = StdRuntime::new();
        let grid = ObjektGridState::new(runtime.runtime_handle(), source, config);
        Self {
            runtime,
            host: ScriptedLayoutHost::new(width, viewport_height),
            grid,
            now: Instant::now(),
        }
    }

    pub fn host(&self) -> &ScriptedLayoutHost {
        &self.host
    }

    pub fn grid(&self) -> &ObjektGridState<ScriptedPageSource, P> {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut ObjektGridState<ScriptedPageSource, P> {
        &mut self.grid
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.runtime_handle()
    }

    /// Whether anything asked for a frame since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.runtime.take_frame_request()
    }

    /// Runs queued UI work and polls spawned fetches.
    pub fn pump(&self) {
        self.runtime.runtime_handle().drain_ui();
    }

    pub fn advance_time(&mut self, by: Duration) {
        self.now += by;
    }

    /// Drains the runtime, advances the clock by [`FRAME_INTERVAL`] and runs
    /// one render pass.
    pub fn frame(&mut self) -> GridFrame<P, TestItem> {
        self.pump();
        self.now += FRAME_INTERVAL;
        self.grid.frame_at(&self.host, self.now)
    }

    /// Runs frames until no fetch was triggered and nothing is settling.
    pub fn wait_for_idle(&mut self) -> GridFrame<P, TestItem> {
        let mut frame = self.frame();
        for _ in 0..10 {
            if !frame.fetch_triggered && !frame.needs_another_frame {
                break;
            }
            frame = self.frame();
        }
        frame
    }

    pub fn scroll_to(&mut self, offset: f32) {
        self.host.set_scroll_offset(offset);
    }

    /// Reports `height` for every materialized row of `frame` and applies the
    /// returned scroll adjustments to the host. Returns their sum.
    pub fn measure_rows(&mut self, frame: &GridFrame<P, TestItem>, height: f32) -> f32 {
        let mut adjustment = 0.0;
        for row in &frame.window.virtual_rows {
            if let Some(delta) = self.grid.measure_row_key(row.key, height) {
                adjustment += delta;
            }
        }
        if adjustment != 0.0 {
            let scroll = self.host.scroll_offset_value();
            self.host.set_scroll_offset(scroll + adjustment);
        }
        adjustment
    }

    pub fn render(&self, frame: &GridFrame<P, TestItem>) -> RecordingRenderer {
        let mut renderer = RecordingRenderer::new();
        self.grid.render(frame, &mut renderer);
        renderer
    }
}
