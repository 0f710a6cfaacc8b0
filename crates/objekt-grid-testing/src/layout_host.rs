use std::cell::Cell;

use objekt_grid_foundation::LayoutHost;

/// Layout host whose numbers are set by the test.
#[derive(Debug)]
pub struct ScriptedLayoutHost {
    mounted: Cell<bool>,
    available: Cell<bool>,
    width: Cell<f32>,
    offset_top: Cell<f32>,
    viewport_height: Cell<f32>,
    scroll_offset: Cell<f32>,
}

impl ScriptedLayoutHost {
    pub fn new(width: f32, viewport_height: f32) -> Self {
        Self {
            mounted: Cell::new(true),
            available: Cell::new(true),
            width: Cell::new(width),
            offset_top: Cell::new(0.0),
            viewport_height: Cell::new(viewport_height),
            scroll_offset: Cell::new(0.0),
        }
    }

    pub fn set_width(&self, width: f32) {
        self.width.set(width);
    }

    pub fn set_offset_top(&self, offset: f32) {
        self.offset_top.set(offset);
    }

    pub fn set_viewport_height(&self, height: f32) {
        self.viewport_height.set(height);
    }

    pub fn set_scroll_offset(&self, offset: f32) {
        self.scroll_offset.set(offset);
    }

    pub fn scroll_offset_value(&self) -> f32 {
        self.scroll_offset.get()
    }

    /// Simulates the container not existing yet.
    pub fn set_mounted(&self, mounted: bool) {
        self.mounted.set(mounted);
    }

    /// While unavailable every observation reports `None`.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    fn observe(&self, value: &Cell<f32>) -> Option<f32> {
        self.available.get().then(|| value.get())
    }
}

impl LayoutHost for ScriptedLayoutHost {
    fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    fn container_width(&self) -> Option<f32> {
        self.observe(&self.width)
    }

    fn container_offset_top(&self) -> Option<f32> {
        self.observe(&self.offset_top)
    }

    fn viewport_height(&self) -> Option<f32> {
        self.observe(&self.viewport_height)
    }

    fn scroll_offset(&self) -> Option<f32> {
        self.observe(&self.scroll_offset)
    }
}
