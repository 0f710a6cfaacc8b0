//! Testing utilities and harness for the objekt grid engine

pub mod assertions;
pub mod fixtures;
pub mod harness;
pub mod layout_host;
pub mod recording_renderer;
pub mod scripted_source;

pub use fixtures::{items, pins, TestItem, TestPin};
pub use harness::{GridHarness, FRAME_INTERVAL};
pub use layout_host::ScriptedLayoutHost;
pub use recording_renderer::{RecordingRenderer, RenderedEntry, RenderedRow};
pub use scripted_source::{ScriptedPageSource, TestPage};

pub mod prelude {
    pub use crate::assertions;
    pub use crate::assertions::{
        assert_approx_eq, assert_count, assert_row_shape, flat_keys, row_labels,
    };
    pub use crate::fixtures::*;
    pub use crate::harness::*;
    pub use crate::layout_host::*;
    pub use crate::recording_renderer::*;
    pub use crate::scripted_source::*;
}
