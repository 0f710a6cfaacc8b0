//! Core runtime for the objekt grid engine.
//!
//! Everything here runs on a single UI thread: the host asks for frames via
//! [`RuntimeScheduler`], then calls [`RuntimeHandle::drain_ui`] to run queued
//! closures and poll spawned futures. Work that must block (network, disk)
//! goes through [`run_in_background`] and resumes on the UI thread.

mod background;
mod platform;
mod runtime;

#[cfg(test)]
mod tests;

pub use background::{run_in_background, BackgroundTask, CancelToken, WorkerLost};
pub use platform::RuntimeScheduler;
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle, TaskHandle, TaskId};
