//! Platform abstraction for runtime scheduling.
//!
//! The runtime never owns an event loop. It asks the host to schedule a
//! frame and the host calls back into [`RuntimeHandle::drain_ui`] when it
//! gets to it.
//!
//! [`RuntimeHandle::drain_ui`]: crate::RuntimeHandle::drain_ui

/// Schedules work for the runtime.
///
/// Implementations must be safe to call from any thread: background fetches
/// wake the runtime through this trait when their result is ready.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}
