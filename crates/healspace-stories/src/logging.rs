//! Structured logging of story session events.
//!
//! Sessions report every event they emit through a `StoryLogger`, so the
//! presentation layer can observe navigation without subscribing to the
//! event channel.

use healspace_types::events::StoryEvent;

pub trait StoryLogger: Send + Sync {
    fn log(&self, viewer_id: &str, event: &StoryEvent);
}

/// Logger that uses the `tracing` crate.
pub struct TracingLogger;

impl StoryLogger for TracingLogger {
    fn log(&self, viewer_id: &str, event: &StoryEvent) {
        // Progress ticks arrive ten times a second; keep them at trace
        match event.item_id() {
            Some(item) if matches!(event, StoryEvent::Progress { .. }) => {
                tracing::trace!(viewer = viewer_id, %item, "{}", event);
            }
            Some(item) => {
                tracing::debug!(viewer = viewer_id, %item, "{}", event);
            }
            None => {
                tracing::info!(viewer = viewer_id, "{}", event);
            }
        }
    }
}

/// No-op logger that discards all events.
pub struct NullLogger;

impl StoryLogger for NullLogger {
    fn log(&self, _viewer_id: &str, _event: &StoryEvent) {}
}
