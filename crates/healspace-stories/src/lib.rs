//! Ephemeral stories for HealSpace.
//!
//! - `repository`: the authoritative reel collection, 24 hour retention, persistence
//! - `navigation`: single-viewer traversal across authors × items
//! - `progress`: per-item display timing, paused or media-driven
//! - `session`: async viewing session with cancellable auto-advance

pub mod clock;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod progress;
pub mod repository;
pub mod seed;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, StoryError};
pub use logging::{NullLogger, StoryLogger, TracingLogger};
pub use navigation::{NavigationController, PathItem, Position, Transition, ViewTracker};
pub use progress::Progress;
pub use repository::{STORIES_KEY, StoryRepository};
pub use session::{SessionConfig, SessionHandle, ViewingSession};
