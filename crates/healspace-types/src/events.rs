use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted by a story viewing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StoryEvent {
    /// The viewer opened on an author's reel
    Opened { author_index: usize, item_index: usize },

    /// An item became the active one
    ItemShown {
        author_id: String,
        item_id: Uuid,
        author_index: usize,
        item_index: usize,
        duration_secs: u32,
    },

    /// Elapsed display time of the active item, 0..=100
    Progress { item_id: Uuid, percent: u8 },

    /// The viewer moved past an item. Sent on every forward step, whether or
    /// not the store recorded a change (already viewed, pruned, write failed).
    ItemViewed { author_id: String, item_id: Uuid },

    /// Traversal crossed into another author's reel
    ReelChanged { author_index: usize },

    Paused { item_id: Uuid },

    Resumed { item_id: Uuid },

    /// The viewer was closed, either explicitly or by running off the end
    Closed,
}

impl StoryEvent {
    /// Returns the item this event concerns, if any.
    pub fn item_id(&self) -> Option<Uuid> {
        match self {
            Self::ItemShown { item_id, .. }
            | Self::Progress { item_id, .. }
            | Self::ItemViewed { item_id, .. }
            | Self::Paused { item_id }
            | Self::Resumed { item_id } => Some(*item_id),
            // Opened, ReelChanged, Closed are session-wide
            _ => None,
        }
    }
}

impl fmt::Display for StoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened { author_index, item_index } => {
                write!(f, "opened reel={} item={}", author_index, item_index)
            }
            Self::ItemShown { author_id, item_id, author_index, item_index, duration_secs } => {
                write!(
                    f,
                    "item_shown author={} item={} pos=({},{}) duration={}s",
                    author_id, item_id, author_index, item_index, duration_secs
                )
            }
            Self::Progress { item_id, percent } => {
                write!(f, "progress item={} pct={}", item_id, percent)
            }
            Self::ItemViewed { author_id, item_id } => {
                write!(f, "item_viewed author={} item={}", author_id, item_id)
            }
            Self::ReelChanged { author_index } => write!(f, "reel_changed reel={}", author_index),
            Self::Paused { item_id } => write!(f, "paused item={}", item_id),
            Self::Resumed { item_id } => write!(f, "resumed item={}", item_id),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Commands sent from the presentation layer to a viewing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionCommand {
    /// Open the viewer on an author's reel, replacing any open session
    Open { author_index: usize },

    /// Forward tap, swipe left
    Next,

    /// Back tap, swipe right
    Previous,

    /// Touch-and-hold or reply input focused
    Pause,

    Resume,

    /// Playback position of the active video item
    MediaPosition { position_ms: u64, length_ms: u64 },

    /// The active video item finished playing
    MediaEnded,

    Close,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_as_type_and_data() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(StoryEvent::Paused { item_id: id }).unwrap();
        assert_eq!(json["type"], "Paused");
        assert_eq!(json["data"]["item_id"], id.to_string());

        let json = serde_json::to_value(StoryEvent::Closed).unwrap();
        assert_eq!(json["type"], "Closed");
    }

    #[test]
    fn session_wide_events_have_no_item() {
        assert_eq!(StoryEvent::Closed.item_id(), None);
        assert_eq!(StoryEvent::ReelChanged { author_index: 2 }.item_id(), None);
        let id = Uuid::new_v4();
        assert_eq!(StoryEvent::Progress { item_id: id, percent: 40 }.item_id(), Some(id));
    }

    #[test]
    fn commands_parse_from_json() {
        let cmd: SessionCommand =
            serde_json::from_str(r#"{"type":"Open","data":{"author_index":1}}"#).unwrap();
        assert_eq!(cmd, SessionCommand::Open { author_index: 1 });
        let cmd: SessionCommand = serde_json::from_str(r#"{"type":"Next"}"#).unwrap();
        assert_eq!(cmd, SessionCommand::Next);
    }
}
