use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stories are visible for 24 hours after creation.
pub const RETENTION_MS: i64 = 24 * 60 * 60 * 1000;

/// Display time used when a payload (or an older persisted item) has none.
pub const DEFAULT_DURATION_SECS: u32 = 5;

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

/// What a story item shows. Each variant carries only its own payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoryContent {
    Image {
        media_url: String,
    },
    Video {
        media_url: String,
    },
    Text {
        text: String,
        #[serde(default)]
        background: Option<String>,
        #[serde(default)]
        font: Option<String>,
    },
}

impl StoryContent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Text { .. } => "text",
        }
    }
}

/// A viewer who reacted to an item. `emoji` is `None` for a plain "seen" record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryReaction {
    pub viewer_id: String,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub reacted_at_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryItem {
    pub id: Uuid,
    pub content: StoryContent,
    #[serde(default)]
    pub created_at_ms: i64,
    /// Scoped to the local viewer only.
    #[serde(default)]
    pub viewed: bool,
    #[serde(default)]
    pub viewers: Vec<StoryReaction>,
    #[serde(default = "default_duration")]
    pub duration_secs: u32,
}

impl StoryItem {
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.created_at_ms
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.age_ms(now_ms) >= RETENTION_MS
    }

    /// Video items are clocked by media playback, not wall time.
    pub fn is_video(&self) -> bool {
        matches!(self.content, StoryContent::Video { .. })
    }
}

/// All live story items of one author, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorReel {
    pub author_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub items: Vec<StoryItem>,
    #[serde(default)]
    pub last_updated_ms: i64,
    #[serde(default)]
    pub all_viewed: bool,
}

impl AuthorReel {
    /// Index of the first item not yet viewed, if any.
    pub fn first_unviewed(&self) -> Option<usize> {
        self.items.iter().position(|item| !item.viewed)
    }

    pub fn item(&self, item_id: Uuid) -> Option<&StoryItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn refresh_all_viewed(&mut self) {
        self.all_viewed = !self.items.is_empty() && self.items.iter().all(|item| item.viewed);
    }
}
