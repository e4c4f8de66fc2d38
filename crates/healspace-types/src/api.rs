use serde::{Deserialize, Serialize};

use crate::models::StoryContent;

// -- Composer --

/// Payload the story composer hands to the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewStoryItem {
    pub content: StoryContent,
    #[serde(default)]
    pub duration_secs: Option<u32>,
}

impl NewStoryItem {
    pub fn text(text: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            content: StoryContent::Text {
                text: text.into(),
                background: None,
                font: None,
            },
            duration_secs: Some(duration_secs),
        }
    }

    pub fn image(media_url: impl Into<String>) -> Self {
        Self {
            content: StoryContent::Image {
                media_url: media_url.into(),
            },
            duration_secs: None,
        }
    }

    pub fn video(media_url: impl Into<String>, duration_secs: u32) -> Self {
        Self {
            content: StoryContent::Video {
                media_url: media_url.into(),
            },
            duration_secs: Some(duration_secs),
        }
    }
}

// -- Listing --

/// One row of a reel listing.
#[derive(Debug, Clone, Serialize)]
pub struct ReelSummary {
    pub author_id: String,
    pub author_name: Option<String>,
    pub item_count: usize,
    pub unviewed_count: usize,
    pub last_updated_ms: i64,
    pub all_viewed: bool,
}
