use uuid::Uuid;

use healspace_types::models::{AuthorReel, StoryContent, StoryItem};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Demo reels shown before anything has been posted locally.
pub fn demo_reels(now_ms: i64) -> Vec<AuthorReel> {
    vec![
        reel(
            "healer-sarah",
            "Sarah Chen",
            now_ms,
            vec![
                (
                    2 * HOUR_MS,
                    StoryContent::Image {
                        media_url: "https://images.healspace.app/stories/sunrise-yoga.jpg".into(),
                    },
                    5,
                ),
                (
                    45 * MINUTE_MS,
                    StoryContent::Text {
                        text: "Breathe in for four, hold for seven, out for eight.".into(),
                        background: Some("#7c9a92".into()),
                        font: Some("serif".into()),
                    },
                    7,
                ),
            ],
        ),
        reel(
            "healer-marcus",
            "Marcus Rivera",
            now_ms,
            vec![(
                5 * HOUR_MS,
                StoryContent::Video {
                    media_url: "https://media.healspace.app/stories/sound-bath.mp4".into(),
                },
                15,
            )],
        ),
        reel(
            "healer-amara",
            "Amara Okafor",
            now_ms,
            vec![(
                20 * HOUR_MS,
                StoryContent::Text {
                    text: "Open slots for reiki this Thursday.".into(),
                    background: Some("#e8d5c4".into()),
                    font: None,
                },
                5,
            )],
        ),
    ]
}

fn reel(
    author_id: &str,
    author_name: &str,
    now_ms: i64,
    items: Vec<(i64, StoryContent, u32)>,
) -> AuthorReel {
    let items: Vec<StoryItem> = items
        .into_iter()
        .map(|(age_ms, content, duration_secs)| StoryItem {
            id: Uuid::new_v4(),
            content,
            created_at_ms: now_ms - age_ms,
            viewed: false,
            viewers: Vec::new(),
            duration_secs,
        })
        .collect();
    let last_updated_ms = items.iter().map(|i| i.created_at_ms).max().unwrap_or(now_ms);

    AuthorReel {
        author_id: author_id.to_string(),
        author_name: Some(author_name.to_string()),
        items,
        last_updated_ms,
        all_viewed: false,
    }
}
