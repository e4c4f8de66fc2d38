use thiserror::Error;
use uuid::Uuid;

/// Errors from story operations.
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Invalid story: {0}")]
    Invalid(String),

    #[error("Author index {index} out of range ({len} reels loaded)")]
    AuthorOutOfRange { index: usize, len: usize },

    #[error("No viewing session is open")]
    NotOpen,

    #[error("No reel for author {0}")]
    ReelNotFound(String),

    #[error("Item {item_id} not found in reel of {author_id}")]
    ItemNotFound { author_id: String, item_id: Uuid },
}

pub type Result<T> = std::result::Result<T, StoryError>;
