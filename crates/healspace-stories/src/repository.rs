use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use healspace_db::KeyValueStore;
use healspace_types::api::{NewStoryItem, ReelSummary};
use healspace_types::models::{
    AuthorReel, DEFAULT_DURATION_SECS, StoryContent, StoryItem, StoryReaction,
};

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StoryError};

/// Key the reel collection is persisted under.
pub const STORIES_KEY: &str = "stories";

pub const MIN_DURATION_SECS: u32 = 1;
pub const MAX_DURATION_SECS: u32 = 60;

/// Builds the collection used when nothing has been persisted yet.
pub type SeedFn = fn(now_ms: i64) -> Vec<AuthorReel>;

/// Owns the authoritative collection of author reels.
///
/// Expiry is evaluated only in [`StoryRepository::load`]. Mutations write the
/// whole collection back before updating the in-memory copy, so a failed
/// write leaves the repository as it was.
pub struct StoryRepository<S> {
    store: S,
    clock: Arc<dyn Clock>,
    seed: SeedFn,
    reels: Vec<AuthorReel>,
    loaded: bool,
}

impl<S: KeyValueStore> StoryRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            seed: |_| Vec::new(),
            reels: Vec::new(),
            loaded: false,
        }
    }

    pub fn with_seed(mut self, seed: SeedFn) -> Self {
        self.seed = seed;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Read the persisted collection (or the seed), dropping expired items and
    /// the reels they leave empty. The seed is persisted on first use so its
    /// items age like any other.
    pub fn load(&mut self) -> Result<&[AuthorReel]> {
        let now = self.clock.now_ms();
        let seed = self.seed;
        let mut seeded = false;
        let mut reels: Vec<AuthorReel> = self.store.read_json(STORIES_KEY, || {
            seeded = true;
            seed(now)
        })?;

        let pruned = prune_expired(&mut reels, now);
        if pruned > 0 {
            info!("Pruned {} expired story items", pruned);
        }
        if seeded || pruned > 0 {
            self.store.write_json(STORIES_KEY, &reels)?;
        }

        self.reels = reels;
        self.loaded = true;
        Ok(&self.reels)
    }

    /// The collection as of the last load or mutation.
    pub fn reels(&self) -> &[AuthorReel] {
        &self.reels
    }

    pub fn reel_index(&self, author_id: &str) -> Option<usize> {
        self.reels.iter().position(|r| r.author_id == author_id)
    }

    pub fn summaries(&self) -> Vec<ReelSummary> {
        self.reels
            .iter()
            .map(|r| ReelSummary {
                author_id: r.author_id.clone(),
                author_name: r.author_name.clone(),
                item_count: r.items.len(),
                unviewed_count: r.items.iter().filter(|i| !i.viewed).count(),
                last_updated_ms: r.last_updated_ms,
                all_viewed: r.all_viewed,
            })
            .collect()
    }

    /// Append a new item to `author_id`'s reel, creating the reel at the front
    /// of the collection if the author has none.
    pub fn add_item(&mut self, author_id: &str, payload: NewStoryItem) -> Result<StoryItem> {
        validate(author_id, &payload)?;
        self.ensure_loaded()?;

        let now = self.clock.now_ms();
        let item = StoryItem {
            id: Uuid::new_v4(),
            content: payload.content,
            created_at_ms: now,
            viewed: false,
            viewers: Vec::new(),
            duration_secs: payload.duration_secs.unwrap_or(DEFAULT_DURATION_SECS),
        };

        let mut next = self.reels.clone();
        match next.iter_mut().find(|r| r.author_id == author_id) {
            Some(reel) => {
                reel.items.push(item.clone());
                reel.last_updated_ms = now;
                reel.all_viewed = false;
            }
            None => next.insert(
                0,
                AuthorReel {
                    author_id: author_id.to_string(),
                    author_name: None,
                    items: vec![item.clone()],
                    last_updated_ms: now,
                    all_viewed: false,
                },
            ),
        }

        self.commit(next)?;
        info!(author = author_id, item = %item.id, kind = item.content.kind(), "Story added");
        Ok(item)
    }

    /// Mark an item viewed by the local viewer. Returns whether anything
    /// changed; an already viewed or no longer loaded item is a no-op.
    pub fn mark_viewed(&mut self, author_id: &str, item_id: Uuid) -> Result<bool> {
        self.ensure_loaded()?;

        let Some(reel_idx) = self.reel_index(author_id) else {
            warn!(author = author_id, item = %item_id, "mark_viewed: reel no longer loaded");
            return Ok(false);
        };
        let Some(item_idx) = self.reels[reel_idx].items.iter().position(|i| i.id == item_id)
        else {
            warn!(author = author_id, item = %item_id, "mark_viewed: item no longer loaded");
            return Ok(false);
        };
        if self.reels[reel_idx].items[item_idx].viewed {
            return Ok(false);
        }

        let mut next = self.reels.clone();
        let reel = &mut next[reel_idx];
        reel.items[item_idx].viewed = true;
        reel.refresh_all_viewed();

        self.commit(next)?;
        debug!(author = author_id, item = %item_id, "Story viewed");
        Ok(true)
    }

    /// Toggle a viewer's reaction on an item: removes it if the same viewer
    /// already left the same emoji, inserts it otherwise.
    /// Returns true when the reaction was added.
    pub fn react(
        &mut self,
        author_id: &str,
        item_id: Uuid,
        viewer_id: &str,
        emoji: Option<String>,
    ) -> Result<bool> {
        self.ensure_loaded()?;

        let reel_idx = self
            .reel_index(author_id)
            .ok_or_else(|| StoryError::ReelNotFound(author_id.to_string()))?;
        let item_idx = self.reels[reel_idx]
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| StoryError::ItemNotFound {
                author_id: author_id.to_string(),
                item_id,
            })?;

        let now = self.clock.now_ms();
        let mut next = self.reels.clone();
        let viewers = &mut next[reel_idx].items[item_idx].viewers;

        let added = match viewers
            .iter()
            .position(|r| r.viewer_id == viewer_id && r.emoji == emoji)
        {
            Some(existing) => {
                viewers.remove(existing);
                false
            }
            None => {
                viewers.push(StoryReaction {
                    viewer_id: viewer_id.to_string(),
                    emoji,
                    reacted_at_ms: now,
                });
                true
            }
        };

        self.commit(next)?;
        debug!(author = author_id, item = %item_id, viewer = viewer_id, added, "Story reaction toggled");
        Ok(added)
    }

    fn ensure_loaded(&mut self) -> Result<()> {
        if !self.loaded {
            self.load()?;
        }
        Ok(())
    }

    fn commit(&mut self, next: Vec<AuthorReel>) -> Result<()> {
        self.store.write_json(STORIES_KEY, &next)?;
        self.reels = next;
        Ok(())
    }
}

/// Drop items past the retention window and reels left empty.
/// Returns the number of items removed.
fn prune_expired(reels: &mut Vec<AuthorReel>, now_ms: i64) -> usize {
    let mut removed = 0;
    for reel in reels.iter_mut() {
        let before = reel.items.len();
        reel.items.retain(|item| !item.is_expired(now_ms));
        if reel.items.len() != before {
            removed += before - reel.items.len();
            reel.refresh_all_viewed();
        }
    }
    reels.retain(|reel| !reel.items.is_empty());
    removed
}

fn validate(author_id: &str, payload: &NewStoryItem) -> Result<()> {
    if author_id.trim().is_empty() {
        return Err(StoryError::Invalid("author id is empty".into()));
    }
    if let Some(secs) = payload.duration_secs {
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs) {
            return Err(StoryError::Invalid(format!(
                "duration must be {}..={} seconds, got {}",
                MIN_DURATION_SECS, MAX_DURATION_SECS, secs
            )));
        }
    }
    match &payload.content {
        StoryContent::Text { text, .. } if text.trim().is_empty() => {
            Err(StoryError::Invalid("text story is empty".into()))
        }
        StoryContent::Image { media_url } | StoryContent::Video { media_url }
            if media_url.trim().is_empty() =>
        {
            Err(StoryError::Invalid("media reference is empty".into()))
        }
        _ => Ok(()),
    }
}
