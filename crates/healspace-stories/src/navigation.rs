use tracing::warn;
use uuid::Uuid;

use healspace_db::KeyValueStore;
use healspace_types::models::AuthorReel;

use crate::error::{Result, StoryError};
use crate::repository::StoryRepository;

/// Receives "the viewer moved past this item" notifications.
pub trait ViewTracker {
    fn mark_viewed(&mut self, author_id: &str, item_id: Uuid) -> Result<bool>;
}

impl<S: KeyValueStore> ViewTracker for StoryRepository<S> {
    fn mark_viewed(&mut self, author_id: &str, item_id: Uuid) -> Result<bool> {
        StoryRepository::mark_viewed(self, author_id, item_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub author_index: usize,
    pub item_index: usize,
}

impl Position {
    pub fn new(author_index: usize, item_index: usize) -> Self {
        Self {
            author_index,
            item_index,
        }
    }
}

/// Outcome of a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved within the same reel
    Item(Position),
    /// Crossed into another author's reel
    Reel(Position),
    /// Ran off the end; the viewer is closed
    Closed,
    /// Nothing to move to
    Unchanged,
}

/// What the controller remembers of an item at open time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathItem {
    pub id: Uuid,
    pub duration_secs: u32,
    pub is_video: bool,
}

#[derive(Debug, Clone)]
struct PathReel {
    author_id: String,
    items: Vec<PathItem>,
}

/// Single-viewer traversal over authors × items.
///
/// The traversal path is snapshotted when the viewer opens. Items added while
/// a session is open show up after the next `open`; items pruned from the
/// repository mid-session are still walked, and marking them viewed is a no-op.
#[derive(Debug, Default)]
pub struct NavigationController {
    path: Vec<PathReel>,
    active: Option<Position>,
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn current(&self) -> Option<Position> {
        self.active
    }

    /// Author id and item of the active position.
    pub fn current_item(&self) -> Option<(&str, &PathItem)> {
        let pos = self.active?;
        let reel = self.path.get(pos.author_index)?;
        let item = reel.items.get(pos.item_index)?;
        Some((reel.author_id.as_str(), item))
    }

    /// Open on `author_index`, at its first unviewed item (or the start if
    /// every item has been seen).
    pub fn open(&mut self, reels: &[AuthorReel], author_index: usize) -> Result<Position> {
        let reel = reels.get(author_index).ok_or(StoryError::AuthorOutOfRange {
            index: author_index,
            len: reels.len(),
        })?;
        if reel.items.is_empty() {
            return Err(StoryError::Invalid(format!(
                "reel of {} has no items",
                reel.author_id
            )));
        }

        self.path = reels
            .iter()
            .map(|r| PathReel {
                author_id: r.author_id.clone(),
                items: r
                    .items
                    .iter()
                    .map(|i| PathItem {
                        id: i.id,
                        duration_secs: i.duration_secs,
                        is_video: i.is_video(),
                    })
                    .collect(),
            })
            .collect();

        let pos = Position::new(author_index, reel.first_unviewed().unwrap_or(0));
        self.active = Some(pos);
        Ok(pos)
    }

    pub fn close(&mut self) {
        self.active = None;
        self.path.clear();
    }

    /// Mark the active item viewed, then step forward: next item, else the
    /// next non-empty reel, else close.
    pub fn advance<T: ViewTracker + ?Sized>(&mut self, tracker: &mut T) -> Result<Transition> {
        let pos = self.active.ok_or(StoryError::NotOpen)?;

        if let Some((author_id, item)) = self.current_item() {
            let (author_id, item_id) = (author_id.to_string(), item.id);
            // The viewer keeps moving even if the store rejects the write
            if let Err(e) = tracker.mark_viewed(&author_id, item_id) {
                warn!(author = %author_id, item = %item_id, "Failed to mark story viewed: {}", e);
            }
        }

        let reel_len = self.reel_len(pos.author_index);
        if pos.item_index + 1 < reel_len {
            let next = Position::new(pos.author_index, pos.item_index + 1);
            self.active = Some(next);
            return Ok(Transition::Item(next));
        }

        let following = (pos.author_index + 1..self.path.len()).find(|&a| self.reel_len(a) > 0);
        match following {
            Some(author_index) => {
                let next = Position::new(author_index, 0);
                self.active = Some(next);
                Ok(Transition::Reel(next))
            }
            None => {
                self.close();
                Ok(Transition::Closed)
            }
        }
    }

    /// Step back: previous item, else the last item of the previous reel.
    /// At the very first item this does nothing and does not close.
    pub fn retreat(&mut self) -> Result<Transition> {
        let pos = self.active.ok_or(StoryError::NotOpen)?;

        if pos.item_index > 0 {
            let prev = Position::new(pos.author_index, pos.item_index - 1);
            self.active = Some(prev);
            return Ok(Transition::Item(prev));
        }

        let preceding = (0..pos.author_index).rev().find(|&a| self.reel_len(a) > 0);
        match preceding {
            Some(author_index) => {
                let prev = Position::new(author_index, self.reel_len(author_index) - 1);
                self.active = Some(prev);
                Ok(Transition::Reel(prev))
            }
            None => Ok(Transition::Unchanged),
        }
    }

    fn reel_len(&self, author_index: usize) -> usize {
        self.path.get(author_index).map_or(0, |r| r.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healspace_types::models::{StoryContent, StoryItem};

    /// Records every mark_viewed call.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(String, Uuid)>,
    }

    impl ViewTracker for Recorder {
        fn mark_viewed(&mut self, author_id: &str, item_id: Uuid) -> Result<bool> {
            self.calls.push((author_id.to_string(), item_id));
            Ok(true)
        }
    }

    struct Failing;

    impl ViewTracker for Failing {
        fn mark_viewed(&mut self, _author_id: &str, _item_id: Uuid) -> Result<bool> {
            Err(StoryError::Store(anyhow::anyhow!("disk full")))
        }
    }

    fn reel(author: &str, viewed: &[bool]) -> AuthorReel {
        AuthorReel {
            author_id: author.into(),
            author_name: None,
            items: viewed
                .iter()
                .map(|&v| StoryItem {
                    id: Uuid::new_v4(),
                    content: StoryContent::Text {
                        text: "hello".into(),
                        background: None,
                        font: None,
                    },
                    created_at_ms: 0,
                    viewed: v,
                    viewers: vec![],
                    duration_secs: 5,
                })
                .collect(),
            last_updated_ms: 0,
            all_viewed: viewed.iter().all(|v| *v),
        }
    }

    #[test]
    fn two_reel_walkthrough() {
        let reels = vec![reel("a", &[false, false]), reel("b", &[false])];
        let mut nav = NavigationController::new();
        let mut rec = Recorder::default();

        assert_eq!(nav.open(&reels, 0).unwrap(), Position::new(0, 0));
        assert_eq!(nav.advance(&mut rec).unwrap(), Transition::Item(Position::new(0, 1)));
        assert_eq!(nav.advance(&mut rec).unwrap(), Transition::Reel(Position::new(1, 0)));
        assert_eq!(nav.advance(&mut rec).unwrap(), Transition::Closed);
        assert!(!nav.is_open());

        let expected: Vec<_> = reels
            .iter()
            .flat_map(|r| r.items.iter().map(move |i| (r.author_id.clone(), i.id)))
            .collect();
        assert_eq!(rec.calls, expected);
    }

    #[test]
    fn retreat_after_one_advance_returns_to_start() {
        let reels = vec![reel("a", &[false, false]), reel("b", &[false])];
        let mut nav = NavigationController::new();
        nav.open(&reels, 0).unwrap();
        nav.advance(&mut Recorder::default()).unwrap();
        assert_eq!(nav.retreat().unwrap(), Transition::Item(Position::new(0, 0)));
    }

    #[test]
    fn retreat_at_very_start_is_noop() {
        let reels = vec![reel("a", &[false, false])];
        let mut nav = NavigationController::new();
        nav.open(&reels, 0).unwrap();
        assert_eq!(nav.retreat().unwrap(), Transition::Unchanged);
        assert_eq!(nav.current(), Some(Position::new(0, 0)));
    }

    #[test]
    fn retreat_crosses_to_last_item_of_previous_reel() {
        let reels = vec![reel("a", &[true, true, true]), reel("b", &[false])];
        let mut nav = NavigationController::new();
        nav.open(&reels, 1).unwrap();
        assert_eq!(nav.retreat().unwrap(), Transition::Reel(Position::new(0, 2)));
    }

    #[test]
    fn open_starts_at_first_unviewed_or_zero() {
        let reels = vec![reel("a", &[true, false, false]), reel("b", &[true, true])];
        let mut nav = NavigationController::new();
        assert_eq!(nav.open(&reels, 0).unwrap(), Position::new(0, 1));
        assert_eq!(nav.open(&reels, 1).unwrap(), Position::new(1, 0));
    }

    #[test]
    fn open_out_of_range_is_an_error() {
        let reels = vec![reel("a", &[false])];
        let mut nav = NavigationController::new();
        assert!(matches!(
            nav.open(&reels, 3),
            Err(StoryError::AuthorOutOfRange { index: 3, len: 1 })
        ));
        assert!(!nav.is_open());
    }

    #[test]
    fn advancing_from_reel_i_closes_after_remaining_item_count() {
        let reels = vec![
            reel("a", &[false]),
            reel("b", &[false, false]),
            reel("c", &[false, false, false]),
        ];
        let mut nav = NavigationController::new();
        nav.open(&reels, 1).unwrap();
        let mut rec = Recorder::default();
        for _ in 0..4 {
            assert!(nav.is_open());
            nav.advance(&mut rec).unwrap();
        }
        assert_eq!(nav.current(), Some(Position::new(2, 2)));
        assert_eq!(nav.advance(&mut rec).unwrap(), Transition::Closed);
        assert_eq!(rec.calls.len(), 5);
    }

    #[test]
    fn navigation_requires_open_viewer() {
        let mut nav = NavigationController::new();
        assert!(matches!(nav.retreat(), Err(StoryError::NotOpen)));
        assert!(matches!(nav.advance(&mut Recorder::default()), Err(StoryError::NotOpen)));
    }

    #[test]
    fn snapshot_ignores_later_changes() {
        let mut reels = vec![reel("a", &[false])];
        let mut nav = NavigationController::new();
        nav.open(&reels, 0).unwrap();

        reels.insert(0, reel("me", &[false]));
        assert_eq!(nav.current_item().map(|(a, _)| a), Some("a"));
        assert_eq!(nav.advance(&mut Recorder::default()).unwrap(), Transition::Closed);
    }

    #[test]
    fn store_failure_does_not_stall_navigation() {
        let reels = vec![reel("a", &[false, false])];
        let mut nav = NavigationController::new();
        nav.open(&reels, 0).unwrap();
        assert_eq!(nav.advance(&mut Failing).unwrap(), Transition::Item(Position::new(0, 1)));
    }
}
