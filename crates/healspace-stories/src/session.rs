use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use healspace_db::KeyValueStore;
use healspace_types::events::{SessionCommand, StoryEvent};

use crate::logging::StoryLogger;
use crate::navigation::{NavigationController, Transition};
use crate::progress::Progress;
use crate::repository::StoryRepository;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Local viewer, attached to every logged event
    pub viewer_id: String,
    /// Auto-advance tick period
    pub tick: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewer_id: "me".into(),
            tick: Duration::from_millis(100),
        }
    }
}

/// Client side of a running [`ViewingSession`].
pub struct SessionHandle<S> {
    commands: mpsc::UnboundedSender<SessionCommand>,
    events: mpsc::UnboundedReceiver<StoryEvent>,
    task: JoinHandle<StoryRepository<S>>,
}

impl<S> SessionHandle<S> {
    /// Returns false if the session has already stopped.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub async fn next_event(&mut self) -> Option<StoryEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<StoryEvent> {
        self.events.try_recv().ok()
    }

    /// Stop the session (closing the viewer if open) and hand back the repository.
    pub async fn shutdown(self) -> Result<StoryRepository<S>, tokio::task::JoinError> {
        drop(self.commands);
        self.task.await
    }
}

/// Story viewer for the lifetime of the presentation layer.
///
/// Owns the repository, the navigation controller and the active item's
/// progress. Commands arrive on a channel; every shown non-video item gets a
/// ticker task bound to a fresh generation and cancellation token. Any
/// transition, close or re-open cancels the ticker, and ticks carrying an old
/// generation are dropped, so a stale auto-advance never fires.
pub struct ViewingSession<S> {
    repo: StoryRepository<S>,
    nav: NavigationController,
    progress: Option<Progress>,
    config: SessionConfig,
    logger: Arc<dyn StoryLogger>,
    events: mpsc::UnboundedSender<StoryEvent>,
    ticks: mpsc::UnboundedSender<u64>,
    generation: u64,
    timer: Option<CancellationToken>,
}

impl<S> ViewingSession<S>
where
    S: KeyValueStore + Send + 'static,
{
    pub fn spawn(
        repo: StoryRepository<S>,
        config: SessionConfig,
        logger: Arc<dyn StoryLogger>,
    ) -> SessionHandle<S> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();

        let session = Self {
            repo,
            nav: NavigationController::new(),
            progress: None,
            config,
            logger,
            events: event_tx,
            ticks: tick_tx,
            generation: 0,
            timer: None,
        };
        let task = tokio::spawn(session.run(cmd_rx, tick_rx));

        SessionHandle {
            commands: cmd_tx,
            events: event_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut ticks: mpsc::UnboundedReceiver<u64>,
    ) -> StoryRepository<S> {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some(generation) = ticks.recv() => self.on_tick(generation),
            }
        }

        if self.nav.is_open() {
            self.close();
        }
        self.repo
    }

    fn handle(&mut self, command: SessionCommand) {
        if let SessionCommand::Open { author_index } = command {
            self.open(author_index);
            return;
        }
        if !self.nav.is_open() {
            debug!("Ignoring {:?} while the viewer is closed", command);
            return;
        }

        let current = self.current_id();
        match command {
            SessionCommand::Open { .. } => {}
            SessionCommand::Close => self.close(),
            SessionCommand::Next => self.advance(),
            SessionCommand::Previous => self.retreat(),
            SessionCommand::Pause => {
                if let (Some(progress), Some(item_id)) = (self.progress.as_mut(), current) {
                    if progress.is_paused() {
                        return;
                    }
                    progress.pause();
                    self.emit(StoryEvent::Paused { item_id });
                }
            }
            SessionCommand::Resume => {
                if let (Some(progress), Some(item_id)) = (self.progress.as_mut(), current) {
                    if !progress.is_paused() {
                        return;
                    }
                    progress.resume();
                    self.emit(StoryEvent::Resumed { item_id });
                }
            }
            SessionCommand::MediaPosition { position_ms, length_ms } => {
                if let (Some(progress), Some(item_id)) = (self.progress.as_mut(), current) {
                    progress.sync_media(position_ms, length_ms);
                    let percent = progress.percent();
                    self.emit(StoryEvent::Progress { item_id, percent });
                }
            }
            SessionCommand::MediaEnded => {
                if self.progress.as_mut().is_some_and(|p| p.media_ended()) {
                    self.advance();
                }
            }
        }
    }

    /// A failed open leaves any running viewer untouched.
    fn open(&mut self, author_index: usize) {
        if let Err(e) = self.repo.load() {
            warn!("Failed to load stories: {}", e);
            return;
        }
        let pos = match self.nav.open(self.repo.reels(), author_index) {
            Ok(pos) => pos,
            Err(e) => {
                warn!("Cannot open story viewer: {}", e);
                return;
            }
        };

        self.disarm();
        self.progress = None;
        self.emit(StoryEvent::Opened {
            author_index: pos.author_index,
            item_index: pos.item_index,
        });
        self.show_current();
    }

    fn close(&mut self) {
        self.disarm();
        self.nav.close();
        self.progress = None;
        self.emit(StoryEvent::Closed);
    }

    fn advance(&mut self) {
        let leaving = self
            .nav
            .current_item()
            .map(|(author_id, item)| (author_id.to_string(), item.id));

        self.disarm();
        let transition = match self.nav.advance(&mut self.repo) {
            Ok(t) => t,
            Err(e) => {
                warn!("Cannot advance: {}", e);
                return;
            }
        };

        // Emitted for every item moved past, including ones the store already
        // had as viewed or failed to record
        if let Some((author_id, item_id)) = leaving {
            self.emit(StoryEvent::ItemViewed { author_id, item_id });
        }
        self.apply(transition);
    }

    fn retreat(&mut self) {
        match self.nav.retreat() {
            Ok(Transition::Unchanged) => {}
            Ok(transition) => self.apply(transition),
            Err(e) => warn!("Cannot retreat: {}", e),
        }
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Item(_) => self.show_current(),
            Transition::Reel(pos) => {
                self.emit(StoryEvent::ReelChanged {
                    author_index: pos.author_index,
                });
                self.show_current();
            }
            Transition::Closed => {
                self.disarm();
                self.progress = None;
                self.emit(StoryEvent::Closed);
            }
            Transition::Unchanged => {}
        }
    }

    fn show_current(&mut self) {
        let (Some(pos), Some((author_id, item))) = (self.nav.current(), self.nav.current_item())
        else {
            return;
        };
        let event = StoryEvent::ItemShown {
            author_id: author_id.to_string(),
            item_id: item.id,
            author_index: pos.author_index,
            item_index: pos.item_index,
            duration_secs: item.duration_secs,
        };
        let progress = Progress::new(item.duration_secs, item.is_video);

        if progress.is_media_driven() {
            self.disarm();
        } else {
            self.arm();
        }
        self.progress = Some(progress);
        self.emit(event);
    }

    fn on_tick(&mut self, generation: u64) {
        if generation != self.generation {
            trace!(generation, current = self.generation, "Dropping stale tick");
            return;
        }
        let Some(item_id) = self.current_id() else {
            return;
        };
        let Some(progress) = self.progress.as_mut() else {
            return;
        };

        let before = progress.percent();
        let complete = progress.tick(self.config.tick);
        let percent = progress.percent();
        if percent != before {
            self.emit(StoryEvent::Progress { item_id, percent });
        }
        if complete {
            self.advance();
        }
    }

    /// Start a ticker for the current item, cancelling any previous one.
    fn arm(&mut self) {
        self.disarm();

        let token = CancellationToken::new();
        self.timer = Some(token.clone());

        let generation = self.generation;
        let period = self.config.tick;
        let ticks = self.ticks.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if ticks.send(generation).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Cancel the pending ticker and invalidate ticks already queued.
    fn disarm(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
        self.generation += 1;
    }

    fn current_id(&self) -> Option<uuid::Uuid> {
        self.nav.current_item().map(|(_, item)| item.id)
    }

    fn emit(&self, event: StoryEvent) {
        self.logger.log(&self.config.viewer_id, &event);
        let _ = self.events.send(event);
    }
}
