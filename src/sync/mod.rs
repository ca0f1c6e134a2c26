//! Board synchronization view-model.
//!
//! Bridges UI mutation intents to the external service and keeps the cached
//! board graph coherent. Consistency is invalidate-then-refetch: a
//! successful mutation marks the board graph stale and the next read goes
//! back to the server. The cache is never patched with a guessed result, and
//! a failed mutation leaves it untouched.

use crate::{
    api::TrelloApi,
    cache::{QueryCache, QueryKey},
    config::SyncSettings,
    domain::{trello::validate_list_name, BoardGraph, BoardUpdate, CardUpdate, NewCard, TrelloCard, TrelloList},
    drag::DropOutcome,
    error::{PlanitError, Result},
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod directory;
pub mod mutation;
pub mod notify;
pub mod polling;

pub use directory::BoardDirectory;
pub use mutation::{InFlight, MutationId, MutationKind, MutationPhase, MutationTracker};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use polling::PollHandle;

/// View-model for one open board
pub struct BoardSync {
    api: Arc<dyn TrelloApi>,
    cache: Arc<QueryCache<BoardGraph>>,
    board_id: String,
    graph_key: QueryKey,
    stale_time: Duration,
    mutations: MutationTracker,
    notifier: Notifier,
    active: AtomicBool,
}

impl BoardSync {
    pub fn new(
        api: Arc<dyn TrelloApi>,
        cache: Arc<QueryCache<BoardGraph>>,
        board_id: impl Into<String>,
        settings: &SyncSettings,
    ) -> Self {
        let board_id = board_id.into();
        Self {
            api,
            cache,
            graph_key: QueryKey::TrelloBoardFull(board_id.clone()),
            board_id,
            stale_time: settings.board_graph_stale_time(),
            mutations: MutationTracker::new(),
            notifier: Notifier::new(),
            active: AtomicBool::new(true),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn mutations(&self) -> &MutationTracker {
        &self.mutations
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn require_board(&self) -> Result<()> {
        if self.board_id.trim().is_empty() {
            return Err(PlanitError::MissingContext(
                "Missing board context".to_string(),
            ));
        }
        Ok(())
    }

    /// Cached graph without any I/O
    pub async fn cached_graph(&self) -> Option<Arc<BoardGraph>> {
        self.cache.get(&self.graph_key).await
    }

    /// Cached graph while fresh, otherwise a refetch
    pub async fn board_graph(&self) -> Result<Arc<BoardGraph>> {
        self.require_board()?;
        if let Some(graph) = self.cache.get_fresh(&self.graph_key, self.stale_time).await {
            return Ok(graph);
        }
        self.refetch().await
    }

    /// Fetches the full graph and stores it; the last response to land wins.
    /// A response that raced a mutation's invalidation is cached as stale.
    /// After `close` the result is returned but no longer cached.
    pub async fn refetch(&self) -> Result<Arc<BoardGraph>> {
        self.require_board()?;
        let generation = self.cache.generation(&self.graph_key).await;
        let graph = self
            .api
            .get_board_with_lists_and_cards(&self.board_id)
            .await?;

        if !self.is_active() {
            debug!(board_id = %self.board_id, "view closed, discarding fetched graph");
            return Ok(Arc::new(graph));
        }
        Ok(self
            .cache
            .set_if_current(self.graph_key.clone(), graph, generation)
            .await)
    }

    /// Window focus came back
    pub async fn focus_regained(&self) -> Result<Arc<BoardGraph>> {
        self.refetch().await
    }

    /// Polls the board until the handle is dropped or the view closes
    pub fn start_polling(self: &Arc<Self>, period: Duration) -> Result<PollHandle> {
        if period.is_zero() {
            return Err(PlanitError::ConfigError(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        info!(board_id = %self.board_id, ?period, "polling started");
        Ok(polling::spawn_poller(Arc::downgrade(self), period))
    }

    /// The view went away; later responses are not applied
    pub fn close(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub async fn create_card(&self, list_id: &str, card: NewCard) -> Result<TrelloCard> {
        let kind = MutationKind::CreateCard;
        self.guard(kind, card.validate())?;
        self.run_mutation(kind, self.api.create_card(list_id, &card))
            .await
    }

    pub async fn update_card(&self, card_id: &str, update: CardUpdate) -> Result<TrelloCard> {
        let kind = MutationKind::UpdateCard;
        self.run_mutation(kind, self.api.update_card(card_id, &update))
            .await
    }

    pub async fn move_card(&self, card_id: &str, list_id: &str) -> Result<TrelloCard> {
        self.run_mutation(MutationKind::MoveCard, self.api.move_card(card_id, list_id))
            .await
    }

    pub async fn delete_card(&self, card_id: &str) -> Result<()> {
        self.run_mutation(MutationKind::DeleteCard, self.api.delete_card(card_id))
            .await
    }

    pub async fn create_list(&self, name: &str) -> Result<TrelloList> {
        let kind = MutationKind::CreateList;
        self.guard(kind, self.require_board().and(validate_list_name(name)))?;
        self.run_mutation(kind, self.api.create_list(&self.board_id, name))
            .await
    }

    pub async fn update_list(&self, list_id: &str, name: &str) -> Result<TrelloList> {
        let kind = MutationKind::UpdateList;
        self.guard(kind, validate_list_name(name))?;
        self.run_mutation(kind, self.api.update_list(list_id, name))
            .await
    }

    pub async fn archive_list(&self, list_id: &str) -> Result<TrelloList> {
        self.run_mutation(MutationKind::ArchiveList, self.api.archive_list(list_id))
            .await
    }

    pub async fn update_board(&self, update: BoardUpdate) -> Result<()> {
        let kind = MutationKind::UpdateBoard;
        self.guard(kind, self.require_board())?;
        self.run_mutation(kind, self.api.update_board(&self.board_id, &update))
            .await
    }

    /// Issues the move a drop resolved to, if any.
    /// Returns `None` when the drop needs no request.
    pub async fn apply_drop(&self, outcome: &DropOutcome) -> Result<Option<TrelloCard>> {
        match outcome {
            DropOutcome::Move(intent) => {
                let card = self.move_card(&intent.card_id, &intent.to_list).await?;
                Ok(Some(card))
            }
            _ => Ok(None),
        }
    }

    /// Reports a client-side rejection without touching the server
    fn guard(&self, kind: MutationKind, check: Result<()>) -> Result<()> {
        check.map_err(|err| {
            warn!(board_id = %self.board_id, %kind, error = %err, "mutation rejected");
            self.notifier
                .error(format!("Could not {}: {}", kind, err));
            err
        })
    }

    async fn run_mutation<T, F>(&self, kind: MutationKind, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        // Dropping this future mid-request forgets the mutation
        let mutation = self.mutations.track(kind);
        debug!(board_id = %self.board_id, %kind, "mutation pending");

        match op.await {
            Ok(value) => {
                mutation.advance(MutationPhase::Success)?;
                self.cache.invalidate(&self.graph_key).await;
                mutation.advance(MutationPhase::CacheInvalidated)?;
                info!(board_id = %self.board_id, %kind, "mutation succeeded");
                self.notifier.success(kind.success_message());
                mutation.advance(MutationPhase::Idle)?;
                Ok(value)
            }
            Err(err) => {
                mutation.advance(MutationPhase::Error)?;
                warn!(board_id = %self.board_id, %kind, error = %err, "mutation failed");
                self.notifier
                    .error(format!("Could not {}: {}", kind, err));
                mutation.advance(MutationPhase::ErrorReported)?;
                mutation.advance(MutationPhase::Idle)?;
                Err(err)
            }
        }
    }
}
