use crate::{
    api::TrelloApi,
    cache::{QueryCache, QueryKey},
    config::SyncSettings,
    domain::TrelloBoard,
    error::Result,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Cached list of the account's boards, shown by the board picker
pub struct BoardDirectory {
    api: Arc<dyn TrelloApi>,
    cache: QueryCache<Vec<TrelloBoard>>,
    stale_time: Duration,
}

impl BoardDirectory {
    pub fn new(api: Arc<dyn TrelloApi>, settings: &SyncSettings) -> Self {
        Self {
            api,
            cache: QueryCache::new(),
            stale_time: settings.board_list_stale_time(),
        }
    }

    pub async fn boards(&self) -> Result<Arc<Vec<TrelloBoard>>> {
        if let Some(boards) = self
            .cache
            .get_fresh(&QueryKey::TrelloBoards, self.stale_time)
            .await
        {
            return Ok(boards);
        }
        self.refresh().await
    }

    pub async fn refresh(&self) -> Result<Arc<Vec<TrelloBoard>>> {
        let generation = self.cache.generation(&QueryKey::TrelloBoards).await;
        let boards = self.api.get_boards().await?;
        debug!(count = boards.len(), "board directory refreshed");
        Ok(self
            .cache
            .set_if_current(QueryKey::TrelloBoards, boards, generation)
            .await)
    }

    /// Forces the next read to refetch, e.g. after a board was renamed
    pub async fn invalidate(&self) {
        self.cache.invalidate(&QueryKey::TrelloBoards).await;
    }
}
