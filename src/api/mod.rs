use crate::{
    domain::{BoardGraph, BoardUpdate, CardUpdate, NewCard, TrelloBoard, TrelloCard, TrelloList},
    error::Result,
};
use async_trait::async_trait;

pub mod auth;
pub mod boards;
pub mod memory;
pub mod trello_client;

pub use auth::{AuthClient, Session};
pub use boards::BoardService;
pub use memory::{ApiCall, InMemoryTrello};
pub use trello_client::TrelloClient;

/// Operations against the external board/list/card service
///
/// Moving a card is a partial update of its list membership. There is no
/// reorder primitive, so position within a list is never persisted.
#[async_trait]
pub trait TrelloApi: Send + Sync {
    /// Lists the boards of the authenticated account
    async fn get_boards(&self) -> Result<Vec<TrelloBoard>>;

    /// Fetches board metadata
    async fn get_board(&self, board_id: &str) -> Result<TrelloBoard>;

    /// Fetches the open lists of a board with their open cards
    async fn get_lists(&self, board_id: &str) -> Result<Vec<TrelloList>>;

    /// Fetches the cards of one list
    async fn get_cards(&self, list_id: &str) -> Result<Vec<TrelloCard>>;

    /// Board metadata followed by lists-with-cards, as one graph
    async fn get_board_with_lists_and_cards(&self, board_id: &str) -> Result<BoardGraph> {
        let board = self.get_board(board_id).await?;
        let lists = self.get_lists(board_id).await?;
        Ok(BoardGraph { board, lists })
    }

    async fn update_board(&self, board_id: &str, update: &BoardUpdate) -> Result<()>;

    /// Partial card update; unset fields are left untouched upstream
    async fn update_card(&self, card_id: &str, update: &CardUpdate) -> Result<TrelloCard>;

    /// Moves a card to another list
    async fn move_card(&self, card_id: &str, list_id: &str) -> Result<TrelloCard> {
        self.update_card(card_id, &CardUpdate::move_to(list_id))
            .await
    }

    /// Creates a card; blank names are rejected before any request
    async fn create_card(&self, list_id: &str, card: &NewCard) -> Result<TrelloCard>;

    async fn delete_card(&self, card_id: &str) -> Result<()>;

    async fn create_list(&self, board_id: &str, name: &str) -> Result<TrelloList>;

    async fn update_list(&self, list_id: &str, name: &str) -> Result<TrelloList>;

    /// Sets the closed flag on a list; the list is not deleted
    async fn archive_list(&self, list_id: &str) -> Result<TrelloList>;
}
