//! In-memory board service.
//!
//! Implements [`TrelloApi`] over local state so the view-model and the
//! interaction layer can run without the network. Every call is journaled
//! and a single failure can be queued to simulate a non-2xx response.

use crate::{
    api::TrelloApi,
    domain::{
        trello::validate_list_name, BoardPrefs, BoardUpdate, CardUpdate, NewCard, TrelloBoard,
        TrelloCard, TrelloList,
    },
    error::{PlanitError, Result},
};
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// A request as the service received it
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    GetBoards,
    GetBoard(String),
    GetLists(String),
    GetCards(String),
    UpdateBoard { board_id: String, update: BoardUpdate },
    UpdateCard { card_id: String, update: CardUpdate },
    CreateCard { list_id: String, name: String },
    DeleteCard(String),
    CreateList { board_id: String, name: String },
    UpdateList { list_id: String, name: String },
    ArchiveList(String),
}

impl ApiCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::GetBoards | Self::GetBoard(_) | Self::GetLists(_) | Self::GetCards(_)
        )
    }
}

#[derive(Default)]
struct State {
    boards: Vec<TrelloBoard>,
    lists: Vec<TrelloList>,
    cards: Vec<TrelloCard>,
}

impl State {
    fn lists_of(&self, board_id: &str) -> Vec<TrelloList> {
        self.lists
            .iter()
            .filter(|l| !l.closed && l.board_id.as_deref() == Some(board_id))
            .map(|l| TrelloList {
                cards: self.cards_of(&l.id),
                ..l.clone()
            })
            .collect()
    }

    fn cards_of(&self, list_id: &str) -> Vec<TrelloCard> {
        self.cards
            .iter()
            .filter(|c| c.list_id == list_id)
            .cloned()
            .collect()
    }
}

pub struct InMemoryTrello {
    state: RwLock<State>,
    calls: Mutex<Vec<ApiCall>>,
    pending_failure: Mutex<Option<u16>>,
}

impl InMemoryTrello {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            calls: Mutex::new(Vec::new()),
            pending_failure: Mutex::new(None),
        }
    }

    fn generate_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    pub async fn seed_board(&self, id: &str, name: &str) {
        self.state.write().await.boards.push(TrelloBoard {
            id: id.to_string(),
            name: name.to_string(),
            desc: String::new(),
            url: format!("https://trello.com/b/{}", id),
            prefs: BoardPrefs::default(),
            lists: None,
        });
    }

    pub async fn seed_list(&self, board_id: &str, id: &str, name: &str) {
        self.state.write().await.lists.push(TrelloList {
            id: id.to_string(),
            name: name.to_string(),
            closed: false,
            board_id: Some(board_id.to_string()),
            cards: Vec::new(),
        });
    }

    pub async fn seed_card(&self, list_id: &str, id: &str, name: &str) {
        self.state.write().await.cards.push(TrelloCard {
            id: id.to_string(),
            name: name.to_string(),
            desc: String::new(),
            due: None,
            labels: Vec::new(),
            list_id: list_id.to_string(),
        });
    }

    /// Makes the next call fail with the given HTTP status
    pub async fn fail_next(&self, status: u16) {
        *self.pending_failure.lock().await = Some(status);
    }

    /// Journal of every call received, in order
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().await.clone()
    }

    pub async fn mutation_calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: ApiCall, failure: &str) -> Result<()> {
        info!(?call, "[InMemoryTrello] call");
        self.calls.lock().await.push(call);
        if let Some(status) = self.pending_failure.lock().await.take() {
            return Err(PlanitError::fetch(
                failure,
                status,
                Some(json!({ "message": "injected failure" })),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryTrello {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(failure: &str) -> PlanitError {
    PlanitError::fetch(
        failure,
        404,
        Some(json!({ "message": "The requested resource was not found." })),
    )
}

#[async_trait]
impl TrelloApi for InMemoryTrello {
    async fn get_boards(&self) -> Result<Vec<TrelloBoard>> {
        self.record(ApiCall::GetBoards, "Failed to fetch boards")
            .await?;
        Ok(self.state.read().await.boards.clone())
    }

    async fn get_board(&self, board_id: &str) -> Result<TrelloBoard> {
        let failure = "Failed to fetch board";
        self.record(ApiCall::GetBoard(board_id.to_string()), failure)
            .await?;
        self.state
            .read()
            .await
            .boards
            .iter()
            .find(|b| b.id == board_id)
            .cloned()
            .ok_or_else(|| not_found(failure))
    }

    async fn get_lists(&self, board_id: &str) -> Result<Vec<TrelloList>> {
        let failure = "Failed to fetch lists";
        self.record(ApiCall::GetLists(board_id.to_string()), failure)
            .await?;
        let state = self.state.read().await;
        if !state.boards.iter().any(|b| b.id == board_id) {
            return Err(not_found(failure));
        }
        Ok(state.lists_of(board_id))
    }

    async fn get_cards(&self, list_id: &str) -> Result<Vec<TrelloCard>> {
        let failure = "Failed to fetch cards";
        self.record(ApiCall::GetCards(list_id.to_string()), failure)
            .await?;
        let state = self.state.read().await;
        if !state.lists.iter().any(|l| l.id == list_id) {
            return Err(not_found(failure));
        }
        Ok(state.cards_of(list_id))
    }

    async fn update_board(&self, board_id: &str, update: &BoardUpdate) -> Result<()> {
        let failure = "Failed to update board";
        self.record(
            ApiCall::UpdateBoard {
                board_id: board_id.to_string(),
                update: update.clone(),
            },
            failure,
        )
        .await?;

        let mut state = self.state.write().await;
        let board = state
            .boards
            .iter_mut()
            .find(|b| b.id == board_id)
            .ok_or_else(|| not_found(failure))?;
        if let Some(name) = &update.name {
            board.name = name.clone();
        }
        if let Some(desc) = &update.desc {
            board.desc = desc.clone();
        }
        if let Some(background) = &update.background {
            board.prefs.background_color = Some(background.clone());
        }
        if let Some(image) = &update.background_image {
            board.prefs.background_image = Some(image.clone());
        }
        Ok(())
    }

    async fn update_card(&self, card_id: &str, update: &CardUpdate) -> Result<TrelloCard> {
        let failure = "Failed to update card";
        self.record(
            ApiCall::UpdateCard {
                card_id: card_id.to_string(),
                update: update.clone(),
            },
            failure,
        )
        .await?;

        let mut state = self.state.write().await;
        let index = state
            .cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or_else(|| not_found(failure))?;

        let mut card = state.cards[index].clone();
        if let Some(name) = &update.name {
            card.name = name.clone();
        }
        if let Some(desc) = &update.desc {
            card.desc = desc.clone();
        }
        if let Some(due) = update.due {
            card.due = Some(due);
        }
        if let Some(list_id) = &update.list_id {
            if !state.lists.iter().any(|l| &l.id == list_id) {
                return Err(PlanitError::fetch(
                    failure,
                    400,
                    Some(json!({ "message": "invalid value for idList" })),
                ));
            }
            // The service appends moved cards to the end of the target list
            if &card.list_id != list_id {
                card.list_id = list_id.clone();
                state.cards.remove(index);
                state.cards.push(card.clone());
                return Ok(card);
            }
        }
        state.cards[index] = card.clone();
        Ok(card)
    }

    async fn create_card(&self, list_id: &str, card: &NewCard) -> Result<TrelloCard> {
        card.validate()?;
        let failure = "Failed to create card";
        self.record(
            ApiCall::CreateCard {
                list_id: list_id.to_string(),
                name: card.name.clone(),
            },
            failure,
        )
        .await?;

        let mut state = self.state.write().await;
        if !state.lists.iter().any(|l| l.id == list_id) {
            return Err(not_found(failure));
        }
        let created = TrelloCard {
            id: Self::generate_id(),
            name: card.name.clone(),
            desc: card.desc.clone().unwrap_or_default(),
            due: card.due,
            labels: Vec::new(),
            list_id: list_id.to_string(),
        };
        state.cards.push(created.clone());
        Ok(created)
    }

    async fn delete_card(&self, card_id: &str) -> Result<()> {
        let failure = "Failed to delete card";
        self.record(ApiCall::DeleteCard(card_id.to_string()), failure)
            .await?;

        let mut state = self.state.write().await;
        let index = state
            .cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or_else(|| not_found(failure))?;
        state.cards.remove(index);
        Ok(())
    }

    async fn create_list(&self, board_id: &str, name: &str) -> Result<TrelloList> {
        validate_list_name(name)?;
        let failure = "Failed to create list";
        self.record(
            ApiCall::CreateList {
                board_id: board_id.to_string(),
                name: name.to_string(),
            },
            failure,
        )
        .await?;

        let mut state = self.state.write().await;
        if !state.boards.iter().any(|b| b.id == board_id) {
            return Err(not_found(failure));
        }
        let list = TrelloList {
            id: Self::generate_id(),
            name: name.to_string(),
            closed: false,
            board_id: Some(board_id.to_string()),
            cards: Vec::new(),
        };
        state.lists.push(list.clone());
        Ok(list)
    }

    async fn update_list(&self, list_id: &str, name: &str) -> Result<TrelloList> {
        validate_list_name(name)?;
        let failure = "Failed to update list";
        self.record(
            ApiCall::UpdateList {
                list_id: list_id.to_string(),
                name: name.to_string(),
            },
            failure,
        )
        .await?;

        let mut state = self.state.write().await;
        let list = state
            .lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| not_found(failure))?;
        list.name = name.to_string();
        Ok(list.clone())
    }

    async fn archive_list(&self, list_id: &str) -> Result<TrelloList> {
        let failure = "Failed to archive list";
        self.record(ApiCall::ArchiveList(list_id.to_string()), failure)
            .await?;

        let mut state = self.state.write().await;
        let list = state
            .lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| not_found(failure))?;
        list.closed = true;
        Ok(list.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryTrello {
        let api = InMemoryTrello::new();
        api.seed_board("B1", "Roadmap").await;
        api.seed_list("B1", "L1", "Todo").await;
        api.seed_list("B1", "L2", "Done").await;
        api.seed_card("L1", "C1", "Draft plan").await;
        api
    }

    #[tokio::test]
    async fn test_move_card_is_single_list_update() {
        let api = seeded().await;
        api.move_card("C1", "L2").await.unwrap();

        assert_eq!(
            api.calls().await,
            vec![ApiCall::UpdateCard {
                card_id: "C1".to_string(),
                update: CardUpdate::move_to("L2"),
            }]
        );

        let graph = api.get_board_with_lists_and_cards("B1").await.unwrap();
        assert!(graph.list("L1").unwrap().cards.is_empty());
        assert_eq!(graph.list_of_card("C1"), Some("L2"));
        assert_eq!(graph.card("C1").unwrap().name, "Draft plan");
    }

    #[tokio::test]
    async fn test_create_card_validates_before_recording() {
        let api = seeded().await;
        assert!(api.create_card("L1", &NewCard::new("")).await.is_err());
        assert!(api.calls().await.is_empty());

        let card = api.create_card("L2", &NewCard::new("Ship")).await.unwrap();
        assert_eq!(card.list_id, "L2");
        assert_eq!(api.get_cards("L2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_twice_surfaces_error() {
        let api = seeded().await;
        api.delete_card("C1").await.unwrap();
        let err = api.delete_card("C1").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_archived_lists_are_hidden() {
        let api = seeded().await;
        let archived = api.archive_list("L2").await.unwrap();
        assert!(archived.closed);

        let lists = api.get_lists("B1").await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, "L1");
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let api = seeded().await;
        api.fail_next(500).await;

        let err = api.update_list("L1", "Backlog").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to update list (status 500)");

        let list = api.update_list("L1", "Backlog").await.unwrap();
        assert_eq!(list.name, "Backlog");
        assert_eq!(api.mutation_calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_update_board_prefs() {
        let api = seeded().await;
        let update = BoardUpdate {
            background: Some("green".to_string()),
            ..Default::default()
        };
        api.update_board("B1", &update).await.unwrap();

        let board = api.get_board("B1").await.unwrap();
        assert_eq!(board.prefs.background_color.as_deref(), Some("green"));
        assert_eq!(board.name, "Roadmap");
    }
}
