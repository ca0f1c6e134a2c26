use crate::{
    domain::{BoardDetail, BoardSummary, CreateBoardPayload, UpdateBoardPayload},
    error::{PlanitError, Result},
    gateway::{RequestClient, RequestOptions},
};
use reqwest::Method;
use serde::Deserialize;
use tracing::info;

const BOARDS_PATH: &str = "/api/boards";

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    ok: bool,
}

/// Client for the first-party board resource
pub struct BoardService {
    client: RequestClient,
    token: Option<String>,
}

impl BoardService {
    pub fn new(client: RequestClient, token: Option<String>) -> Self {
        Self { client, token }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PlanitError::MissingContext("You must be signed in to manage boards.".to_string())
            })
    }

    fn board_context(&self, board_id: &str) -> Result<&str> {
        match self.token.as_deref() {
            Some(token) if !token.is_empty() && !board_id.trim().is_empty() => Ok(token),
            _ => Err(PlanitError::MissingContext(
                "Missing board context".to_string(),
            )),
        }
    }

    pub async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        let token = self.token()?;
        self.client
            .request(Method::GET, BOARDS_PATH, RequestOptions::new().token(token))
            .await
    }

    pub async fn create_board(&self, payload: &CreateBoardPayload) -> Result<BoardSummary> {
        let token = self.token()?;
        payload.validate()?;
        let summary: BoardSummary = self
            .client
            .request(
                Method::POST,
                BOARDS_PATH,
                RequestOptions::new().token(token).body(payload)?,
            )
            .await?;
        info!(board_id = %summary.id, "created board");
        Ok(summary)
    }

    pub async fn get_board(&self, board_id: &str) -> Result<BoardDetail> {
        let token = self.board_context(board_id)?;
        self.client
            .request(
                Method::GET,
                &format!("{}/{}", BOARDS_PATH, board_id),
                RequestOptions::new().token(token),
            )
            .await
    }

    pub async fn update_board(
        &self,
        board_id: &str,
        payload: &UpdateBoardPayload,
    ) -> Result<BoardDetail> {
        let token = self.board_context(board_id)?;
        self.client
            .request(
                Method::PATCH,
                &format!("{}/{}", BOARDS_PATH, board_id),
                RequestOptions::new().token(token).body(payload)?,
            )
            .await
    }

    /// Deletes a board; returns the server's `ok` flag
    pub async fn delete_board(&self, board_id: &str) -> Result<bool> {
        let token = self.board_context(board_id)?;
        let response: DeleteResponse = self
            .client
            .request(
                Method::DELETE,
                &format!("{}/{}", BOARDS_PATH, board_id),
                RequestOptions::new().token(token),
            )
            .await?;
        info!(board_id, ok = response.ok, "deleted board");
        Ok(response.ok)
    }
}
