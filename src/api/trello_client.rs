//! HTTP client for the external board service

use crate::{
    api::TrelloApi,
    config::TrelloConfig,
    domain::{
        trello::validate_list_name, BoardUpdate, CardUpdate, NewCard, TrelloBoard, TrelloCard,
        TrelloList,
    },
    error::Result,
    gateway::{build_http_client, decode_body, error_from_response, normalize_base_url},
};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Key/token authenticated client for the external REST API
pub struct TrelloClient {
    base_url: String,
    api_key: String,
    token: String,
    client: Client,
}

impl TrelloClient {
    pub fn new(config: &TrelloConfig) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(&config.base_url)?,
            api_key: config.api_key.clone(),
            token: config.token.clone(),
            client: build_http_client(config.timeout_secs)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        failure: &str,
    ) -> Result<Response> {
        let url = self.url(path);
        debug!(%method, %url, "external request");

        let response = self
            .client
            .request(method.clone(), &url)
            .query(&[("key", self.api_key.as_str()), ("token", self.token.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response, Some(failure)).await;
            warn!(%method, %url, error = %err, "external request failed");
            return Err(err);
        }

        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        failure: &str,
    ) -> Result<T> {
        let response = self.send(method, path, params, failure).await?;
        decode_body(response).await
    }
}

#[async_trait]
impl TrelloApi for TrelloClient {
    async fn get_boards(&self) -> Result<Vec<TrelloBoard>> {
        self.fetch(Method::GET, "members/me/boards", &[], "Failed to fetch boards")
            .await
    }

    async fn get_board(&self, board_id: &str) -> Result<TrelloBoard> {
        self.fetch(
            Method::GET,
            &format!("boards/{}", board_id),
            &[("cards", "open".to_string())],
            "Failed to fetch board",
        )
        .await
    }

    async fn get_lists(&self, board_id: &str) -> Result<Vec<TrelloList>> {
        self.fetch(
            Method::GET,
            &format!("boards/{}/lists", board_id),
            &[("cards", "open".to_string())],
            "Failed to fetch lists",
        )
        .await
    }

    async fn get_cards(&self, list_id: &str) -> Result<Vec<TrelloCard>> {
        self.fetch(
            Method::GET,
            &format!("lists/{}/cards", list_id),
            &[],
            "Failed to fetch cards",
        )
        .await
    }

    async fn update_board(&self, board_id: &str, update: &BoardUpdate) -> Result<()> {
        self.send(
            Method::PUT,
            &format!("boards/{}", board_id),
            &update.to_params(),
            "Failed to update board",
        )
        .await?;
        Ok(())
    }

    async fn update_card(&self, card_id: &str, update: &CardUpdate) -> Result<TrelloCard> {
        self.fetch(
            Method::PUT,
            &format!("cards/{}", card_id),
            &update.to_params(),
            "Failed to update card",
        )
        .await
    }

    async fn create_card(&self, list_id: &str, card: &NewCard) -> Result<TrelloCard> {
        card.validate()?;
        self.fetch(
            Method::POST,
            "cards",
            &card.to_params(list_id),
            "Failed to create card",
        )
        .await
    }

    async fn delete_card(&self, card_id: &str) -> Result<()> {
        self.send(
            Method::DELETE,
            &format!("cards/{}", card_id),
            &[],
            "Failed to delete card",
        )
        .await?;
        Ok(())
    }

    async fn create_list(&self, board_id: &str, name: &str) -> Result<TrelloList> {
        validate_list_name(name)?;
        self.fetch(
            Method::POST,
            "lists",
            &[("name", name.to_string()), ("idBoard", board_id.to_string())],
            "Failed to create list",
        )
        .await
    }

    async fn update_list(&self, list_id: &str, name: &str) -> Result<TrelloList> {
        validate_list_name(name)?;
        self.fetch(
            Method::PUT,
            &format!("lists/{}", list_id),
            &[("name", name.to_string())],
            "Failed to update list",
        )
        .await
    }

    async fn archive_list(&self, list_id: &str) -> Result<TrelloList> {
        self.fetch(
            Method::PUT,
            &format!("lists/{}/closed", list_id),
            &[("value", "true".to_string())],
            "Failed to archive list",
        )
        .await
    }
}
