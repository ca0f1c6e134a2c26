//! JSON-over-HTTP gateway shared by the API clients.
//!
//! Attaches bearer tokens, serializes request bodies and turns every non-2xx
//! response into a [`PlanitError::Fetch`] carrying the status and the parsed
//! response body.

use crate::config::ApiConfig;
use crate::error::{PlanitError, Result};
use reqwest::{header, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub body: Option<Value>,
    pub token: Option<String>,
    pub params: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }
}

/// HTTP client bound to one API base URL
#[derive(Debug, Clone)]
pub struct RequestClient {
    base_url: String,
    client: Client,
}

impl RequestClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(&config.base_url)?,
            client: build_http_client(config.timeout_secs)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an absolute API path such as `/api/boards`
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Sends a request and decodes the JSON response
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self.send(method, path, options).await?;
        decode_body(response).await
    }

    /// Sends a request whose success body is not needed
    pub async fn request_empty(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<()> {
        self.send(method, path, options).await?;
        Ok(())
    }

    async fn send(&self, method: Method, path: &str, options: RequestOptions) -> Result<Response> {
        let url = self.url(path);
        debug!(%method, %url, "request");

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = &options.token {
            builder = builder.bearer_auth(token);
        }
        if !options.params.is_empty() {
            builder = builder.query(&options.params);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let reason = response
            .status()
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
        let err = error_from_response(response, None).await;
        warn!(%method, %url, error = %err, "request failed");
        Err(match err {
            PlanitError::Fetch {
                message,
                status,
                body,
            } if message.is_empty() => PlanitError::fetch(reason, status, body),
            other => other,
        })
    }
}

pub(crate) fn build_http_client(timeout_secs: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw)?;
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Normalizes a non-2xx response into a fetch error.
///
/// With `message` set, that message names the failed operation; otherwise
/// the body's `message`/`error` field is used, or an empty message when
/// the body carries neither.
pub(crate) async fn error_from_response(response: Response, message: Option<&str>) -> PlanitError {
    let status = response.status().as_u16();
    let body = read_error_body(response).await;

    let message = match message {
        Some(message) => message.to_string(),
        None => body
            .as_ref()
            .and_then(|b| {
                b.get("message")
                    .or_else(|| b.get("error"))
                    .and_then(Value::as_str)
            })
            .unwrap_or_default()
            .to_string(),
    };

    PlanitError::fetch(message, status, body)
}

async fn read_error_body(response: Response) -> Option<Value> {
    if is_json(&response) {
        response.json::<Value>().await.ok()
    } else {
        match response.text().await {
            Ok(text) if !text.is_empty() => Some(Value::String(text)),
            _ => None,
        }
    }
}

pub(crate) async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    if is_json(&response) {
        Ok(response.json().await?)
    } else {
        let text = response.text().await?;
        Ok(serde_json::from_value(Value::String(text))?)
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pong {
        ok: bool,
    }

    async fn client_for(server: &MockServer) -> RequestClient {
        RequestClient::new(&ApiConfig::new(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_request_attaches_token_and_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ping"))
            .and(header_eq("authorization", "Bearer abc"))
            .and(query_param("verbose", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let pong: Pong = client
            .request(
                Method::GET,
                "/api/ping",
                RequestOptions::new().token("abc").param("verbose", true),
            )
            .await
            .unwrap();

        assert_eq!(pong, Pong { ok: true });
    }

    #[tokio::test]
    async fn test_error_uses_json_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/boards"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "Board name is required"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .request::<Value>(
                Method::POST,
                "/api/boards",
                RequestOptions::new().body(&serde_json::json!({"name": ""})).unwrap(),
            )
            .await
            .unwrap_err();

        match err {
            PlanitError::Fetch {
                message,
                status,
                body,
            } => {
                assert_eq!(message, "Board name is required");
                assert_eq!(status, 400);
                assert_eq!(body.unwrap()["error"], "Board name is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_falls_back_to_reason_phrase() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .request_empty(Method::GET, "/api/boards", RequestOptions::new())
            .await
            .unwrap_err();

        match err {
            PlanitError::Fetch { message, status, body } => {
                assert_eq!(message, "Service Unavailable");
                assert_eq!(status, 503);
                assert_eq!(body, Some(Value::String("upstream down".to_string())));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_text_body_decodes_as_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let text: String = client
            .request(Method::GET, "/health", RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn test_url_joining() {
        let client = RequestClient::new(&ApiConfig::new("http://localhost:3000/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/api/boards"), "http://localhost:3000/api/boards");
        assert_eq!(client.url("api/boards"), "http://localhost:3000/api/boards");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            RequestClient::new(&ApiConfig::new("not a url")),
            Err(PlanitError::InvalidUrl(_))
        ));
    }
}
