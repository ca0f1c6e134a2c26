use crate::{
    domain::{AuthResponse, LoginPayload, RegisterPayload, UserProfile},
    error::{PlanitError, Result},
    gateway::{RequestClient, RequestOptions},
};
use reqwest::Method;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Holds the bearer token of the signed-in user
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}

/// Client for the sign-in, sign-up and profile endpoints
pub struct AuthClient {
    client: RequestClient,
    session: Arc<Session>,
}

impl AuthClient {
    pub fn new(client: RequestClient, session: Arc<Session>) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session)
    }

    pub async fn login(&self, payload: &LoginPayload) -> Result<AuthResponse> {
        payload.validate()?;
        let response: AuthResponse = self
            .client
            .request(Method::POST, "/api/login", RequestOptions::new().body(payload)?)
            .await?;
        self.session.set_token(Some(response.token.clone())).await;
        info!(user_id = %response.user.id, "signed in");
        Ok(response)
    }

    pub async fn register(&self, payload: &RegisterPayload) -> Result<AuthResponse> {
        payload.validate()?;
        let response: AuthResponse = self
            .client
            .request(
                Method::POST,
                "/api/register",
                RequestOptions::new().body(payload)?,
            )
            .await?;
        self.session.set_token(Some(response.token.clone())).await;
        info!(user_id = %response.user.id, "registered");
        Ok(response)
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        let token = self
            .session
            .token()
            .await
            .ok_or_else(|| PlanitError::MissingContext("Missing auth token".to_string()))?;
        self.client
            .request(
                Method::GET,
                "/api/profile",
                RequestOptions::new().token(token),
            )
            .await
    }

    /// Clears the local session, then notifies the server on a best-effort basis
    pub async fn logout(&self) {
        self.session.set_token(None).await;
        if let Err(e) = self
            .client
            .request_empty(Method::POST, "/api/logout", RequestOptions::new())
            .await
        {
            warn!(error = %e, "logout request failed; local session already cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_client(server: &MockServer) -> AuthClient {
        let client = RequestClient::new(&ApiConfig::new(server.uri())).unwrap();
        AuthClient::new(client, Arc::new(Session::new()))
    }

    fn auth_response() -> serde_json::Value {
        json!({
            "ok": true,
            "token": "jwt-123",
            "user": {"id": "u1", "fName": "Ada", "lName": "Lovelace", "email": "ada@example.com"}
        })
    }

    #[tokio::test]
    async fn test_login_stores_token_and_profile_uses_it() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_response()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .and(header("authorization", "Bearer jwt-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_response()["user"].clone()))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        let payload = LoginPayload {
            email: "ada@example.com".to_string(),
            password: "pw".to_string(),
        };
        auth.login(&payload).await.unwrap();
        assert_eq!(auth.session().token().await.as_deref(), Some("jwt-123"));

        let profile = auth.profile().await.unwrap();
        assert_eq!(profile.f_name, "Ada");
    }

    #[tokio::test]
    async fn test_register_mismatch_sends_nothing() {
        let server = MockServer::start().await;
        let auth = auth_client(&server);
        let payload = RegisterPayload {
            f_name: "Ada".to_string(),
            l_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "one".to_string(),
            confirm_password: "two".to_string(),
        };

        assert!(auth.register(&payload).await.is_err());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_without_token() {
        let server = MockServer::start().await;
        let err = auth_client(&server).profile().await.unwrap_err();
        assert_eq!(err.to_string(), "Missing auth token");
    }

    #[tokio::test]
    async fn test_logout_ignores_server_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/logout"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_client(&server);
        auth.session().set_token(Some("jwt".to_string())).await;

        auth.logout().await;
        assert!(!auth.session().is_authenticated().await);
    }
}
