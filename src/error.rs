use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanitError>;

#[derive(Debug, Error)]
pub enum PlanitError {
    /// Non-2xx response from either API
    #[error("{message} (status {status})")]
    Fetch {
        message: String,
        status: u16,
        body: Option<serde_json::Value>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    MissingContext(String),

    #[error("Invalid mutation transition from {from} to {to}")]
    InvalidMutationTransition { from: String, to: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PlanitError {
    /// Builds a fetch error for a failed operation
    pub fn fetch(
        message: impl Into<String>,
        status: u16,
        body: Option<serde_json::Value>,
    ) -> Self {
        Self::Fetch {
            message: message.into(),
            status,
            body,
        }
    }

    /// HTTP status carried by a fetch error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Fetch { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for errors raised before any request was sent
    pub fn is_client_side(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::MissingContext(_))
    }
}
