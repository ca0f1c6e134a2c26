//! # Planit Core
//!
//! Board, list and card synchronization for the Planit project board.
//!
//! This crate holds the domain types of the external board service and of
//! the first-party backend, the HTTP gateways to both, a client-side query
//! cache, and the board view-model that turns user intents (including
//! pointer drags) into mutations followed by cache invalidation and refetch.

pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod drag;
pub mod error;
pub mod gateway;
pub mod sync;

// Re-export commonly used types
pub use api::{AuthClient, BoardService, InMemoryTrello, TrelloApi, TrelloClient};
pub use cache::{QueryCache, QueryKey};
pub use config::{ApiConfig, SyncSettings, TrelloConfig};
pub use domain::{BoardGraph, CardUpdate, NewCard, TrelloBoard, TrelloCard, TrelloList};
pub use drag::{DragController, DropOutcome, DropTarget};
pub use error::{PlanitError, Result};
pub use sync::{BoardDirectory, BoardSync, Notifier};
