//! Client-side query cache.
//!
//! An explicit key→value map with invalidation and change notification.
//! Values are stored behind `Arc`; every write produces a new allocation,
//! so readers can tell a refetched value from the previous one by identity
//! even when the content is equal. Entries are never patched in place.
//!
//! Each key also carries an invalidation generation. A fetch that started
//! before an invalidation can still land, but only as a stale entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

/// Identity of a cached query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Boards of the external account
    TrelloBoards,
    /// One board with its lists and cards
    TrelloBoardFull(String),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrelloBoards => write!(f, "trello-boards"),
            Self::TrelloBoardFull(id) => write!(f, "trello-board-full:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
    Removed(QueryKey),
}

struct Entry<V> {
    value: Arc<V>,
    fetched_at: Instant,
    stale: bool,
}

struct Slots<V> {
    entries: HashMap<QueryKey, Entry<V>>,
    generations: HashMap<QueryKey, u64>,
}

impl<V> Slots<V> {
    fn generation(&self, key: &QueryKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

pub struct QueryCache<V> {
    slots: RwLock<Slots<V>>,
    events: broadcast::Sender<CacheEvent>,
}

impl<V: Send + Sync + 'static> QueryCache<V> {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            slots: RwLock::new(Slots {
                entries: HashMap::new(),
                generations: HashMap::new(),
            }),
            events,
        }
    }

    /// Last stored value, stale or not
    pub async fn get(&self, key: &QueryKey) -> Option<Arc<V>> {
        self.slots
            .read()
            .await
            .entries
            .get(key)
            .map(|e| Arc::clone(&e.value))
    }

    /// Value only if it was not invalidated and is younger than `stale_time`
    pub async fn get_fresh(&self, key: &QueryKey, stale_time: Duration) -> Option<Arc<V>> {
        self.slots
            .read()
            .await
            .entries
            .get(key)
            .filter(|e| !e.stale && e.fetched_at.elapsed() < stale_time)
            .map(|e| Arc::clone(&e.value))
    }

    /// True when there is no entry or the entry must be refetched
    pub async fn is_stale(&self, key: &QueryKey, stale_time: Duration) -> bool {
        self.get_fresh(key, stale_time).await.is_none()
    }

    /// Invalidation generation of `key`; capture it before fetching
    pub async fn generation(&self, key: &QueryKey) -> u64 {
        self.slots.read().await.generation(key)
    }

    /// Stores a freshly fetched value, replacing whatever was there
    pub async fn set(&self, key: QueryKey, value: V) -> Arc<V> {
        let mut slots = self.slots.write().await;
        let generation = slots.generation(&key);
        self.store(&mut slots, key, value, generation)
    }

    /// Stores a value fetched when `key` was at `generation`.
    /// If `key` was invalidated since, the value is kept but marked stale.
    pub async fn set_if_current(&self, key: QueryKey, value: V, generation: u64) -> Arc<V> {
        let mut slots = self.slots.write().await;
        self.store(&mut slots, key, value, generation)
    }

    fn store(&self, slots: &mut Slots<V>, key: QueryKey, value: V, generation: u64) -> Arc<V> {
        let stale = slots.generation(&key) != generation;
        let value = Arc::new(value);
        slots.entries.insert(
            key.clone(),
            Entry {
                value: Arc::clone(&value),
                fetched_at: Instant::now(),
                stale,
            },
        );
        debug!(%key, stale, "cache updated");
        self.notify(CacheEvent::Updated(key));
        value
    }

    /// Marks an entry stale; the value stays readable until refetched.
    /// Returns false when nothing was cached under `key`.
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        let mut slots = self.slots.write().await;
        *slots.generations.entry(key.clone()).or_insert(0) += 1;
        let found = match slots.entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        };
        drop(slots);
        debug!(%key, found, "cache invalidated");
        self.notify(CacheEvent::Invalidated(key.clone()));
        found
    }

    pub async fn remove(&self, key: &QueryKey) -> Option<Arc<V>> {
        let removed = self.slots.write().await.entries.remove(key).map(|e| e.value);
        if removed.is_some() {
            self.notify(CacheEvent::Removed(key.clone()));
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.entries.is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: CacheEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl<V: Send + Sync + 'static> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
