pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::remote::{RemoteClient, RequestInit};

struct CacheState<V> {
    entries: Arc<HashMap<String, V>>,
    valid: bool,
    /// Bumped on every invalidation so an in-flight fetch can tell it raced one.
    generation: u64,
}

/// Lazily populated snapshot of a remote key/value listing.
///
/// The map is only ever replaced wholesale from the backend. No lock is held
/// across the fetch, so concurrent readers of an invalid cache may each fetch;
/// the last write wins.
pub struct RemoteCache<V> {
    name: &'static str,
    url: String,
    remote: Arc<RemoteClient>,
    state: RwLock<CacheState<V>>,
}

impl<V: DeserializeOwned + Send + Sync> RemoteCache<V> {
    pub fn new(name: &'static str, url: &str, remote: Arc<RemoteClient>) -> Self {
        Self {
            name,
            url: url.to_string(),
            remote,
            state: RwLock::new(CacheState {
                entries: Arc::new(HashMap::new()),
                valid: false,
                generation: 0,
            }),
        }
    }

    /// Return the cached map, refetching first when invalid.
    ///
    /// A failed fetch leaves the cache invalid with an empty map.
    pub async fn get(&self) -> Arc<HashMap<String, V>> {
        let generation = {
            let state = self.state.read().await;
            if state.valid {
                debug!(cache = self.name, entries = state.entries.len(), "cache hit");
                return state.entries.clone();
            }
            state.generation
        };

        debug!(cache = self.name, url = %self.url, "cache invalid, fetching");
        let fetched = self.fetch().await;

        let mut state = self.state.write().await;
        match fetched {
            Ok(entries) => {
                let entries = Arc::new(entries);
                state.entries = entries.clone();
                state.valid = state.generation == generation;
                if !state.valid {
                    debug!(cache = self.name, "invalidated during fetch, keeping stale flag");
                }
                entries
            }
            Err(e) => {
                warn!(cache = self.name, error = %format!("{:#}", e), "cache refresh failed");
                state.entries = Arc::new(HashMap::new());
                state.valid = false;
                state.entries.clone()
            }
        }
    }

    /// Mark the cache stale. The stored map is kept until the next `get()`.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.valid = false;
        state.generation = state.generation.wrapping_add(1);
        debug!(cache = self.name, "cache invalidated");
    }

    pub async fn is_valid(&self) -> bool {
        self.state.read().await.valid
    }

    /// The stored map without any validity check or fetch.
    pub async fn peek(&self) -> Arc<HashMap<String, V>> {
        self.state.read().await.entries.clone()
    }

    async fn fetch(&self) -> Result<HashMap<String, V>> {
        let result = self.remote.fetch_json(&self.url, RequestInit::get()).await;
        if let Some(message) = result.err_message {
            bail!("backend refused listing: {}", message);
        }
        match result.data {
            None => Ok(HashMap::new()),
            Some(data) => serde_json::from_value(data)
                .with_context(|| format!("{} listing is not a string-keyed map", self.name)),
        }
    }
}
