// Resource Cache & Fetch Coordinator
use futures::future::{BoxFuture, FutureExt, Shared, TryFutureExt};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::ClientError;
use crate::filter::QueryParams;
use crate::types::Id;

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Value>, ClientError>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// A list page, keyed by its normalized query
    List(QueryParams),
    Detail(Id),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: String,
    pub scope: CacheScope,
}

impl CacheKey {
    pub fn list(resource: impl Into<String>, params: QueryParams) -> Self {
        Self { resource: resource.into(), scope: CacheScope::List(params) }
    }

    pub fn detail(resource: impl Into<String>, id: Id) -> Self {
        Self { resource: resource.into(), scope: CacheScope::Detail(id) }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            CacheScope::List(params) => write!(f, "{}?{}", self.resource, params.to_query_string()),
            CacheScope::Detail(id) => write!(f, "{}/{}", self.resource, id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// One cached response plus its fetch bookkeeping.
///
/// `data` is the last successful value; a later failure sets `error` next to
/// it and never replaces it.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub data: Option<Arc<Value>>,
    pub fetched_at: Option<Instant>,
    pub state: FetchState,
    pub error: Option<ClientError>,
    pub invalidated: bool,
}

impl CacheEntry {
    fn fresh_data(&self, policy: CachePolicy, now: Instant) -> Option<Arc<Value>> {
        if self.invalidated {
            return None;
        }
        let fetched_at = self.fetched_at?;
        if now.saturating_duration_since(fetched_at) < policy.stale_time {
            self.data.clone()
        } else {
            None
        }
    }
}

/// How long a successful response may be served without refetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub stale_time: Duration,
}

impl CachePolicy {
    pub const ALWAYS_FRESH: CachePolicy = CachePolicy { stale_time: Duration::ZERO };

    pub fn stale_after(stale_time: Duration) -> Self {
        Self { stale_time }
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    in_flight: HashMap<CacheKey, SharedFetch>,
}

/// Process-wide query cache.
///
/// Every read and write happens under one short lock that is never held
/// across an await, so each store or invalidation is atomic.
#[derive(Clone, Default)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `key` from cache when fresh; otherwise join the outstanding
    /// request for `key` or start one with `loader`.
    pub async fn fetch_with<F, Fut>(
        &self,
        key: CacheKey,
        policy: CachePolicy,
        loader: F,
    ) -> Result<Arc<Value>, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let fetch = {
            let mut state = self.lock();
            if let Some(data) = state
                .entries
                .get(&key)
                .and_then(|entry| entry.fresh_data(policy, Instant::now()))
            {
                tracing::debug!("Cache hit for {}", key);
                return Ok(data);
            }

            match state.in_flight.get(&key) {
                Some(pending) => {
                    tracing::debug!("Joining in-flight request for {}", key);
                    pending.clone()
                }
                None => {
                    let pending = loader().map_ok(Arc::new).boxed().shared();
                    state.in_flight.insert(key.clone(), pending.clone());
                    state.entries.entry(key.clone()).or_default().state = FetchState::Loading;
                    pending
                }
            }
        };

        let result = fetch.clone().await;
        self.settle(&key, &fetch, &result);
        result
    }

    /// Record the outcome of `fetch`, unless it was detached by an
    /// invalidation or already recorded by another waiter.
    fn settle(&self, key: &CacheKey, fetch: &SharedFetch, result: &Result<Arc<Value>, ClientError>) {
        let mut state = self.lock();
        match state.in_flight.get(key) {
            Some(current) if current.ptr_eq(fetch) => {
                state.in_flight.remove(key);
            }
            Some(_) => {
                tracing::debug!("Discarding superseded response for {}", key);
                return;
            }
            None => return,
        }

        let entry = state.entries.entry(key.clone()).or_default();
        match result {
            Ok(data) => {
                entry.data = Some(data.clone());
                entry.fetched_at = Some(Instant::now());
                entry.state = FetchState::Success;
                entry.error = None;
                entry.invalidated = false;
            }
            Err(e) => {
                tracing::error!("Fetch failed for {}: {}", key, e);
                entry.state = FetchState::Error;
                entry.error = Some(e.clone());
            }
        }
    }

    /// Mark every matching entry stale and detach its outstanding request so
    /// the next read goes to the network. Returns how many entries matched.
    pub fn invalidate_where(&self, predicate: impl Fn(&CacheKey) -> bool) -> usize {
        let mut state = self.lock();
        state.in_flight.retain(|key, _| !predicate(key));

        let mut count = 0;
        for (key, entry) in state.entries.iter_mut() {
            if predicate(key) {
                entry.invalidated = true;
                if entry.state == FetchState::Loading {
                    entry.state = FetchState::Idle;
                }
                count += 1;
            }
        }
        count
    }

    /// Every list page of `resource`, whatever its query
    pub fn invalidate_lists(&self, resource: &str) -> usize {
        let count = self.invalidate_where(|key| key.resource == resource && matches!(key.scope, CacheScope::List(_)));
        tracing::debug!("Invalidated {} list entries of {}", count, resource);
        count
    }

    pub fn invalidate_detail(&self, resource: &str, id: &Id) -> usize {
        self.invalidate_where(|key| key.resource == resource && key.scope == CacheScope::Detail(id.clone()))
    }

    /// Every entry whose resource starts with `prefix`
    pub fn invalidate_prefixed(&self, prefix: &str) -> usize {
        self.invalidate_where(|key| key.resource.starts_with(prefix))
    }

    pub fn invalidate_resource(&self, resource: &str) -> usize {
        let count = self.invalidate_where(|key| key.resource == resource);
        tracing::debug!("Invalidated {} entries of {}", count, resource);
        count
    }

    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().entries.get(key).cloned()
    }

    /// Last known good value, fresh or not
    pub fn last_good(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.lock().entries.get(key).and_then(|e| e.data.clone())
    }

    pub fn is_loading(&self, key: &CacheKey) -> bool {
        self.lock().in_flight.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
