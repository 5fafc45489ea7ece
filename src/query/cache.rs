use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use super::tag::Tag;

type Provides<V> = Arc<dyn Fn(&V) -> Vec<Tag> + Send + Sync>;
type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

const EVENT_CAPACITY: usize = 64;

struct CacheEntry<V> {
    value: V,
    tags: Vec<Tag>,
    stored_at: u64,
}

struct InFlight<V, E> {
    id: u64,
    future: SharedFetch<V, E>,
}

struct CacheInner<K, V, E> {
    entries: HashMap<K, CacheEntry<V>>,
    tag_index: HashMap<Tag, HashSet<K>>,
    inflight: HashMap<K, InFlight<V, E>>,
    /// Fetches cut loose by an invalidation; their results are never stored
    detached: HashSet<u64>,
    clock: u64,
    next_fetch_id: u64,
}

impl<K, V, E> CacheInner<K, V, E>
where
    K: Eq + Hash + Clone,
{
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn remove(&mut self, key: &K) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        for tag in &entry.tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
        true
    }

    fn insert(&mut self, key: K, value: V, tags: Vec<Tag>, max_entries: usize) {
        self.remove(&key);

        if max_entries > 0 && self.entries.len() >= max_entries {
            let victim = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                self.remove(&victim);
            }
        }

        for tag in &tags {
            self.tag_index.entry(tag.clone()).or_default().insert(key.clone());
        }
        let stored_at = self.tick();
        self.entries.insert(key, CacheEntry { value, tags, stored_at });
    }
}

/// Keyed cache of fetched values with a tag → key index.
///
/// * identical concurrent queries share one fetch (single-flight)
/// * `invalidate` drops every entry carrying one of the given tags and
///   announces the dropped keys to subscribers, who refetch if they care
/// * failed fetches never touch the cache
/// * an invalidation detaches every in-flight fetch: queries issued afterwards
///   start a new fetch, while the detached one still answers its existing
///   waiters but is not stored, and its key is announced as invalidated
pub struct QueryCache<K, V, E> {
    inner: Arc<RwLock<CacheInner<K, V, E>>>,
    provides: Provides<V>,
    events: broadcast::Sender<Vec<K>>,
    max_entries: usize,
}

impl<K, V, E> QueryCache<K, V, E>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// `provides` maps a fetched value to the tags its entry is filed under.
    /// `max_entries == 0` means unbounded.
    pub fn new<P>(max_entries: usize, provides: P) -> Self
    where
        P: Fn(&V) -> Vec<Tag> + Send + Sync + 'static,
    {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                tag_index: HashMap::new(),
                inflight: HashMap::new(),
                detached: HashSet::new(),
                clock: 0,
                next_fetch_id: 0,
            })),
            provides: Arc::new(provides),
            events,
            max_entries,
        }
    }

    /// Cached value for `key`, or the result of the in-flight fetch for it,
    /// or the result of a new fetch built by `fetch`.
    pub async fn query<F, Fut>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut inner = self.inner.write().await;

            if let Some(entry) = inner.entries.get(&key) {
                debug!(?key, "query cache hit");
                return Ok(entry.value.clone());
            }

            if let Some(flight) = inner.inflight.get(&key) {
                debug!(?key, "joining in-flight query");
                flight.future.clone()
            } else {
                debug!(?key, "query cache miss, fetching");
                inner.next_fetch_id += 1;
                let id = inner.next_fetch_id;

                let future = Self::settle(
                    Arc::downgrade(&self.inner),
                    key.clone(),
                    id,
                    fetch(),
                    self.provides.clone(),
                    self.events.clone(),
                    self.max_entries,
                )
                .boxed()
                .shared();

                inner.inflight.insert(
                    key.clone(),
                    InFlight {
                        id,
                        future: future.clone(),
                    },
                );
                future
            }
        };

        shared.await
    }

    // Runs inside the shared future: whichever waiter drives it to completion
    // stores the result, not only the caller that started it.
    #[allow(clippy::too_many_arguments)]
    async fn settle<Fut>(
        inner: Weak<RwLock<CacheInner<K, V, E>>>,
        key: K,
        id: u64,
        fetch: Fut,
        provides: Provides<V>,
        events: broadcast::Sender<Vec<K>>,
        max_entries: usize,
    ) -> Result<V, E>
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let result = fetch.await;

        let Some(inner) = inner.upgrade() else {
            return result;
        };
        let mut inner = inner.write().await;

        if inner.inflight.get(&key).map(|f| f.id) == Some(id) {
            inner.inflight.remove(&key);
        }
        let detached = inner.detached.remove(&id);

        if let Ok(value) = &result {
            if detached {
                warn!(?key, "result invalidated while in flight, not caching");
                let _ = events.send(vec![key.clone()]);
            } else {
                let tags = provides(value);
                inner.insert(key, value.clone(), tags, max_entries);
            }
        }

        result
    }

    /// Drop every entry filed under any of `tags` and detach every in-flight
    /// fetch. Returns the dropped keys.
    ///
    /// In-flight tags are not known until the fetch resolves, so any
    /// invalidation detaches all of them. Idempotent for stored entries.
    pub async fn invalidate(&self, tags: &[Tag]) -> Vec<K> {
        let keys: Vec<K> = {
            let mut inner = self.inner.write().await;

            let flights: Vec<u64> = inner.inflight.drain().map(|(_, flight)| flight.id).collect();
            if !flights.is_empty() {
                debug!(detached = flights.len(), "detached in-flight queries");
            }
            inner.detached.extend(flights);

            let mut keys = HashSet::new();
            for tag in tags {
                if let Some(tagged) = inner.tag_index.get(tag) {
                    keys.extend(tagged.iter().cloned());
                }
            }
            for key in &keys {
                inner.remove(key);
            }
            keys.into_iter().collect()
        };

        let rendered: Vec<String> = tags.iter().map(Tag::to_string).collect();
        debug!(tags = ?rendered, dropped = keys.len(), "invalidated tags");

        if !keys.is_empty() {
            // No receivers is fine; nobody is watching.
            let _ = self.events.send(keys.clone());
        }
        keys
    }

    /// Announcements of keys whose entries were dropped by invalidation
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<K>> {
        self.events.subscribe()
    }

    /// Cached value without fetching
    pub async fn peek(&self, key: &K) -> Option<V> {
        self.inner.read().await.entries.get(key).map(|e| e.value.clone())
    }

    pub async fn is_fetching(&self, key: &K) -> bool {
        self.inner.read().await.inflight.contains_key(key)
    }

    pub async fn tags_of(&self, key: &K) -> Vec<Tag> {
        self.inner
            .read()
            .await
            .entries
            .get(key)
            .map(|e| e.tags.clone())
            .unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Forget every stored entry. In-flight fetches still complete and store.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.tag_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    struct Page {
        ids: Vec<&'static str>,
    }

    fn page(ids: &[&'static str]) -> Page {
        Page { ids: ids.to_vec() }
    }

    fn cache(max_entries: usize) -> QueryCache<u32, Page, String> {
        QueryCache::new(max_entries, |p: &Page| {
            let mut tags: Vec<Tag> = p.ids.iter().map(|id| Tag::item("Plans", *id)).collect();
            tags.push(Tag::list("Plans"));
            tags
        })
    }

    async fn counted(calls: Arc<AtomicUsize>, value: Page) -> Result<Page, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(value)
    }

    #[tokio::test]
    async fn second_query_is_a_hit() {
        let cache = cache(0);
        let calls = Arc::new(AtomicUsize::new(0));

        let a = cache.query(1, || counted(calls.clone(), page(&["p1"]))).await.unwrap();
        let b = cache.query(1, || counted(calls.clone(), page(&["p2"]))).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_identical_queries_share_one_fetch() {
        let cache = cache(0);
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.query(7, || counted(calls.clone(), page(&["p1", "p2"]))),
            cache.query(7, || counted(calls.clone(), page(&["other"]))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), page(&["p1", "p2"]));
        assert_eq!(b.unwrap(), page(&["p1", "p2"]));
        assert!(!cache.is_fetching(&7).await);
    }

    #[tokio::test]
    async fn different_keys_fetch_separately() {
        let cache = cache(0);
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.query(1, || counted(calls.clone(), page(&["p1"]))),
            cache.query(2, || counted(calls.clone(), page(&["p2"]))),
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_shared_but_not_cached() {
        let cache = cache(0);
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<Page, String>("boom".to_string())
        };

        let err = cache.query(1, || failing(calls.clone())).await.unwrap_err();
        assert_eq!(err, "boom");
        assert!(cache.is_empty().await);

        cache.query(1, || counted(calls.clone(), page(&["p1"]))).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn item_tag_only_drops_entries_holding_it() {
        let cache = cache(0);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.query(1, || counted(calls.clone(), page(&["p1", "p2"]))).await.unwrap();
        cache.query(2, || counted(calls.clone(), page(&["p3"]))).await.unwrap();

        let dropped = cache.invalidate(&[Tag::item("Plans", "p1")]).await;

        assert_eq!(dropped, vec![1]);
        assert!(cache.peek(&1).await.is_none());
        assert_eq!(cache.peek(&2).await, Some(page(&["p3"])));
    }

    #[tokio::test]
    async fn list_tag_drops_everything() {
        let cache = cache(0);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.query(1, || counted(calls.clone(), page(&["p1"]))).await.unwrap();
        cache.query(2, || counted(calls.clone(), page(&[]))).await.unwrap();

        let mut dropped = cache.invalidate(&[Tag::list("Plans")]).await;
        dropped.sort();
        assert_eq!(dropped, vec![1, 2]);
        assert!(cache.is_empty().await);

        // idempotent
        assert!(cache.invalidate(&[Tag::list("Plans")]).await.is_empty());
    }

    #[tokio::test]
    async fn subscribers_hear_dropped_keys() {
        let cache = cache(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut events = cache.subscribe();

        cache.query(3, || counted(calls.clone(), page(&["p9"]))).await.unwrap();
        cache.invalidate(&[Tag::item("Plans", "p9")]).await;

        assert_eq!(events.recv().await.unwrap(), vec![3]);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn result_invalidated_in_flight_is_not_stored() {
        let cache = Arc::new(cache(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let mut events = cache.subscribe();

        let pending = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move { cache.query(1, || counted(calls, page(&["p1"]))).await })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.is_fetching(&1).await);
        cache.invalidate(&[Tag::list("Plans")]).await;

        let value = pending.await.unwrap().unwrap();
        assert_eq!(value, page(&["p1"]));
        assert!(cache.peek(&1).await.is_none());
        assert_eq!(events.recv().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn query_after_invalidation_does_not_join_older_fetch() {
        let cache = Arc::new(cache(0));
        let calls = Arc::new(AtomicUsize::new(0));

        let pending = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move { cache.query(1, || counted(calls, page(&["old"]))).await })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.invalidate(&[Tag::item("Plans", "unrelated")]).await;
        assert!(!cache.is_fetching(&1).await);

        let fresh = cache.query(1, || counted(calls.clone(), page(&["new"]))).await.unwrap();
        let stale = pending.await.unwrap().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(fresh, page(&["new"]));
        assert_eq!(stale, page(&["old"]));
        assert_eq!(cache.peek(&1).await, Some(page(&["new"])));
    }

    #[tokio::test]
    async fn oldest_entry_is_evicted_at_capacity() {
        let cache = cache(2);
        let calls = Arc::new(AtomicUsize::new(0));

        for key in 1..=3 {
            cache.query(key, || counted(calls.clone(), page(&[]))).await.unwrap();
        }

        assert_eq!(cache.len().await, 2);
        assert!(cache.peek(&1).await.is_none());
        assert!(cache.peek(&3).await.is_some());
    }

    #[tokio::test]
    async fn tags_follow_the_value() {
        let cache = cache(0);
        let calls = Arc::new(AtomicUsize::new(0));

        cache.query(1, || counted(calls.clone(), page(&["p1"]))).await.unwrap();
        let tags = cache.tags_of(&1).await;
        assert!(tags.contains(&Tag::item("Plans", "p1")));
        assert!(tags.iter().any(Tag::is_list));
    }
}
