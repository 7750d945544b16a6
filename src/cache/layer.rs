//! Request/response cache that sits between the data stores and the remote source.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::api::{DataSource, Endpoint, FetchError, FetchResult, Request};

type SharedFetch = Shared<BoxFuture<'static, FetchResult<Value>>>;

struct CacheEntry {
  endpoint: Endpoint,
  value: Value,
}

struct InFlight {
  endpoint: Endpoint,
  /// Identifies this particular request; a newer request for the same key
  /// (after invalidation) gets a new ticket.
  ticket: u64,
  /// Cleared when the endpoint is flushed while the request runs; callers
  /// still share the response but it is not stored.
  writable: bool,
  future: SharedFetch,
}

#[derive(Default)]
struct CacheState {
  entries: HashMap<String, CacheEntry>,
  in_flight: HashMap<String, InFlight>,
  next_ticket: u64,
}

impl CacheState {
  /// Drop the in-flight marker for `key` if it still belongs to `ticket`.
  /// Returns whether the result may be stored: false when the request was
  /// invalidated or flushed while running.
  fn finish(&mut self, key: &str, ticket: u64) -> bool {
    match self.in_flight.get(key) {
      Some(f) if f.ticket == ticket => self
        .in_flight
        .remove(key)
        .is_some_and(|f| f.writable),
      _ => false,
    }
  }

  /// Stop in-flight requests matching `keep_out` from writing their entry.
  /// They stay registered so new callers keep joining them.
  fn detach_writes(&mut self, mut keep_out: impl FnMut(&InFlight) -> bool) {
    for f in self.in_flight.values_mut() {
      if keep_out(f) {
        f.writable = false;
      }
    }
  }
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keyed cache of remote responses for one review session.
///
/// Entries are keyed by [`Request::cache_key`] and live until they are
/// invalidated; nothing expires on a timer. Concurrent callers asking for the
/// same key share a single network request.
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Clone)]
pub struct FetchCache {
  source: Arc<dyn DataSource>,
  state: Arc<Mutex<CacheState>>,
  uncached_in_flight: Arc<AtomicUsize>,
}

impl FetchCache {
  pub fn new(source: Arc<dyn DataSource>) -> Self {
    Self {
      source,
      state: Arc::new(Mutex::new(CacheState::default())),
      uncached_in_flight: Arc::new(AtomicUsize::new(0)),
    }
  }

  fn state(&self) -> MutexGuard<'_, CacheState> {
    lock(&self.state)
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Cached entry for the key - return it
  /// 2. Request for the key already in flight - wait for that one
  /// 3. Otherwise fetch, store on success, return
  ///
  /// Failures are never stored and reach every waiting caller.
  pub async fn fetch_with_cache<T: DeserializeOwned>(&self, request: Request) -> FetchResult<T> {
    let endpoint = request.endpoint();
    let key = request.cache_key();

    let future = {
      let mut state = self.state();

      if let Some(entry) = state.entries.get(&key) {
        debug!(%key, "cache hit");
        return decode(endpoint, entry.value.clone());
      }

      match state.in_flight.get(&key) {
        Some(in_flight) => {
          debug!(%key, "joining in-flight request");
          in_flight.future.clone()
        }
        None => {
          let ticket = state.next_ticket;
          state.next_ticket += 1;

          debug!(%key, ticket, "cache miss, fetching");
          let future = self.spawn_fetch(request, key.clone(), ticket);
          state.in_flight.insert(
            key,
            InFlight {
              endpoint,
              ticket,
              writable: true,
              future: future.clone(),
            },
          );
          future
        }
      }
    };

    decode(endpoint, future.await?)
  }

  /// Fetch straight from the source. Never reads or writes cache entries.
  pub async fn fetch_without_cache<T: DeserializeOwned>(&self, request: Request) -> FetchResult<T> {
    let endpoint = request.endpoint();
    let _busy = BusyGuard::new(&self.uncached_in_flight);

    debug!(%endpoint, "uncached request");
    let value = self.source.request(&request).await?;
    decode(endpoint, value)
  }

  /// Run the request on its own task so the entry is settled exactly once,
  /// even if every caller stops waiting.
  fn spawn_fetch(&self, request: Request, key: String, ticket: u64) -> SharedFetch {
    let source = Arc::clone(&self.source);
    let state = Arc::clone(&self.state);
    let endpoint = request.endpoint();

    let task_state = Arc::clone(&state);
    let task_key = key.clone();
    let handle = tokio::spawn(async move {
      let result = source.request(&request).await;

      let mut state = lock(&task_state);
      if !state.finish(&task_key, ticket) {
        debug!(key = %task_key, ticket, "request was cleared while running, result not cached");
        return result;
      }

      match &result {
        Ok(value) => {
          state.entries.insert(
            task_key,
            CacheEntry {
              endpoint,
              value: value.clone(),
            },
          );
        }
        Err(e) => warn!(key = %task_key, error = %e, "fetch failed"),
      }
      result
    });

    async move {
      match handle.await {
        Ok(result) => result,
        Err(e) => {
          warn!(%key, error = %e, "fetch task aborted");
          lock(&state).finish(&key, ticket);
          Err(FetchError::Aborted { endpoint })
        }
      }
    }
    .boxed()
    .shared()
  }

  /// Whether a cached request for this exact key is in flight.
  pub fn is_loading(&self, request: &Request) -> bool {
    self.state().in_flight.contains_key(&request.cache_key())
  }

  /// Whether any cached request to `endpoint` is in flight.
  pub fn is_endpoint_loading(&self, endpoint: Endpoint) -> bool {
    self
      .state()
      .in_flight
      .values()
      .any(|f| f.endpoint == endpoint)
  }

  /// Whether any request, cached or not, is in flight.
  pub fn is_busy(&self) -> bool {
    self.uncached_in_flight.load(Ordering::SeqCst) > 0 || !self.state().in_flight.is_empty()
  }

  #[allow(dead_code)]
  pub fn is_cached(&self, request: &Request) -> bool {
    self.state().entries.contains_key(&request.cache_key())
  }

  /// Clear one key. A request in flight for it still answers its callers
  /// but no longer writes the entry.
  #[allow(dead_code)]
  pub fn invalidate(&self, request: &Request) {
    let key = request.cache_key();
    let mut state = self.state();
    state.entries.remove(&key);
    state.in_flight.remove(&key);
    debug!(%key, "invalidated");
  }

  /// Clear every key belonging to the given endpoints.
  ///
  /// Requests already in flight for those endpoints keep deduplicating and
  /// still count as loading, but their responses are not stored.
  pub fn clear_endpoints(&self, endpoints: &[Endpoint]) {
    let mut state = self.state();
    state.entries.retain(|_, e| !endpoints.contains(&e.endpoint));
    state.detach_writes(|f| endpoints.contains(&f.endpoint));
    debug!(?endpoints, "cleared endpoints");
  }

  /// Clear every entry. In-flight requests behave as in [`Self::clear_endpoints`].
  pub fn clear(&self) {
    let mut state = self.state();
    state.entries.clear();
    state.detach_writes(|_| true);
    debug!("cleared cache");
  }
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, value: Value) -> FetchResult<T> {
  serde_json::from_value(value).map_err(|e| FetchError::decode(endpoint, e))
}

/// Counts an uncached request as in flight until dropped.
struct BusyGuard<'a> {
  counter: &'a AtomicUsize,
}

impl<'a> BusyGuard<'a> {
  fn new(counter: &'a AtomicUsize) -> Self {
    counter.fetch_add(1, Ordering::SeqCst);
    Self { counter }
  }
}

impl Drop for BusyGuard<'_> {
  fn drop(&mut self) {
    self.counter.fetch_sub(1, Ordering::SeqCst);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::{sample_data, CountingSource};
  use crate::api::{Employee, PaginatedResponse, Transaction};
  use std::time::Duration;

  fn setup() -> (Arc<CountingSource>, FetchCache) {
    let source = Arc::new(CountingSource::new(sample_data(6), 2));
    let cache = FetchCache::new(source.clone());
    (source, cache)
  }

  #[tokio::test]
  async fn test_second_fetch_is_served_from_cache() {
    let (source, cache) = setup();

    let first: Vec<Employee> = cache.fetch_with_cache(Request::Employees).await.unwrap();
    let second: Vec<Employee> = cache.fetch_with_cache(Request::Employees).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls(Endpoint::Employees), 1);
    assert!(cache.is_cached(&Request::Employees));
  }

  #[tokio::test]
  async fn test_concurrent_fetches_share_one_request() {
    let (source, cache) = setup();

    let (a, b) = tokio::join!(
      cache.fetch_with_cache::<Vec<Employee>>(Request::Employees),
      cache.fetch_with_cache::<Vec<Employee>>(Request::Employees),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(source.calls(Endpoint::Employees), 1);
  }

  #[tokio::test]
  async fn test_params_are_part_of_the_key() {
    let (source, cache) = setup();

    let e1: Vec<Transaction> = cache
      .fetch_with_cache(Request::transactions_by_employee("e1"))
      .await
      .unwrap();
    let e2: Vec<Transaction> = cache
      .fetch_with_cache(Request::transactions_by_employee("e2"))
      .await
      .unwrap();

    assert!(e1.iter().all(|t| t.employee_id() == "e1"));
    assert!(e2.iter().all(|t| t.employee_id() == "e2"));
    assert_eq!(source.calls(Endpoint::TransactionsByEmployee), 2);
  }

  #[tokio::test]
  async fn test_failure_leaves_no_entry() {
    let (source, cache) = setup();
    source.fail(Endpoint::Employees);

    let result = cache.fetch_with_cache::<Vec<Employee>>(Request::Employees).await;
    assert!(matches!(result, Err(FetchError::Remote { .. })));
    assert!(!cache.is_cached(&Request::Employees));
    assert!(!cache.is_loading(&Request::Employees));

    source.recover(Endpoint::Employees);
    let employees: Vec<Employee> = cache.fetch_with_cache(Request::Employees).await.unwrap();
    assert_eq!(employees.len(), 2);
    assert_eq!(source.calls(Endpoint::Employees), 2);
  }

  #[tokio::test]
  async fn test_failure_reaches_every_waiter() {
    let (source, cache) = setup();
    source.fail(Endpoint::Employees);

    let (a, b) = tokio::join!(
      cache.fetch_with_cache::<Vec<Employee>>(Request::Employees),
      cache.fetch_with_cache::<Vec<Employee>>(Request::Employees),
    );

    assert!(a.is_err());
    assert_eq!(a, b);
    assert_eq!(source.calls(Endpoint::Employees), 1);
  }

  #[tokio::test]
  async fn test_uncached_fetch_bypasses_entries() {
    let (source, cache) = setup();
    let request = Request::paginated_transactions(None);

    let _: PaginatedResponse<Vec<Transaction>> =
      cache.fetch_without_cache(request.clone()).await.unwrap();
    let _: PaginatedResponse<Vec<Transaction>> =
      cache.fetch_without_cache(request.clone()).await.unwrap();

    assert_eq!(source.calls(Endpoint::PaginatedTransactions), 2);
    assert!(!cache.is_cached(&request));
    assert!(!cache.is_busy());
  }

  #[tokio::test]
  async fn test_invalidate_forces_refetch() {
    let (source, cache) = setup();

    let _: Vec<Employee> = cache.fetch_with_cache(Request::Employees).await.unwrap();
    cache.invalidate(&Request::Employees);
    assert!(!cache.is_cached(&Request::Employees));

    let _: Vec<Employee> = cache.fetch_with_cache(Request::Employees).await.unwrap();
    assert_eq!(source.calls(Endpoint::Employees), 2);
  }

  #[tokio::test]
  async fn test_loading_flag_tracks_in_flight_request() {
    let (source, cache) = setup();
    source.delay(&Request::Employees, Duration::from_millis(200));

    let task = tokio::spawn({
      let cache = cache.clone();
      async move { cache.fetch_with_cache::<Vec<Employee>>(Request::Employees).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(cache.is_loading(&Request::Employees));
    assert!(cache.is_endpoint_loading(Endpoint::Employees));
    assert!(cache.is_busy());

    task.await.unwrap().unwrap();
    assert!(!cache.is_loading(&Request::Employees));
    assert!(!cache.is_busy());
  }

  #[tokio::test]
  async fn test_invalidated_in_flight_result_is_not_stored() {
    let (source, cache) = setup();
    source.delay(&Request::Employees, Duration::from_millis(200));

    let task = tokio::spawn({
      let cache = cache.clone();
      async move { cache.fetch_with_cache::<Vec<Employee>>(Request::Employees).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    cache.invalidate(&Request::Employees);
    assert!(!cache.is_loading(&Request::Employees));

    // The first caller still gets its answer
    let employees = task.await.unwrap().unwrap();
    assert_eq!(employees.len(), 2);
    assert!(!cache.is_cached(&Request::Employees));
  }

  #[tokio::test]
  async fn test_clear_endpoints() {
    let (_source, cache) = setup();
    let page = Request::paginated_transactions(None);
    let lookup = Request::transactions_by_employee("e1");

    let _: Vec<Employee> = cache.fetch_with_cache(Request::Employees).await.unwrap();
    let _: PaginatedResponse<Vec<Transaction>> = cache.fetch_with_cache(page.clone()).await.unwrap();
    let _: Vec<Transaction> = cache.fetch_with_cache(lookup.clone()).await.unwrap();

    cache.clear_endpoints(&[Endpoint::PaginatedTransactions, Endpoint::TransactionsByEmployee]);

    assert!(cache.is_cached(&Request::Employees));
    assert!(!cache.is_cached(&page));
    assert!(!cache.is_cached(&lookup));

    cache.clear();
    assert!(!cache.is_cached(&Request::Employees));
  }

  #[tokio::test]
  async fn test_cleared_endpoint_keeps_in_flight_request_shared() {
    let (source, cache) = setup();
    let page = Request::paginated_transactions(None);
    source.delay(&page, Duration::from_millis(200));

    let first = tokio::spawn({
      let cache = cache.clone();
      let page = page.clone();
      async move {
        cache
          .fetch_with_cache::<PaginatedResponse<Vec<Transaction>>>(page)
          .await
      }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    cache.clear_endpoints(&[Endpoint::PaginatedTransactions]);
    assert!(cache.is_loading(&page));
    assert!(cache.is_endpoint_loading(Endpoint::PaginatedTransactions));

    // Joins the request already running instead of sending another
    let second: PaginatedResponse<Vec<Transaction>> =
      cache.fetch_with_cache(page.clone()).await.unwrap();
    let first = first.await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls(Endpoint::PaginatedTransactions), 1);
    assert!(!cache.is_loading(&page));
    assert!(!cache.is_cached(&page));
  }

  #[tokio::test]
  async fn test_full_clear_keeps_in_flight_request_shared() {
    let (source, cache) = setup();
    source.delay(&Request::Employees, Duration::from_millis(200));

    let first = tokio::spawn({
      let cache = cache.clone();
      async move { cache.fetch_with_cache::<Vec<Employee>>(Request::Employees).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    cache.clear();
    assert!(cache.is_loading(&Request::Employees));

    let second: Vec<Employee> = cache.fetch_with_cache(Request::Employees).await.unwrap();
    assert_eq!(first.await.unwrap().unwrap(), second);
    assert_eq!(source.calls(Endpoint::Employees), 1);
    assert!(!cache.is_cached(&Request::Employees));
  }
}
