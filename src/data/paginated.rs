//! The "all transactions" feed, loaded one page at a time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::api::{Cursor, Endpoint, FetchResult, PaginatedResponse, Request, Transaction};
use crate::cache::FetchCache;

/// Where the feed is in its page sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
  /// Nothing fetched since creation or the last invalidation
  Empty,
  LoadingFirstPage,
  /// Pages loaded and the remote handed out a next-page cursor
  HasMore,
  LoadingNextPage,
  /// Last page loaded (null cursor)
  Exhausted,
}

#[derive(Debug, Default)]
struct FeedState {
  data: Option<PaginatedResponse<Vec<Transaction>>>,
  generation: u64,
}

/// Accumulates pages of `paginatedTransactions`.
///
/// Pages are appended, never replaced, until [`invalidate_data`] resets the
/// feed. Only the cursor of the last page is kept.
///
/// [`invalidate_data`]: PaginatedTransactions::invalidate_data
#[derive(Clone)]
pub struct PaginatedTransactions {
  cache: FetchCache,
  state: Arc<Mutex<FeedState>>,
}

impl PaginatedTransactions {
  pub fn new(cache: FetchCache) -> Self {
    Self {
      cache,
      state: Arc::new(Mutex::new(FeedState::default())),
    }
  }

  fn state(&self) -> MutexGuard<'_, FeedState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// All pages loaded so far together with the latest cursor.
  #[allow(dead_code)]
  pub fn data(&self) -> Option<PaginatedResponse<Vec<Transaction>>> {
    self.state().data.clone()
  }

  pub fn transactions(&self) -> Option<Vec<Transaction>> {
    self.state().data.as_ref().map(|d| d.data.clone())
  }

  pub fn next_page(&self) -> Option<Cursor> {
    self.state().data.as_ref().and_then(|d| d.next_page.clone())
  }

  pub fn has_more(&self) -> bool {
    self.next_page().is_some()
  }

  /// Bumped by every [`invalidate_data`](Self::invalidate_data).
  pub fn generation(&self) -> u64 {
    self.state().generation
  }

  pub fn is_loading(&self) -> bool {
    self.cache.is_endpoint_loading(Endpoint::PaginatedTransactions)
  }

  pub fn status(&self) -> FeedStatus {
    let loading = self.is_loading();
    match &self.state().data {
      None if loading => FeedStatus::LoadingFirstPage,
      None => FeedStatus::Empty,
      Some(d) if d.next_page.is_none() => FeedStatus::Exhausted,
      Some(_) if loading => FeedStatus::LoadingNextPage,
      Some(_) => FeedStatus::HasMore,
    }
  }

  /// Load the next page.
  ///
  /// With no data this fetches the first page; with a cursor it fetches the
  /// page the cursor points at and appends it. Once the cursor is null this
  /// is a no-op and makes no request.
  ///
  /// A page that arrives after the feed was invalidated, or after another
  /// call already appended it, is dropped.
  pub async fn fetch_all(&self) -> FetchResult<()> {
    let generation = self.generation();
    self.fetch_from(generation).await
  }

  /// [`fetch_all`](Self::fetch_all) on behalf of a caller that decided to
  /// load at `generation`. Makes no request if the feed has been invalidated
  /// since.
  pub async fn fetch_from(&self, generation: u64) -> FetchResult<()> {
    let page = {
      let state = self.state();
      if state.generation != generation {
        debug!("feed invalidated before loading, skipping");
        return Ok(());
      }
      match &state.data {
        None => None,
        Some(current) => match &current.next_page {
          Some(cursor) => Some(cursor.clone()),
          None => {
            debug!("feed exhausted, nothing to fetch");
            return Ok(());
          }
        },
      }
    };

    let response: PaginatedResponse<Vec<Transaction>> = self
      .cache
      .fetch_with_cache(Request::paginated_transactions(page.clone()))
      .await?;

    let mut guard = self.state();
    let state = &mut *guard;

    if state.generation != generation {
      debug!("feed invalidated while loading, dropping page");
      return Ok(());
    }

    // The page must continue from exactly where the feed stands now
    let in_position = match &state.data {
      None => page.is_none(),
      Some(current) => page.is_some() && current.next_page == page,
    };
    if !in_position {
      debug!("feed moved on while loading, dropping page");
      return Ok(());
    }

    debug!(count = response.data.len(), "page loaded");
    if let Some(current) = state.data.as_mut() {
      current.data.extend(response.data);
      current.next_page = response.next_page;
    } else {
      state.data = Some(response);
    }

    Ok(())
  }

  /// Back to [`FeedStatus::Empty`]; all accumulated pages are discarded.
  pub fn invalidate_data(&self) {
    let mut state = self.state();
    state.data = None;
    state.generation += 1;
  }
}
