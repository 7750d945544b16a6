use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::api::{Employee, FetchResult, Request};
use crate::cache::FetchCache;

#[derive(Debug, Default)]
struct DirectoryState {
  data: Option<Vec<Employee>>,
  generation: u64,
}

/// The full employee list, fetched once per session.
#[derive(Clone)]
pub struct EmployeeDirectory {
  cache: FetchCache,
  state: Arc<Mutex<DirectoryState>>,
}

impl EmployeeDirectory {
  pub fn new(cache: FetchCache) -> Self {
    Self {
      cache,
      state: Arc::new(Mutex::new(DirectoryState::default())),
    }
  }

  fn state(&self) -> MutexGuard<'_, DirectoryState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The employee list, or `None` if it has not been loaded yet.
  pub fn data(&self) -> Option<Vec<Employee>> {
    self.state().data.clone()
  }

  pub fn is_loading(&self) -> bool {
    self.cache.is_loading(&Request::Employees)
  }

  /// Load all employees. Served from the cache after the first success.
  pub async fn fetch_all(&self) -> FetchResult<()> {
    let generation = self.state().generation;

    let employees: Vec<Employee> = self.cache.fetch_with_cache(Request::Employees).await?;

    let mut state = self.state();
    if state.generation == generation {
      debug!(count = employees.len(), "employees loaded");
      state.data = Some(employees);
    }
    Ok(())
  }

  pub fn invalidate_data(&self) {
    let mut state = self.state();
    state.data = None;
    state.generation += 1;
  }
}
