use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::api::{Endpoint, FetchError, FetchResult, Request, Transaction};
use crate::cache::FetchCache;

#[derive(Debug, Default)]
struct LookupState {
  data: Option<Vec<Transaction>>,
  /// Employee the current `data` belongs to
  employee_id: Option<String>,
  /// Employee of the most recent `fetch_by_id` call
  requested: Option<String>,
  generation: u64,
}

/// All transactions of a single employee (not paginated).
#[derive(Clone)]
pub struct EmployeeTransactions {
  cache: FetchCache,
  state: Arc<Mutex<LookupState>>,
}

impl EmployeeTransactions {
  pub fn new(cache: FetchCache) -> Self {
    Self {
      cache,
      state: Arc::new(Mutex::new(LookupState::default())),
    }
  }

  fn state(&self) -> MutexGuard<'_, LookupState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn data(&self) -> Option<Vec<Transaction>> {
    self.state().data.clone()
  }

  #[allow(dead_code)]
  pub fn employee_id(&self) -> Option<String> {
    self.state().employee_id.clone()
  }

  pub fn is_loading(&self) -> bool {
    self.cache.is_endpoint_loading(Endpoint::TransactionsByEmployee)
  }

  /// Load the transactions of `employee_id`, replacing whatever was shown.
  ///
  /// The result is applied only if this is still the latest requested
  /// employee and the lookup was not invalidated in the meantime.
  pub async fn fetch_by_id(&self, employee_id: &str) -> FetchResult<()> {
    if employee_id.is_empty() {
      return Err(FetchError::InvalidRequest(
        "employee id cannot be empty".to_string(),
      ));
    }

    let generation = {
      let mut state = self.state();
      state.requested = Some(employee_id.to_string());
      state.generation
    };

    let transactions: Vec<Transaction> = self
      .cache
      .fetch_with_cache(Request::transactions_by_employee(employee_id))
      .await?;

    let mut state = self.state();
    if state.generation != generation || state.requested.as_deref() != Some(employee_id) {
      debug!(employee_id, "lookup superseded, dropping result");
      return Ok(());
    }

    debug!(employee_id, count = transactions.len(), "employee transactions loaded");
    state.data = Some(transactions);
    state.employee_id = Some(employee_id.to_string());
    Ok(())
  }

  pub fn invalidate_data(&self) {
    let mut state = self.state();
    state.data = None;
    state.employee_id = None;
    state.requested = None;
    state.generation += 1;
  }
}
