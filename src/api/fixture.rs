//! In-memory remote source backed by a JSON fixture.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::types::{PaginatedRequestParams, PaginatedResponse};
use super::{Cursor, DataSource, Employee, Endpoint, FetchError, FetchResult, Request, Transaction};

const BUNDLED_FIXTURE: &str = include_str!("../../fixtures/transactions.json");

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureData {
  pub employees: Vec<Employee>,
  pub transactions: Vec<Transaction>,
}

/// Remote source that serves a fixed data set with simulated network latency.
///
/// Pages are numbered from 0; `nextPage` is the next page number or null.
/// Approvals are applied to the stored records, so later fetches see them.
pub struct FixtureSource {
  data: Mutex<FixtureData>,
  page_size: usize,
  latency: Duration,
}

impl FixtureSource {
  pub fn new(data: FixtureData) -> Self {
    Self {
      data: Mutex::new(data),
      page_size: DEFAULT_PAGE_SIZE,
      latency: DEFAULT_LATENCY,
    }
  }

  /// Fixture compiled into the binary.
  pub fn bundled() -> Result<Self> {
    let data: FixtureData = serde_json::from_str(BUNDLED_FIXTURE)
      .map_err(|e| eyre!("Failed to parse bundled fixture: {}", e))?;
    Ok(Self::new(data))
  }

  pub fn from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read fixture file {}: {}", path.display(), e))?;

    let data: FixtureData = serde_json::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse fixture file {}: {}", path.display(), e))?;

    Ok(Self::new(data))
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self
  }

  fn data(&self) -> MutexGuard<'_, FixtureData> {
    self.data.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn handle(&self, request: &Request) -> FetchResult<Value> {
    let endpoint = request.endpoint();
    match request {
      Request::Employees => to_json(endpoint, &self.data().employees),
      Request::PaginatedTransactions(params) => {
        let page = self.paginate(params)?;
        to_json(endpoint, &page)
      }
      Request::TransactionsByEmployee(params) => {
        if params.employee_id.is_empty() {
          return Err(FetchError::remote(endpoint, "Employee id cannot be empty"));
        }

        let transactions: Vec<Transaction> = self
          .data()
          .transactions
          .iter()
          .filter(|t| t.employee_id() == params.employee_id)
          .cloned()
          .collect();
        to_json(endpoint, &transactions)
      }
      Request::SetTransactionApproval(params) => {
        let mut data = self.data();
        let transaction = data
          .transactions
          .iter_mut()
          .find(|t| t.id == params.transaction_id)
          .ok_or_else(|| FetchError::remote(endpoint, "Invalid transaction to approve"))?;
        transaction.approved = params.value;
        Ok(Value::Null)
      }
    }
  }

  fn paginate(
    &self,
    params: &PaginatedRequestParams,
  ) -> FetchResult<PaginatedResponse<Vec<Transaction>>> {
    let page = match &params.page {
      None => 0,
      Some(cursor) => cursor
        .as_value()
        .as_u64()
        .ok_or_else(|| FetchError::remote(Endpoint::PaginatedTransactions, "Invalid page cursor"))?
        as usize,
    };

    let data = self.data();
    let total = data.transactions.len();
    let start = page.saturating_mul(self.page_size).min(total);
    let end = (start + self.page_size).min(total);

    Ok(PaginatedResponse {
      data: data.transactions[start..end].to_vec(),
      next_page: (end < total).then(|| Cursor::new(page as u64 + 1)),
    })
  }
}

fn to_json<T: serde::Serialize>(endpoint: Endpoint, value: &T) -> FetchResult<Value> {
  serde_json::to_value(value).map_err(|e| FetchError::decode(endpoint, e))
}

#[async_trait]
impl DataSource for FixtureSource {
  async fn request(&self, request: &Request) -> FetchResult<Value> {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
    self.handle(request)
  }
}
