//! Everything the UI reads and triggers, wired to one shared cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

use super::approval::ApprovalSubmitter;
use super::by_employee::EmployeeTransactions;
use super::employees::EmployeeDirectory;
use super::merge::{merge_transactions, transaction_views, TransactionView};
use super::paginated::{FeedStatus, PaginatedTransactions};
use crate::api::{DataSource, Employee, FetchResult};
use crate::cache::FetchCache;

/// A review session: the stores, the employee filter, and the approval overlay.
///
/// Exactly one transaction source is active at a time: the paginated feed
/// when no employee is selected, the employee lookup otherwise. Switching
/// invalidates the source being left before the other one is fetched.
#[derive(Clone)]
pub struct ReviewSession {
  cache: FetchCache,
  employees: EmployeeDirectory,
  paginated: PaginatedTransactions,
  by_employee: EmployeeTransactions,
  approvals: ApprovalSubmitter,
  filter: Arc<Mutex<Option<Employee>>>,
}

impl ReviewSession {
  pub fn new(source: Arc<dyn DataSource>) -> Self {
    let cache = FetchCache::new(source);

    Self {
      employees: EmployeeDirectory::new(cache.clone()),
      paginated: PaginatedTransactions::new(cache.clone()),
      by_employee: EmployeeTransactions::new(cache.clone()),
      approvals: ApprovalSubmitter::new(cache.clone()),
      cache,
      filter: Arc::new(Mutex::new(None)),
    }
  }

  fn filter(&self) -> MutexGuard<'_, Option<Employee>> {
    self.filter.lock().unwrap_or_else(PoisonError::into_inner)
  }

  // ==========================================================================
  // Operations
  // ==========================================================================

  /// Load employees, then the next page of the feed.
  ///
  /// If the feed is invalidated while employees load, for instance because
  /// an employee got selected, the page is not fetched.
  pub async fn load_all_transactions(&self) -> FetchResult<()> {
    let generation = self.paginated.generation();
    self.employees.fetch_all().await?;
    self.paginated.fetch_from(generation).await
  }

  /// Filter by `employee`; the empty employee clears the filter.
  pub async fn select_employee(&self, employee: &Employee) -> FetchResult<()> {
    if employee.is_empty() {
      return self.clear_filter().await;
    }

    info!(employee_id = %employee.id, "filtering by employee");
    self.paginated.invalidate_data();
    *self.filter() = Some(employee.clone());
    self.by_employee.fetch_by_id(&employee.id).await
  }

  /// Drop the employee filter and restart the feed from its first page.
  pub async fn clear_filter(&self) -> FetchResult<()> {
    info!("showing all transactions");
    self.by_employee.invalidate_data();
    self.paginated.invalidate_data();
    *self.filter() = None;
    self.load_all_transactions().await
  }

  /// The "View More" action. Does nothing while an employee is selected.
  pub async fn view_more(&self) -> FetchResult<()> {
    if self.filter().is_some() {
      return Ok(());
    }
    self.paginated.fetch_all().await
  }

  /// Drop every cached response and held list, then fetch again.
  ///
  /// The employee filter is kept; a filtered session reloads the lookup,
  /// an unfiltered one restarts the feed from its first page.
  pub async fn reload(&self) -> FetchResult<()> {
    info!("reloading from remote");
    self.cache.clear();
    self.employees.invalidate_data();
    self.by_employee.invalidate_data();
    self.paginated.invalidate_data();

    match self.selected_employee() {
      Some(employee) => {
        self.employees.fetch_all().await?;
        self.by_employee.fetch_by_id(&employee.id).await
      }
      None => self.load_all_transactions().await,
    }
  }

  pub async fn set_approval(&self, transaction_id: &str, value: bool) -> FetchResult<()> {
    self
      .approvals
      .set_transaction_approval(transaction_id, value)
      .await
  }

  // ==========================================================================
  // View state
  // ==========================================================================

  /// Merged, deduplicated transactions with their effective approval.
  pub fn transactions(&self) -> Vec<TransactionView> {
    let paginated = self.paginated.transactions();
    let by_employee = self.by_employee.data();
    let merged = merge_transactions(paginated.as_deref(), by_employee.as_deref());
    transaction_views(merged, &self.approvals.overlay())
  }

  #[allow(dead_code)]
  pub fn employees(&self) -> Option<Vec<Employee>> {
    self.employees.data()
  }

  /// Entries of the employee filter: "All Employees" first, then everyone.
  /// Empty until the directory has loaded.
  pub fn filter_options(&self) -> Vec<Employee> {
    match self.employees.data() {
      Some(employees) => std::iter::once(Employee::empty()).chain(employees).collect(),
      None => Vec::new(),
    }
  }

  pub fn selected_employee(&self) -> Option<Employee> {
    self.filter().clone()
  }

  pub fn employees_loading(&self) -> bool {
    self.employees.is_loading()
  }

  pub fn transactions_loading(&self) -> bool {
    self.paginated.is_loading() || self.by_employee.is_loading()
  }

  /// Whether "View More" applies: no filter, something shown, and a next page.
  pub fn has_more(&self) -> bool {
    let filtered = self.filter().is_some();
    !filtered && self.paginated.has_more() && !self.transactions().is_empty()
  }

  pub fn feed_status(&self) -> FeedStatus {
    self.paginated.status()
  }

  /// Whether any request, including approval changes, is in flight.
  pub fn busy(&self) -> bool {
    self.cache.is_busy()
  }

  pub fn approval_pending(&self, transaction_id: &str) -> bool {
    self.approvals.is_pending(transaction_id)
  }
}
