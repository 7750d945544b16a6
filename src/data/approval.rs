use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use crate::api::{Endpoint, FetchResult, Request, Transaction};
use crate::cache::FetchCache;

/// Approval decisions confirmed by the remote but possibly not yet visible
/// in fetched records.
///
/// Entries are never removed during a session; the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalOverlay {
  approvals: HashMap<String, bool>,
}

impl ApprovalOverlay {
  pub fn set(&mut self, transaction_id: &str, value: bool) {
    self.approvals.insert(transaction_id.to_string(), value);
  }

  pub fn get(&self, transaction_id: &str) -> Option<bool> {
    self.approvals.get(transaction_id).copied()
  }

  /// Overlay value if there is one, otherwise the record's own flag.
  pub fn effective_approval(&self, transaction: &Transaction) -> bool {
    self.get(&transaction.id).unwrap_or(transaction.approved)
  }

  #[allow(dead_code)]
  pub fn len(&self) -> usize {
    self.approvals.len()
  }

  #[allow(dead_code)]
  pub fn is_empty(&self) -> bool {
    self.approvals.is_empty()
  }
}

/// Sends approval changes to the remote and records the confirmed ones.
#[derive(Clone)]
pub struct ApprovalSubmitter {
  cache: FetchCache,
  overlay: Arc<Mutex<ApprovalOverlay>>,
  /// Submissions in flight per transaction id
  pending: Arc<Mutex<HashMap<String, usize>>>,
}

impl ApprovalSubmitter {
  pub fn new(cache: FetchCache) -> Self {
    Self {
      cache,
      overlay: Arc::new(Mutex::new(ApprovalOverlay::default())),
      pending: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  fn overlay_mut(&self) -> MutexGuard<'_, ApprovalOverlay> {
    self.overlay.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Snapshot of the overlay.
  pub fn overlay(&self) -> ApprovalOverlay {
    self.overlay_mut().clone()
  }

  #[allow(dead_code)]
  pub fn approval(&self, transaction_id: &str) -> Option<bool> {
    self.overlay_mut().get(transaction_id)
  }

  pub fn is_pending(&self, transaction_id: &str) -> bool {
    lock_pending(&self.pending).contains_key(transaction_id)
  }

  #[allow(dead_code)]
  pub fn is_loading(&self) -> bool {
    !lock_pending(&self.pending).is_empty()
  }

  /// Persist an approval change, bypassing the cache.
  ///
  /// The overlay is updated only after the remote confirms. On failure the
  /// overlay is untouched and the error is returned to the caller.
  pub async fn set_transaction_approval(&self, transaction_id: &str, value: bool) -> FetchResult<()> {
    let result = {
      let _pending = PendingGuard::new(&self.pending, transaction_id);
      self
        .cache
        .fetch_without_cache::<()>(Request::set_transaction_approval(transaction_id, value))
        .await
    };

    if let Err(e) = result {
      warn!(transaction_id, error = %e, "approval change failed");
      return Err(e);
    }

    self.overlay_mut().set(transaction_id, value);

    // Cached pages still carry the old flag; later fetches should see the change
    self.cache.clear_endpoints(&[
      Endpoint::PaginatedTransactions,
      Endpoint::TransactionsByEmployee,
    ]);

    info!(transaction_id, value, "approval saved");
    Ok(())
  }
}

type PendingCounts = Mutex<HashMap<String, usize>>;

fn lock_pending(pending: &PendingCounts) -> MutexGuard<'_, HashMap<String, usize>> {
  pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counts one submission for a transaction as pending until dropped.
struct PendingGuard<'a> {
  pending: &'a PendingCounts,
  transaction_id: String,
}

impl<'a> PendingGuard<'a> {
  fn new(pending: &'a PendingCounts, transaction_id: &str) -> Self {
    *lock_pending(pending)
      .entry(transaction_id.to_string())
      .or_insert(0) += 1;
    Self {
      pending,
      transaction_id: transaction_id.to_string(),
    }
  }
}

impl Drop for PendingGuard<'_> {
  fn drop(&mut self) {
    let mut pending = lock_pending(self.pending);
    if let Some(count) = pending.get_mut(&self.transaction_id) {
      *count -= 1;
      if *count == 0 {
        pending.remove(&self.transaction_id);
      }
    }
  }
}
