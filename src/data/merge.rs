use std::collections::HashSet;

use super::approval::ApprovalOverlay;
use crate::api::Transaction;

/// A transaction as displayed: the fetched record plus its effective approval.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionView {
  pub transaction: Transaction,
  pub approved: bool,
}

/// Combine both transaction sources into one list without duplicate ids.
///
/// Records are taken in order, feed first, and the first record seen for an
/// id wins. Normally only one source holds data; if both do, the feed's copy
/// (and its `approved` flag) is the one kept.
pub fn merge_transactions(
  paginated: Option<&[Transaction]>,
  by_employee: Option<&[Transaction]>,
) -> Vec<Transaction> {
  let mut seen = HashSet::new();

  paginated
    .into_iter()
    .flatten()
    .chain(by_employee.into_iter().flatten())
    .filter(|t| seen.insert(t.id.as_str()))
    .cloned()
    .collect()
}

pub fn transaction_views(
  transactions: Vec<Transaction>,
  overlay: &ApprovalOverlay,
) -> Vec<TransactionView> {
  transactions
    .into_iter()
    .map(|transaction| TransactionView {
      approved: overlay.effective_approval(&transaction),
      transaction,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::{employee, transaction};

  fn ids(transactions: &[Transaction]) -> Vec<&str> {
    transactions.iter().map(|t| t.id.as_str()).collect()
  }

  #[test]
  fn test_merge_empty_sources() {
    assert!(merge_transactions(None, None).is_empty());
  }

  #[test]
  fn test_merge_single_source_keeps_order() {
    let e1 = employee("e1", "Ada", "Lovelace");
    let feed = vec![transaction("t2", &e1, false), transaction("t1", &e1, false)];

    let merged = merge_transactions(Some(feed.as_slice()), None);
    assert_eq!(ids(&merged), vec!["t2", "t1"]);

    let merged = merge_transactions(None, Some(feed.as_slice()));
    assert_eq!(ids(&merged), vec!["t2", "t1"]);
  }

  #[test]
  fn test_duplicate_id_keeps_feed_copy() {
    let e1 = employee("e1", "Ada", "Lovelace");
    let feed = vec![transaction("T1", &e1, false)];
    let lookup = vec![transaction("T1", &e1, true), transaction("T2", &e1, false)];

    let merged = merge_transactions(Some(feed.as_slice()), Some(lookup.as_slice()));

    assert_eq!(ids(&merged), vec!["T1", "T2"]);
    assert!(!merged[0].approved);
  }

  #[test]
  fn test_duplicates_within_one_source_are_dropped() {
    let e1 = employee("e1", "Ada", "Lovelace");
    let feed = vec![
      transaction("t1", &e1, false),
      transaction("t1", &e1, true),
      transaction("t2", &e1, false),
    ];

    let merged = merge_transactions(Some(feed.as_slice()), None);
    assert_eq!(ids(&merged), vec!["t1", "t2"]);
  }

  #[test]
  fn test_views_apply_overlay() {
    let e1 = employee("e1", "Ada", "Lovelace");
    let transactions = vec![transaction("T1", &e1, false), transaction("T2", &e1, true)];
    let mut overlay = ApprovalOverlay::default();
    overlay.set("T1", true);

    let views = transaction_views(transactions, &overlay);

    assert!(views[0].approved);
    assert!(!views[0].transaction.approved);
    assert!(views[1].approved);
  }
}
