use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An employee as returned by the `employees` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  pub id: String,
  pub first_name: String,
  pub last_name: String,
}

impl Employee {
  /// The "no filter selected" entry. Never sent to the remote source.
  pub fn empty() -> Self {
    Self {
      id: String::new(),
      first_name: "All".to_string(),
      last_name: "Employees".to_string(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.id.is_empty()
  }

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// A payment transaction awaiting review.
///
/// Records are snapshots of the last fetch; local approval decisions live in
/// the overlay and never modify these in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
  pub id: String,
  #[serde(with = "rust_decimal::serde::float")]
  pub amount: Decimal,
  pub employee: Employee,
  pub merchant: String,
  pub date: NaiveDate,
  pub approved: bool,
}

impl Transaction {
  pub fn employee_id(&self) -> &str {
    &self.employee.id
  }
}

/// Opaque page cursor handed out by the remote source.
///
/// The value is only compared and echoed back, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Value);

impl Cursor {
  pub fn new(value: impl Into<Value>) -> Self {
    Self(value.into())
  }

  pub fn as_value(&self) -> &Value {
    &self.0
  }
}

/// One page of results plus the cursor of the next page, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
  pub data: T,
  #[serde(default)]
  pub next_page: Option<Cursor>,
}

// ============================================================================
// Request parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedRequestParams {
  pub page: Option<Cursor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestByEmployeeParams {
  pub employee_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTransactionApprovalParams {
  pub transaction_id: String,
  pub value: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transaction_wire_format() {
    let json = serde_json::json!({
      "id": "t1",
      "amount": 12.5,
      "employee": { "id": "e1", "firstName": "Ada", "lastName": "Lovelace" },
      "merchant": "Bookshop",
      "date": "2024-03-01",
      "approved": false
    });

    let transaction: Transaction = serde_json::from_value(json).unwrap();
    assert_eq!(transaction.id, "t1");
    assert_eq!(transaction.employee_id(), "e1");
    assert_eq!(transaction.amount, Decimal::new(125, 1));
    assert!(!transaction.approved);
  }

  #[test]
  fn test_paginated_response_without_next_page() {
    let json = serde_json::json!({ "data": [], "nextPage": null });
    let page: PaginatedResponse<Vec<Transaction>> = serde_json::from_value(json).unwrap();
    assert!(page.next_page.is_none());

    let json = serde_json::json!({ "data": [] });
    let page: PaginatedResponse<Vec<Transaction>> = serde_json::from_value(json).unwrap();
    assert!(page.next_page.is_none());
  }

  #[test]
  fn test_cursor_is_opaque() {
    let json = serde_json::json!({ "data": [], "nextPage": "abc" });
    let page: PaginatedResponse<Vec<Transaction>> = serde_json::from_value(json).unwrap();
    assert_eq!(page.next_page, Some(Cursor::new("abc")));

    let params = PaginatedRequestParams {
      page: Some(Cursor::new(2)),
    };
    assert_eq!(serde_json::to_string(&params).unwrap(), r#"{"page":2}"#);
  }

  #[test]
  fn test_empty_employee_sentinel() {
    let empty = Employee::empty();
    assert!(empty.is_empty());
    assert_eq!(empty.full_name(), "All Employees");
  }
}
