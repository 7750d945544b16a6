use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::types::{
  Cursor, PaginatedRequestParams, RequestByEmployeeParams, SetTransactionApprovalParams,
};

/// Named operations exposed by the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
  Employees,
  PaginatedTransactions,
  TransactionsByEmployee,
  SetTransactionApproval,
}

impl Endpoint {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Employees => "employees",
      Self::PaginatedTransactions => "paginatedTransactions",
      Self::TransactionsByEmployee => "transactionsByEmployee",
      Self::SetTransactionApproval => "setTransactionApproval",
    }
  }
}

impl fmt::Display for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A request to the remote source: an endpoint plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
  Employees,
  PaginatedTransactions(PaginatedRequestParams),
  TransactionsByEmployee(RequestByEmployeeParams),
  SetTransactionApproval(SetTransactionApprovalParams),
}

impl Request {
  pub fn paginated_transactions(page: Option<Cursor>) -> Self {
    Self::PaginatedTransactions(PaginatedRequestParams { page })
  }

  pub fn transactions_by_employee(employee_id: impl Into<String>) -> Self {
    Self::TransactionsByEmployee(RequestByEmployeeParams {
      employee_id: employee_id.into(),
    })
  }

  pub fn set_transaction_approval(transaction_id: impl Into<String>, value: bool) -> Self {
    Self::SetTransactionApproval(SetTransactionApprovalParams {
      transaction_id: transaction_id.into(),
      value,
    })
  }

  pub fn endpoint(&self) -> Endpoint {
    match self {
      Self::Employees => Endpoint::Employees,
      Self::PaginatedTransactions(_) => Endpoint::PaginatedTransactions,
      Self::TransactionsByEmployee(_) => Endpoint::TransactionsByEmployee,
      Self::SetTransactionApproval(_) => Endpoint::SetTransactionApproval,
    }
  }

  /// Parameters as the JSON object sent on the wire (`null` when there are none).
  pub fn params(&self) -> Value {
    match self {
      Self::Employees => Value::Null,
      Self::PaginatedTransactions(params) => to_value(params),
      Self::TransactionsByEmployee(params) => to_value(params),
      Self::SetTransactionApproval(params) => to_value(params),
    }
  }

  /// Cache key: endpoint name followed by the serialized parameters.
  ///
  /// Two requests share a key exactly when they hit the same endpoint with
  /// equal parameters.
  pub fn cache_key(&self) -> String {
    match self.params() {
      Value::Null => self.endpoint().to_string(),
      params => format!("{}{}", self.endpoint(), params),
    }
  }
}

fn to_value(params: &impl Serialize) -> Value {
  // Param structs are plain strings/bools/JSON values, serialization cannot fail.
  serde_json::to_value(params).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cache_key_includes_params() {
    assert_eq!(Request::Employees.cache_key(), "employees");
    assert_eq!(
      Request::paginated_transactions(None).cache_key(),
      r#"paginatedTransactions{"page":null}"#
    );
    assert_eq!(
      Request::paginated_transactions(Some(Cursor::new(1))).cache_key(),
      r#"paginatedTransactions{"page":1}"#
    );
    assert_eq!(
      Request::transactions_by_employee("e1").cache_key(),
      r#"transactionsByEmployee{"employeeId":"e1"}"#
    );
  }

  #[test]
  fn test_distinct_employees_never_collide() {
    let a = Request::transactions_by_employee("e1");
    let b = Request::transactions_by_employee("e2");
    assert_ne!(a.cache_key(), b.cache_key());
  }

  #[test]
  fn test_approval_params_wire_format() {
    let request = Request::set_transaction_approval("t1", true);
    assert_eq!(request.endpoint(), Endpoint::SetTransactionApproval);
    assert_eq!(
      request.params(),
      serde_json::json!({ "transactionId": "t1", "value": true })
    );
  }
}
