//! Remote data source: wire types, requests, and source implementations.
//!
//! Everything above this module talks to the remote through [`DataSource`],
//! addressed by named operations (see [`Endpoint`]).

mod error;
mod fixture;
mod http;
mod request;
#[cfg(test)]
pub mod testing;
mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use error::{FetchError, FetchResult};
pub use fixture::{FixtureData, FixtureSource};
pub use http::HttpSource;
pub use request::{Endpoint, Request};
pub use types::{
  Cursor, Employee, PaginatedRequestParams, PaginatedResponse, RequestByEmployeeParams,
  SetTransactionApprovalParams, Transaction,
};

/// The remote collaborator that owns employees and transactions.
///
/// Implementations return the raw JSON payload of an operation (`null` when
/// the operation has no payload). Decoding happens in the cache layer.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
  async fn request(&self, request: &Request) -> FetchResult<Value>;
}
