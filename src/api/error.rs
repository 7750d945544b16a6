use thiserror::Error;

use super::request::Endpoint;

/// Failure of a remote operation.
///
/// Cloneable so a single failure can be handed to every caller waiting on a
/// deduplicated request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  #[error("{endpoint} request failed: {message}")]
  Remote { endpoint: Endpoint, message: String },

  #[error("failed to decode {endpoint} response: {message}")]
  Decode { endpoint: Endpoint, message: String },

  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error("{endpoint} request was aborted")]
  Aborted { endpoint: Endpoint },
}

impl FetchError {
  pub fn remote(endpoint: Endpoint, message: impl Into<String>) -> Self {
    Self::Remote {
      endpoint,
      message: message.into(),
    }
  }

  pub fn decode(endpoint: Endpoint, error: serde_json::Error) -> Self {
    Self::Decode {
      endpoint,
      message: error.to_string(),
    }
  }
}

pub type FetchResult<T> = Result<T, FetchError>;
