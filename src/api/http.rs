use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::{DataSource, Endpoint, FetchError, FetchResult, Request};

/// HTTP JSON client for the remote source.
///
/// Every operation is a `POST {base_url}/{endpoint}` with the request params
/// as the JSON body. An empty response body means "no payload".
#[derive(Clone)]
pub struct HttpSource {
  client: reqwest::Client,
  base_url: Url,
  token: Option<String>,
}

impl HttpSource {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
    let mut base_url =
      Url::parse(base_url).map_err(|e| eyre!("Invalid source url {}: {}", base_url, e))?;

    // Url::join replaces the last path segment unless the base ends with '/'
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base_url,
      token: None,
    })
  }

  /// Send `Authorization: Bearer <token>` with every request.
  pub fn with_token(mut self, token: impl Into<String>) -> Self {
    self.token = Some(token.into());
    self
  }

  fn endpoint_url(&self, endpoint: Endpoint) -> std::result::Result<Url, url::ParseError> {
    self.base_url.join(endpoint.as_str())
  }
}

#[async_trait]
impl DataSource for HttpSource {
  async fn request(&self, request: &Request) -> FetchResult<Value> {
    let endpoint = request.endpoint();
    let url = self
      .endpoint_url(endpoint)
      .map_err(|e| FetchError::remote(endpoint, e.to_string()))?;

    let mut builder = self.client.post(url).json(&request.params());
    if let Some(token) = &self.token {
      builder = builder.bearer_auth(token);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| FetchError::remote(endpoint, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(FetchError::remote(
        endpoint,
        format!("HTTP {}: {}", status, body.trim()),
      ));
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| FetchError::remote(endpoint, e.to_string()))?;

    if body.is_empty() {
      return Ok(Value::Null);
    }

    serde_json::from_slice(&body).map_err(|e| FetchError::decode(endpoint, e))
  }
}
