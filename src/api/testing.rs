//! Test doubles for the remote source.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use super::{DataSource, Employee, Endpoint, FetchError, FetchResult, FixtureData, FixtureSource, Request};

pub fn employee(id: &str, first_name: &str, last_name: &str) -> Employee {
  Employee {
    id: id.to_string(),
    first_name: first_name.to_string(),
    last_name: last_name.to_string(),
  }
}

pub fn transaction(id: &str, employee: &Employee, approved: bool) -> super::Transaction {
  super::Transaction {
    id: id.to_string(),
    amount: Decimal::new(1000, 2),
    employee: employee.clone(),
    merchant: "Merchant".to_string(),
    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
    approved,
  }
}

/// Two employees, `count` transactions alternating between them.
pub fn sample_data(count: usize) -> FixtureData {
  let employees = vec![employee("e1", "Ada", "Lovelace"), employee("e2", "Alan", "Turing")];
  let transactions = (1..=count)
    .map(|i| transaction(&format!("t{}", i), &employees[(i - 1) % 2], false))
    .collect();

  FixtureData {
    employees,
    transactions,
  }
}

/// Fixture source that records every call and can be told to fail or stall.
pub struct CountingSource {
  inner: FixtureSource,
  calls: Mutex<HashMap<Endpoint, usize>>,
  failing: Mutex<HashSet<Endpoint>>,
  delays: Mutex<HashMap<String, Duration>>,
}

impl CountingSource {
  pub fn new(data: FixtureData, page_size: usize) -> Self {
    Self {
      inner: FixtureSource::new(data)
        .with_page_size(page_size)
        .with_latency(Duration::from_millis(5)),
      calls: Mutex::new(HashMap::new()),
      failing: Mutex::new(HashSet::new()),
      delays: Mutex::new(HashMap::new()),
    }
  }

  pub fn calls(&self, endpoint: Endpoint) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .get(&endpoint)
      .copied()
      .unwrap_or(0)
  }

  pub fn fail(&self, endpoint: Endpoint) {
    self.failing.lock().unwrap().insert(endpoint);
  }

  pub fn recover(&self, endpoint: Endpoint) {
    self.failing.lock().unwrap().remove(&endpoint);
  }

  /// Extra latency for one specific request.
  pub fn delay(&self, request: &Request, duration: Duration) {
    self
      .delays
      .lock()
      .unwrap()
      .insert(request.cache_key(), duration);
  }
}

#[async_trait]
impl DataSource for CountingSource {
  async fn request(&self, request: &Request) -> FetchResult<Value> {
    let endpoint = request.endpoint();
    *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;

    let delay = self.delays.lock().unwrap().get(&request.cache_key()).copied();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }

    if self.failing.lock().unwrap().contains(&endpoint) {
      return Err(FetchError::remote(endpoint, "service unavailable"));
    }

    self.inner.request(request).await
  }
}
