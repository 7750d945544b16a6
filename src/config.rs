use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{DataSource, FixtureSource, HttpSource};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// Custom title for header (defaults to the source description)
  pub title: Option<String>,
  #[serde(default)]
  pub source: SourceConfig,
}

/// Where employees and transactions come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
  /// In-memory data set, the bundled one unless `path` is given
  Fixture {
    path: Option<PathBuf>,
    #[serde(default = "default_page_size")]
    page_size: usize,
    /// Simulated network latency per request
    #[serde(default = "default_latency_ms")]
    latency_ms: u64,
  },
  /// Remote JSON endpoint
  Http {
    url: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
  },
}

fn default_page_size() -> usize {
  5
}

fn default_latency_ms() -> u64 {
  300
}

fn default_timeout_secs() -> u64 {
  30
}

impl Default for SourceConfig {
  fn default() -> Self {
    SourceConfig::Fixture {
      path: None,
      page_size: default_page_size(),
      latency_ms: default_latency_ms(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./txreview.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/txreview/config.yaml
  ///
  /// Without any file the bundled fixture data is used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("txreview.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("txreview").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if let SourceConfig::Fixture { page_size: 0, .. } = config.source {
      return Err(eyre!("source.page_size must be at least 1"));
    }
    Ok(config)
  }

  /// Get the remote API token from the environment, if one is set.
  ///
  /// Checks TXREVIEW_API_TOKEN.
  pub fn api_token() -> Option<String> {
    std::env::var("TXREVIEW_API_TOKEN").ok().filter(|t| !t.is_empty())
  }

  /// Build the data source described by this configuration.
  pub fn build_source(&self) -> Result<Arc<dyn DataSource>> {
    match &self.source {
      SourceConfig::Fixture {
        path,
        page_size,
        latency_ms,
      } => {
        let source = match path {
          Some(path) => FixtureSource::from_path(path)?,
          None => FixtureSource::bundled()?,
        };
        Ok(Arc::new(
          source
            .with_page_size(*page_size)
            .with_latency(Duration::from_millis(*latency_ms)),
        ))
      }
      SourceConfig::Http { url, timeout_secs } => {
        let source = HttpSource::new(url, Duration::from_secs(*timeout_secs))?;
        let source = match Self::api_token() {
          Some(token) => source.with_token(token),
          None => source,
        };
        Ok(Arc::new(source))
      }
    }
  }

  /// Short description of the source for the header.
  pub fn source_label(&self) -> String {
    match &self.source {
      SourceConfig::Fixture { path: Some(p), .. } => format!("fixture {}", p.display()),
      SourceConfig::Fixture { path: None, .. } => "demo data".to_string(),
      SourceConfig::Http { url, .. } => url.clone(),
    }
  }
}
