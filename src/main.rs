mod api;
mod app;
mod cache;
mod config;
mod data;
mod event;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, SourceConfig};

#[derive(Parser, Debug)]
#[command(name = "txreview")]
#[command(about = "A terminal UI for reviewing and approving payment transactions")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/txreview/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Base URL of a remote transactions API (overrides the configured source)
  #[arg(short, long)]
  url: Option<String>,

  /// Simulated latency of the bundled demo data, in milliseconds
  #[arg(long)]
  latency_ms: Option<u64>,
}

/// Log to a file in the data directory; the terminal belongs to the UI.
///
/// The filter comes from TXREVIEW_LOG and defaults to `info`.
fn init_logging() -> Result<WorkerGuard> {
  let log_dir = dirs::data_dir()
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("txreview");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::never(&log_dir, "txreview.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env("TXREVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true)
    .init();

  Ok(guard)
}

fn apply_overrides(config: Config, args: &Args) -> Config {
  let source = match (&args.url, config.source) {
    (Some(url), SourceConfig::Http { timeout_secs, .. }) => SourceConfig::Http {
      url: url.clone(),
      timeout_secs,
    },
    (Some(url), SourceConfig::Fixture { .. }) => SourceConfig::Http {
      url: url.clone(),
      timeout_secs: 30,
    },
    (
      None,
      SourceConfig::Fixture {
        path,
        page_size,
        latency_ms,
      },
    ) => SourceConfig::Fixture {
      path,
      page_size,
      latency_ms: args.latency_ms.unwrap_or(latency_ms),
    },
    (None, source) => source,
  };

  Config { source, ..config }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let _log_guard = init_logging()?;

  // Load configuration, command line wins
  let config = Config::load(args.config.as_deref())?;
  let config = apply_overrides(config, &args);

  tracing::info!(source = %config.source_label(), "starting txreview");

  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
