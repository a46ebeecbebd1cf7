//! Command implementations
//!
//! Shared plumbing lives here: global flags, configuration resolution,
//! client construction and the `--timeout` deadline.
//!
//! Replication observes the deadline between pages, so copies that have
//! started always settle. Single-object writes are simply cut off.

pub mod completions;
pub mod provision;
pub mod replicate;
pub mod save;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::time::Instant;
use wsp_core::{Config, ConfigManager, ReplicationObserver, Workspaces};
use wsp_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Flags accepted by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Directory containing config.toml
    #[arg(long, global = true, env = wsp_core::config::CONFIG_DIR_ENV)]
    pub config_dir: Option<PathBuf>,

    /// Bucket name (overrides config and S3_BUCKET)
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Store endpoint URL (overrides config and S3_ENDPOINT)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Store region (overrides config and AWS_REGION)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Abort if the operation has not finished after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl GlobalArgs {
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            json: self.json,
            no_color: self.no_color,
            quiet: self.quiet,
        }
    }

    /// When `--timeout` expires, counted from now
    pub fn deadline(&self) -> Option<Instant> {
        self.timeout
            .map(|secs| Instant::now() + Duration::from_secs(secs))
    }
}

/// Resolve configuration: file, then environment, then command-line flags
pub fn load_config(global: &GlobalArgs) -> wsp_core::Result<Config> {
    let manager = match &global.config_dir {
        Some(dir) => ConfigManager::with_dir(dir),
        None => ConfigManager::new()?,
    };

    tracing::debug!(path = %manager.config_path().display(), "Loading configuration");
    let mut config = manager.load()?;
    config.apply_env();
    apply_overrides(&mut config, global);
    Ok(config)
}

fn apply_overrides(config: &mut Config, global: &GlobalArgs) {
    if let Some(bucket) = &global.bucket {
        config.store.bucket = bucket.clone();
    }
    if let Some(endpoint) = &global.endpoint {
        config.store.endpoint = Some(endpoint.clone());
    }
    if let Some(region) = &global.region {
        config.store.region = region.clone();
    }
}

/// Build an S3-backed `Workspaces` from the resolved configuration
pub async fn connect(
    global: &GlobalArgs,
    formatter: &Formatter,
    observer: Option<Arc<dyn ReplicationObserver>>,
) -> Result<Workspaces<S3Client>, ExitCode> {
    let config = match load_config(global) {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return Err(ExitCode::UsageError);
        }
    };

    tracing::debug!(
        bucket = %config.store.bucket,
        endpoint = config.store.endpoint.as_deref().unwrap_or("default"),
        "Resolved store configuration"
    );

    if config.store.bucket.is_empty() {
        formatter.warning("No bucket configured; set S3_BUCKET or --bucket");
    }

    let client = match S3Client::new(&config.store).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return Err(ExitCode::from_error(&e));
        }
    };

    let mut workspaces =
        Workspaces::new(Arc::new(client), config.store.bucket.clone()).with_retry(config.retry);
    if let Some(observer) = observer {
        workspaces = workspaces.with_observer(observer);
    }
    if let Some(deadline) = global.deadline() {
        workspaces = workspaces.with_deadline(deadline);
    }
    Ok(workspaces)
}

/// Run a single store call under the `--timeout` deadline, if one was given
pub async fn with_deadline<F: Future>(
    timeout_secs: Option<u64>,
    future: F,
) -> Result<F::Output, tokio::time::error::Elapsed> {
    match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), future).await,
        None => Ok(future.await),
    }
}
