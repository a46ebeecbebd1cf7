//! wsp-core: Core library for the wsp workspace provisioner
//!
//! This crate provides:
//! - The ObjectStore trait the provisioner runs against
//! - Paginated, concurrent prefix replication with per-object failure reporting
//! - Workspace provisioning and single-object saves
//! - Configuration loading and listing retry policy
//!
//! Nothing here depends on a specific S3 SDK; see `wsp-s3` for the
//! aws-sdk-s3 backend.

pub mod config;
pub mod error;
pub mod replicate;
pub mod retry;
pub mod traits;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, ConfigManager, RetryConfig, StoreConfig};
pub use error::{Error, Result};
pub use replicate::{CopyFailure, CopyTask, ReplicationObserver, ReplicationReport, Replicator};
pub use retry::{is_retryable_error, retry_with_backoff};
pub use traits::{ListingPage, ObjectStore};
pub use workspace::{
    ProvisionOutcome, ProvisionRequest, TEMPLATES_ROOT, WORKSPACES_ROOT, Workspaces,
    template_prefix, workspace_prefix,
};
