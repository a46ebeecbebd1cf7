//! Error types for wsp-core
//!
//! A single error enum covers every failure the provisioner can surface.
//! Per-object copy failures are deliberately not represented here: they are
//! recorded in the replication report and never propagate.

use thiserror::Error;

use crate::replicate::ReplicationReport;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the provisioner and its object store adapters
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied input was rejected before any store call was made
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A listing request failed; terminal for the whole replication
    #[error("Listing failed for prefix '{prefix}' on page {page}: {source}")]
    Listing {
        prefix: String,
        page: usize,
        #[source]
        source: Box<Error>,
    },

    /// The store returned a listing that cannot be paginated further
    #[error("Malformed listing response: {0}")]
    MalformedListing(String),

    /// Network or transport failure talking to the store
    #[error("Network error: {0}")]
    Network(String),

    /// The store rejected the credentials or the request signature
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Bucket or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller's deadline passed at a page boundary; `report` covers the
    /// pages that were listed and settled before it
    #[error(
        "Deadline exceeded after {} page(s); {} object(s) copied",
        .report.pages,
        .report.copied
    )]
    DeadlineExceeded { report: Box<ReplicationReport> },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("{0}")]
    General(String),
}

impl Error {
    /// Wrap a store error raised while fetching a listing page
    pub fn listing(prefix: impl Into<String>, page: usize, source: Error) -> Self {
        Error::Listing {
            prefix: prefix.into(),
            page,
            source: Box::new(source),
        }
    }
}
