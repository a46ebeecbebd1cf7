//! ObjectStore trait and listing types
//!
//! The replicator only needs three primitives from a store: a paginated
//! listing, a server-side copy and a single-object write. Backends (the
//! aws-sdk-s3 adapter, in-memory doubles) implement this trait.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// One page of a prefix listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Object keys in store order; every key starts with the listed prefix
    pub keys: Vec<String>,

    /// Whether more objects follow this page
    pub truncated: bool,

    /// Opaque token to replay for the next page; only meaningful when truncated
    pub next_cursor: Option<String>,
}

impl ListingPage {
    /// A final page holding `keys`
    pub fn last(keys: Vec<String>) -> Self {
        Self {
            keys,
            truncated: false,
            next_cursor: None,
        }
    }

    /// A truncated page followed by the page `cursor` points at
    pub fn partial(keys: Vec<String>, cursor: impl Into<String>) -> Self {
        Self {
            keys,
            truncated: true,
            next_cursor: Some(cursor.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Minimal object store surface used by the provisioner
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of objects under `prefix`, starting at `cursor`
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        cursor: Option<String>,
    ) -> Result<ListingPage>;

    /// Server-side copy within `bucket`; no object data passes through the caller
    async fn copy_object(&self, bucket: &str, source_key: &str, destination_key: &str)
    -> Result<()>;

    /// Write a single object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        payload: Bytes,
        content_type: Option<String>,
    ) -> Result<()>;
}
