//! Prefix replication
//!
//! Copies every object under a source prefix to a destination prefix, one
//! listing page at a time. Copies within a page run concurrently and the next
//! page is only requested once the whole page has settled. Listing failures
//! end the run; copy failures are recorded in the report and never abort it.
//!
//! An optional deadline is checked only between pages, so a page whose
//! copies have started is always allowed to settle.

use std::sync::Arc;

use futures::future::join_all;
use jiff::Timestamp;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::{is_retryable_error, retry_with_backoff};
use crate::traits::{ListingPage, ObjectStore};

/// A single server-side copy derived from a listed key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyTask {
    pub source_key: String,
    pub destination_key: String,
}

impl CopyTask {
    /// Build the task for `source_key`, replacing the first occurrence of
    /// `source_prefix` with `destination_prefix`.
    ///
    /// This is a literal substring substitution, not a path-segment rewrite:
    /// the first match wins wherever it appears in the key.
    pub fn derive(source_key: &str, source_prefix: &str, destination_prefix: &str) -> Self {
        Self {
            source_key: source_key.to_string(),
            destination_key: source_key.replacen(source_prefix, destination_prefix, 1),
        }
    }
}

/// A copy that did not complete
#[derive(Debug, Clone, Serialize)]
pub struct CopyFailure {
    #[serde(flatten)]
    pub task: CopyTask,
    pub error: String,
}

/// Outcome of a finished pagination run
///
/// `Ok(report)` means every page was listed; check `failures` for objects
/// that could not be copied.
#[derive(Debug, Clone, Serialize)]
pub struct ReplicationReport {
    pub source_prefix: String,
    pub destination_prefix: String,
    /// Listing requests that returned a page
    pub pages: usize,
    /// Objects seen across all pages
    pub listed: usize,
    pub copied: usize,
    pub failures: Vec<CopyFailure>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl ReplicationReport {
    fn new(source_prefix: &str, destination_prefix: &str) -> Self {
        let now = Timestamp::now();
        Self {
            source_prefix: source_prefix.to_string(),
            destination_prefix: destination_prefix.to_string(),
            pages: 0,
            listed: 0,
            copied: 0,
            failures: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Every listed object was copied
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Progress hooks invoked while a replication runs
pub trait ReplicationObserver: Send + Sync {
    /// A page of `objects` keys was listed
    fn on_page(&self, _page: usize, _objects: usize) {}

    fn on_copied(&self, _task: &CopyTask) {}

    fn on_failed(&self, _failure: &CopyFailure) {}
}

struct SilentObserver;

impl ReplicationObserver for SilentObserver {}

/// Replicates object prefixes within one bucket
pub struct Replicator<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    bucket: String,
    retry: RetryConfig,
    observer: Arc<dyn ReplicationObserver>,
    deadline: Option<Instant>,
}

impl<S: ObjectStore + ?Sized> Replicator<S> {
    pub fn new(store: Arc<S>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            retry: RetryConfig::default(),
            observer: Arc::new(SilentObserver),
            deadline: None,
        }
    }

    /// Retry policy applied to listing requests
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReplicationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Stop at the first page boundary reached after `deadline`
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Copy every object under `source_prefix` to the same relative key under
    /// `destination_prefix`.
    ///
    /// Pages are fetched sequentially with the store's continuation cursor.
    /// A listing error (after retries) aborts the run and is returned; copy
    /// errors are logged, collected in the report and do not stop the run.
    /// A passed deadline returns `Error::DeadlineExceeded` carrying the
    /// report for the pages already settled.
    pub async fn replicate(
        &self,
        source_prefix: &str,
        destination_prefix: &str,
    ) -> Result<ReplicationReport> {
        if source_prefix.is_empty() {
            return Err(Error::Validation(
                "source prefix must not be empty".to_string(),
            ));
        }

        let mut report = ReplicationReport::new(source_prefix, destination_prefix);
        let mut cursor: Option<String> = None;

        loop {
            if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                report.finished_at = Timestamp::now();
                tracing::warn!(
                    source = source_prefix,
                    pages = report.pages,
                    copied = report.copied,
                    "Deadline passed, stopping before the next page"
                );
                return Err(Error::DeadlineExceeded {
                    report: Box::new(report),
                });
            }

            let page_number = report.pages + 1;
            let page = self
                .list_page(source_prefix, cursor.take())
                .await
                .map_err(|e| Error::listing(source_prefix, page_number, e))?;
            report.pages = page_number;

            if page.is_empty() {
                tracing::debug!(page = page_number, "Empty listing page, done");
                break;
            }

            tracing::debug!(
                page = page_number,
                objects = page.keys.len(),
                truncated = page.truncated,
                "Listed page"
            );
            report.listed += page.keys.len();
            self.observer.on_page(page_number, page.keys.len());

            let copies = page.keys.iter().map(|key| {
                self.copy_one(CopyTask::derive(key, source_prefix, destination_prefix))
            });
            for outcome in join_all(copies).await {
                match outcome {
                    Ok(()) => report.copied += 1,
                    Err(failure) => report.failures.push(failure),
                }
            }

            if !page.truncated {
                break;
            }
            match page.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => {
                    return Err(Error::listing(
                        source_prefix,
                        page_number,
                        Error::MalformedListing(
                            "truncated page without a continuation token".to_string(),
                        ),
                    ));
                }
            }
        }

        report.finished_at = Timestamp::now();
        tracing::info!(
            source = source_prefix,
            destination = destination_prefix,
            pages = report.pages,
            copied = report.copied,
            failed = report.failures.len(),
            "Replication finished"
        );

        Ok(report)
    }

    async fn list_page(&self, prefix: &str, cursor: Option<String>) -> Result<ListingPage> {
        let store = &self.store;
        let bucket = self.bucket.as_str();

        retry_with_backoff(
            &self.retry,
            move || store.list_objects(bucket, prefix, cursor.clone()),
            is_retryable_error,
        )
        .await
    }

    async fn copy_one(&self, task: CopyTask) -> std::result::Result<(), CopyFailure> {
        match self
            .store
            .copy_object(&self.bucket, &task.source_key, &task.destination_key)
            .await
        {
            Ok(()) => {
                self.observer.on_copied(&task);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    source = %task.source_key,
                    destination = %task.destination_key,
                    error = %e,
                    "Copy failed"
                );
                let failure = CopyFailure {
                    task,
                    error: e.to_string(),
                };
                self.observer.on_failed(&failure);
                Err(failure)
            }
        }
    }
}
