//! In-memory ObjectStore double for unit tests
//!
//! Paginates like ListObjectsV2: keys in lexical order, at most `page_size`
//! per page, and the cursor is the last key returned. Every call is recorded
//! so tests can assert on exact call counts and cursors.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::traits::{ListingPage, ObjectStore};

#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub page_size: usize,
    pub objects: Mutex<BTreeMap<String, Bytes>>,
    pub content_types: Mutex<BTreeMap<String, Option<String>>>,
    pub list_calls: Mutex<Vec<Option<String>>>,
    pub copy_calls: Mutex<Vec<(String, String)>>,
    pub failing_copies: HashSet<String>,
    /// 1-based listing call that fails with a non-retryable error
    pub fail_list_on: Option<usize>,
    /// Listing calls that fail once with a transient error before succeeding
    pub transient_list_failures: AtomicUsize,
    /// Emit a truncated page without a cursor on the first call
    pub drop_cursor: bool,
    pub copy_delay: Option<Duration>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn with_keys<I, K>(page_size: usize, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let objects = keys
            .into_iter()
            .map(|k| {
                let key = k.into();
                let body = Bytes::from(format!("body of {key}"));
                (key, body)
            })
            .collect();

        Self {
            page_size,
            objects: Mutex::new(objects),
            ..Default::default()
        }
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn copy_call_count(&self) -> usize {
        self.copy_calls.lock().unwrap().len()
    }

    pub fn keys_under(&self, prefix: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(
        &self,
        _bucket: &str,
        prefix: &str,
        cursor: Option<String>,
    ) -> Result<ListingPage> {
        let call = {
            let mut calls = self.list_calls.lock().unwrap();
            calls.push(cursor.clone());
            calls.len()
        };

        if self
            .transient_list_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Network("503 Service Unavailable".to_string()));
        }
        if self.fail_list_on == Some(call) {
            return Err(Error::Auth("AccessDenied".to_string()));
        }

        let objects = self.objects.lock().unwrap();
        let mut matching = objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter(|k| cursor.as_ref().is_none_or(|c| k.as_str() > c.as_str()));

        let keys: Vec<String> = matching.by_ref().take(self.page_size).cloned().collect();
        let more = matching.next().is_some();

        if more && self.drop_cursor {
            return Ok(ListingPage {
                keys,
                truncated: true,
                next_cursor: None,
            });
        }

        let next_cursor = if more { keys.last().cloned() } else { None };
        Ok(match next_cursor {
            Some(cursor) => ListingPage::partial(keys, cursor),
            None => ListingPage::last(keys),
        })
    }

    async fn copy_object(
        &self,
        _bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<()> {
        self.copy_calls
            .lock()
            .unwrap()
            .push((source_key.to_string(), destination_key.to_string()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.copy_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_copies.contains(source_key) {
            return Err(Error::Network(format!("copy of {source_key} refused")));
        }

        let mut objects = self.objects.lock().unwrap();
        let body = objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| Error::NotFound(source_key.to_string()))?;
        objects.insert(destination_key.to_string(), body);
        Ok(())
    }

    async fn put_object(
        &self,
        _bucket: &str,
        key: &str,
        payload: Bytes,
        content_type: Option<String>,
    ) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), payload);
        self.content_types
            .lock()
            .unwrap()
            .insert(key.to_string(), content_type);
        Ok(())
    }
}
