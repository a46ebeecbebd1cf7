//! Session workspaces
//!
//! A workspace is a copy of a template prefix placed under a per-session
//! prefix. Provisioning validates the request, then replicates
//! `templates/{template}` to `workspaces/{session}`.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::replicate::{ReplicationObserver, ReplicationReport, Replicator};
use crate::traits::ObjectStore;

/// Key prefix under which templates are stored
pub const TEMPLATES_ROOT: &str = "templates/";

/// Key prefix under which session workspaces are created
pub const WORKSPACES_ROOT: &str = "workspaces/";

/// Request to create a workspace for a session from a named template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    pub session_id: Option<String>,
    pub template_name: Option<String>,
}

impl ProvisionRequest {
    pub fn new(session_id: impl Into<String>, template_name: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            template_name: Some(template_name.into()),
        }
    }

    /// Return `(session_id, template_name)`, rejecting absent or blank fields
    pub fn validate(&self) -> Result<(&str, &str)> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.trim().is_empty())
        }

        match (present(&self.session_id), present(&self.template_name)) {
            (Some(session), Some(template)) => Ok((session, template)),
            (None, Some(_)) => Err(Error::Validation("missing sessionId".to_string())),
            (Some(_), None) => Err(Error::Validation("missing templateName".to_string())),
            (None, None) => Err(Error::Validation(
                "missing sessionId and templateName".to_string(),
            )),
        }
    }
}

/// Result of a provisioning call
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionOutcome {
    pub session_id: String,
    pub template_name: String,
    pub report: ReplicationReport,
}

/// Template source prefix for `template_name`
pub fn template_prefix(template_name: &str) -> String {
    format!("{TEMPLATES_ROOT}{template_name}")
}

/// Workspace destination prefix for `session_id`
pub fn workspace_prefix(session_id: &str) -> String {
    format!("{WORKSPACES_ROOT}{session_id}")
}

/// Creates workspaces and writes files into them
pub struct Workspaces<S: ObjectStore + ?Sized> {
    replicator: Replicator<S>,
}

impl<S: ObjectStore + ?Sized> Workspaces<S> {
    pub fn new(store: Arc<S>, bucket: impl Into<String>) -> Self {
        Self {
            replicator: Replicator::new(store, bucket),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.replicator = self.replicator.with_retry(retry);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ReplicationObserver>) -> Self {
        self.replicator = self.replicator.with_observer(observer);
        self
    }

    /// Stop provisioning at the first page boundary after `deadline`
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.replicator = self.replicator.with_deadline(deadline);
        self
    }

    pub fn replicator(&self) -> &Replicator<S> {
        &self.replicator
    }

    /// Validate `request` and copy its template into the session's workspace
    ///
    /// Success means the template listing completed; individual copy
    /// failures are reported in the outcome, not returned as errors.
    pub async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionOutcome> {
        let (session_id, template_name) = request.validate()?;

        tracing::info!(session_id, template_name, "Provisioning workspace");
        let report = self
            .replicator
            .replicate(&template_prefix(template_name), &workspace_prefix(session_id))
            .await?;

        Ok(ProvisionOutcome {
            session_id: session_id.to_string(),
            template_name: template_name.to_string(),
            report,
        })
    }

    /// Write `payload` to `base_key + relative_path` and return that key
    ///
    /// The two parts are concatenated as given; include the separator in one
    /// of them. The content type is guessed from the relative path.
    pub async fn save(
        &self,
        base_key: &str,
        relative_path: &str,
        payload: impl Into<Bytes>,
    ) -> Result<String> {
        let key = format!("{base_key}{relative_path}");
        if key.is_empty() {
            return Err(Error::Validation("object key must not be empty".to_string()));
        }

        let content_type = mime_guess::from_path(relative_path)
            .first()
            .map(|m| m.essence_str().to_string());

        self.replicator
            .store()
            .put_object(self.replicator.bucket(), &key, payload.into(), content_type)
            .await?;

        tracing::debug!(key = %key, "Saved object");
        Ok(key)
    }
}
