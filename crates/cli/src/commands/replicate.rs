//! replicate command - Copy every object under one prefix to another
//!
//! Runs the paginated prefix copy directly, without the template/workspace
//! naming used by `provision`.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use wsp_core::{CopyFailure, Error, ReplicationObserver, ReplicationReport};

use super::{GlobalArgs, connect};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, SpinnerObserver};

/// Copy all objects under SOURCE_PREFIX to DESTINATION_PREFIX
#[derive(Args, Debug)]
pub struct ReplicateArgs {
    /// Key prefix to copy from (e.g. templates/node)
    pub source_prefix: String,

    /// Key prefix to copy to (e.g. workspaces/abc123)
    pub destination_prefix: String,
}

/// JSON view of a replication report
#[derive(Debug, Serialize)]
pub(crate) struct ReplicationOutput<'a> {
    pub source_prefix: &'a str,
    pub destination_prefix: &'a str,
    pub pages: usize,
    pub listed: usize,
    pub copied: usize,
    pub failed: usize,
    pub elapsed_ms: i64,
    pub failures: &'a [CopyFailure],
}

impl<'a> From<&'a ReplicationReport> for ReplicationOutput<'a> {
    fn from(report: &'a ReplicationReport) -> Self {
        let elapsed: jiff::SignedDuration = report.finished_at.duration_since(report.started_at);
        Self {
            source_prefix: &report.source_prefix,
            destination_prefix: &report.destination_prefix,
            pages: report.pages,
            listed: report.listed,
            copied: report.copied,
            failed: report.failures.len(),
            elapsed_ms: elapsed.as_millis() as i64,
            failures: &report.failures,
        }
    }
}

/// Execute the replicate command
pub async fn execute(args: ReplicateArgs, global: &GlobalArgs) -> ExitCode {
    let formatter = Formatter::new(global.output_config());

    if args.source_prefix.is_empty() {
        formatter.error("Validation failed: source prefix must not be empty");
        return ExitCode::UsageError;
    }

    let spinner = formatter.show_progress().then(|| Arc::new(SpinnerObserver::new()));
    let observer = spinner
        .clone()
        .map(|s| s as Arc<dyn ReplicationObserver>);

    let workspaces = match connect(global, &formatter, observer).await {
        Ok(w) => w,
        Err(code) => return code,
    };

    let result = workspaces
        .replicator()
        .replicate(&args.source_prefix, &args.destination_prefix)
        .await;

    if let Some(spinner) = &spinner {
        spinner.finish();
    }

    match result {
        Ok(report) => {
            show_report(&formatter, &report);
            ExitCode::Success
        }
        Err(Error::DeadlineExceeded { report }) => {
            formatter.error(&format!(
                "Replication did not finish within {}s; stopped after page {}",
                global.timeout.unwrap_or_default(),
                report.pages
            ));
            show_report(&formatter, &report);
            ExitCode::Timeout
        }
        Err(e) => {
            formatter.error(&format!("Replication failed: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

/// Print a report as JSON or as a human-readable summary
pub(crate) fn show_report(formatter: &Formatter, report: &ReplicationReport) {
    if formatter.is_json() {
        formatter.json(&ReplicationOutput::from(report));
    } else {
        render_report(formatter, report);
    }
}

/// Print a human-readable summary, listing failed copies in a table
pub(crate) fn render_report(formatter: &Formatter, report: &ReplicationReport) {
    let summary = format!(
        "{} -> {}: {} copied, {} failed, {} page(s)",
        formatter.style_key(&report.source_prefix),
        formatter.style_key(&report.destination_prefix),
        report.copied,
        report.failures.len(),
        report.pages,
    );

    if report.is_complete() {
        formatter.success(&summary);
        return;
    }

    formatter.warning(&summary);
    let rows = report
        .failures
        .iter()
        .map(|f| {
            vec![
                f.task.source_key.clone(),
                f.task.destination_key.clone(),
                f.error.clone(),
            ]
        })
        .collect();
    formatter.table(&["Source", "Destination", "Error"], rows);
}
