//! provision command - Create a session workspace from a template
//!
//! Copies `templates/<TEMPLATE>` to `workspaces/<SESSION_ID>`. The request is
//! validated before any store call; a missing field is a usage error.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use wsp_core::{Error, ProvisionRequest, ReplicationObserver};

use super::replicate::{ReplicationOutput, render_report, show_report};
use super::{GlobalArgs, connect};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, SpinnerObserver};

/// Create a workspace for a session from a template
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Session identifier; becomes workspaces/<SESSION_ID>
    #[arg(long)]
    pub session_id: Option<String>,

    /// Template name; read from templates/<TEMPLATE>
    #[arg(long = "template")]
    pub template_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProvisionOutput<'a> {
    status: &'static str,
    session_id: &'a str,
    template_name: &'a str,
    #[serde(flatten)]
    replication: ReplicationOutput<'a>,
}

/// Execute the provision command
pub async fn execute(args: ProvisionArgs, global: &GlobalArgs) -> ExitCode {
    let formatter = Formatter::new(global.output_config());

    let request = ProvisionRequest {
        session_id: args.session_id,
        template_name: args.template_name,
    };
    if let Err(e) = request.validate() {
        formatter.error(&e.to_string());
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

    let result = workspaces.provision(&request).await;

    if let Some(spinner) = &spinner {
        spinner.finish();
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(Error::DeadlineExceeded { report }) => {
            formatter.error(&format!(
                "Provisioning did not finish within {}s; stopped after page {}",
                global.timeout.unwrap_or_default(),
                report.pages
            ));
            show_report(&formatter, &report);
            return ExitCode::Timeout;
        }
        Err(e) => {
            formatter.error(&format!("Failed to provision workspace: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    // Created even when some copies failed; the failures are part of the output
    if formatter.is_json() {
        formatter.json(&ProvisionOutput {
            status: "created",
            session_id: &outcome.session_id,
            template_name: &outcome.template_name,
            replication: ReplicationOutput::from(&outcome.report),
        });
    } else {
        formatter.println(&format!(
            "Workspace {} created from template {}",
            formatter.style_name(&outcome.session_id),
            formatter.style_name(&outcome.template_name),
        ));
        render_report(&formatter, &outcome.report);
    }

    ExitCode::Success
}
