//! save command - Write a single object into the store
//!
//! The object key is BASE_KEY followed directly by RELATIVE_PATH.

use std::path::PathBuf;

use anyhow::Context;
use bytes::Bytes;
use clap::Args;
use serde::Serialize;

use super::{GlobalArgs, connect, with_deadline};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Write a file or literal content to BASE_KEY + RELATIVE_PATH
#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("payload")
        .required(true)
        .args(["file", "content"]),
))]
pub struct SaveArgs {
    /// Key prefix, e.g. workspaces/abc123
    pub base_key: String,

    /// Path appended to the base key, e.g. /src/index.js
    pub relative_path: String,

    /// Read the payload from a local file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Use this text as the payload
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SaveOutput {
    key: String,
    size_bytes: usize,
}

/// Execute the save command
pub async fn execute(args: SaveArgs, global: &GlobalArgs) -> ExitCode {
    let formatter = Formatter::new(global.output_config());

    let payload = match read_payload(&args).await {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::UsageError;
        }
    };
    let size_bytes = payload.len();

    let workspaces = match connect(global, &formatter, None).await {
        Ok(w) => w,
        Err(code) => return code,
    };

    let result = with_deadline(
        global.timeout,
        workspaces.save(&args.base_key, &args.relative_path, payload),
    )
    .await;

    match result {
        Ok(Ok(key)) => {
            if formatter.is_json() {
                formatter.json(&SaveOutput { key, size_bytes });
            } else {
                formatter.success(&format!(
                    "Saved {} {}",
                    formatter.style_key(&key),
                    formatter.style_detail(&format!("({size_bytes} bytes)")),
                ));
            }
            ExitCode::Success
        }
        Ok(Err(e)) => {
            formatter.error(&format!("Failed to save object: {e}"));
            ExitCode::from_error(&e)
        }
        Err(_) => {
            formatter.error(&format!(
                "Save did not finish within {}s",
                global.timeout.unwrap_or_default()
            ));
            ExitCode::Timeout
        }
    }
}

async fn read_payload(args: &SaveArgs) -> anyhow::Result<Bytes> {
    match (&args.file, &args.content) {
        (Some(path), _) => {
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(Bytes::from(data))
        }
        (None, Some(text)) => Ok(Bytes::from(text.clone())),
        (None, None) => anyhow::bail!("Either --file or --content is required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(file: Option<PathBuf>, content: Option<&str>) -> SaveArgs {
        SaveArgs {
            base_key: "workspaces/abc123".to_string(),
            relative_path: "/index.js".to_string(),
            file,
            content: content.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_read_payload_from_content() {
        let payload = read_payload(&args(None, Some("hello"))).await.unwrap();
        assert_eq!(payload, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_read_payload_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("index.js");
        std::fs::write(&path, b"console.log(1)").unwrap();

        let payload = read_payload(&args(Some(path), None)).await.unwrap();
        assert_eq!(payload.len(), 14);
    }

    #[tokio::test]
    async fn test_read_payload_missing_file() {
        let err = read_payload(&args(Some(PathBuf::from("/nonexistent/wsp")), None))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read /nonexistent/wsp"));
    }
}
