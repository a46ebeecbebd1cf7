//! Process exit codes
//!
//! Scripts driving `wsp` branch on these, so values are stable.

/// Exit status of a wsp invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Completed; for replication this means every page was listed
    Success = 0,
    /// Unclassified failure
    GeneralError = 1,
    /// Invalid arguments or a rejected request
    UsageError = 2,
    /// Store unreachable or a listing failed
    NetworkError = 3,
    /// Credentials rejected by the store
    AuthError = 4,
    /// Bucket does not exist
    NotFound = 5,
    /// The `--timeout` deadline passed
    Timeout = 124,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Pick the exit code matching a core error
    pub fn from_error(error: &wsp_core::Error) -> Self {
        use wsp_core::Error;

        match error {
            Error::Validation(_) => ExitCode::UsageError,
            Error::Listing { source, .. } => ExitCode::from_error(source),
            Error::Auth(_) => ExitCode::AuthError,
            Error::NotFound(_) => ExitCode::NotFound,
            Error::Network(_) | Error::MalformedListing(_) => ExitCode::NetworkError,
            Error::Config(_) | Error::TomlParse(_) => ExitCode::UsageError,
            Error::DeadlineExceeded { .. } => ExitCode::Timeout,
            Error::Io(_) | Error::General(_) => ExitCode::GeneralError,
        }
    }
}
