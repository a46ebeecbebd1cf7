//! Output formatting
//!
//! Human-readable output with optional colors, or strict JSON for scripting.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::SpinnerObserver;

/// Output settings shared by every command
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit JSON instead of human-readable text
    pub json: bool,
    /// Disable colors
    pub no_color: bool,
    /// Suppress everything but errors
    pub quiet: bool,
}
