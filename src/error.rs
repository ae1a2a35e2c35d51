//! Error types and result aliases.
//!
//! Failures are tagged by kind so the ripping loop can tell transient UI
//! hiccups (retried in place) apart from configuration or credential problems
//! (fatal, reported immediately).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using [`RipError`]
pub type Result<T> = std::result::Result<T, RipError>;

/// Errors that can occur while driving the browser, ripping pages, or
/// assembling the merged document.
#[derive(Debug, Error)]
pub enum RipError {
    /// An unsupported `--driver` name was requested
    #[error("driver '{name}' is not supported: {reason}")]
    UnsupportedDriver { name: String, reason: String },

    /// Failed to launch the browser
    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Navigation to a URL failed
    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    /// A window/tab operation failed
    #[error("window operation failed: {0}")]
    WindowFailed(String),

    /// A bounded wait ran out before its condition held
    #[error("timed out after {waited:?} waiting for {condition}")]
    Timeout { condition: String, waited: Duration },

    /// An element expected in the DOM was not found
    #[error("element '{0}' not found")]
    ElementMissing(String),

    /// An element detached from the DOM between lookup and use
    #[error("stale element reference: {0}")]
    StaleElement(String),

    /// Injected JavaScript failed to evaluate or returned garbage
    #[error("script evaluation failed: {0}")]
    ScriptError(String),

    /// The login form was absent from the portal page
    #[error("login form not present at {0}")]
    LoginFormMissing(String),

    /// The portal explicitly rejected the submitted credentials
    #[error("credentials rejected for user '{0}'")]
    CredentialsRejected(String),

    /// Rendering a captured page to PDF failed
    #[error("failed to render {} to PDF: {reason}", .path.display())]
    RenderFailed { path: PathBuf, reason: String },

    /// Reading or concatenating per-page PDFs failed
    #[error("merge failed: {0}")]
    MergeFailed(String),

    /// Filesystem error while persisting or scanning output
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RipError {
    /// Whether the ripping loop may retry the current item after this error.
    ///
    /// Transient UI errors (timeouts, missing/stale elements, script and
    /// navigation failures) are usually self-resolving in a client-rendered
    /// app. Configuration, credential, I/O, and assembly errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RipError::Timeout { .. }
                | RipError::ElementMissing(_)
                | RipError::StaleElement(_)
                | RipError::ScriptError(_)
                | RipError::NavigationFailed(_)
                | RipError::WindowFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let timeout = RipError::Timeout {
            condition: "epub container visible".to_string(),
            waited: Duration::from_secs(10),
        };
        assert!(timeout.is_transient());
        assert!(RipError::ElementMissing(".outline-item".to_string()).is_transient());
        assert!(RipError::StaleElement("a".to_string()).is_transient());
        assert!(RipError::ScriptError("boom".to_string()).is_transient());
    }

    #[test]
    fn test_fatal_classification() {
        let driver = RipError::UnsupportedDriver {
            name: "edge".to_string(),
            reason: "unknown driver".to_string(),
        };
        assert!(!driver.is_transient());
        assert!(!RipError::CredentialsRejected("user".to_string()).is_transient());
        assert!(!RipError::LoginFormMissing("https://portal".to_string()).is_transient());
        assert!(!RipError::MergeFailed("bad pdf".to_string()).is_transient());
    }

    #[test]
    fn test_timeout_display_names_condition() {
        let err = RipError::Timeout {
            condition: "table of contents".to_string(),
            waited: Duration::from_secs(60),
        };
        let msg = err.to_string();
        assert!(msg.contains("table of contents"));
        assert!(msg.contains("60s"));
    }
}
