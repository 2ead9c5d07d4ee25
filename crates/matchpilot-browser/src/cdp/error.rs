//! CDP error types.

use matchpilot_core::PageError;
use thiserror::Error;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to Chrome.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Error object returned by the browser for a command.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error (for endpoint discovery).
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// The node a handle pointed at is gone from the document.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CdpError {
    /// Protocol errors Chrome raises for stale node ids.
    pub fn is_missing_node(&self) -> bool {
        match self {
            CdpError::Protocol { message, .. } => {
                message.contains("No node") || message.contains("Could not find node")
            }
            CdpError::ElementNotFound(_) => true,
            _ => false,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::NavigationFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for PageError {
    fn from(e: CdpError) -> Self {
        if e.is_missing_node() {
            return PageError::ElementGone(e.to_string());
        }
        match e {
            CdpError::ConnectionFailed(_)
            | CdpError::ChromeNotAvailable(_)
            | CdpError::WebSocket(_)
            | CdpError::SessionClosed => PageError::Disconnected,
            CdpError::NavigationFailed(msg) => PageError::Navigation(msg),
            CdpError::JavaScript(msg) => PageError::Script(msg),
            CdpError::Timeout(msg) => PageError::Timeout(msg),
            other => PageError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_mean_disconnected() {
        assert!(matches!(PageError::from(CdpError::SessionClosed), PageError::Disconnected));
        assert!(matches!(
            PageError::from(CdpError::WebSocket("reset".into())),
            PageError::Disconnected
        ));
    }

    #[test]
    fn test_stale_node_maps_to_element_gone() {
        let err = CdpError::Protocol {
            code: -32000,
            message: "No node with given id found".into(),
        };
        assert!(err.is_missing_node());
        assert!(matches!(PageError::from(err), PageError::ElementGone(_)));
    }

    #[test]
    fn test_timeout_stays_a_timeout() {
        let err = PageError::from(CdpError::Timeout("Request Runtime.evaluate timed out".into()));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_javascript_error_maps_to_script() {
        let err = PageError::from(CdpError::JavaScript("Uncaught TypeError".into()));
        assert!(matches!(err, PageError::Script(ref m) if m.contains("TypeError")));
        assert!(err.is_transient());
    }
}
