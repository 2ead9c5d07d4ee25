//! Navigation operations for CDP page session.

use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::events::LoadEvent;

use super::core::PageSession;

impl PageSession {
    /// Navigate to URL and wait until the new document reaches `until`.
    ///
    /// Returns the frame id the navigation happened in.
    pub async fn navigate(
        &self,
        url: &str,
        until: LoadEvent,
        timeout: Duration,
    ) -> Result<String, CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText").and_then(|e| e.as_str()) {
            return Err(CdpError::NavigationFailed(format!("{}: {}", url, error)));
        }

        let frame_id = result["frameId"].as_str().unwrap_or("main").to_string();

        // Fragment-only navigations stay in the same document and carry no loader.
        let Some(loader_id) = result["loaderId"].as_str() else {
            debug!("Same-document navigation to {}", url);
            return Ok(frame_id);
        };

        tokio::time::timeout(timeout, self.events.wait_for(loader_id, until))
            .await
            .map_err(|_| {
                CdpError::Timeout(format!(
                    "{} did not reach {} within {}ms",
                    url,
                    until.lifecycle_name(),
                    timeout.as_millis()
                ))
            })?;

        debug!("Navigated to {}", url);
        Ok(frame_id)
    }

    /// Get current URL.
    pub async fn get_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    /// Get page title.
    pub async fn get_title(&self) -> Result<String, CdpError> {
        let result = self.evaluate("document.title").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }
}
