//! BrowserManager page tracking: opening tabs and picking up tabs the site opens.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::{BrowserError, BrowserManager};
use crate::cdp::{LoadEvent, PageSession};
use crate::remote::CdpPage;

impl BrowserManager {
    /// Open a new tab, loading `url` in it when given.
    pub async fn new_page(&self, url: Option<&str>) -> Result<Arc<CdpPage>, BrowserError> {
        self.ensure_connected().await?;
        let client = self.client().await?;

        let session = client.new_page(None).await?;
        let page = self.track(session).await;

        if let Some(url) = url {
            page.session()
                .navigate(url, LoadEvent::DomContentLoaded, self.config.command_timeout)
                .await?;
        }

        debug!("Opened page {} at {}", page.target_id(), url.unwrap_or("about:blank"));
        Ok(page)
    }

    /// Wait for a page target we have not seen before whose URL satisfies `matcher`.
    ///
    /// Unmatched targets are not remembered, so a tab that starts at
    /// `about:blank` is picked up once it reaches the matching URL.
    pub async fn wait_for_new_page(
        &self,
        matcher: &(dyn for<'m> Fn(&'m str) -> bool + Send + Sync),
        timeout: Duration,
    ) -> Result<Arc<CdpPage>, BrowserError> {
        self.ensure_connected().await?;
        let client = self.client().await?;
        let deadline = Instant::now() + timeout;

        loop {
            let targets = client.get_targets().await?;
            let candidate = {
                let known = self.known_targets.read().await;
                targets
                    .into_iter()
                    .filter(|t| t.is_page() && !known.contains(&t.target_id))
                    .find(|t| matcher(&t.url))
            };

            if let Some(target) = candidate {
                let session = client.attach_page(&target.target_id).await?;
                debug!("Picked up new page {} at {}", target.target_id, target.url);
                return Ok(self.track(session).await);
            }

            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "no new page within {}ms",
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.config.target_poll_interval).await;
        }
    }

    /// Pages handed out so far, oldest first.
    pub async fn tracked_pages(&self) -> Vec<Arc<CdpPage>> {
        self.pages.read().await.clone()
    }

    async fn track(&self, session: PageSession) -> Arc<CdpPage> {
        self.known_targets
            .write()
            .await
            .insert(session.target_id().to_string());
        let page = Arc::new(CdpPage::new(session));
        self.pages.write().await.push(page.clone());
        page
    }
}
