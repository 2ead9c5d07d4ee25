//! The engine's remote surface implemented over CDP.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use matchpilot_core::{
    DialogResponse, DialogSubscription, ElementHandle, PageError, RemotePage, RemoteSession,
    WaitPolicy,
};
use serde_json::Value;

use crate::cdp::PageSession;
use crate::manager::BrowserManager;

/// One browser tab driven through its CDP session.
pub struct CdpPage {
    session: PageSession,
}

impl CdpPage {
    pub fn new(session: PageSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    pub fn target_id(&self) -> &str {
        self.session.target_id()
    }
}

#[async_trait]
impl RemotePage for CdpPage {
    fn id(&self) -> &str {
        self.session.target_id()
    }

    async fn navigate(
        &self,
        url: &str,
        wait: WaitPolicy,
        timeout: Duration,
    ) -> Result<(), PageError> {
        self.session.navigate(url, wait.into(), timeout).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.session.get_url().await?)
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementHandle>, PageError> {
        let node = self.session.query_selector(selector).await?;
        Ok(node.map(ElementHandle::new))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        let nodes = self.session.query_selector_all(selector).await?;
        Ok(nodes.into_iter().map(ElementHandle::new).collect())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, PageError> {
        Ok(self.session.evaluate(expression).await?)
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        Ok(self.session.click_node(element.id()).await?)
    }

    async fn select_all(&self, element: &ElementHandle) -> Result<(), PageError> {
        Ok(self.session.select_node_contents(element.id()).await?)
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), PageError> {
        self.session.focus(element.id()).await?;
        Ok(self.session.insert_text(text).await?)
    }

    async fn upload_file(&self, element: &ElementHandle, path: &Path) -> Result<(), PageError> {
        Ok(self.session.set_file_input(element.id(), path).await?)
    }

    async fn once_dialog(&self, response: DialogResponse) -> Result<DialogSubscription, PageError> {
        Ok(self.session.events().register_dialog(response))
    }
}

#[async_trait]
impl RemoteSession for BrowserManager {
    async fn open_page(&self, url: Option<&str>) -> Result<Arc<dyn RemotePage>, PageError> {
        let page = self.new_page(url).await?;
        Ok(page as Arc<dyn RemotePage>)
    }

    async fn wait_for_page(
        &self,
        matcher: &(dyn for<'m> Fn(&'m str) -> bool + Send + Sync),
        timeout: Duration,
    ) -> Result<Arc<dyn RemotePage>, PageError> {
        let page = self.wait_for_new_page(matcher, timeout).await?;
        Ok(page as Arc<dyn RemotePage>)
    }

    async fn pages(&self) -> Vec<Arc<dyn RemotePage>> {
        self.tracked_pages()
            .await
            .into_iter()
            .map(|page| page as Arc<dyn RemotePage>)
            .collect()
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
