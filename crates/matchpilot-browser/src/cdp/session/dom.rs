//! DOM operations for CDP page session.
//!
//! Elements are addressed by backend node id, which stays valid across
//! `DOM.getDocument` calls for as long as the node is attached.

use std::path::Path;

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::{BoxModel, DomNode, RemoteObject};

use super::core::PageSession;

impl PageSession {
    /// Node id of the document root.
    async fn document_node_id(&self) -> Result<i64, CdpError> {
        let result = self
            .call("DOM.getDocument", Some(json!({"depth": 0})))
            .await?;
        result["root"]["nodeId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("Missing root nodeId".to_string()))
    }

    /// Describe a node by its (frontend) node id.
    pub async fn describe_node(&self, node_id: i64) -> Result<DomNode, CdpError> {
        let result = self
            .call("DOM.describeNode", Some(json!({"nodeId": node_id})))
            .await?;
        Ok(serde_json::from_value(result["node"].clone())?)
    }

    /// First element matching `selector`, as a backend node id.
    pub async fn query_selector(&self, selector: &str) -> Result<Option<i64>, CdpError> {
        let root = self.document_node_id().await?;

        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({
                    "nodeId": root,
                    "selector": selector,
                })),
            )
            .await?;

        let node_id = result["nodeId"].as_i64().unwrap_or(0);
        if node_id == 0 {
            return Ok(None);
        }
        Ok(Some(self.describe_node(node_id).await?.backend_node_id))
    }

    /// Every element matching `selector`, in document order.
    pub async fn query_selector_all(&self, selector: &str) -> Result<Vec<i64>, CdpError> {
        let root = self.document_node_id().await?;

        let result = self
            .call(
                "DOM.querySelectorAll",
                Some(json!({
                    "nodeId": root,
                    "selector": selector,
                })),
            )
            .await?;

        let node_ids: Vec<i64> = result["nodeIds"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default();

        let mut backend_ids = Vec::with_capacity(node_ids.len());
        for node_id in node_ids {
            backend_ids.push(self.describe_node(node_id).await?.backend_node_id);
        }
        Ok(backend_ids)
    }

    /// Get box model for node, `None` when it is not rendered.
    pub async fn get_box_model(&self, backend_node_id: i64) -> Result<Option<BoxModel>, CdpError> {
        let result = self
            .call(
                "DOM.getBoxModel",
                Some(json!({"backendNodeId": backend_node_id})),
            )
            .await;

        match result {
            Ok(r) => {
                let model: BoxModel = serde_json::from_value(r["model"].clone())?;
                Ok(Some(model))
            }
            Err(e) if e.is_missing_node() => Err(e),
            Err(CdpError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve node to runtime object.
    pub async fn resolve_node(&self, backend_node_id: i64) -> Result<RemoteObject, CdpError> {
        let result = self
            .call(
                "DOM.resolveNode",
                Some(json!({"backendNodeId": backend_node_id})),
            )
            .await?;

        let obj: RemoteObject = serde_json::from_value(result["object"].clone())?;
        Ok(obj)
    }

    /// Focus element.
    pub async fn focus(&self, backend_node_id: i64) -> Result<(), CdpError> {
        self.call("DOM.focus", Some(json!({"backendNodeId": backend_node_id})))
            .await?;
        Ok(())
    }

    pub async fn scroll_into_view(&self, backend_node_id: i64) -> Result<(), CdpError> {
        self.call(
            "DOM.scrollIntoViewIfNeeded",
            Some(json!({"backendNodeId": backend_node_id})),
        )
        .await?;
        Ok(())
    }

    /// Click an element at the center of its box, or via `click()` when it has no box.
    pub async fn click_node(&self, backend_node_id: i64) -> Result<(), CdpError> {
        // Not every element supports scrolling (e.g. inside a hidden container).
        let _ = self.scroll_into_view(backend_node_id).await;

        match self.get_box_model(backend_node_id).await? {
            Some(model) => {
                let (x, y) = Self::quad_center(&model.content);
                self.click(x, y).await
            }
            None => {
                debug!("Node {} has no box, clicking from script", backend_node_id);
                self.call_function_on_node(backend_node_id, "function() { this.click(); }", vec![])
                    .await?;
                Ok(())
            }
        }
    }

    /// Select the whole value of an editable element.
    pub async fn select_node_contents(&self, backend_node_id: i64) -> Result<(), CdpError> {
        self.focus(backend_node_id).await?;
        let selected = self
            .call_function_on_node(
                backend_node_id,
                "function() { if (typeof this.select === 'function') { this.select(); return true; } return false; }",
                vec![],
            )
            .await?;
        if selected.as_bool() != Some(true) {
            self.press_key_combo("Control+a").await?;
        }
        Ok(())
    }

    /// Put `path` into a file input.
    pub async fn set_file_input(&self, backend_node_id: i64, path: &Path) -> Result<(), CdpError> {
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.call(
            "DOM.setFileInputFiles",
            Some(json!({
                "files": [absolute.display().to_string()],
                "backendNodeId": backend_node_id,
            })),
        )
        .await?;
        debug!("Set file input {} to {}", backend_node_id, absolute.display());
        Ok(())
    }

    /// Calculate center point of a quad.
    pub(super) fn quad_center(quad: &[f64]) -> (f64, f64) {
        if quad.len() >= 8 {
            let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
            let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
            (x, y)
        } else {
            (0.0, 0.0)
        }
    }
}
