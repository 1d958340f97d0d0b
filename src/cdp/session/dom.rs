//! DOM operations for CDP page session.

use serde_json::json;

use crate::cdp::error::CdpError;
use crate::cdp::protocol::{BoxModel, DomNode};

use super::core::PageSession;

impl PageSession {
    /// Get document root node, pierced so that iframe content documents are
    /// included in the tree.
    pub async fn get_document(&self) -> Result<DomNode, CdpError> {
        let result = self
            .call("DOM.getDocument", Some(json!({"depth": -1, "pierce": true})))
            .await?;

        let root: DomNode = serde_json::from_value(result["root"].clone())?;
        Ok(root)
    }

    /// Query selector against the main document.
    pub async fn query_selector(&self, selector: &str) -> Result<Option<i64>, CdpError> {
        let doc = self.get_document().await?;
        self.query_selector_in(doc.node_id, selector).await
    }

    /// Query selector scoped to an arbitrary node (e.g. an iframe's content
    /// document).
    pub async fn query_selector_in(
        &self,
        root_id: i64,
        selector: &str,
    ) -> Result<Option<i64>, CdpError> {
        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({
                    "nodeId": root_id,
                    "selector": selector,
                })),
            )
            .await?;

        let node_id = result["nodeId"].as_i64().unwrap_or(0);
        if node_id == 0 { Ok(None) } else { Ok(Some(node_id)) }
    }

    /// Query all matching nodes in the main document.
    pub async fn query_selector_all(&self, selector: &str) -> Result<Vec<i64>, CdpError> {
        let doc = self.get_document().await?;
        self.query_selector_all_in(doc.node_id, selector).await
    }

    /// Query all matching nodes, scoped to an arbitrary node.
    pub async fn query_selector_all_in(
        &self,
        root_id: i64,
        selector: &str,
    ) -> Result<Vec<i64>, CdpError> {
        let result = self
            .call(
                "DOM.querySelectorAll",
                Some(json!({
                    "nodeId": root_id,
                    "selector": selector,
                })),
            )
            .await?;

        let node_ids = result["nodeIds"]
            .as_array()
            .map(|ids| ids.iter().filter_map(|id| id.as_i64()).collect())
            .unwrap_or_default();
        Ok(node_ids)
    }

    /// Resolve a DOM node into a remote object for `call_function_on`.
    pub async fn resolve_node(&self, node_id: i64) -> Result<String, CdpError> {
        let result = self
            .call("DOM.resolveNode", Some(json!({"nodeId": node_id})))
            .await?;

        result["object"]["objectId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse(format!("No objectId for node {}", node_id)))
    }

    /// Get box model for node.
    pub async fn get_box_model(&self, node_id: i64) -> Result<Option<BoxModel>, CdpError> {
        let result = self
            .call("DOM.getBoxModel", Some(json!({"nodeId": node_id})))
            .await;

        match result {
            Ok(r) => {
                let model: BoxModel = serde_json::from_value(r["model"].clone())?;
                Ok(Some(model))
            }
            // -32000: node is not rendered.
            Err(CdpError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Focus element.
    pub async fn focus(&self, node_id: i64) -> Result<(), CdpError> {
        self.call("DOM.focus", Some(json!({"nodeId": node_id})))
            .await?;
        Ok(())
    }

    /// Set node value (for input elements).
    pub async fn set_node_value(&self, node_id: i64, value: &str) -> Result<(), CdpError> {
        self.focus(node_id).await?;
        self.press_key_combo("Control+a").await?;
        self.type_text(value).await?;
        Ok(())
    }

    /// Click on a node at its box-model center.
    pub async fn click_node(&self, node_id: i64) -> Result<(), CdpError> {
        let box_model = self
            .get_box_model(node_id)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(format!("node {} (not visible)", node_id)))?;

        let (x, y) = Self::quad_center(&box_model.content);
        self.click(x, y).await
    }

    /// Click on element by selector.
    pub async fn click_selector(&self, selector: &str) -> Result<(), CdpError> {
        let node_id = self
            .query_selector(selector)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(selector.to_string()))?;

        self.click_node(node_id).await
    }

    /// Click on element by selector, scoped to an arbitrary node.
    pub async fn click_selector_in(&self, root_id: i64, selector: &str) -> Result<(), CdpError> {
        let node_id = self
            .query_selector_in(root_id, selector)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(selector.to_string()))?;

        self.click_node(node_id).await
    }

    /// Fill input by selector.
    pub async fn fill(&self, selector: &str, value: &str) -> Result<(), CdpError> {
        let node_id = self
            .query_selector(selector)
            .await?
            .ok_or_else(|| CdpError::ElementNotFound(selector.to_string()))?;

        self.set_node_value(node_id, value).await
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
