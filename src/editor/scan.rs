//! Preview-document access and component scanning.
//!
//! Components are the elements carrying the identifier attribute inside the
//! preview iframe's document, in document order. Scanning runs through the
//! page's own DOM APIs (the preview frame is same-origin), which also yields
//! each component's text content for text-based lookup.

use std::collections::HashSet;
use std::time::Instant;

use serde::Deserialize;
use tracing::trace;

use crate::cdp::CdpError;

use super::commands::{ComponentHandle, EditorSession};
use super::error::EditorError;

/// One scanned component: identifier plus text content.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ComponentInfo {
    pub uuid: String,
    #[serde(default)]
    pub text: String,
}

/// How to look up a component in the preview.
#[derive(Debug, Clone)]
pub enum ComponentQuery {
    /// Last component (in document order) whose text contains the fragment.
    Text(String),
    /// 1-based position in document order.
    Position(usize),
}

/// Resolve a query against a scan, in document order. Text lookups take the
/// last match; positions are 1-based.
pub(super) fn pick_component<'a>(
    components: &'a [ComponentInfo],
    query: &ComponentQuery,
) -> Option<&'a ComponentInfo> {
    match query {
        ComponentQuery::Text(fragment) => components
            .iter()
            .filter(|c| c.text.contains(fragment.as_str()))
            .next_back(),
        ComponentQuery::Position(position) => {
            position.checked_sub(1).and_then(|i| components.get(i))
        }
    }
}

impl EditorSession {
    /// Node id of the preview iframe's content document.
    pub async fn preview_document(&self) -> Result<i64, EditorError> {
        let root = self.page().get_document().await?;
        let doc = root
            .find_frame(&self.config().preview_frame_id)
            .ok_or_else(|| EditorError::PreviewNotLoaded(self.config().preview_frame_id.clone()))?;
        Ok(doc.node_id)
    }

    /// Scan all components in the preview document, in document order.
    pub async fn scan_components(&self) -> Result<Vec<ComponentInfo>, EditorError> {
        let frame_id =
            serde_json::to_string(&self.config().preview_frame_id).map_err(CdpError::from)?;
        let attr = &self.config().component_attr;
        let expression = format!(
            r#"(() => {{
  const frame = document.getElementById({frame_id});
  const doc = frame && frame.contentDocument;
  if (!doc) return null;
  return Array.from(doc.querySelectorAll('[{attr}]')).map((el) => ({{
    uuid: el.getAttribute('{attr}') || '',
    text: el.textContent || '',
  }}));
}})()"#
        );

        let value = self.page().evaluate(&expression).await?;
        if value.is_null() {
            return Err(EditorError::PreviewNotLoaded(
                self.config().preview_frame_id.clone(),
            ));
        }

        let components: Vec<ComponentInfo> =
            serde_json::from_value(value).map_err(CdpError::from)?;
        trace!("Scanned {} components", components.len());
        Ok(components)
    }

    /// Find a component by text fragment or 1-based position.
    pub async fn find_component(
        &self,
        query: &ComponentQuery,
    ) -> Result<Option<ComponentHandle>, EditorError> {
        let components = self.scan_components().await?;
        let Some(info) = pick_component(&components, query) else {
            return Ok(None);
        };
        let node_id = self.component_node(&info.uuid).await?;
        Ok(Some(ComponentHandle {
            uuid: info.uuid.clone(),
            node_id,
        }))
    }

    /// Selector for a component by identifier.
    pub(super) fn component_selector(&self, uuid: &str) -> String {
        format!("[{}=\"{}\"]", self.config().component_attr, uuid)
    }

    /// Resolve a component's DOM node in the preview document.
    pub(super) async fn component_node(&self, uuid: &str) -> Result<i64, EditorError> {
        let doc = self.preview_document().await?;
        let selector = self.component_selector(uuid);
        self.page()
            .query_selector_in(doc, &selector)
            .await?
            .ok_or_else(|| EditorError::ComponentNotFound(uuid.to_string()))
    }

    /// Poll until a component with the given identifier is present.
    pub(super) async fn wait_for_component(
        &self,
        uuid: &str,
    ) -> Result<ComponentHandle, EditorError> {
        let deadline = Instant::now() + self.config().element_timeout;
        loop {
            match self.component_node(uuid).await {
                Ok(node_id) => {
                    return Ok(ComponentHandle {
                        uuid: uuid.to_string(),
                        node_id,
                    });
                }
                // Preview may still be swapping in the server's update.
                Err(EditorError::ComponentNotFound(_)) | Err(EditorError::PreviewNotLoaded(_)) => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(EditorError::ComponentNotFound(uuid.to_string()));
            }
            tokio::time::sleep(self.config().poll_interval).await;
        }
    }

    /// Poll until at least one component identifier outside `before` is
    /// present, returning handles for all such components.
    pub(super) async fn wait_for_new_components(
        &self,
        before: &HashSet<String>,
    ) -> Result<Vec<ComponentHandle>, EditorError> {
        let deadline = Instant::now() + self.config().element_timeout;
        loop {
            match self.scan_components().await {
                Ok(scan) => {
                    let fresh: Vec<&ComponentInfo> =
                        scan.iter().filter(|c| !before.contains(&c.uuid)).collect();
                    if !fresh.is_empty() {
                        let mut handles = Vec::with_capacity(fresh.len());
                        for info in fresh {
                            handles.push(ComponentHandle {
                                uuid: info.uuid.clone(),
                                node_id: self.component_node(&info.uuid).await?,
                            });
                        }
                        return Ok(handles);
                    }
                }
                Err(EditorError::PreviewNotLoaded(_)) => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(EditorError::ComponentNotFound(
                    "newly created component".to_string(),
                ));
            }
            tokio::time::sleep(self.config().poll_interval).await;
        }
    }

    /// Poll until no component with the given identifier remains.
    pub(super) async fn wait_for_component_gone(&self, uuid: &str) -> Result<(), EditorError> {
        let deadline = Instant::now() + self.config().element_timeout;
        loop {
            match self.scan_components().await {
                Ok(scan) => {
                    if !scan.iter().any(|c| c.uuid == uuid) {
                        return Ok(());
                    }
                }
                Err(EditorError::PreviewNotLoaded(_)) => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(EditorError::ComponentStillPresent(uuid.to_string()));
            }
            tokio::time::sleep(self.config().poll_interval).await;
        }
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
