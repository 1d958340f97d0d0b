//! CDP protocol types and message definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CDP request message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP response message.
#[derive(Debug, Deserialize)]
pub struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP error in response.
#[derive(Debug, Deserialize)]
pub struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
    pub data: Option<String>,
}

/// Page info from /json endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub title: String,
    pub url: String,
    pub web_socket_debugger_url: Option<String>,
}

/// Browser version info.
///
/// Note: Chrome returns PascalCase field names for this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,
    #[serde(rename = "User-Agent")]
    pub user_agent: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

// ============================================================================
// DOM Types
// ============================================================================

/// DOM node from CDP.
///
/// Retrieved with `pierce: true`, so iframe content documents appear inline
/// under their frame element via `content_document`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomNode {
    pub node_id: i64,
    pub backend_node_id: i64,
    pub node_type: i64,
    pub node_name: String,
    pub local_name: Option<String>,
    pub node_value: Option<String>,
    pub child_node_count: Option<i64>,
    pub children: Option<Vec<DomNode>>,
    pub attributes: Option<Vec<String>>,
    pub frame_id: Option<String>,
    pub content_document: Option<Box<DomNode>>,
    pub shadow_roots: Option<Vec<DomNode>>,
}

impl DomNode {
    /// Look up an attribute value. CDP flattens attributes into a
    /// name/value/name/value list.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .as_deref()?
            .chunks(2)
            .find(|pair| pair[0] == name)
            .and_then(|pair| pair.get(1))
            .map(String::as_str)
    }

    /// Walk the (pierced) tree looking for an `<iframe>` element with the
    /// given `id` attribute, returning its content document.
    pub fn find_frame(&self, frame_element_id: &str) -> Option<&DomNode> {
        if self.node_name.eq_ignore_ascii_case("iframe")
            && self.attribute("id") == Some(frame_element_id)
        {
            return self.content_document.as_deref();
        }
        for child in self.children.as_deref().unwrap_or_default() {
            if let Some(doc) = child.find_frame(frame_element_id) {
                return Some(doc);
            }
        }
        if let Some(doc) = &self.content_document {
            if let Some(found) = doc.find_frame(frame_element_id) {
                return Some(found);
            }
        }
        None
    }
}

/// Box model from CDP.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxModel {
    pub content: Vec<f64>,
    pub padding: Vec<f64>,
    pub border: Vec<f64>,
    pub margin: Vec<f64>,
    pub width: i64,
    pub height: i64,
}

// ============================================================================
// Input Types
// ============================================================================

/// Mouse button.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    None,
    Left,
    Middle,
    Right,
}

/// Mouse event type.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventType {
    MousePressed,
    MouseReleased,
    MouseMoved,
}

/// Key event type.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEventType {
    KeyDown,
    KeyUp,
    Char,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
