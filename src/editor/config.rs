//! Editor DOM/endpoint conventions and timeouts.

use std::time::Duration;

/// Conventions of the application under test, plus wait tuning.
///
/// The defaults match the reference editor: a preview iframe with a known
/// element id, components carrying a `data-uuid` attribute, a custom dialog
/// element, and an AJAX endpoint under `/mercury-editor/`.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Element id of the iframe hosting the live preview.
    pub preview_frame_id: String,
    /// URL path prefix of the editing server's endpoints.
    pub endpoint_prefix: String,
    /// Selector for the editor dialog element.
    pub dialog_selector: String,
    /// Attribute carrying the component identifier.
    pub component_attr: String,
    /// Maximum wait for one server round trip.
    pub round_trip_timeout: Duration,
    /// Maximum wait for an element to appear or disappear.
    pub element_timeout: Duration,
    /// Interval between DOM re-scans while waiting.
    pub poll_interval: Duration,
    /// Settle delay after programmatic widget updates.
    pub settle_delay: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            preview_frame_id: "me-preview".to_string(),
            endpoint_prefix: "/mercury-editor/".to_string(),
            dialog_selector: "mercury-dialog.lpb-dialog".to_string(),
            component_attr: "data-uuid".to_string(),
            round_trip_timeout: Duration::from_secs(10),
            element_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
            settle_delay: Duration::from_millis(500),
        }
    }
}
