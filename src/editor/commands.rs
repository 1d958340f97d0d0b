//! The editor command surface.
//!
//! Each command is one user-like action followed by a single suspension: a
//! matching server round trip, an element wait, or a settle delay. Commands
//! are strictly sequential; a session drives one browser page.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::cdp::{CdpError, PageSession, RequestPattern};

use super::config::EditorConfig;
use super::error::EditorError;

/// Reference to a component in the preview document.
#[derive(Debug, Clone)]
pub struct ComponentHandle {
    /// Value of the component identifier attribute.
    pub uuid: String,
    /// DOM node id inside the preview document, valid until the preview is
    /// next replaced by a server update.
    pub node_id: i64,
}

/// Where `add_component` opens the add flow.
#[derive(Debug, Clone)]
pub enum Placement {
    /// First add control in the preview document.
    FirstAvailable,
    /// Add control of a named region within a section.
    Region { section: String, region: String },
    /// Add control directly before the anchor element.
    Before(String),
    /// Add control directly after the anchor element.
    After(String),
}

/// Whether a dialog save edits an existing component or creates a new one,
/// derived from the dialog form's action path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveMode {
    Edit(String),
    Create,
}

/// Parse a dialog form action into a save mode. Edit forms post to
/// `.../edit/{uuid}`; anything else is a create.
pub(super) fn parse_form_action(action: &str) -> SaveMode {
    let parts: Vec<&str> = action.trim_end_matches('/').split('/').collect();
    if parts.len() >= 2 && parts[parts.len() - 2] == "edit" {
        SaveMode::Edit(parts[parts.len() - 1].to_string())
    } else {
        SaveMode::Create
    }
}

/// Selector for the add control implied by a placement.
pub(super) fn add_button_selector(placement: &Placement) -> String {
    match placement {
        Placement::FirstAvailable => ".lpb-btn--add".to_string(),
        Placement::Region { section, region } => {
            format!("{section} [data-region=\"{region}\"] .lpb-btn--add")
        }
        Placement::Before(anchor) => format!("{anchor} > .lpb-btn--add.before"),
        Placement::After(anchor) => format!("{anchor} > .lpb-btn--add.after"),
    }
}

/// Selector for the editable region of a named rich-text field. Field
/// machine names use underscores; the DOM classes use dashes.
pub(super) fn rich_text_selector(field: &str) -> String {
    format!(
        ".field--name-field-{} .ck-content[contenteditable=true]",
        field.replace('_', "-")
    )
}

/// Drives the editor on one browser page.
pub struct EditorSession {
    page: Arc<PageSession>,
    config: EditorConfig,
}

impl EditorSession {
    /// Create a session over an attached page.
    pub fn new(page: Arc<PageSession>, config: EditorConfig) -> Self {
        Self { page, config }
    }

    /// The underlying CDP page session.
    pub fn page(&self) -> &PageSession {
        &self.page
    }

    /// The editor conventions in effect.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Open the add-component flow at the given placement and pick a
    /// component type. Leaves the creation dialog open.
    pub async fn add_component(
        &self,
        type_id: &str,
        placement: Placement,
    ) -> Result<(), EditorError> {
        let doc = self.preview_document().await?;
        let selector = add_button_selector(&placement);
        debug!("Adding '{}' component via '{}'", type_id, selector);

        self.page.click_selector_in(doc, &selector).await?;
        self.page
            .wait_for_selector(".lpb-component-list", self.config.element_timeout)
            .await?;
        self.page
            .click_selector(&format!(".type-{type_id} a"))
            .await?;
        self.wait_for_dialog().await?;
        Ok(())
    }

    /// Select a layout option in the open dialog and wait for the server to
    /// rebuild it.
    pub async fn choose_layout(&self, layout_id: &str) -> Result<(), EditorError> {
        let round_trip = self
            .page
            .expect_round_trip(RequestPattern::post(&self.config.endpoint_prefix))
            .await;
        self.page
            .click_selector(&format!("input[value=\"{layout_id}\"] + label"))
            .await?;
        round_trip.wait(self.config.round_trip_timeout).await?;
        self.wait_for_dialog().await?;
        Ok(())
    }

    /// Submit the open dialog and return handles for the saved component(s).
    ///
    /// An edit form names the component it edits; the handle for that
    /// identifier is returned once the preview shows it again. A create form
    /// does not, so the preview's identifier set is captured before the save
    /// and re-scanned afterwards until new identifiers appear.
    pub async fn save_component(&self) -> Result<Vec<ComponentHandle>, EditorError> {
        let before: HashSet<String> = self
            .scan_components()
            .await?
            .into_iter()
            .map(|c| c.uuid)
            .collect();
        let mode = self.dialog_save_mode().await?;
        debug!("Saving component ({:?})", mode);

        let round_trip = self
            .page
            .expect_round_trip(RequestPattern::post(&self.config.endpoint_prefix))
            .await;
        self.page
            .click_selector(".me-dialog__buttonpane .lpb-btn--save")
            .await?;
        round_trip.wait(self.config.round_trip_timeout).await?;

        match mode {
            SaveMode::Edit(uuid) => Ok(vec![self.wait_for_component(&uuid).await?]),
            SaveMode::Create => self.wait_for_new_components(&before).await,
        }
    }

    /// Set the content of a named rich-text field through the widget's live
    /// instance, then let it settle.
    pub async fn set_rich_text_value(&self, field: &str, value: &str) -> Result<(), EditorError> {
        let node_id = self
            .page
            .query_selector(&rich_text_selector(field))
            .await?
            .ok_or_else(|| EditorError::FieldNotFound(field.to_string()))?;
        let object_id = self.page.resolve_node(node_id).await?;

        let result = self
            .page
            .call_function_on(
                &object_id,
                r#"function (value) {
  if (!this.ckeditorInstance) return false;
  this.ckeditorInstance.setData(value);
  return true;
}"#,
                Some(vec![serde_json::Value::String(value.to_string())]),
            )
            .await?;
        if result.as_bool() != Some(true) {
            return Err(EditorError::FieldNotFound(field.to_string()));
        }
        tokio::time::sleep(self.config.settle_delay).await;
        Ok(())
    }

    /// Navigate from the content view into the editor; returns once the
    /// preview iframe has a loaded document.
    pub async fn edit_page(&self) -> Result<(), EditorError> {
        self.page.click_selector("a.me-edit-screen-toggle").await?;

        let deadline = Instant::now() + self.config.element_timeout;
        loop {
            match self.preview_document().await {
                Ok(_) => return Ok(()),
                Err(EditorError::PreviewNotLoaded(_)) => {}
                Err(e) => return Err(e),
            }
            if Instant::now() >= deadline {
                return Err(EditorError::PreviewNotLoaded(
                    self.config.preview_frame_id.clone(),
                ));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Trigger the page-level save and wait for its round trip.
    pub async fn save_page(&self) -> Result<(), EditorError> {
        let round_trip = self
            .page
            .expect_round_trip(RequestPattern::post(&self.config.endpoint_prefix))
            .await;
        self.page.click_selector("#me-save-btn").await?;
        round_trip.wait(self.config.round_trip_timeout).await?;
        Ok(())
    }

    /// Trigger the delete action and confirm it in the dialog that follows.
    pub async fn delete_page(&self) -> Result<(), EditorError> {
        let clicked = self
            .page
            .evaluate(
                r#"(() => {
  const link = Array.from(document.querySelectorAll("a"))
    .find((a) => (a.textContent || "").includes("Delete"));
  if (!link) return false;
  link.click();
  return true;
})()"#,
            )
            .await?;
        if clicked.as_bool() != Some(true) {
            return Err(EditorError::ControlNotFound("a:Delete".to_string()));
        }

        // The confirm button renders asynchronously; click it once visible.
        let deadline = Instant::now() + self.config.element_timeout;
        loop {
            let confirmed = self
                .page
                .evaluate(
                    r#"(() => {
  const button = Array.from(document.querySelectorAll(".button--primary"))
    .find((b) => b.offsetParent !== null && (b.textContent || "").includes("Delete"));
  if (!button) return false;
  button.click();
  return true;
})()"#,
                )
                .await?;
            if confirmed.as_bool() == Some(true) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(EditorError::ControlNotFound(
                    ".button--primary:Delete".to_string(),
                ));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Leave the editor via the done action.
    pub async fn exit_editor(&self) -> Result<(), EditorError> {
        self.page.click_selector("#me-done-btn").await?;
        self.page.wait_for_load(self.config.element_timeout).await?;
        Ok(())
    }

    /// Open the edit dialog for an existing component.
    pub async fn edit_component(&self, component: &ComponentHandle) -> Result<(), EditorError> {
        let doc = self.preview_document().await?;
        let selector = format!("{} .lpb-edit", self.component_selector(&component.uuid));

        let round_trip = self
            .page
            .expect_round_trip(RequestPattern::post(&self.config.endpoint_prefix))
            .await;
        self.page.click_selector_in(doc, &selector).await?;
        round_trip.wait(self.config.round_trip_timeout).await?;
        self.wait_for_dialog().await?;
        Ok(())
    }

    /// Delete an existing component, confirming through the dialog, and wait
    /// until it is gone from the preview.
    pub async fn delete_component(&self, component: &ComponentHandle) -> Result<(), EditorError> {
        let doc = self.preview_document().await?;
        let selector = format!("{} .lpb-delete", self.component_selector(&component.uuid));

        self.page.click_selector_in(doc, &selector).await?;
        self.wait_for_dialog().await?;
        self.page
            .click_selector(".me-dialog__buttonpane .lpb-btn--delete")
            .await?;
        self.wait_for_component_gone(&component.uuid).await?;
        Ok(())
    }

    /// Wait for the editor dialog to be present.
    async fn wait_for_dialog(&self) -> Result<i64, EditorError> {
        match self
            .page
            .wait_for_selector(&self.config.dialog_selector, self.config.element_timeout)
            .await
        {
            Ok(node_id) => Ok(node_id),
            Err(CdpError::Timeout(_)) => Err(EditorError::DialogNotOpen),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the open dialog's form action and classify the pending save.
    async fn dialog_save_mode(&self) -> Result<SaveMode, EditorError> {
        let form_selector = serde_json::to_string(&format!("{} form", self.config.dialog_selector))
            .map_err(CdpError::from)?;
        let expression = format!(
            r#"(() => {{
  const form = document.querySelector({form_selector});
  if (!form) return null;
  return form.getAttribute("action") || "";
}})()"#
        );

        let action = self.page.evaluate(&expression).await?;
        if action.is_null() {
            return Err(EditorError::DialogNotOpen);
        }
        let action = action.as_str().unwrap_or("");
        if action.is_empty() {
            return Err(EditorError::MissingFormAction);
        }
        Ok(parse_form_action(action))
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
