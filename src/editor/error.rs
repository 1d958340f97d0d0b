//! Editor command errors.

use thiserror::Error;

use crate::cdp::CdpError;

/// Errors surfaced by editor commands. Any unmet expectation aborts the
/// calling test; none of these are retried internally.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Cdp(#[from] CdpError),

    #[error("Preview frame '#{0}' has no loaded document")]
    PreviewNotLoaded(String),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Component '{0}' still present after delete")]
    ComponentStillPresent(String),

    #[error("Rich text field not found: {0}")]
    FieldNotFound(String),

    #[error("Editor dialog did not open")]
    DialogNotOpen,

    #[error("Dialog form has no action attribute")]
    MissingFormAction,

    #[error("No clickable '{0}' control")]
    ControlNotFound(String),
}
