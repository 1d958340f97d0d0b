//! Editor test commands.
//!
//! The commands in this module drive an iframe-embedded visual page editor
//! the way a test script's user would: locate an element, click it, then
//! suspend until either one matching server round trip completes, an
//! expected element (dis)appears, or a fixed settle delay elapses. Failures
//! abort the calling test; there are no retries.

mod commands;
mod config;
mod error;
mod scan;

pub use commands::{ComponentHandle, EditorSession, Placement, SaveMode};
pub use config::EditorConfig;
pub use error::EditorError;
pub use scan::{ComponentInfo, ComponentQuery};
