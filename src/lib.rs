//! End-to-end test commands for an iframe-embedded visual page editor.
//!
//! Test scripts use this crate to drive a page-building editor the way a
//! user would: add, edit, delete and save content components, choose
//! layouts, set rich-text field values, and enter/save/exit the editor.
//! The browser is controlled over the Chrome DevTools Protocol (CDP); no
//! Node.js tooling is involved.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    WebSocket     ┌──────────────────┐
//! │ EditorSession   │ ◄──────────────► │   Chrome/Edge    │
//! │ over CdpClient  │       CDP        │  (page under     │
//! │  (this crate)   │                  │   test)          │
//! └─────────────────┘                  └──────────────────┘
//! ```
//!
//! The page under test hosts its live preview in an iframe; components in
//! the preview carry a unique identifier attribute. Each command issues one
//! user-like action, then suspends until a specific condition is observed:
//! one matching server round trip, an element appearing or disappearing, or
//! a fixed settle delay. Commands run strictly sequentially.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mercury_e2e::{Browser, BrowserConfig, ComponentQuery, EditorConfig, EditorSession, Placement};
//!
//! let browser = Browser::launch(BrowserConfig::default()).await?;
//! let page = browser.open("https://site.test/node/1").await?;
//! let editor = EditorSession::new(page.into(), EditorConfig::default());
//!
//! editor.edit_page().await?;
//! editor.add_component("text", Placement::FirstAvailable).await?;
//! editor.set_rich_text_value("body", "<p>Hello</p>").await?;
//! let saved = editor.save_component().await?;
//! assert_eq!(saved.len(), 1);
//!
//! let hero = editor.find_component(&ComponentQuery::Position(1)).await?;
//! editor.save_page().await?;
//! editor.exit_editor().await?;
//! ```
//!
//! ## Commands
//!
//! - `edit_page` / `save_page` / `delete_page` / `exit_editor` — page
//!   lifecycle around the editor.
//! - `add_component` — open the add flow at a placement (first available,
//!   region of a section, or before/after an anchor) and pick a type.
//! - `choose_layout` — pick a layout option, wait for the rebuilt dialog.
//! - `save_component` — submit the open dialog; returns handles for the
//!   edited component, or for the newly created one(s) discovered by
//!   diffing the preview's identifier set.
//! - `set_rich_text_value` — set a named rich-text field through the
//!   widget's live instance.
//! - `find_component` — look up a component by text fragment (last match in
//!   document order) or 1-based position.
//! - `edit_component` / `delete_component` — per-component dialogs.

pub mod cdp;
pub mod chrome;
pub mod editor;

pub use cdp::{CdpClient, CdpError, PageSession, RequestPattern, RoundTripResponse};
pub use chrome::{Browser, BrowserConfig, BrowserError};
pub use editor::{
    ComponentHandle, ComponentInfo, ComponentQuery, EditorConfig, EditorError, EditorSession,
    Placement, SaveMode,
};
