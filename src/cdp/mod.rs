//! Chrome DevTools Protocol (CDP) client implementation.
//!
//! This module provides a pure Rust CDP client for driving the browser under
//! test. It connects to Chrome/Chromium via WebSocket and communicates using
//! the CDP JSON-RPC protocol.
//!
//! ## Usage
//!
//! 1. Start Chrome with remote debugging:
//!    ```bash
//!    chrome --remote-debugging-port=9222
//!    ```
//!
//! 2. Connect and automate:
//!    ```rust,ignore
//!    let client = CdpClient::connect("http://localhost:9222").await?;
//!    let page = client.new_page(Some("https://example.com")).await?;
//!    page.click_selector("#me-save-btn").await?;
//!    ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::*;
pub use session::{PageSession, RequestPattern, RoundTrip, RoundTripResponse};
