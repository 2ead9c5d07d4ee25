//! Chrome DevTools Protocol (CDP) client implementation.
//!
//! Connects to Chrome/Chromium via WebSocket and speaks the CDP JSON-RPC
//! protocol. One background task reads the socket and routes responses to
//! their callers and events to the page session they belong to.
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
//!    let client = CdpClient::connect("http://localhost:9222", Duration::from_secs(30)).await?;
//!    let page = client.new_page(None).await?;
//!    page.navigate("http://example.com", LoadEvent::DomContentLoaded, Duration::from_secs(10)).await?;
//!    ```

mod client;
mod error;
mod events;
#[cfg(test)]
pub(crate) mod fake;
mod protocol;
mod session;
mod transport;

pub use client::CdpClient;
pub use error::CdpError;
pub use events::{LoadEvent, PageEvents};
pub use protocol::*;
pub use session::PageSession;
