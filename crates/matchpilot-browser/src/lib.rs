//! # matchpilot Browser
//!
//! Drives Chrome over the DevTools Protocol and exposes it to the
//! orchestration engine as a [`RemoteSession`](matchpilot_core::RemoteSession).
//!
//! ## Layers
//!
//! - [`cdp`]: WebSocket transport, protocol types and per-page sessions.
//! - [`manager`]: finds or launches Chrome and tracks the pages we drive.
//! - [`remote`]: the `RemotePage`/`RemoteSession` implementations.

pub mod cdp;
pub mod manager;
pub mod remote;

pub use cdp::{CdpClient, CdpError, PageSession};
pub use manager::{BrowserError, BrowserManager, BrowserManagerConfig};
pub use remote::CdpPage;
