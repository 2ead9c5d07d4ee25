//! Browser instance manager.
//!
//! Attaches to a Chrome already listening on the debug port, or launches one
//! with a persistent profile so the operator's login survives restarts. Pages
//! handed to the engine are tracked here so views opened by the site itself
//! can be told apart from the ones we already drive.

mod manager_core;
mod manager_pages;
mod manager_types;

pub use manager_core::BrowserManager;
pub use manager_types::{BrowserError, BrowserManagerConfig};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
