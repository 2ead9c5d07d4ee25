//! Console side of the manual sign-in gate.

use std::io::BufRead;
use std::sync::Arc;

use async_trait::async_trait;
use matchpilot_core::{LoginInstructions, OperatorPrompt};
use tokio::sync::Notify;
use tracing::{debug, info};

/// Prints sign-in instructions for the person at the terminal.
pub(crate) struct ConsolePrompt;

impl ConsolePrompt {
    fn banner(instructions: &LoginInstructions) -> String {
        let rule = "=".repeat(64);
        format!(
            "{rule}\n\
             MANUAL SIGN-IN REQUIRED\n\
             {rule}\n\
             1. In the Chrome window, open: {url}\n\
             2. Sign in as: {name}\n\
             3. If the https:// address shows 404, use the plain http:// one.\n\
             4. Press Enter here once the dashboard is showing.\n\
             The run continues on its own as soon as the dashboard is detected.\n\
             {rule}",
            rule = rule,
            url = instructions.entry_url,
            name = instructions.identity_name,
        )
    }
}

#[async_trait]
impl OperatorPrompt for ConsolePrompt {
    async fn announce_login(&self, instructions: &LoginInstructions) {
        info!(
            entry_url = %instructions.entry_url,
            identity = %instructions.identity_name,
            "Waiting for manual sign-in"
        );
        println!("{}", Self::banner(instructions));
    }
}

/// Wake `wake` every time the operator presses Enter.
///
/// Uses a plain thread: a blocked read on tokio's stdin would keep the
/// runtime from shutting down.
pub(crate) fn spawn_enter_listener(wake: Arc<Notify>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() {
                break;
            }
            debug!("Operator pressed Enter");
            wake.notify_one();
        }
    });
}
