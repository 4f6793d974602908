//! Clipboard output via wl-copy
//!
//! Uses wl-copy to place text on the Wayland clipboard. Works on all
//! Wayland compositors; requires the wl-clipboard package.

use super::TextOutput;
use crate::error::OutputError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Clipboard destination backed by wl-copy
pub struct WlCopyClipboard;

impl WlCopyClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WlCopyClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextOutput for WlCopyClipboard {
    async fn set_text(&self, text: &str) -> Result<(), OutputError> {
        if text.is_empty() {
            return Ok(());
        }

        let mut child = Command::new("wl-copy")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OutputError::WlCopyNotFound
                } else {
                    OutputError::ClipboardFailed(e.to_string())
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| OutputError::ClipboardFailed(e.to_string()))?;
            // Close stdin to signal EOF
            drop(stdin);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| OutputError::ClipboardFailed(e.to_string()))?;

        if !status.success() {
            return Err(OutputError::ClipboardFailed(
                "wl-copy exited with error".to_string(),
            ));
        }

        tracing::info!("Text copied to clipboard ({} chars)", text.chars().count());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "clipboard (wl-copy)"
    }
}
