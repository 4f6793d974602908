//! Text output module
//!
//! The transcript's destination is the system clipboard. The trait seam
//! keeps the daemon testable and leaves room for other destinations.

pub mod clipboard;

use crate::error::OutputError;

/// Trait for text output implementations
#[async_trait::async_trait]
pub trait TextOutput: Send + Sync {
    /// Place text at the destination
    async fn set_text(&self, text: &str) -> Result<(), OutputError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Factory function for the clipboard output
pub fn create_clipboard() -> Box<dyn TextOutput> {
    Box::new(clipboard::WlCopyClipboard::new())
}
