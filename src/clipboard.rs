//! Clipboard sink
//!
//! Thin seam over the OS clipboard so the navigator can be exercised in
//! tests without touching a real display server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard write failed: {0}")]
    WriteFailed(String),
}

/// Writes a string payload to a clipboard. No read-back is ever needed.
pub trait ClipboardSink {
    fn write_text(&mut self, payload: &str) -> Result<(), ClipboardError>;
}

/// The OS clipboard, backed by arboard. The inner clipboard handle is
/// opened lazily on first write so that merely starting the program does
/// not require a display server.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, payload: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
            self.inner = Some(clipboard);
        }
        if let Some(clipboard) = self.inner.as_mut() {
            clipboard
                .set_text(payload.to_string())
                .map_err(|err| ClipboardError::WriteFailed(err.to_string()))?;
        }
        Ok(())
    }
}

/// In-memory sink for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

#[cfg(test)]
impl ClipboardSink for MemoryClipboard {
    fn write_text(&mut self, payload: &str) -> Result<(), ClipboardError> {
        self.contents = Some(payload.to_string());
        Ok(())
    }
}

/// Sink whose writes always fail, for exercising the recovery path.
#[cfg(test)]
pub struct FailingClipboard;

#[cfg(test)]
impl ClipboardSink for FailingClipboard {
    fn write_text(&mut self, _payload: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unavailable(
            "no display server".to_string(),
        ))
    }
}
