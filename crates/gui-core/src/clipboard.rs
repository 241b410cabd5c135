// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 resocks5 Contributors

//! Copy-address affordance

use std::sync::Mutex;
use std::time::Duration;

use resocks5_common::{Error, Result};

/// How long the "copied" confirmation stays visible
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_secs(3);

/// System clipboard seam
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Clipboard backed by `arboard`
///
/// The handle is kept open after the first write: on X11 and Wayland the
/// copied text is only served while the owning handle is alive.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| Error::Clipboard("clipboard lock poisoned".to_string()))?;

        if guard.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
            *guard = Some(clipboard);
        }

        match guard.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_owned())
                .map_err(|e| Error::Clipboard(e.to_string())),
            None => Err(Error::Clipboard("clipboard unavailable".to_string())),
        }
    }
}

/// Transient "copied" confirmation
#[derive(Debug, Default)]
pub struct CopyFeedback {
    writing: bool,
    copied: bool,
}

impl CopyFeedback {
    pub fn is_copied(&self) -> bool {
        self.copied
    }

    /// Handle a copy request. Returns the text to write, or `None` while a
    /// write is pending, the confirmation is showing, or there is nothing to copy.
    pub fn request(&mut self, address: Option<&str>) -> Option<String> {
        if self.writing || self.copied {
            return None;
        }

        let address = address?;
        self.writing = true;
        Some(address.to_string())
    }

    /// Apply the clipboard write. Returns true when the confirmation starts.
    pub fn apply_written(&mut self, result: Result<()>) -> bool {
        self.writing = false;
        match result {
            Ok(()) => {
                self.copied = true;
                true
            }
            Err(e) => {
                tracing::warn!("Failed to copy local address: {}", e);
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.copied = false;
    }
}
