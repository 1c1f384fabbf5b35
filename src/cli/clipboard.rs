//! Clipboard copy with a timed clear.
//!
//! The clear runs on a background thread; the caller keeps the original
//! clipboard handle alive and joins the thread, since on X11 the copied
//! text disappears once its owner is dropped.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use arboard::Clipboard;
use tracing::debug;
use zeroize::Zeroizing;

use crate::errors::{KeystashError, Result};

/// A value placed on the clipboard, pending its scheduled clear.
pub struct ClipboardLease {
    _owner: Clipboard,
    clearer: JoinHandle<Result<()>>,
}

impl ClipboardLease {
    /// Block until the clipboard has been cleared.
    pub fn wait(self) -> Result<()> {
        self.clearer
            .join()
            .map_err(|_| KeystashError::Clipboard("clipboard clearer panicked".into()))?
    }
}

/// Put `value` on the clipboard and schedule it to be wiped after `ttl`.
///
/// The clear only happens if the clipboard still holds `value`, so text
/// the user copied in the meantime is left alone.
pub fn copy_with_clear(value: &str, ttl: Duration) -> Result<ClipboardLease> {
    let mut owner = Clipboard::new().map_err(|e| KeystashError::Clipboard(e.to_string()))?;
    owner
        .set_text(value.to_owned())
        .map_err(|e| KeystashError::Clipboard(e.to_string()))?;

    let expected = Zeroizing::new(value.to_owned());
    let clearer = thread::spawn(move || {
        thread::sleep(ttl);
        let mut clipboard =
            Clipboard::new().map_err(|e| KeystashError::Clipboard(e.to_string()))?;
        let current = clipboard.get_text().map(Zeroizing::new).ok();
        if current.as_deref().map(String::as_str) == Some(expected.as_str()) {
            clipboard
                .set_text(String::new())
                .map_err(|e| KeystashError::Clipboard(e.to_string()))?;
            debug!("clipboard cleared");
        } else {
            debug!("clipboard changed since copy, leaving it alone");
        }
        Ok(())
    });

    Ok(ClipboardLease {
        _owner: owner,
        clearer,
    })
}
