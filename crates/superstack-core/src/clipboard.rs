//! OS clipboard access through `cli-clipboard`, which picks the platform
//! backend (macOS pasteboard, Windows clipboard, X11 or Wayland).

use cli_clipboard::{ClipboardContext, ClipboardProvider};

use crate::error::{Result, SuperstackError};

/// Replace the clipboard contents with `text`.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut ctx = ClipboardContext::new()
        .map_err(|e| SuperstackError::ClipboardUnavailable(e.to_string()))?;
    ctx.set_contents(text.to_owned())
        .map_err(|e| SuperstackError::ClipboardFailed(e.to_string()))?;
    tracing::debug!(bytes = text.len(), "copied to clipboard");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_succeeds_or_reports_a_clipboard_error() {
        // Headless machines have no clipboard; either outcome is fine as long
        // as failure comes back as one of the clipboard variants.
        match copy_to_clipboard("superstack clipboard test") {
            Ok(()) => {}
            Err(SuperstackError::ClipboardUnavailable(_))
            | Err(SuperstackError::ClipboardFailed(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
