//! Bounded previews of process output for log lines and error messages.

/// Maximum number of characters of command output shown in logs and error messages
pub const OUTPUT_PREVIEW_LIMIT: usize = 200;

/// Output text cut to at most `limit` characters, with `...` appended when cut.
///
/// Cuts on a character boundary so multi-byte UTF-8 output never produces a broken preview.
pub fn preview(output: &[u8], limit: usize) -> String {
    let text = String::from_utf8_lossy(output);
    let text = text.trim_end();
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// [`preview`] with the default limit
pub fn default_preview(output: &[u8]) -> String {
    preview(output, OUTPUT_PREVIEW_LIMIT)
}
