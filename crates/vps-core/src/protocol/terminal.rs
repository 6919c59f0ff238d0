//! Command lines written to the Terminal characteristic.

use crate::domain::error::BridgeError;

/// Decodes a Terminal write into a shell command line.
///
/// Trailing newlines (added by some controller keyboards) are stripped.
///
/// # Errors
///
/// Returns [`BridgeError::MalformedInput`] for non-UTF-8 or blank payloads.
pub fn decode_command_line(payload: &[u8]) -> Result<String, BridgeError> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| BridgeError::MalformedInput("terminal payload is not UTF-8".into()))?;
    let line = text.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(BridgeError::MalformedInput("terminal command is empty".into()));
    }
    Ok(line.to_string())
}
