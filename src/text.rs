//! Line-oriented text reconstruction for documents
//!
//! Documents are decoded leniently (invalid UTF-8 becomes U+FFFD), split on
//! `\n`, `\r\n` or a lone `\r`, and joined back according to a [`LinePolicy`].
//! With the default [`LinePolicy::Concatenate`] the terminators are dropped,
//! so `"a\nb\nc"` reads as `"abc"`.

use crate::config::LinePolicy;
use crate::error::Result;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read a whole stream and rebuild its text line by line
///
/// # Errors
///
/// Returns an I/O error if reading the stream fails. Decoding never fails.
pub async fn accumulate_lines<R>(mut reader: R, policy: LinePolicy) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).await?;
    Ok(join_lines(&String::from_utf8_lossy(&raw), policy))
}

/// Join the lines of already-decoded text according to `policy`
///
/// A trailing terminator never yields an extra empty line.
pub fn join_lines(text: &str, policy: LinePolicy) -> String {
    let lines = split_lines(text);
    match policy {
        LinePolicy::Concatenate => lines.concat(),
        LinePolicy::PreserveNewlines => lines.join("\n"),
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    // '\r' and '\n' are ASCII, so every cut lands on a char boundary
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}
