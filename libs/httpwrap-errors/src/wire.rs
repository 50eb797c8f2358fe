//! Wire-level constants and helpers shared by every response writer.

use http::StatusCode;

/// Content type of the default plain-text error body.
pub const TEXT_PLAIN_UTF_8: &str = "text/plain; charset=utf-8";

/// Map a caller-supplied code onto a status a response can carry.
///
/// Codes outside `100..=999` cannot be written and become `500`.
#[must_use]
pub fn status_or_internal(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Body of the default plain-text error: the message followed by one newline.
#[must_use]
pub fn plain_text_body(message: &str) -> String {
    let mut body = String::with_capacity(message.len() + 1);
    body.push_str(message);
    body.push('\n');
    body
}
