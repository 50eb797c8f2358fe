//! RFC 7807 Problem Details (legacy revision).
//!
//! Kept for producers that still emit the earlier revision. On the wire it is
//! indistinguishable from [`Problem`]: same members, same media type.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::document::{ABOUT_BLANK, DocumentRef, RawDocument};
use crate::http_error::HttpError;
use crate::problem::{APPLICATION_PROBLEM_JSON, Problem};

/// RFC 7807 Problem Details.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawDocument")]
#[must_use]
pub struct Rfc7807Problem {
    pub type_url: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
    pub extensions: Map<String, Value>,
}

impl Rfc7807Problem {
    pub fn new(status: u16, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: ABOUT_BLANK.to_owned(),
            title: title.into(),
            status,
            detail: detail.into(),
            instance: String::new(),
            extensions: Map::new(),
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request", detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(403, "Forbidden", detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found", detail)
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.detail
    }

    fn document(&self) -> DocumentRef<'_> {
        DocumentRef {
            type_url: &self.type_url,
            title: &self.title,
            status: self.status,
            detail: &self.detail,
            instance: &self.instance,
            extensions: &self.extensions,
        }
    }

    #[must_use]
    pub fn to_json_value(&self) -> Value {
        self.document().to_value()
    }

    pub fn to_http_error(&self) -> HttpError {
        HttpError::new(self.status, self.document().to_json_string())
            .with_content_type(APPLICATION_PROBLEM_JSON)
    }

    /// Copy into the RFC 9457 representation.
    pub fn to_current(&self) -> Problem {
        Problem {
            type_url: self.type_url.clone(),
            title: self.title.clone(),
            status: self.status,
            detail: self.detail.clone(),
            instance: self.instance.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

impl Serialize for Rfc7807Problem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.document().serialize(serializer)
    }
}

impl From<RawDocument> for Rfc7807Problem {
    fn from(raw: RawDocument) -> Self {
        Self {
            type_url: raw.type_url,
            title: raw.title,
            status: raw.status,
            detail: raw.detail,
            instance: raw.instance,
            extensions: raw.extensions,
        }
    }
}

impl From<Rfc7807Problem> for HttpError {
    fn from(problem: Rfc7807Problem) -> Self {
        problem.to_http_error()
    }
}

impl From<Rfc7807Problem> for Problem {
    fn from(legacy: Rfc7807Problem) -> Self {
        Self {
            type_url: legacy.type_url,
            title: legacy.title,
            status: legacy.status,
            detail: legacy.detail,
            instance: legacy.instance,
            extensions: legacy.extensions,
        }
    }
}

impl fmt::Display for Rfc7807Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.status, self.title, self.detail)
    }
}

impl std::error::Error for Rfc7807Problem {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn new_and_display() {
        let p = Rfc7807Problem::new(403, "Forbidden", "Insufficient permissions");
        assert_eq!(p.type_url, "about:blank");
        assert_eq!(p.status_code(), 403);
        assert_eq!(p.error_message(), "Insufficient permissions");
        assert_eq!(p.to_string(), "403: Forbidden - Insufficient permissions");
    }

    #[test]
    fn to_http_error_serializes_all_members() {
        let p = Rfc7807Problem::new(403, "Forbidden", "Access denied")
            .with_type("https://example.com/errors/forbidden")
            .with_instance("/api/resource/123")
            .with_extension("user_id", "abc123");

        let http = p.to_http_error();
        assert_eq!(http.status_code(), 403);
        assert_eq!(http.content_type(), Some(APPLICATION_PROBLEM_JSON));

        let body: Value = serde_json::from_str(http.message()).unwrap();
        assert_eq!(body["type"], "https://example.com/errors/forbidden");
        assert_eq!(body["title"], "Forbidden");
        assert_eq!(body["status"], 403);
        assert_eq!(body["detail"], "Access denied");
        assert_eq!(body["instance"], "/api/resource/123");
        assert_eq!(body["user_id"], "abc123");
    }

    #[test]
    fn http_error_body_starts_with_type() {
        let http = Rfc7807Problem::forbidden("Access denied").to_http_error();
        assert!(http.message().starts_with(r#"{"type":"about:blank","title":"#));
    }

    #[test]
    fn helpers_and_custom_title() {
        let p = Rfc7807Problem::bad_request("Invalid input");
        assert_eq!((p.status, p.title.as_str()), (400, "Bad Request"));

        let p = Rfc7807Problem::not_found("Resource not found").with_title("Missing Resource");
        assert_eq!((p.status, p.title.as_str()), (404, "Missing Resource"));

        let p = Rfc7807Problem::forbidden("Access denied");
        assert_eq!(p.status, 403);
    }

    #[test]
    fn round_trips_through_current_revision() {
        let legacy = Rfc7807Problem::bad_request("Invalid user ID format")
            .with_type("https://example.com/errors/validation")
            .with_instance("/api/users/abc")
            .with_extension("invalid_field", "user_id")
            .with_extension("expected_format", "numeric");

        let current = legacy.to_current();
        assert_eq!(current.to_legacy(), legacy);

        let owned: Problem = legacy.clone().into();
        assert_eq!(owned, current);
        assert_eq!(owned.to_json_value(), legacy.to_json_value());
    }
}
