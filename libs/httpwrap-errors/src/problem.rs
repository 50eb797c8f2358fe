//! RFC 9457 Problem Details for HTTP APIs.
//!
//! [`Problem`] is the recommended representation. It serializes as a flat JSON object:
//! the standard members (`type`, `title`, `status`, `detail`, `instance`) followed by every
//! extension member at the top level.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::catalog::CommonProblemType;
use crate::document::{ABOUT_BLANK, DocumentRef, RawDocument};
use crate::http_error::HttpError;
use crate::rfc7807::Rfc7807Problem;

/// Content type for Problem Details, shared by RFC 7807 and RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Extension key holding a list of sub-problems.
pub const PROBLEMS_KEY: &str = "problems";
/// Extension key holding a trace identifier.
pub const TRACE_ID_KEY: &str = "trace-id";
/// Extension key holding a retry hint in seconds.
pub const RETRY_AFTER_KEY: &str = "retry-after";

/// Structural validation failure reported by [`Problem::validate`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProblemValidationError {
    #[error("problem status is missing")]
    MissingStatus,
    #[error("problem status {status} is outside 100..=599")]
    StatusOutOfRange { status: u16 },
    #[error("problem type {type_url:?} is not a valid URI: {source}")]
    InvalidType {
        type_url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Individual validation violation for a specific field or property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationViolation {
    /// field path, e.g. "email" or "user.email"
    pub field: String,
    /// Human-readable message describing the validation error
    pub message: String,
    /// Optional machine-readable error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ValidationViolation {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<ValidationViolation> for Value {
    fn from(v: ValidationViolation) -> Self {
        let mut entry = json!({ "field": v.field, "message": v.message });
        if let (Some(code), Some(obj)) = (v.code, entry.as_object_mut()) {
            obj.insert("code".to_owned(), Value::String(code));
        }
        entry
    }
}

/// RFC 9457 Problem Details for HTTP APIs.
///
/// Builder methods take `self` by value, so a chain of `with_*` calls always produces a
/// single owned value and never aliases another problem.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawDocument")]
#[must_use]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    /// When dereferenced, it might provide human-readable documentation.
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem. `0` means unset.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence of the problem.
    pub detail: String,
    /// A URI reference that identifies the specific occurrence of the problem.
    pub instance: String,
    /// Problem-specific members, flattened into the JSON document.
    pub extensions: Map<String, Value>,
}

impl Problem {
    /// Create a new Problem with `type` set to `about:blank`.
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

    /// Create a new Problem with an explicit `type` URI.
    pub fn new_with_type(
        status: u16,
        type_url: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(status, title, detail).with_type(type_url)
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_common_type(self, problem_type: CommonProblemType) -> Self {
        self.with_type(problem_type.uri())
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    /// Insert or overwrite one extension member.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Store a list of sub-problems under `"problems"`.
    pub fn with_multiple_problems<I>(self, problems: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let list: Vec<Value> = problems.into_iter().map(Into::into).collect();
        self.with_extension(PROBLEMS_KEY, list)
    }

    /// Store field-level violations under `"problems"`.
    pub fn with_violations(self, violations: Vec<ValidationViolation>) -> Self {
        self.with_multiple_problems(violations)
    }

    pub fn with_trace_id(self, id: impl Into<String>) -> Self {
        self.with_extension(TRACE_ID_KEY, id.into())
    }

    /// Store a retry hint under `"retry-after"`.
    ///
    /// This does not set a `Retry-After` response header.
    pub fn with_retry_after(self, seconds: u64) -> Self {
        self.with_extension(RETRY_AFTER_KEY, seconds)
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// The occurrence-specific detail.
    #[must_use]
    pub fn error_message(&self) -> &str {
        &self.detail
    }

    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.extension(TRACE_ID_KEY).and_then(Value::as_str)
    }

    /// Whether `type` is one of the registered [`CommonProblemType`] URIs.
    #[must_use]
    pub fn is_common_type(&self) -> bool {
        CommonProblemType::from_uri(&self.type_url).is_some()
    }

    /// Whether `type` is an `http` or `https` URI that could be fetched.
    #[must_use]
    pub fn is_dereferenceable(&self) -> bool {
        self.type_url.starts_with("http://") || self.type_url.starts_with("https://")
    }

    /// Check the structural invariants of the document.
    ///
    /// Validation is opt-in: serialization and conversion never call it.
    ///
    /// # Errors
    /// Returns [`ProblemValidationError`] when the status is unset or outside 100..=599,
    /// or when `type` is neither empty, `about:blank`, nor an absolute URI.
    pub fn validate(&self) -> Result<(), ProblemValidationError> {
        if self.status == 0 {
            return Err(ProblemValidationError::MissingStatus);
        }
        if !(100..=599).contains(&self.status) {
            return Err(ProblemValidationError::StatusOutOfRange {
                status: self.status,
            });
        }
        if self.type_url.is_empty() || self.type_url == ABOUT_BLANK {
            return Ok(());
        }
        url::Url::parse(&self.type_url)
            .map(|_| ())
            .map_err(|source| ProblemValidationError::InvalidType {
                type_url: self.type_url.clone(),
                source,
            })
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

    /// The JSON document for this problem, extensions flattened.
    #[must_use]
    pub fn to_json_value(&self) -> Value {
        self.document().to_value()
    }

    /// Convert into an [`HttpError`] carrying the JSON document and
    /// `application/problem+json`.
    pub fn to_http_error(&self) -> HttpError {
        HttpError::new(self.status, self.document().to_json_string())
            .with_content_type(APPLICATION_PROBLEM_JSON)
    }

    /// Copy into the RFC 7807 representation.
    #[must_use]
    pub fn to_legacy(&self) -> Rfc7807Problem {
        Rfc7807Problem {
            type_url: self.type_url.clone(),
            title: self.title.clone(),
            status: self.status,
            detail: self.detail.clone(),
            instance: self.instance.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

// Convenience constructors with a default title and a common type.
impl Problem {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        CommonProblemType::BadRequest.as_problem(detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(401, "Unauthorized", detail)
            .with_common_type(CommonProblemType::AuthenticationRequired)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(403, "Forbidden", detail)
            .with_common_type(CommonProblemType::InsufficientPermissions)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found", detail).with_common_type(CommonProblemType::ResourceNotFound)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(409, "Conflict", detail).with_common_type(CommonProblemType::ResourceConflict)
    }

    pub fn too_many_requests(detail: impl Into<String>) -> Self {
        Self::new(429, "Too Many Requests", detail)
            .with_common_type(CommonProblemType::RateLimitExceeded)
    }

    pub fn internal_server_error(detail: impl Into<String>) -> Self {
        CommonProblemType::InternalError.as_problem(detail)
    }

    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        CommonProblemType::ServiceUnavailable.as_problem(detail)
    }
}

impl Serialize for Problem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.document().serialize(serializer)
    }
}

impl From<RawDocument> for Problem {
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

impl From<Problem> for HttpError {
    fn from(problem: Problem) -> Self {
        problem.to_http_error()
    }
}

impl From<Problem> for Rfc7807Problem {
    fn from(problem: Problem) -> Self {
        Self {
            type_url: problem.type_url,
            title: problem.title,
            status: problem.status,
            detail: problem.detail,
            instance: problem.instance,
            extensions: problem.extensions,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.status, self.title, self.detail)
    }
}

impl std::error::Error for Problem {}
