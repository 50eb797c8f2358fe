//! Registry of well-known problem types.
//!
//! The registry is static data: it is fixed at compile time and never mutated, so it can
//! be read from any number of request handlers without synchronization.

use crate::problem::Problem;

const BASE_URI: &str = "https://httpwrap.dev/problems/";

macro_rules! common_problem_types {
    ($($(#[$doc:meta])* $variant:ident => ($slug:literal, $status:literal, $title:literal),)*) => {
        /// A well-known problem type with a stable, dereferenceable URI.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CommonProblemType {
            $($(#[$doc])* $variant,)*
        }

        impl CommonProblemType {
            /// Every registered problem type.
            pub const ALL: &'static [CommonProblemType] = &[$(CommonProblemType::$variant,)*];

            /// The `type` URI identifying this problem type.
            #[must_use]
            pub const fn uri(self) -> &'static str {
                match self {
                    $(CommonProblemType::$variant => concat!("https://httpwrap.dev/problems/", $slug),)*
                }
            }

            /// Last path segment of [`uri`](Self::uri).
            #[must_use]
            pub const fn slug(self) -> &'static str {
                match self {
                    $(CommonProblemType::$variant => $slug,)*
                }
            }

            /// Status code usually associated with this problem type.
            #[must_use]
            pub const fn status(self) -> u16 {
                match self {
                    $(CommonProblemType::$variant => $status,)*
                }
            }

            /// Default human-readable title.
            #[must_use]
            pub const fn title(self) -> &'static str {
                match self {
                    $(CommonProblemType::$variant => $title,)*
                }
            }
        }
    };
}

common_problem_types! {
    /// Request payload failed validation.
    ValidationError => ("validation-error", 400, "Validation Error"),
    /// Credentials are missing or invalid.
    AuthenticationRequired => ("authentication-required", 401, "Authentication Required"),
    /// The caller is authenticated but not allowed to perform the operation.
    InsufficientPermissions => ("insufficient-permissions", 403, "Insufficient Permissions"),
    ResourceNotFound => ("resource-not-found", 404, "Resource Not Found"),
    ResourceConflict => ("resource-conflict", 409, "Resource Conflict"),
    RateLimitExceeded => ("rate-limit-exceeded", 429, "Rate Limit Exceeded"),
    /// Generic malformed request.
    BadRequest => ("bad-request", 400, "Bad Request"),
    MethodNotAllowed => ("method-not-allowed", 405, "Method Not Allowed"),
    UnsupportedMediaType => ("unsupported-media-type", 415, "Unsupported Media Type"),
    PayloadTooLarge => ("payload-too-large", 413, "Payload Too Large"),
    RequestTimeout => ("request-timeout", 408, "Request Timeout"),
    InternalError => ("internal-error", 500, "Internal Server Error"),
    ServiceUnavailable => ("service-unavailable", 503, "Service Unavailable"),
    /// An upstream dependency failed.
    DependencyFailure => ("dependency-failure", 502, "Dependency Failure"),
}

impl CommonProblemType {
    /// Look up the registered problem type for a `type` URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        if !uri.starts_with(BASE_URI) {
            return None;
        }
        Self::ALL.iter().copied().find(|t| t.uri() == uri)
    }

    /// Look up a registered problem type by its slug, e.g. `"resource-not-found"`.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.slug() == slug)
    }

    /// Build a [`Problem`] of this type with its default status and title.
    pub fn as_problem(self, detail: impl Into<String>) -> Problem {
        Problem::new(self.status(), self.title(), detail).with_common_type(self)
    }
}
