//! Basic HTTP error: a status code, a message and an optional content type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// An HTTP-level failure carrying everything needed to write a response.
///
/// Values are immutable once built; [`HttpError::with_content_type`] consumes the
/// error and returns a new one instead of mutating a shared instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct HttpError {
    code: u16,
    message: String,
    #[serde(
        default,
        deserialize_with = "non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    content_type: Option<String>,
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|ct| !ct.is_empty()))
}

impl HttpError {
    /// Create an error with the given status code and message.
    ///
    /// No range check is performed on `code`.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            content_type: None,
        }
    }

    /// Attach an explicit content type.
    ///
    /// An empty string leaves the error without a content type, so the router's
    /// default plain-text formatting applies.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.content_type = (!content_type.is_empty()).then_some(content_type);
        self
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Split the error into `(code, message, content_type)`.
    #[must_use]
    pub fn into_parts(self) -> (u16, String, Option<String>) {
        (self.code, self.message, self.content_type)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for HttpError {}

macro_rules! status_constructors {
    ($($(#[$doc:meta])* $name:ident => $code:literal;)*) => {
        impl HttpError {
            $(
                $(#[$doc])*
                pub fn $name(message: impl Into<String>) -> Self {
                    Self::new($code, message)
                }
            )*
        }
    };
}

status_constructors! {
    /// 400: the request is malformed or otherwise invalid.
    bad_request => 400;
    /// 401: the request requires authentication.
    unauthorized => 401;
    /// 402
    payment_required => 402;
    /// 403: the server understood the request but refuses to authorize it.
    forbidden => 403;
    /// 404: the requested resource does not exist.
    not_found => 404;
    /// 405: the method is not supported for the target resource.
    method_not_allowed => 405;
    /// 406
    not_acceptable => 406;
    /// 407
    proxy_auth_required => 407;
    /// 408: the request was not received in time.
    request_timeout => 408;
    /// 409: the request conflicts with the current state of the resource.
    conflict => 409;
    /// 410
    gone => 410;
    /// 411
    length_required => 411;
    /// 412
    precondition_failed => 412;
    /// 413: the request body is larger than the server accepts.
    payload_too_large => 413;
    /// 414
    uri_too_long => 414;
    /// 415: the request body format is not supported.
    unsupported_media_type => 415;
    /// 416
    range_not_satisfiable => 416;
    /// 417
    expectation_failed => 417;
    /// 421
    misdirected_request => 421;
    /// 422: the request is well formed but semantically invalid.
    unprocessable_entity => 422;
    /// 423
    locked => 423;
    /// 424
    failed_dependency => 424;
    /// 426
    upgrade_required => 426;
    /// 428
    precondition_required => 428;
    /// 429: the client sent too many requests.
    too_many_requests => 429;
    /// 431
    request_header_fields_too_large => 431;
    /// 451
    unavailable_for_legal_reasons => 451;
    /// 500: an unexpected condition prevented the request from completing.
    internal_server_error => 500;
    /// 501
    not_implemented => 501;
    /// 502: an upstream server returned an invalid response.
    bad_gateway => 502;
    /// 503: the server is temporarily unable to handle the request.
    service_unavailable => 503;
    /// 504: an upstream server did not answer in time.
    gateway_timeout => 504;
    /// 505
    http_version_not_supported => 505;
    /// 506
    variant_also_negotiates => 506;
    /// 507
    insufficient_storage => 507;
    /// 508
    loop_detected => 508;
    /// 510
    not_extended => 510;
    /// 511
    network_authentication_required => 511;
}
