//! The failure channel of a fallible handler.
//!
//! A handler reports failure as a [`HandlerError`], classified at the point of failure:
//! either a classified HTTP failure that already knows its status and body, or an opaque
//! error that will be rendered as a generic `500`.

use std::error::Error as StdError;
use std::fmt;

use httpwrap_errors::{HttpError, Problem, Rfc7807Problem};

/// Boxed opaque error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure returned by a handler.
#[derive(Debug)]
pub enum HandlerError {
    /// Carries an explicit status and body; rendered as-is.
    Http(HttpError),
    /// Any other error; rendered as `500` with its `Display` text.
    Opaque(BoxError),
}

impl HandlerError {
    /// Wrap any error as an opaque failure.
    #[must_use]
    pub fn opaque<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Opaque(err.into())
    }

    /// View this failure as an [`HttpError`], if it is one.
    #[must_use]
    pub fn as_http_error(&self) -> Option<&HttpError> {
        match self {
            Self::Http(err) => Some(err),
            Self::Opaque(_) => None,
        }
    }

    /// Status the failure will be rendered with, before range normalization.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Http(err) => err.status_code(),
            Self::Opaque(_) => 500,
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => fmt::Display::fmt(err, f),
            Self::Opaque(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl StdError for HandlerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Http(_) => None,
            Self::Opaque(err) => Some(err.as_ref()),
        }
    }
}

impl From<HttpError> for HandlerError {
    fn from(err: HttpError) -> Self {
        Self::Http(err)
    }
}

impl From<Problem> for HandlerError {
    fn from(problem: Problem) -> Self {
        Self::Http(problem.to_http_error())
    }
}

impl From<Rfc7807Problem> for HandlerError {
    fn from(problem: Rfc7807Problem) -> Self {
        Self::Http(problem.to_http_error())
    }
}

impl From<BoxError> for HandlerError {
    fn from(err: BoxError) -> Self {
        Self::Opaque(err)
    }
}

/// Errors raised with `anyhow` keep their classification when they wrap one of the
/// error model types; everything else becomes opaque.
impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<HttpError>() {
            Ok(http) => return Self::Http(http),
            Err(err) => err,
        };
        let err = match err.downcast::<Problem>() {
            Ok(problem) => return problem.into(),
            Err(err) => err,
        };
        match err.downcast::<Rfc7807Problem>() {
            Ok(problem) => problem.into(),
            Err(err) => Self::Opaque(err.into()),
        }
    }
}
