//! The error dispatch rule shared by every router shell.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use httpwrap_errors::wire::status_or_internal;

use crate::failure::HandlerError;
use crate::observer::ErrorObserver;
use crate::sink::ResponseSink;

/// Write the response for a handler failure.
///
/// - [`HandlerError::Http`] with a content type: that header, the status, and the
///   message bytes exactly as given.
/// - [`HandlerError::Http`] without one: the sink's plain-text error with the status.
/// - [`HandlerError::Opaque`]: plain-text `500` with the error's `Display` text.
///
/// Status codes outside `100..=999` are written as `500`. A content type that is not a
/// valid header value is treated as absent.
#[must_use]
pub fn dispatch<S: ResponseSink>(mut sink: S, err: &HandlerError) -> S::Output {
    match err {
        HandlerError::Http(http) => {
            let status = status_or_internal(http.status_code());
            match http
                .content_type()
                .and_then(|ct| HeaderValue::from_str(ct).ok())
            {
                Some(ct) => {
                    sink.set_header(CONTENT_TYPE, ct);
                    sink.finish(status, Bytes::copy_from_slice(http.message().as_bytes()))
                }
                None => sink.plain_error(status, http.message()),
            }
        }
        HandlerError::Opaque(source) => {
            sink.plain_error(StatusCode::INTERNAL_SERVER_ERROR, &source.to_string())
        }
    }
}

/// Turn a handler outcome into a response.
///
/// Successful responses pass through untouched. On failure the response is built with
/// [`dispatch`] first, then the observer is notified.
#[must_use]
pub fn dispatch_result<S, R>(
    result: Result<R, HandlerError>,
    sink: impl FnOnce() -> S,
    observer: &ErrorObserver,
) -> R
where
    S: ResponseSink<Output = R>,
{
    match result {
        Ok(resp) => resp,
        Err(err) => {
            let resp = dispatch(sink(), &err);
            observer.notify(&err);
            resp
        }
    }
}
