//! Response sinks: the write side each router shell hands to the dispatcher.

use std::marker::PhantomData;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use httpwrap_errors::wire::{TEXT_PLAIN_UTF_8, plain_text_body};

/// Minimal response writer used by [`dispatch`](crate::dispatch::dispatch).
///
/// `finish` and `plain_error` consume the sink, so a response is written at most once.
pub trait ResponseSink {
    type Output;

    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Write the status and the body as-is.
    fn finish(self, status: StatusCode, body: Bytes) -> Self::Output;

    /// Write the router's default plain-text error response.
    fn plain_error(self, status: StatusCode, message: &str) -> Self::Output;
}

/// Sink that buffers headers and produces an [`http::Response`] with any body type
/// constructible from [`Bytes`].
#[derive(Debug)]
pub struct BufferedSink<B> {
    headers: HeaderMap,
    _body: PhantomData<fn() -> B>,
}

impl<B> BufferedSink<B> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
            _body: PhantomData,
        }
    }
}

impl<B> Default for BufferedSink<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> ResponseSink for BufferedSink<B>
where
    B: From<Bytes>,
{
    type Output = Response<B>;

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn finish(self, status: StatusCode, body: Bytes) -> Response<B> {
        let mut resp = Response::new(B::from(body));
        *resp.status_mut() = status;
        *resp.headers_mut() = self.headers;
        resp
    }

    fn plain_error(mut self, status: StatusCode, message: &str) -> Response<B> {
        self.set_header(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF_8));
        self.set_header(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        self.finish(status, Bytes::from(plain_text_body(message)))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn finish_keeps_headers_and_body() {
        let mut sink = BufferedSink::<Bytes>::new();
        sink.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let resp = sink.finish(StatusCode::CONFLICT, Bytes::from_static(b"{}"));

        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(resp.body().as_ref(), b"{}");
    }

    #[test]
    fn plain_error_appends_newline() {
        let resp = BufferedSink::<Bytes>::new().plain_error(StatusCode::NOT_FOUND, "missing");
        assert_eq!(resp.headers()[CONTENT_TYPE], TEXT_PLAIN_UTF_8);
        assert_eq!(resp.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(resp.body().as_ref(), b"missing\n");
    }
}
