//! Axum integration: make the error types directly usable as responses.

use axum::http::header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http_error::HttpError;
use crate::problem::Problem;
use crate::rfc7807::Rfc7807Problem;
use crate::wire::{TEXT_PLAIN_UTF_8, plain_text_body, status_or_internal};

/// The default plain-text error response: message plus newline, `text/plain`.
#[must_use]
pub fn plain_text_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        [
            (CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN_UTF_8)),
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        plain_text_body(message),
    )
        .into_response()
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (code, message, content_type) = self.into_parts();
        let status = status_or_internal(code);
        match content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
            Some(ct) => (status, [(CONTENT_TYPE, ct)], message).into_response(),
            None => plain_text_error(status, &message),
        }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        self.to_http_error().into_response()
    }
}

impl IntoResponse for Rfc7807Problem {
    fn into_response(self) -> Response {
        self.to_http_error().into_response()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::problem::APPLICATION_PROBLEM_JSON;
    use http_body_util::BodyExt;

    async fn body_string(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn content_type(resp: &Response) -> &str {
        resp.headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    #[tokio::test]
    async fn http_error_without_content_type_is_plain_text() {
        let resp = HttpError::bad_request("name is required").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content_type(&resp), TEXT_PLAIN_UTF_8);
        assert_eq!(body_string(resp).await, "name is required\n");
    }

    #[tokio::test]
    async fn http_error_with_content_type_is_written_verbatim() {
        let resp = HttpError::new(400, r#"{"error":"bad request"}"#)
            .with_content_type("application/json")
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content_type(&resp), "application/json");
        assert_eq!(body_string(resp).await, r#"{"error":"bad request"}"#);
    }

    #[tokio::test]
    async fn problem_into_response_sets_status_and_content_type() {
        let resp = Problem::bad_request("invalid payload").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content_type(&resp), APPLICATION_PROBLEM_JSON);

        let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["detail"], "invalid payload");
    }

    #[tokio::test]
    async fn legacy_problem_into_response() {
        let resp = Rfc7807Problem::not_found("gone").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(content_type(&resp), APPLICATION_PROBLEM_JSON);
    }
}
