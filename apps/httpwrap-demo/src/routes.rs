//! Demo routes, one per failure kind.

use std::sync::Arc;

use anyhow::Context;
use axum::Json;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use httpwrap::{
    CommonProblemType, HandlerError, HttpError, Problem, Rfc7807Problem, Router,
    ValidationViolation, tracing_observer,
};
use httpwrap_errors::finalize;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::ProblemsConfig;

#[derive(Clone)]
struct DemoState {
    problems: Arc<ProblemsConfig>,
}

impl DemoState {
    /// Attach `instance` and `trace-id` according to the `problems` config section.
    fn enrich(&self, problem: Problem, uri: &Uri, headers: &HeaderMap) -> Problem {
        let trace_id = self
            .problems
            .trace_header
            .as_deref()
            .and_then(|name| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if self.problems.instance_from_path {
            return finalize(problem, uri.path(), trace_id);
        }
        match trace_id {
            Some(id) => problem.with_trace_id(id),
            None => problem,
        }
    }
}

/// Build the demo application.
pub fn router(problems: ProblemsConfig) -> axum::Router {
    let state = DemoState {
        problems: Arc::new(problems),
    };

    Router::with_observer(tracing_observer())
        .get("/health", health)
        .get("/echo", echo)
        .get("/json-error", json_error)
        .route("/problems", |problems| {
            problems
                .get("/{slug}", common_problem)
                .get("/legacy/{status}", legacy_problem)
        })
        .post("/users", create_user)
        .get("/opaque", opaque)
        .into_router()
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
struct EchoParams {
    msg: Option<String>,
}

/// Plain-text failure: `400` with the message and a trailing newline.
async fn echo(Query(params): Query<EchoParams>) -> Result<String, HandlerError> {
    let msg = params
        .msg
        .filter(|m| !m.is_empty())
        .ok_or_else(|| HttpError::bad_request("msg query parameter is required"))?;
    Ok(msg)
}

/// Failure with an explicit content type: the body is written exactly as given.
async fn json_error() -> Result<(), HandlerError> {
    let body = json!({
        "error": "unsupported_media_type",
        "accepted": ["application/json"],
    });
    Err(HttpError::unsupported_media_type(body.to_string())
        .with_content_type("application/json")
        .into())
}

/// Problem of a registered type, e.g. `/problems/resource-not-found`.
async fn common_problem(
    State(state): State<DemoState>,
    Path(slug): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<(), HandlerError> {
    let kind = CommonProblemType::from_slug(&slug)
        .ok_or_else(|| HttpError::not_found(format!("unknown problem type {slug:?}")))?;
    let problem = kind.as_problem(format!("demo {} problem", kind.title().to_lowercase()));
    Err(state.enrich(problem, &uri, &headers).into())
}

/// Legacy problem document with an arbitrary status.
async fn legacy_problem(
    Path(status): Path<u16>,
    OriginalUri(uri): OriginalUri,
) -> Result<(), HandlerError> {
    let title = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status");
    Err(Rfc7807Problem::new(status, title, "legacy problem document")
        .with_instance(uri.path())
        .into())
}

#[derive(Deserialize)]
struct NewUser {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

/// Validation failure reported as a problem with a `problems` extension.
async fn create_user(
    State(state): State<DemoState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(user): Json<NewUser>,
) -> Result<(StatusCode, Json<Value>), HandlerError> {
    let mut violations = Vec::new();
    if user.name.trim().is_empty() {
        violations.push(ValidationViolation::new("name", "must not be empty").with_code("required"));
    }
    if !user.email.contains('@') {
        violations
            .push(ValidationViolation::new("email", "must be an email address").with_code("format"));
    }
    if !violations.is_empty() {
        let problem = CommonProblemType::ValidationError
            .as_problem("request body failed validation")
            .with_violations(violations);
        return Err(state.enrich(problem, &uri, &headers).into());
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "name": user.name, "email": user.email })),
    ))
}

/// Unclassified failure: rendered as a plain-text `500`.
async fn opaque() -> Result<(), HandlerError> {
    let upstream: anyhow::Result<()> = Err(anyhow::anyhow!("connection reset by peer"));
    upstream.context("fetching inventory")?;
    Ok(())
}
