#![allow(clippy::unwrap_used, clippy::expect_used)]
#![cfg(feature = "mux")]

//! Integration tests for the matchit multiplexer, driven through both service traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use httpwrap::{
    ErrorObserver, HandlerError, HttpError, Mux, MuxResponse, PathParams, Problem,
    Rfc7807Problem,
};
use serde_json::Value;
use tower::ServiceExt; // for oneshot

type Body = Full<Bytes>;

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::default())
        .unwrap()
}

async fn body_string(resp: MuxResponse) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn fail(err: impl Into<HandlerError>) -> Result<MuxResponse, HandlerError> {
    Err(err.into())
}

fn demo_mux(observer: ErrorObserver) -> Mux<Body> {
    let mut mux = Mux::with_observer(observer);
    mux.get("/ok", |_| async {
        Ok::<_, HandlerError>(Response::new(Full::from("OK")))
    })
    .unwrap();
    mux.get("/plain", |_| async { fail(HttpError::not_found("Resource not found")) })
    .unwrap();
    mux.get("/json", |_| async {
        fail(HttpError::bad_request(r#"{"error":"bad request"}"#).with_content_type("application/json"))
    })
    .unwrap();
    mux.get("/problem/{id}", |req: Request<Body>| async move {
        let id = req
            .extensions()
            .get::<PathParams>()
            .and_then(|p| p.get("id"))
            .unwrap_or_default()
            .to_owned();
        fail(Problem::not_found(format!("item {id} not found")).with_instance(req.uri().path()))
    })
    .unwrap();
    mux.get("/legacy", |_| async { fail(Rfc7807Problem::forbidden("Access denied")) })
    .unwrap();
    mux.handle("/opaque", |_| async { fail(HandlerError::opaque("database connection failed")) })
    .unwrap();
    mux
}

#[tokio::test]
async fn tower_and_hyper_paths_produce_the_same_response() {
    let mux = demo_mux(ErrorObserver::noop());

    let via_tower = mux
        .clone()
        .oneshot(request(Method::GET, "/plain"))
        .await
        .unwrap();
    let via_hyper = hyper::service::Service::call(&mux, request(Method::GET, "/plain"))
        .await
        .unwrap();

    assert_eq!(via_tower.status(), via_hyper.status());
    assert_eq!(via_tower.headers(), via_hyper.headers());
    assert_eq!(body_string(via_tower).await, body_string(via_hyper).await);
}

#[tokio::test]
async fn dispatch_rule_on_every_failure_kind() {
    let mux = demo_mux(ErrorObserver::noop());

    let resp = mux.clone().oneshot(request(Method::GET, "/ok")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "OK");

    let resp = mux.clone().oneshot(request(Method::GET, "/plain")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(body_string(resp).await, "Resource not found\n");

    let resp = mux.clone().oneshot(request(Method::GET, "/json")).await.unwrap();
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(body_string(resp).await, r#"{"error":"bad request"}"#);

    let resp = mux
        .clone()
        .oneshot(request(Method::GET, "/problem/42"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/problem+json");
    let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["detail"], "item 42 not found");
    assert_eq!(body["instance"], "/problem/42");

    let resp = mux.clone().oneshot(request(Method::GET, "/legacy")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["type"], "about:blank");

    let resp = mux.oneshot(request(Method::DELETE, "/opaque")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(resp).await, "database connection failed\n");
}

#[tokio::test]
async fn observer_sees_handler_failures_only() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mux = demo_mux(ErrorObserver::new(move |err| {
        sink.lock().unwrap().push(err.status_code());
    }));

    for path in ["/ok", "/plain", "/legacy", "/opaque", "/missing"] {
        let _ = mux.clone().oneshot(request(Method::GET, path)).await.unwrap();
    }
    let _ = mux.oneshot(request(Method::POST, "/ok")).await.unwrap();

    // Router-level 404/405 are not handler failures.
    assert_eq!(*seen.lock().unwrap(), vec![404, 403, 500]);
}

#[tokio::test]
async fn concurrent_requests_do_not_mix_errors() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut mux = Mux::with_observer(ErrorObserver::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    mux.get("/work/{n}", |req: Request<Body>| async move {
        let n = req
            .extensions()
            .get::<PathParams>()
            .and_then(|p| p.get("n"))
            .unwrap_or_default()
            .to_owned();
        tokio::task::yield_now().await;
        Err::<MuxResponse, HandlerError>(
            Problem::too_many_requests("slow down")
                .with_trace_id(format!("trace-{n}"))
                .into(),
        )
    })
    .unwrap();

    let tasks: Vec<_> = (0..32u32)
        .map(|n| {
            let mux = mux.clone();
            tokio::spawn(async move {
                let resp = mux
                    .oneshot(request(Method::GET, &format!("/work/{n}")))
                    .await
                    .unwrap();
                let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
                (n, body["trace-id"].as_str().unwrap().to_owned())
            })
        })
        .collect();

    for task in tasks {
        let (n, trace_id) = task.await.unwrap();
        assert_eq!(trace_id, format!("trace-{n}"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 32);
}
