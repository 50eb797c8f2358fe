//! Method + path multiplexer built on `matchit`.
//!
//! Patterns are either `"/path"` (any method) or `"METHOD /path"`. Paths use `matchit`
//! syntax (`/users/{id}`, `/static/{*rest}`); captured parameters are exposed to handlers
//! through the [`PathParams`] request extension.
//!
//! A [`Mux`] is both a `tower::Service` and a `hyper::service::Service`, so it can be
//! served directly by hyper or wrapped in tower middleware.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::future::{self, BoxFuture};
use http::header::ALLOW;
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::Full;

use crate::dispatch::dispatch_result;
use crate::failure::HandlerError;
use crate::observer::ErrorObserver;
use crate::sink::{BufferedSink, ResponseSink};

/// Response type produced by mux handlers.
pub type MuxResponse = Response<Full<Bytes>>;

/// Future returned by the mux services.
pub type MuxFuture = BoxFuture<'static, Result<MuxResponse, Infallible>>;

type HandlerFuture = BoxFuture<'static, Result<MuxResponse, HandlerError>>;
type BoxHandler<B> = Arc<dyn Fn(Request<B>) -> HandlerFuture + Send + Sync>;

/// Errors raised while registering a pattern.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MuxError {
    #[error("invalid method in pattern {pattern:?}")]
    InvalidMethod { pattern: String },

    #[error("path must start with '/' in pattern {pattern:?}")]
    InvalidPath { pattern: String },

    #[error("cannot register pattern {pattern:?}: {source}")]
    Conflict {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },
}

/// Path parameters captured by the matched pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&matchit::Params<'_, '_>> for PathParams {
    fn from(params: &matchit::Params<'_, '_>) -> Self {
        Self(
            params
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        )
    }
}

enum Lookup<B> {
    Found(BoxHandler<B>, PathParams),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

struct Routes<B> {
    by_method: HashMap<Method, matchit::Router<BoxHandler<B>>>,
    any_method: matchit::Router<BoxHandler<B>>,
}

impl<B> Clone for Routes<B> {
    fn clone(&self) -> Self {
        Self {
            by_method: self.by_method.clone(),
            any_method: self.any_method.clone(),
        }
    }
}

impl<B> Routes<B> {
    fn new() -> Self {
        Self {
            by_method: HashMap::new(),
            any_method: matchit::Router::new(),
        }
    }

    fn insert(
        &mut self,
        method: Option<Method>,
        path: &str,
        handler: BoxHandler<B>,
    ) -> Result<(), matchit::InsertError> {
        match method {
            Some(method) => self
                .by_method
                .entry(method)
                .or_insert_with(matchit::Router::new)
                .insert(path, handler),
            None => self.any_method.insert(path, handler),
        }
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup<B> {
        // A GET route also answers HEAD.
        let get = Method::GET;
        let fallback = (*method == Method::HEAD).then_some(&get);
        for candidate in std::iter::once(method).chain(fallback) {
            if let Some(matched) = self.by_method.get(candidate).and_then(|r| r.at(path).ok()) {
                return Lookup::Found(matched.value.clone(), PathParams::from(&matched.params));
            }
        }

        if let Ok(matched) = self.any_method.at(path) {
            return Lookup::Found(matched.value.clone(), PathParams::from(&matched.params));
        }

        let mut allowed: Vec<Method> = self
            .by_method
            .iter()
            .filter(|(_, router)| router.at(path).is_ok())
            .map(|(method, _)| method.clone())
            .collect();
        if allowed.is_empty() {
            return Lookup::NotFound;
        }
        if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
            allowed.push(Method::HEAD);
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Lookup::MethodNotAllowed(allowed)
    }
}

fn parse_pattern(pattern: &str) -> Result<(Option<Method>, &str), MuxError> {
    let (method, path) = match pattern.split_once(' ') {
        Some((method, path)) => {
            let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
                MuxError::InvalidMethod {
                    pattern: pattern.to_owned(),
                }
            })?;
            (Some(method), path.trim_start())
        }
        None => (None, pattern),
    };
    if !path.starts_with('/') {
        return Err(MuxError::InvalidPath {
            pattern: pattern.to_owned(),
        });
    }
    Ok((method, path))
}

fn not_found() -> MuxResponse {
    BufferedSink::new().plain_error(StatusCode::NOT_FOUND, "404 page not found")
}

fn method_not_allowed(allowed: &[Method]) -> MuxResponse {
    let mut sink = BufferedSink::new();
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        sink.set_header(ALLOW, value);
    }
    sink.plain_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

/// Request multiplexer for fallible handlers.
///
/// `B` is the request body type, e.g. `hyper::body::Incoming` when served by hyper.
#[must_use]
pub struct Mux<B> {
    routes: Arc<Routes<B>>,
    observer: ErrorObserver,
}

impl<B> Clone for Mux<B> {
    fn clone(&self) -> Self {
        Self {
            routes: Arc::clone(&self.routes),
            observer: self.observer.clone(),
        }
    }
}

impl<B> Default for Mux<B>
where
    B: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Mux<B>
where
    B: Send + 'static,
{
    pub fn new() -> Self {
        Self::with_observer(ErrorObserver::noop())
    }

    pub fn with_observer(observer: impl Into<ErrorObserver>) -> Self {
        Self {
            routes: Arc::new(Routes::new()),
            observer: observer.into(),
        }
    }

    /// Register `handler` for `pattern`.
    ///
    /// # Errors
    /// Returns [`MuxError`] if the pattern is malformed or conflicts with a registered one.
    pub fn handle<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(Request<B>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MuxResponse, HandlerError>> + Send + 'static,
    {
        let (method, path) = parse_pattern(pattern)?;
        let handler: BoxHandler<B> =
            Arc::new(move |req: Request<B>| -> HandlerFuture { Box::pin(handler(req)) });
        Arc::make_mut(&mut self.routes)
            .insert(method, path, handler)
            .map_err(|source| MuxError::Conflict {
                pattern: pattern.to_owned(),
                source,
            })
    }

    /// Register a `GET` handler.
    ///
    /// # Errors
    /// See [`Mux::handle`].
    pub fn get<F, Fut>(&mut self, path: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(Request<B>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MuxResponse, HandlerError>> + Send + 'static,
    {
        self.handle(&format!("GET {path}"), handler)
    }

    /// Register a `POST` handler.
    ///
    /// # Errors
    /// See [`Mux::handle`].
    pub fn post<F, Fut>(&mut self, path: &str, handler: F) -> Result<(), MuxError>
    where
        F: Fn(Request<B>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MuxResponse, HandlerError>> + Send + 'static,
    {
        self.handle(&format!("POST {path}"), handler)
    }

    fn serve(&self, mut req: Request<B>) -> MuxFuture {
        match self.routes.lookup(req.method(), req.uri().path()) {
            Lookup::Found(handler, params) => {
                req.extensions_mut().insert(params);
                let fut = handler(req);
                let observer = self.observer.clone();
                Box::pin(async move {
                    Ok(dispatch_result(fut.await, BufferedSink::new, &observer))
                })
            }
            Lookup::MethodNotAllowed(allowed) => {
                Box::pin(future::ready(Ok(method_not_allowed(&allowed))))
            }
            Lookup::NotFound => Box::pin(future::ready(Ok(not_found()))),
        }
    }
}

impl<B> tower::Service<Request<B>> for Mux<B>
where
    B: Send + 'static,
{
    type Response = MuxResponse;
    type Error = Infallible;
    type Future = MuxFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        self.serve(req)
    }
}

impl<B> hyper::service::Service<Request<B>> for Mux<B>
where
    B: Send + 'static,
{
    type Response = MuxResponse;
    type Error = Infallible;
    type Future = MuxFuture;

    fn call(&self, req: Request<B>) -> Self::Future {
        self.serve(req)
    }
}
