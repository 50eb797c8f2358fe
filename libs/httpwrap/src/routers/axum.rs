//! axum shell.
//!
//! Handlers are ordinary axum handlers whose return type is
//! `Result<impl IntoResponse, HandlerError>`. [`HandlerError`] renders itself through the
//! shared dispatch rule and stashes the failure in the response extensions; the
//! [`Router`] wrapper installs a middleware that hands it to the observer.

use std::convert::Infallible;
use std::sync::Arc;

use ::axum::body::Body;
use ::axum::extract::{Request, State};
use ::axum::handler::Handler;
use ::axum::middleware::{self, Next};
use ::axum::response::{IntoResponse, Response};
use ::axum::routing::{self, MethodRouter};
use tower::Service;

use crate::dispatch::dispatch;
use crate::failure::HandlerError;
use crate::observer::ErrorObserver;
use crate::sink::BufferedSink;

/// Failure carried from the handler to the observing middleware.
#[derive(Clone)]
struct DispatchedFailure(Arc<HandlerError>);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let mut resp = dispatch(BufferedSink::<Body>::new(), &self);
        resp.extensions_mut()
            .insert(DispatchedFailure(Arc::new(self)));
        resp
    }
}

async fn observe_failures(
    State(observer): State<ErrorObserver>,
    req: Request,
    next: Next,
) -> Response {
    let mut resp = next.run(req).await;
    if let Some(DispatchedFailure(err)) = resp.extensions_mut().remove::<DispatchedFailure>() {
        observer.notify(&err);
    }
    resp
}

/// `None` for the root, otherwise the prefix with one leading `/` and no trailing `/`.
fn nest_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim_matches('/');
    (!trimmed.is_empty()).then(|| format!("/{trimmed}"))
}

/// axum router that reports handler failures to an [`ErrorObserver`].
///
/// Finish with [`Router::into_router`] to get a plain `axum::Router`.
#[must_use]
pub struct Router<S = ()> {
    inner: ::axum::Router<S>,
    observer: ErrorObserver,
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_observer(ErrorObserver::noop())
    }

    pub fn with_observer(observer: impl Into<ErrorObserver>) -> Self {
        Self {
            inner: ::axum::Router::new(),
            observer: observer.into(),
        }
    }

    fn route_with(self, path: &str, method_router: MethodRouter<S>) -> Self {
        Self {
            inner: self.inner.route(path, method_router),
            observer: self.observer,
        }
    }

    /// Register a handler for every method on `path`.
    pub fn handle<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route_with(path, routing::any(handler))
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route_with(path, routing::get(handler))
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route_with(path, routing::post(handler))
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route_with(path, routing::put(handler))
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route_with(path, routing::delete(handler))
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route_with(path, routing::patch(handler))
    }

    pub fn options<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route_with(path, routing::options(handler))
    }

    pub fn head<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route_with(path, routing::head(handler))
    }

    /// Build a group of routes under `prefix`. The group shares this router's observer.
    ///
    /// A missing leading `/` is added and trailing slashes are ignored; `"/"` merges the
    /// group into this router.
    pub fn route<F>(self, prefix: &str, build: F) -> Self
    where
        F: FnOnce(Router<S>) -> Router<S>,
    {
        let group = build(Router {
            inner: ::axum::Router::new(),
            observer: self.observer.clone(),
        });
        let inner = match nest_prefix(prefix) {
            Some(prefix) => self.inner.nest(&prefix, group.inner),
            None => self.inner.merge(group.inner),
        };
        Self {
            inner,
            observer: self.observer,
        }
    }

    /// Mount an arbitrary service under `prefix`.
    ///
    /// Prefixes are normalized as in [`Router::route`]; `"/"` makes the service the
    /// fallback for every unmatched request.
    pub fn mount<T>(self, prefix: &str, service: T) -> Self
    where
        T: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        T::Response: IntoResponse,
        T::Future: Send + 'static,
    {
        let inner = match nest_prefix(prefix) {
            Some(prefix) => self.inner.nest_service(&prefix, service),
            None => self.inner.fallback_service(service),
        };
        Self {
            inner,
            observer: self.observer,
        }
    }

    /// Apply the observing middleware and return the underlying axum router.
    pub fn into_router(self) -> ::axum::Router<S> {
        self.inner
            .layer(middleware::from_fn_with_state(self.observer, observe_failures))
    }
}

impl<S> Default for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl From<Router> for ::axum::Router {
    fn from(router: Router) -> Self {
        router.into_router()
    }
}
