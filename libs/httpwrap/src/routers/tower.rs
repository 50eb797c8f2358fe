//! tower shell: a single fallible handler exposed as an infallible `tower::Service`.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{Request, Response};

use crate::dispatch::dispatch_result;
use crate::failure::HandlerError;
use crate::observer::ErrorObserver;
use crate::sink::BufferedSink;

/// Wrap `handler` as a service with the no-op observer.
pub fn handler_fn<F>(handler: F) -> HandlerService<F> {
    HandlerService {
        handler,
        observer: ErrorObserver::noop(),
    }
}

/// Service that renders handler failures with the shared dispatch rule.
///
/// The response body type is whatever the handler produces; it only has to be
/// constructible from [`Bytes`] so error responses can use it too.
#[must_use]
#[derive(Clone)]
pub struct HandlerService<F> {
    handler: F,
    observer: ErrorObserver,
}

impl<F> HandlerService<F> {
    pub fn with_observer(self, observer: impl Into<ErrorObserver>) -> Self {
        Self {
            handler: self.handler,
            observer: observer.into(),
        }
    }
}

impl<F> fmt::Debug for HandlerService<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerService")
            .field("observer", &self.observer)
            .finish_non_exhaustive()
    }
}

impl<F, Fut, B, R> tower::Service<Request<B>> for HandlerService<F>
where
    F: Fn(Request<B>) -> Fut,
    Fut: Future<Output = Result<Response<R>, HandlerError>> + Send + 'static,
    R: From<Bytes> + Send + 'static,
{
    type Response = Response<R>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response<R>, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let fut = (self.handler)(req);
        let observer = self.observer.clone();
        Box::pin(async move { Ok(dispatch_result(fut.await, BufferedSink::new, &observer)) })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;
    use httpwrap_errors::HttpError;
    use tower::ServiceExt;

    #[tokio::test]
    async fn success_passes_through() {
        let svc = handler_fn(|_req: Request<()>| async {
            Ok::<_, HandlerError>(Response::new(Bytes::from_static(b"OK")))
        });
        let resp = svc.oneshot(Request::new(())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body().as_ref(), b"OK");
    }

    #[tokio::test]
    async fn failure_uses_dispatch_rule() {
        let svc = handler_fn(|_req: Request<()>| async {
            Err::<Response<Bytes>, _>(HandlerError::from(HttpError::unauthorized("login first")))
        });
        let resp = svc.oneshot(Request::new(())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.body().as_ref(), b"login first\n");
    }
}
