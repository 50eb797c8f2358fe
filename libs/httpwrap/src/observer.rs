//! Error observation hook.
//!
//! Every router shell reports each handler failure to an [`ErrorObserver`] after the
//! error response has been built. The observer only sees the error; it cannot change the
//! response.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::failure::HandlerError;

type ObserverFn = dyn Fn(&HandlerError) + Send + Sync;

/// Shared, cloneable error callback.
///
/// The default observer does nothing. A panic raised by the callback is caught and
/// logged; it never reaches the serving task.
#[derive(Clone)]
pub struct ErrorObserver {
    inner: Arc<ObserverFn>,
}

impl ErrorObserver {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&HandlerError) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Observer that ignores every error.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub(crate) fn notify(&self, err: &HandlerError) {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.inner)(err)));
        if outcome.is_err() {
            tracing::error!(status = err.status_code(), "error observer panicked");
        }
    }
}

impl Default for ErrorObserver {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for ErrorObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorObserver").finish_non_exhaustive()
    }
}

impl<F> From<F> for ErrorObserver
where
    F: Fn(&HandlerError) + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// Observer that logs each failure through `tracing`.
///
/// Opaque failures and 5xx responses are logged at `error`, 4xx at `warn`,
/// anything else at `info`.
#[must_use]
pub fn tracing_observer() -> ErrorObserver {
    ErrorObserver::new(log_failure)
}

fn log_failure(err: &HandlerError) {
    match err {
        HandlerError::Opaque(source) => {
            tracing::error!(status = 500_u16, error = %source, "handler failed");
        }
        HandlerError::Http(http) => {
            let status = http.status_code();
            if status >= 500 {
                tracing::error!(status, error = http.message(), "handler returned server error");
            } else if status >= 400 {
                tracing::warn!(status, error = http.message(), "handler returned client error");
            } else {
                tracing::info!(status, error = http.message(), "handler returned error");
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use httpwrap_errors::HttpError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    #[test]
    fn notify_invokes_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let observer = ErrorObserver::new(move |err| {
            assert_eq!(err.status_code(), 404);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        observer.notify(&HttpError::not_found("nope").into());
        observer.clone().notify(&HttpError::not_found("nope").into());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[traced_test]
    fn panicking_observer_is_contained() {
        let observer = ErrorObserver::new(|_| panic!("observer bug"));
        observer.notify(&HttpError::internal_server_error("boom").into());
        assert!(logs_contain("error observer panicked"));
    }

    #[test]
    #[traced_test]
    fn tracing_observer_picks_level_from_status() {
        let observer = tracing_observer();
        observer.notify(&HttpError::bad_request("missing field").into());
        observer.notify(&HttpError::bad_gateway("upstream down").into());
        observer.notify(&HandlerError::opaque("connection reset"));

        assert!(logs_contain("WARN"));
        assert!(logs_contain("handler returned client error"));
        assert!(logs_contain("handler returned server error"));
        assert!(logs_contain("connection reset"));
    }
}
