use std::sync::Arc;

use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// Interceptor with pre- and post-handler hooks.
///
/// `before` runs ahead of the handler and may short-circuit dispatch by
/// returning `false`: the handler and every later `before` hook are skipped.
/// `after` is pure side-effect and runs in reverse entry order, so hooks
/// unwind like a stack around the handler.
pub trait Middleware: Send + Sync {
    /// Returns `false` to short-circuit the chain.
    fn before(&self, _request: &HttpRequest, _response: &mut HttpResponse) -> bool {
        true
    }

    fn after(&self, _request: &HttpRequest, _response: &mut HttpResponse) {}
}

/// The per-request hook sequence: global middlewares, then path-scoped ones,
/// then the matched route's own. Built fresh for every dispatch and dropped
/// with it.
#[derive(Default)]
pub struct MiddlewareChain {
    entries: Vec<Arc<dyn Middleware>>,
    entered: usize,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.entries.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs `before` hooks left to right, recording how many were entered.
    /// Stops at the first hook that returns `false`; that hook does not
    /// count as entered and will not see `after`.
    pub fn execute_before(&mut self, request: &HttpRequest, response: &mut HttpResponse) -> bool {
        for middleware in &self.entries {
            if !middleware.before(request, response) {
                return false;
            }
            self.entered += 1;
        }
        true
    }

    /// Runs `after` hooks right to left over the entered prefix only, so a
    /// short-circuited chain stays balanced. A panicking hook is contained
    /// and the remaining hooks still run.
    pub fn execute_after(&self, request: &HttpRequest, response: &mut HttpResponse) {
        for middleware in self.entries[..self.entered].iter().rev() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                middleware.after(request, response);
            }));
            if outcome.is_err() {
                tracing::error!(path = %request.path(), "middleware after hook panicked");
            }
        }
    }
}
