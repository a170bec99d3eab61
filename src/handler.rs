use std::sync::Arc;

use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// A request handler.
///
/// Implement this on a type to register a handler object, or pass a plain
/// closure - every `Fn(&HttpRequest, &mut HttpResponse)` gets a blanket
/// implementation, so both shapes flow through the same registration surface.
pub trait RouteHandler: Send + Sync {
    fn handle(&self, request: &HttpRequest, response: &mut HttpResponse);
}

impl<F> RouteHandler for F
where
    F: Fn(&HttpRequest, &mut HttpResponse) + Send + Sync,
{
    fn handle(&self, request: &HttpRequest, response: &mut HttpResponse) {
        self(request, response)
    }
}

/// Uniform invocation token stored in the route tables.
///
/// The empty state is a plain `None` - no allocation. Calling an empty
/// wrapper is a no-op, which lets the router treat "no handler configured"
/// and "handler configured" uniformly.
#[derive(Clone, Default)]
pub struct HandlerWrapper(Option<Arc<dyn RouteHandler>>);

impl HandlerWrapper {
    pub fn new(handler: impl RouteHandler + 'static) -> Self {
        Self(Some(Arc::new(handler)))
    }

    pub fn none() -> Self {
        Self(None)
    }

    /// True when a target handler is set.
    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    pub fn call(&self, request: &HttpRequest, response: &mut HttpResponse) {
        if let Some(handler) = &self.0 {
            handler.handle(request, response);
        }
    }
}

impl std::fmt::Debug for HandlerWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_some() {
            "HandlerWrapper(set)"
        } else {
            "HandlerWrapper(empty)"
        })
    }
}
