//! Router core - the entry point for every parsed request.
//!
//! Resolution tries the matchers in a fixed order: the exact-path table,
//! then the radix tree, then the regex fallback. The first tier that yields
//! a handler for the request method wins; a path known only under another
//! method falls through and ultimately lands on the 404 handler.

use http::Method;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::handler::{HandlerWrapper, RouteHandler};
use crate::middleware::{Middleware, MiddlewareChain};
use crate::request::HttpRequest;
use crate::response::HttpResponse;
use crate::router::radix::{ParamVec, RadixTree};
use crate::router::regex_table::RegexRouteTable;

/// Registration-time routing errors.
#[derive(Debug)]
pub enum RouteError {
    /// The same pattern string was registered in both the dynamic tiers and
    /// the regex table; the overlap would make dispatch ambiguous.
    DuplicatePattern(String),
    /// The regex pattern failed to compile.
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::DuplicatePattern(pattern) => {
                write!(
                    f,
                    "pattern '{pattern}' is already registered under another matcher tier"
                )
            }
            RouteError::InvalidPattern { pattern, .. } => {
                write!(f, "regex pattern '{pattern}' failed to compile")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::InvalidPattern { source, .. } => Some(source),
            RouteError::DuplicatePattern(_) => None,
        }
    }
}

/// Exact-path table entry: per-method handlers plus route-scoped middleware.
#[derive(Default)]
struct StaticRouteEntry {
    handlers: HashMap<Method, HandlerWrapper>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

/// Everything one dispatch needs from resolution.
struct RouteContext {
    found: bool,
    handler: HandlerWrapper,
    middlewares: Vec<Arc<dyn Middleware>>,
    params: ParamVec,
}

impl RouteContext {
    fn not_found() -> Self {
        Self {
            found: false,
            handler: HandlerWrapper::none(),
            middlewares: Vec::new(),
            params: ParamVec::new(),
        }
    }
}

pub struct Router {
    static_routes: HashMap<String, StaticRouteEntry>,
    tree: RadixTree,
    regex_routes: RegexRouteTable,
    /// Pattern strings registered through the dynamic tiers, for duplicate
    /// detection against the regex table.
    dynamic_patterns: HashSet<String>,
    middlewares: Vec<Arc<dyn Middleware>>,
    path_middlewares: HashMap<String, Vec<Arc<dyn Middleware>>>,
    not_found: HandlerWrapper,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        let default_404 = |_req: &HttpRequest, resp: &mut HttpResponse| {
            resp.status(404)
                .html("<html><body><h1>404 Not Found</h1></body></html>");
        };
        Self {
            static_routes: HashMap::new(),
            tree: RadixTree::new(),
            regex_routes: RegexRouteTable::new(),
            dynamic_patterns: HashSet::new(),
            middlewares: Vec::new(),
            path_middlewares: HashMap::new(),
            not_found: HandlerWrapper::new(default_404),
        }
    }

    fn is_dynamic(path: &str) -> bool {
        path.contains(':') || path.contains('*')
    }

    /// Registers a route. Literal paths land in the exact table; paths with
    /// `:param` or `*catch-all` segments land in the radix tree.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handler: impl RouteHandler + 'static,
    ) -> Result<(), RouteError> {
        self.add_route(method, path, HandlerWrapper::new(handler))
    }

    pub(crate) fn add_route(
        &mut self,
        method: Method,
        path: &str,
        handler: HandlerWrapper,
    ) -> Result<(), RouteError> {
        if Self::is_dynamic(path) {
            if self.regex_routes.contains_pattern(path) {
                return Err(RouteError::DuplicatePattern(path.to_string()));
            }
            self.tree.insert(method.clone(), path, handler);
            self.dynamic_patterns.insert(path.to_string());
        } else {
            let entry = self.static_routes.entry(path.to_string()).or_default();
            entry.handlers.insert(method.clone(), handler);
        }
        debug!(method = %method, path = %path, "route registered");
        Ok(())
    }

    pub fn get(&mut self, path: &str, handler: impl RouteHandler + 'static) -> Result<(), RouteError> {
        self.route(Method::GET, path, handler)
    }

    pub fn post(&mut self, path: &str, handler: impl RouteHandler + 'static) -> Result<(), RouteError> {
        self.route(Method::POST, path, handler)
    }

    pub fn put(&mut self, path: &str, handler: impl RouteHandler + 'static) -> Result<(), RouteError> {
        self.route(Method::PUT, path, handler)
    }

    pub fn del(&mut self, path: &str, handler: impl RouteHandler + 'static) -> Result<(), RouteError> {
        self.route(Method::DELETE, path, handler)
    }

    /// Registers a regex fallback route. The pattern must cover the whole
    /// path; capture groups bind `param_names` positionally.
    pub fn add_regex_route(
        &mut self,
        method: Method,
        pattern: &str,
        param_names: Vec<String>,
        handler: impl RouteHandler + 'static,
    ) -> Result<(), RouteError> {
        self.add_regex_route_wrapper(method, pattern, param_names, HandlerWrapper::new(handler))
    }

    pub(crate) fn add_regex_route_wrapper(
        &mut self,
        method: Method,
        pattern: &str,
        param_names: Vec<String>,
        handler: HandlerWrapper,
    ) -> Result<(), RouteError> {
        if self.dynamic_patterns.contains(pattern) {
            return Err(RouteError::DuplicatePattern(pattern.to_string()));
        }
        self.regex_routes.add(method, pattern, param_names, handler)
    }

    /// Appends a middleware to the global chain.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Scopes a middleware to one path.
    ///
    /// A literal path with a registered route attaches to that route's
    /// entry; a regex pattern attaches to its table entry. Anything else is
    /// keyed by the exact request path, so it also covers paths that only
    /// resolve through the radix tree (or not at all).
    pub fn add_path_middleware(&mut self, path: &str, middleware: Arc<dyn Middleware>) {
        if let Some(entry) = self.static_routes.get_mut(path) {
            entry.middlewares.push(middleware);
            return;
        }
        if let Some(entry) = self.regex_routes.entry_mut(path) {
            entry.middlewares.push(middleware);
            return;
        }
        self.path_middlewares
            .entry(path.to_string())
            .or_default()
            .push(middleware);
    }

    /// Replaces the 404 handler.
    pub fn set_not_found(&mut self, handler: impl RouteHandler + 'static) {
        self.not_found = HandlerWrapper::new(handler);
    }

    pub(crate) fn set_not_found_wrapper(&mut self, handler: HandlerWrapper) {
        if handler.is_some() {
            self.not_found = handler;
        }
    }

    fn resolve(&self, method: &Method, path: &str) -> RouteContext {
        if let Some(entry) = self.static_routes.get(path) {
            if let Some(handler) = entry.handlers.get(method) {
                debug!(method = %method, path = %path, tier = "static", "route matched");
                return RouteContext {
                    found: true,
                    handler: handler.clone(),
                    middlewares: entry.middlewares.clone(),
                    params: ParamVec::new(),
                };
            }
        }

        if let Some(matched) = self.tree.find(path) {
            if let Some(handler) = matched.node.handler(method) {
                debug!(method = %method, path = %path, tier = "radix", "route matched");
                return RouteContext {
                    found: true,
                    handler: handler.clone(),
                    middlewares: Vec::new(),
                    params: matched.params,
                };
            }
        }

        if let Some((entry, params)) = self.regex_routes.find(path, method) {
            if let Some(handler) = entry.handlers.get(method) {
                debug!(method = %method, path = %path, tier = "regex", "route matched");
                return RouteContext {
                    found: true,
                    handler: handler.clone(),
                    middlewares: entry.middlewares.clone(),
                    params,
                };
            }
        }

        warn!(method = %method, path = %path, "no route matched");
        RouteContext::not_found()
    }

    /// Dispatches one request: resolve, inject params, run the chain and
    /// the handler, and report whether a route was found (regardless of any
    /// middleware short-circuit).
    pub fn dispatch(&self, request: &mut HttpRequest, response: &mut HttpResponse) -> bool {
        let context = self.resolve(request.method(), request.path());

        for (name, value) in &context.params {
            request.set_path_param(name.clone(), value.clone());
        }

        let mut chain = MiddlewareChain::new();
        for middleware in &self.middlewares {
            chain.add(middleware.clone());
        }
        if let Some(scoped) = self.path_middlewares.get(request.path()) {
            for middleware in scoped {
                chain.add(middleware.clone());
            }
        }
        for middleware in &context.middlewares {
            chain.add(middleware.clone());
        }

        let proceed = match catch_unwind(AssertUnwindSafe(|| {
            chain.execute_before(request, response)
        })) {
            Ok(proceed) => proceed,
            Err(_) => {
                error!(path = %request.path(), "middleware before hook panicked");
                Self::internal_error(response);
                false
            }
        };

        if proceed {
            let handler = if context.found {
                &context.handler
            } else {
                &self.not_found
            };
            let outcome = catch_unwind(AssertUnwindSafe(|| handler.call(request, response)));
            if outcome.is_err() {
                error!(
                    method = %request.method(),
                    path = %request.path(),
                    "handler panicked"
                );
                Self::internal_error(response);
            }
        }

        chain.execute_after(request, response);

        context.found
    }

    /// Replaces whatever a failed handler left behind with a generic 500.
    fn internal_error(response: &mut HttpResponse) {
        *response = HttpResponse::new();
        response
            .status(500)
            .text("500 Internal Server Error");
    }

    /// Logs every registered route. Useful at startup to verify the table.
    pub fn dump_routes(&self) {
        for (path, entry) in &self.static_routes {
            for method in entry.handlers.keys() {
                info!(tier = "static", route = %format!("{method} {path}"), "registered route");
            }
        }
        for (method, pattern) in self.tree.routes() {
            info!(tier = "radix", route = %format!("{method} {pattern}"), "registered route");
        }
        for entry in self.regex_routes.routes() {
            for method in entry.handlers.keys() {
                info!(tier = "regex", route = %format!("{method} {}", entry.pattern), "registered route");
            }
        }
    }
}
