//! Ordered regex fallback for routes the radix tree cannot express.

use http::Method;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::handler::HandlerWrapper;
use crate::middleware::Middleware;
use crate::router::radix::ParamVec;
use crate::router::RouteError;

pub(crate) struct RegexRoute {
    pub pattern: String,
    regex: Regex,
    /// Capture-group names, positional: group 1 binds `param_names[0]`.
    param_names: Vec<String>,
    pub handlers: HashMap<Method, HandlerWrapper>,
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

/// Append-only table of compiled patterns, matched in insertion order.
#[derive(Default)]
pub(crate) struct RegexRouteTable {
    routes: Vec<RegexRoute>,
}

impl RegexRouteTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Compiles the pattern once and stores it. A pattern string already in
    /// the table folds into the existing entry; re-registering a method on
    /// it overwrites that method's handler.
    pub(crate) fn add(
        &mut self,
        method: Method,
        pattern: &str,
        param_names: Vec<String>,
        handler: HandlerWrapper,
    ) -> Result<(), RouteError> {
        if let Some(entry) = self.routes.iter_mut().find(|r| r.pattern == pattern) {
            entry.handlers.insert(method, handler);
            return Ok(());
        }

        let regex = Regex::new(pattern).map_err(|source| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        debug!(pattern = %pattern, "regex route compiled");

        let mut handlers = HashMap::new();
        handlers.insert(method, handler);
        self.routes.push(RegexRoute {
            pattern: pattern.to_string(),
            regex,
            param_names,
            handlers,
            middlewares: Vec::new(),
        });
        Ok(())
    }

    pub(crate) fn contains_pattern(&self, pattern: &str) -> bool {
        self.routes.iter().any(|r| r.pattern == pattern)
    }

    pub(crate) fn entry_mut(&mut self, pattern: &str) -> Option<&mut RegexRoute> {
        self.routes.iter_mut().find(|r| r.pattern == pattern)
    }

    /// First entry whose regex matches the whole path and carries a handler
    /// for the method wins. Bindings come from positional capture groups.
    pub(crate) fn find(&self, path: &str, method: &Method) -> Option<(&RegexRoute, ParamVec)> {
        for route in &self.routes {
            let Some(caps) = route.regex.captures(path) else {
                continue;
            };
            // Substring hits do not count; the pattern must cover the path.
            let whole = caps.get(0).map(|m| m.len() == path.len()).unwrap_or(false);
            if !whole || !route.handlers.contains_key(method) {
                continue;
            }

            let mut params = ParamVec::new();
            for (i, name) in route.param_names.iter().enumerate() {
                if let Some(group) = caps.get(i + 1) {
                    params.push((name.clone(), group.as_str().to_string()));
                }
            }
            return Some((route, params));
        }
        None
    }

    pub(crate) fn routes(&self) -> impl Iterator<Item = &RegexRoute> {
        self.routes.iter()
    }
}
