use http::Method;
use std::collections::HashMap;

/// A parsed HTTP request as seen by the router, middleware and handlers.
///
/// Constructed by the connection glue (or directly in tests) from an already
/// parsed wire request: the path carries no query string and is URL-decoded.
/// The router is the only mutator after construction - it injects the path
/// parameters captured during matching before the handler runs.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    path_params: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: Vec::new(),
            path_params: HashMap::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The URL-decoded path component, without query or fragment.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Header lookup is case-insensitive; keys are stored lowercased.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: Vec<u8>) -> &mut Self {
        self.body = body;
        self
    }

    /// Injects a path parameter captured by the router.
    pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.path_params.insert(name.into(), value.into());
    }

    /// Handler-side accessor for a captured path parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }
}
