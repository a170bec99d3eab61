/// The response under construction during dispatch.
///
/// Mutable throughout the middleware chain and the handler; ownership moves
/// to the wire serializer after the `after` hooks finish. Headers keep their
/// insertion order. Every setter is chainable and last-writer-wins: a second
/// `status` call replaces the first, and `header` replaces an existing value
/// for the same (case-insensitive) name instead of appending a duplicate.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&mut self, code: u16) -> &mut Self {
        self.status = code;
        self
    }

    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            slot.1 = value;
        } else {
            self.headers.push((name, value));
        }
        self
    }

    pub fn content_type(&mut self, ct: impl Into<String>) -> &mut Self {
        self.header("Content-Type", ct)
    }

    pub fn body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = body.into();
        self
    }

    pub fn text(&mut self, s: impl Into<String>) -> &mut Self {
        self.content_type("text/plain; charset=utf-8")
            .body(s.into().into_bytes())
    }

    pub fn html(&mut self, s: impl Into<String>) -> &mut Self {
        self.content_type("text/html; charset=utf-8")
            .body(s.into().into_bytes())
    }

    /// Sets an `application/json` body from an already serialized string.
    pub fn json(&mut self, s: impl Into<String>) -> &mut Self {
        self.content_type("application/json")
            .body(s.into().into_bytes())
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }
}

/// Reason phrase for the status line written by the serializer.
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_are_last_writer_wins() {
        let mut resp = HttpResponse::new();
        resp.status(200).status(201);
        assert_eq!(resp.status_code(), 201);

        resp.header("k", "v1").header("K", "v2");
        assert_eq!(resp.get_header("k"), Some("v2"));
        assert_eq!(resp.headers().len(), 1);
    }

    #[test]
    fn content_helpers_set_type_and_body() {
        let mut resp = HttpResponse::new();
        resp.html("<h1>hi</h1>");
        assert_eq!(
            resp.get_header("content-type"),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(resp.body_bytes(), b"<h1>hi</h1>");

        resp.json("{\"ok\":true}");
        assert_eq!(resp.get_header("content-type"), Some("application/json"));
    }

    #[test]
    fn status_reason_covers_common_codes() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(500), "Internal Server Error");
    }
}
