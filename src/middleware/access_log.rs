use std::cell::RefCell;
use std::time::Instant;

use tracing::{debug, info};

use super::Middleware;
use crate::request::HttpRequest;
use crate::response::HttpResponse;

thread_local! {
    // Dispatch never suspends between before and after, so the coroutine
    // stays on one thread for the whole request and a thread-local start
    // time is sound.
    static REQUEST_START: RefCell<Option<Instant>> = const { RefCell::new(None) };
}

/// Structured access logging around every dispatch.
pub struct AccessLogMiddleware;

impl Middleware for AccessLogMiddleware {
    fn before(&self, request: &HttpRequest, _response: &mut HttpResponse) -> bool {
        REQUEST_START.with(|s| *s.borrow_mut() = Some(Instant::now()));
        debug!(method = %request.method(), path = %request.path(), "request received");
        true
    }

    fn after(&self, request: &HttpRequest, response: &mut HttpResponse) {
        let latency_us = REQUEST_START
            .with(|s| s.borrow_mut().take())
            .map(|start| start.elapsed().as_micros() as u64);
        info!(
            method = %request.method(),
            path = %request.path(),
            status = response.status_code(),
            latency_us,
            "request complete"
        );
    }
}
