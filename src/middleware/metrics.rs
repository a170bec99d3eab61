use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::Middleware;
use crate::request::HttpRequest;
use crate::response::HttpResponse;

thread_local! {
    static DISPATCH_START: RefCell<Option<Instant>> = const { RefCell::new(None) };
}

/// Request counters collected across all worker threads.
///
/// All counters use atomic operations, so a single instance can be shared
/// between the router and a scraping endpoint without locks.
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    success: AtomicUsize,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            success: AtomicUsize::new(0),
            client_errors: AtomicUsize::new(0),
            server_errors: AtomicUsize::new(0),
        }
    }
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean dispatch latency; zero before the first request completes.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses with a 2xx/3xx status.
    pub fn success_count(&self) -> usize {
        self.success.load(Ordering::Relaxed)
    }

    pub fn client_error_count(&self) -> usize {
        self.client_errors.load(Ordering::Relaxed)
    }

    pub fn server_error_count(&self) -> usize {
        self.server_errors.load(Ordering::Relaxed)
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _request: &HttpRequest, _response: &mut HttpResponse) -> bool {
        DISPATCH_START.with(|s| *s.borrow_mut() = Some(Instant::now()));
        true
    }

    fn after(&self, _request: &HttpRequest, response: &mut HttpResponse) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        if let Some(start) = DISPATCH_START.with(|s| s.borrow_mut().take()) {
            self.total_latency_ns
                .fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
        }
        match response.status_code() {
            400..=499 => self.client_errors.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.server_errors.fetch_add(1, Ordering::Relaxed),
            _ => self.success.fetch_add(1, Ordering::Relaxed),
        };
    }
}
