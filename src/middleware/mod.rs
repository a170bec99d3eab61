mod access_log;
mod chain;
mod metrics;

pub use access_log::AccessLogMiddleware;
pub use chain::{Middleware, MiddlewareChain};
pub use metrics::MetricsMiddleware;
