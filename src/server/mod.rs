//! Server assembly: the fluent builder, the coroutine-driven listener and
//! the glue service that adapts wire requests onto the router.
//!
//! Each accepted connection owns one coroutine; the coroutine reads and
//! parses a request, calls [`Router::dispatch`](crate::Router::dispatch)
//! synchronously, writes the response, then yields for keep-alive or
//! terminates. Route tables are assembled by the builder and immutable once
//! the listener starts.

pub mod builder;
pub mod http_server;
pub mod service;

pub use builder::{BuildError, ServerBuilder};
pub use http_server::Server;
pub use service::RouterService;
