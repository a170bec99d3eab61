//! whirr - an embeddable HTTP/1.x server framework core.
//!
//! The heart of the crate is the [`Router`]: it resolves a parsed request to
//! a handler through three matcher tiers (exact table, radix tree, regex
//! fallback), runs a pre/post middleware chain around the handler, and fills
//! in an [`HttpResponse`]. A fluent [`ServerBuilder`] assembles the server
//! configuration, registers routes and middleware, and binds the router to
//! the `may` coroutine scheduler that drives concurrent connections.
//!
//! ```rust,ignore
//! use whirr::ServerBuilder;
//!
//! ServerBuilder::new()
//!     .listen("0.0.0.0", 8080)
//!     .threads(4)
//!     .get("/users/:id", |req, resp| {
//!         let id = req.path_param("id").unwrap_or("");
//!         resp.json(&format!("{{\"id\":\"{id}\"}}"));
//!     })
//!     .run()
//!     .unwrap();
//! ```

pub mod config;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use config::{ConfigError, ServerConfig, StackMode};
pub use handler::{HandlerWrapper, RouteHandler};
pub use middleware::{AccessLogMiddleware, MetricsMiddleware, Middleware, MiddlewareChain};
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use router::{RouteError, Router};
pub use server::{BuildError, RouterService, Server, ServerBuilder};
