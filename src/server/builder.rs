use http::Method;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::http_server::Server;
use super::service::RouterService;
use crate::config::{ConfigError, ServerConfig, StackMode};
use crate::handler::{HandlerWrapper, RouteHandler};
use crate::middleware::Middleware;
use crate::router::{RouteError, Router};

/// Errors fatal to assembling or running a server.
#[derive(Debug)]
pub enum BuildError {
    Config(ConfigError),
    /// TLS is enabled but the cert or key could not be read.
    TlsMaterial {
        path: PathBuf,
        source: std::io::Error,
    },
    Route(RouteError),
    Bind(std::io::Error),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Config(e) => write!(f, "configuration rejected: {e}"),
            BuildError::TlsMaterial { path, source } => {
                write!(f, "unusable TLS material {}: {source}", path.display())
            }
            BuildError::Route(e) => write!(f, "route registration failed: {e}"),
            BuildError::Bind(e) => write!(f, "bind failed: {e}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Config(e) => Some(e),
            BuildError::TlsMaterial { source, .. } => Some(source),
            BuildError::Route(e) => Some(e),
            BuildError::Bind(e) => Some(e),
        }
    }
}

/// Fluent server assembly.
///
/// Accumulates configuration, routes and middleware, then `build()` turns
/// the recorded registrations into an immutable router wired to the
/// coroutine scheduler. `build()` is idempotent in its inputs - the recorded
/// state is not consumed - but it does tune the global scheduler each call.
/// Signal handlers are installed by `run()` only, never by `build()`, so
/// builds stay reusable in tests.
pub struct ServerBuilder {
    config: ServerConfig,
    middlewares: Vec<Arc<dyn Middleware>>,
    path_middlewares: Vec<(String, Arc<dyn Middleware>)>,
    routes: Vec<(Method, String, HandlerWrapper)>,
    regex_routes: Vec<(Method, String, Vec<String>, HandlerWrapper)>,
    not_found: HandlerWrapper,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            middlewares: Vec::new(),
            path_middlewares: Vec::new(),
            routes: Vec::new(),
            regex_routes: Vec::new(),
            not_found: HandlerWrapper::none(),
        }
    }

    pub fn listen(&mut self, host: &str, port: u16) -> &mut Self {
        self.config.host = host.to_string();
        self.config.port = port;
        self
    }

    pub fn threads(&mut self, count: usize) -> &mut Self {
        self.config.worker_threads = count;
        self
    }

    pub fn stack_size(&mut self, bytes: usize) -> &mut Self {
        self.config.stack_size = bytes;
        self
    }

    pub fn use_independent_stack(&mut self) -> &mut Self {
        self.config.stack_mode = StackMode::Independent;
        self
    }

    pub fn use_shared_stack(&mut self) -> &mut Self {
        self.config.stack_mode = StackMode::Shared;
        self
    }

    pub fn log_level(&mut self, level: &str) -> &mut Self {
        self.config.log_level = level.to_string();
        self
    }

    pub fn server_name(&mut self, name: &str) -> &mut Self {
        self.config.server_name = name.to_string();
        self
    }

    pub fn enable_tls(&mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> &mut Self {
        self.config.tls_enabled = true;
        self.config.tls_cert = Some(cert.into());
        self.config.tls_key = Some(key.into());
        self
    }

    pub fn daemon(&mut self, enable: bool) -> &mut Self {
        self.config.daemonize = enable;
        self
    }

    /// Replaces the accumulated configuration with a pre-populated one.
    pub fn from_config(&mut self, config: ServerConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn from_toml_str(&mut self, toml: &str) -> Result<&mut Self, ConfigError> {
        self.config = ServerConfig::from_toml_str(toml)?;
        Ok(self)
    }

    pub fn from_config_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, ConfigError> {
        self.config = ServerConfig::from_toml_file(path)?;
        Ok(self)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handler: impl RouteHandler + 'static,
    ) -> &mut Self {
        self.routes
            .push((method, path.to_string(), HandlerWrapper::new(handler)));
        self
    }

    pub fn get(&mut self, path: &str, handler: impl RouteHandler + 'static) -> &mut Self {
        self.route(Method::GET, path, handler)
    }

    pub fn post(&mut self, path: &str, handler: impl RouteHandler + 'static) -> &mut Self {
        self.route(Method::POST, path, handler)
    }

    pub fn put(&mut self, path: &str, handler: impl RouteHandler + 'static) -> &mut Self {
        self.route(Method::PUT, path, handler)
    }

    pub fn del(&mut self, path: &str, handler: impl RouteHandler + 'static) -> &mut Self {
        self.route(Method::DELETE, path, handler)
    }

    pub fn regex_route(
        &mut self,
        method: Method,
        pattern: &str,
        param_names: Vec<String>,
        handler: impl RouteHandler + 'static,
    ) -> &mut Self {
        self.regex_routes.push((
            method,
            pattern.to_string(),
            param_names,
            HandlerWrapper::new(handler),
        ));
        self
    }

    /// Appends a middleware to the global chain.
    pub fn middleware(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Scopes a middleware to one route path.
    pub fn route_middleware(&mut self, path: &str, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.path_middlewares.push((path.to_string(), middleware));
        self
    }

    /// Overrides the 404 handler.
    pub fn not_found(&mut self, handler: impl RouteHandler + 'static) -> &mut Self {
        self.not_found = HandlerWrapper::new(handler);
        self
    }

    /// Validates the configuration, tunes the scheduler, assembles the
    /// router and returns a stopped [`Server`].
    pub fn build(&mut self) -> Result<Server, BuildError> {
        self.config.validate().map_err(BuildError::Config)?;

        init_tracing(&self.config.log_level);

        if self.config.tls_enabled {
            self.check_tls_material()?;
        }

        apply_scheduler_config(&self.config);

        let mut router = Router::new();
        for middleware in &self.middlewares {
            router.add_middleware(middleware.clone());
        }
        for (method, path, handler) in &self.routes {
            router
                .add_route(method.clone(), path, handler.clone())
                .map_err(BuildError::Route)?;
        }
        for (method, pattern, param_names, handler) in &self.regex_routes {
            router
                .add_regex_route_wrapper(
                    method.clone(),
                    pattern,
                    param_names.clone(),
                    handler.clone(),
                )
                .map_err(BuildError::Route)?;
        }
        // Route-scoped attachment needs the routes in place first.
        for (path, middleware) in &self.path_middlewares {
            router.add_path_middleware(path, middleware.clone());
        }
        router.set_not_found_wrapper(self.not_found.clone());
        router.dump_routes();

        let service = RouterService::new(Arc::new(router), &self.config.server_name);
        Ok(Server::new(self.config.clone(), service))
    }

    /// Builds, starts, and blocks until a shutdown signal arrives, then
    /// drains. INT and TERM both stop the server.
    pub fn run(&mut self) -> Result<(), BuildError> {
        let mut server = self.build()?;

        if self.config.daemonize {
            info!("daemon mode configured; expecting the process supervisor to detach");
        }

        server.start().map_err(BuildError::Bind)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            warn!(error = %e, "could not install shutdown signal handler");
        }

        info!(
            host = %self.config.host,
            port = self.config.port,
            workers = self.config.worker_threads,
            stack_mode = %self.config.stack_mode,
            "server running"
        );

        while !shutdown.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(200));
        }

        info!("shutdown signal received, draining");
        server.stop();
        Ok(())
    }

    fn check_tls_material(&self) -> Result<(), BuildError> {
        for path in [&self.config.tls_cert, &self.config.tls_key] {
            let Some(path) = path else {
                return Err(BuildError::Config(ConfigError::Invalid(
                    "tls enabled but cert/key path missing".to_string(),
                )));
            };
            fs::read(path).map_err(|source| BuildError::TlsMaterial {
                path: path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Tunes the global coroutine scheduler. Shared stack mode sizes a stack
/// pool for reuse across resumes; independent mode leaves pooling off.
fn apply_scheduler_config(config: &ServerConfig) {
    let scheduler = may::config();
    scheduler.set_workers(config.worker_threads);
    scheduler.set_stack_size(config.stack_size);
    match config.stack_mode {
        StackMode::Independent => {
            scheduler.set_pool_capacity(0);
        }
        StackMode::Shared => {
            scheduler.set_pool_capacity(config.worker_threads * 256);
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed (tests, embedding apps); the
    // existing one wins.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
