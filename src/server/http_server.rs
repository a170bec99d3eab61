use may::coroutine::JoinHandle;
use may_minihttp::HttpServer as WireServer;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::info;

use super::service::RouterService;
use crate::config::ServerConfig;

struct AcceptLoop {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

/// A built server: the configuration plus the glue service, with the accept
/// loop attached once [`start`](Server::start) succeeds.
pub struct Server {
    config: ServerConfig,
    service: RouterService,
    accept: Option<AcceptLoop>,
}

impl Server {
    pub(crate) fn new(config: ServerConfig, service: RouterService) -> Self {
        Self {
            config,
            service,
            accept: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn service(&self) -> &RouterService {
        &self.service
    }

    /// Binds the configured address and starts accepting connections, one
    /// coroutine per connection. Bind failures surface as the underlying
    /// `io::Error`.
    pub fn start(&mut self) -> io::Result<()> {
        let addr = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid listen address"))?;
        let handle = WireServer(self.service.clone()).start(addr)?;
        info!(%addr, server_name = %self.config.server_name, "server accepting connections");
        self.accept = Some(AcceptLoop { addr, handle });
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.accept.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.accept.as_ref().map(|a| a.addr)
    }

    /// Polls until the listener answers a TCP connect, for tests and
    /// supervised startups that need the socket live before proceeding.
    pub fn wait_ready(&self) -> io::Result<()> {
        let addr = self
            .accept
            .as_ref()
            .map(|a| a.addr)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "server not started"))?;
        for _ in 0..50 {
            if TcpStream::connect(addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Requests drain: stops accepting and joins the accept coroutine.
    /// In-flight coroutines run to their next I/O point and terminate.
    pub fn stop(&mut self) {
        if let Some(accept) = self.accept.take() {
            unsafe {
                accept.handle.coroutine().cancel();
            }
            let _ = accept.handle.join();
            info!("server stopped");
        }
    }

    /// Blocks until the accept loop exits.
    pub fn join(mut self) -> std::thread::Result<()> {
        match self.accept.take() {
            Some(accept) => accept.handle.join(),
            None => Ok(()),
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}
