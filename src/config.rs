//! Typed server configuration with TOML (de)serialization.
//!
//! The builder accepts a pre-populated [`ServerConfig`]; this module also
//! provides the text round-trip (`[server]`, `[threads]`, `[logging]`,
//! `[tls]`, `[daemon]` sections) and semantic validation. Unknown keys are
//! ignored on parse; missing keys take the documented defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Coroutine stack discipline. A deployment knob only - dispatch semantics
/// are identical under either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackMode {
    /// Each coroutine owns its stack.
    Independent,
    /// Coroutines draw stacks from a shared pool, swapped in on resume.
    Shared,
}

impl fmt::Display for StackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StackMode::Independent => "independent",
            StackMode::Shared => "shared",
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// Semantic validation failure; refuses a `build()`.
    Invalid(String),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Io(std::io::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(reason) => write!(f, "invalid configuration: {reason}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Serialize(e) => write!(f, "config serialize error: {e}"),
            ConfigError::Io(e) => write!(f, "config io error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid(_) => None,
            ConfigError::Parse(e) => Some(e),
            ConfigError::Serialize(e) => Some(e),
            ConfigError::Io(e) => Some(e),
        }
    }
}

const RECOGNIZED_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Default coroutine stack size: 64 KiB, enough for handler call chains
/// without inflating memory under high connection counts.
pub const DEFAULT_STACK_SIZE: usize = 0x10000;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub worker_threads: usize,
    pub stack_mode: StackMode,
    /// Per-coroutine stack size in bytes.
    pub stack_size: usize,
    pub log_level: String,
    /// Banner reported in the `Server` response header.
    pub server_name: String,
    pub tls_enabled: bool,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub daemonize: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            worker_threads: 4,
            stack_mode: StackMode::Independent,
            stack_size: DEFAULT_STACK_SIZE,
            log_level: "info".to_string(),
            server_name: "whirr/1.0".to_string(),
            tls_enabled: false,
            tls_cert: None,
            tls_key: None,
            daemonize: false,
        }
    }
}

impl ServerConfig {
    /// Semantic validation: a zero port, a zero worker count and an
    /// unrecognized log level are the refusable states.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must not be 0".to_string()));
        }
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid(
                "worker thread count must not be 0".to_string(),
            ));
        }
        if !RECOGNIZED_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unrecognized log level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let doc: ConfigDoc = toml::from_str(s).map_err(ConfigError::Parse)?;
        Ok(doc.into())
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&ConfigDoc::from(self)).map_err(ConfigError::Serialize)
    }
}

// The on-disk layout groups keys into sections; the flat runtime struct
// converts through these serde mirrors.

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct ConfigDoc {
    server: ServerSection,
    threads: ThreadsSection,
    logging: LoggingSection,
    tls: TlsSection,
    daemon: DaemonSection,
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct ServerSection {
    host: String,
    port: u16,
    name: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        let d = ServerConfig::default();
        Self {
            host: d.host,
            port: d.port,
            name: d.server_name,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct ThreadsSection {
    count: usize,
    stack_mode: StackMode,
    stack_size: usize,
}

impl Default for ThreadsSection {
    fn default() -> Self {
        Self {
            count: 4,
            stack_mode: StackMode::Independent,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct LoggingSection {
    level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct TlsSection {
    enabled: bool,
    cert: Option<PathBuf>,
    key: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct DaemonSection {
    enabled: bool,
}

impl From<ConfigDoc> for ServerConfig {
    fn from(doc: ConfigDoc) -> Self {
        Self {
            host: doc.server.host,
            port: doc.server.port,
            worker_threads: doc.threads.count,
            stack_mode: doc.threads.stack_mode,
            stack_size: doc.threads.stack_size,
            log_level: doc.logging.level,
            server_name: doc.server.name,
            tls_enabled: doc.tls.enabled,
            tls_cert: doc.tls.cert,
            tls_key: doc.tls.key,
            daemonize: doc.daemon.enabled,
        }
    }
}

impl From<&ServerConfig> for ConfigDoc {
    fn from(config: &ServerConfig) -> Self {
        Self {
            server: ServerSection {
                host: config.host.clone(),
                port: config.port,
                name: config.server_name.clone(),
            },
            threads: ThreadsSection {
                count: config.worker_threads,
                stack_mode: config.stack_mode,
                stack_size: config.stack_size,
            },
            logging: LoggingSection {
                level: config.log_level.clone(),
            },
            tls: TlsSection {
                enabled: config.tls_enabled,
                cert: config.tls_cert.clone(),
                key: config.tls_key.clone(),
            },
            daemon: DaemonSection {
                enabled: config.daemonize,
            },
        }
    }
}
