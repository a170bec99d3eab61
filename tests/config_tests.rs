#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use whirr::{ConfigError, ServerConfig, StackMode};

#[test]
fn round_trip_preserves_every_field() {
    let config = ServerConfig {
        host: "10.0.0.5".to_string(),
        port: 9090,
        worker_threads: 2,
        stack_mode: StackMode::Shared,
        stack_size: 0x8000,
        log_level: "trace".to_string(),
        server_name: "edge/2.3".to_string(),
        tls_enabled: true,
        tls_cert: Some(PathBuf::from("/tls/cert.pem")),
        tls_key: Some(PathBuf::from("/tls/key.pem")),
        daemonize: true,
    };

    let text = config.to_toml_string().unwrap();
    assert!(text.contains("[server]"));
    assert!(text.contains("[threads]"));
    assert!(text.contains("[logging]"));
    assert!(text.contains("[tls]"));
    assert!(text.contains("[daemon]"));

    let parsed = ServerConfig::from_toml_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn validation_rejects_the_documented_degenerate_states() {
    let ok = ServerConfig::default();
    assert!(ok.validate().is_ok());

    let mut bad_port = ServerConfig::default();
    bad_port.port = 0;
    assert!(matches!(bad_port.validate(), Err(ConfigError::Invalid(_))));

    let mut bad_threads = ServerConfig::default();
    bad_threads.worker_threads = 0;
    assert!(matches!(
        bad_threads.validate(),
        Err(ConfigError::Invalid(_))
    ));

    let mut bad_level = ServerConfig::default();
    bad_level.log_level = "loud".to_string();
    assert!(matches!(bad_level.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn every_documented_log_level_validates() {
    for level in ["trace", "debug", "info", "warn", "error"] {
        let mut config = ServerConfig::default();
        config.log_level = level.to_string();
        assert!(config.validate().is_ok(), "level {level} should validate");
    }
}

#[test]
fn parse_accepts_the_documented_layout() {
    let parsed = ServerConfig::from_toml_str(
        r#"
[server]
host = "0.0.0.0"
port = 8080
name = "edge-gw/1.0"

[threads]
count = 4
stack_mode = "independent"

[logging]
level = "info"

[tls]
enabled = false

[daemon]
enabled = false
"#,
    )
    .unwrap();

    assert_eq!(parsed.server_name, "edge-gw/1.0");
    assert_eq!(parsed.worker_threads, 4);
    assert_eq!(parsed.stack_mode, StackMode::Independent);
    assert!(!parsed.tls_enabled);
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = ServerConfig::from_toml_str("[server\nhost = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = ServerConfig::from_toml_file("/nonexistent/whirr.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
