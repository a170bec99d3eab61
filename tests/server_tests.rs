#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use whirr::{
    BuildError, HttpRequest, HttpResponse, Middleware, Server, ServerBuilder, ServerConfig,
};

mod common;
use common::http::{free_port, send_request};
use common::test_server::setup_may_runtime;

fn start_on_free_port(builder: &mut ServerBuilder) -> (Server, SocketAddr) {
    setup_may_runtime();
    let port = free_port();
    let mut server = builder.listen("127.0.0.1", port).threads(1).build().unwrap();
    server.start().unwrap();
    server.wait_ready().unwrap();
    let addr = server.local_addr().unwrap();
    (server, addr)
}

#[test]
fn path_param_route_end_to_end() {
    let mut builder = ServerBuilder::new();
    builder.get("/api/users/:id", |req: &HttpRequest, r: &mut HttpResponse| {
        let id = req.path_param("id").unwrap_or("");
        r.json(format!("{{\"id\":\"{id}\"}}"));
    });
    let (mut server, addr) = start_on_free_port(&mut builder);

    let resp = send_request(
        &addr,
        "GET /api/users/42 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(resp.starts_with("HTTP/1.1 200"));
    assert!(resp.contains("{\"id\":\"42\"}"));

    server.stop();
}

#[test]
fn html_root_end_to_end() {
    let mut builder = ServerBuilder::new();
    builder.get("/", |_: &HttpRequest, r: &mut HttpResponse| {
        r.html("<h1>hi</h1>");
    });
    let (mut server, addr) = start_on_free_port(&mut builder);

    let resp = send_request(
        &addr,
        "GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(resp.starts_with("HTTP/1.1 200"));
    let content_type = resp
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(n, _)| n.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.trim().to_string())
        .unwrap();
    assert!(content_type.starts_with("text/html"));
    assert!(resp.contains("<h1>hi</h1>"));

    server.stop();
}

#[test]
fn method_mismatch_serves_the_default_404_page() {
    let mut builder = ServerBuilder::new();
    builder.post("/data", |_: &HttpRequest, r: &mut HttpResponse| {
        r.status(201).text("created");
    });
    let (mut server, addr) = start_on_free_port(&mut builder);

    let resp = send_request(
        &addr,
        "GET /data HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(resp.starts_with("HTTP/1.1 404"));
    assert!(resp.contains("<h1>404 Not Found</h1>"));

    server.stop();
}

#[test]
fn server_banner_header_is_injected() {
    let mut builder = ServerBuilder::new();
    builder
        .server_name("whirr-test/9.9")
        .get("/ping", |_: &HttpRequest, r: &mut HttpResponse| {
            r.text("pong");
        });
    let (mut server, addr) = start_on_free_port(&mut builder);

    let resp = send_request(
        &addr,
        "GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(resp.contains("whirr-test/9.9"));

    server.stop();
}

#[test]
fn middleware_headers_reach_the_wire() {
    struct Stamp;
    impl Middleware for Stamp {
        fn after(&self, _req: &HttpRequest, resp: &mut HttpResponse) {
            resp.header("X-Stamped", "yes");
        }
    }

    let mut builder = ServerBuilder::new();
    builder
        .middleware(Arc::new(Stamp))
        .get("/stamped", |_: &HttpRequest, r: &mut HttpResponse| {
            r.text("ok");
        });
    let (mut server, addr) = start_on_free_port(&mut builder);

    let resp = send_request(
        &addr,
        "GET /stamped HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(resp.starts_with("HTTP/1.1 200"));
    assert!(resp.contains("X-Stamped: yes"));

    server.stop();
}

#[test]
fn percent_encoded_paths_are_decoded_before_dispatch() {
    let mut builder = ServerBuilder::new();
    builder.get("/files/:name", |req: &HttpRequest, r: &mut HttpResponse| {
        r.text(req.path_param("name").unwrap_or("").to_string());
    });
    let (mut server, addr) = start_on_free_port(&mut builder);

    let resp = send_request(
        &addr,
        "GET /files/hello%20world HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(resp.starts_with("HTTP/1.1 200"));
    assert!(resp.contains("hello world"));

    server.stop();
}

#[test]
fn build_refuses_invalid_config() {
    let mut builder = ServerBuilder::new();
    builder.from_config(ServerConfig {
        port: 0,
        ..ServerConfig::default()
    });
    assert!(matches!(builder.build(), Err(BuildError::Config(_))));
}

#[test]
fn build_refuses_unreadable_tls_material() {
    let mut builder = ServerBuilder::new();
    builder
        .listen("127.0.0.1", free_port())
        .enable_tls("/nonexistent/cert.pem", "/nonexistent/key.pem");
    assert!(matches!(
        builder.build(),
        Err(BuildError::TlsMaterial { .. })
    ));
}

#[test]
fn build_surfaces_duplicate_route_registration() {
    let mut builder = ServerBuilder::new();
    builder
        .listen("127.0.0.1", free_port())
        .get("/users/:id", |_: &HttpRequest, _: &mut HttpResponse| {})
        .regex_route(
            http::Method::GET,
            "/users/:id",
            vec!["id".to_string()],
            |_: &HttpRequest, _: &mut HttpResponse| {},
        );
    assert!(matches!(builder.build(), Err(BuildError::Route(_))));
}

#[test]
fn builder_loads_toml_configuration() {
    let mut builder = ServerBuilder::new();
    builder
        .from_toml_str(
            r#"
[server]
name = "configured/1.0"

[threads]
count = 2
stack_mode = "shared"
"#,
        )
        .unwrap();

    assert_eq!(builder.config().server_name, "configured/1.0");
    assert_eq!(builder.config().worker_threads, 2);
}
