use may_minihttp::{HttpService, Request, Response};
use percent_encoding::percent_decode_str;
use std::collections::HashSet;
use std::io::{self, Read};
use std::sync::{Arc, Mutex, OnceLock};

use crate::request::HttpRequest;
use crate::response::{status_reason, HttpResponse};
use crate::router::Router;

/// Adapts parsed wire requests onto the router.
///
/// One clone of the service lives in every connection coroutine; the router
/// behind the `Arc` is immutable after start, so no locking is involved on
/// the dispatch path.
#[derive(Clone)]
pub struct RouterService {
    router: Arc<Router>,
    server_name: Arc<str>,
}

impl RouterService {
    pub fn new(router: Arc<Router>, server_name: &str) -> Self {
        Self {
            router,
            server_name: Arc::from(server_name),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl HttpService for RouterService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let method = match req.method().parse::<http::Method>() {
            Ok(method) => method,
            Err(_) => {
                res.status_code(400, status_reason(400));
                return Ok(());
            }
        };

        // The router contract wants the decoded path component only.
        let raw_path = req.path().to_string();
        let path = raw_path.split('?').next().unwrap_or("/");
        let path = percent_decode_str(path).decode_utf8_lossy().into_owned();

        let mut request = HttpRequest::new(method, path);
        for header in req.headers() {
            request.set_header(header.name, String::from_utf8_lossy(header.value).to_string());
        }
        let mut body = Vec::new();
        if req.body().read_to_end(&mut body).is_ok() && !body.is_empty() {
            request.set_body(body);
        }

        let mut response = HttpResponse::new();
        self.router.dispatch(&mut request, &mut response);

        if response.get_header("server").is_none() {
            response.header("Server", self.server_name.as_ref());
        }

        write_response(res, &response);
        Ok(())
    }
}

fn write_response(res: &mut Response, response: &HttpResponse) {
    let status = response.status_code();
    res.status_code(status as usize, status_reason(status));
    for (name, value) in response.headers() {
        res.header(intern_header_line(name, value));
    }
    res.body_vec(response.body_bytes().to_vec());
}

// The wire layer takes header lines as `&'static str`. Distinct lines are
// interned once; repeated lines (content types, the server banner) cost a
// set lookup afterwards.
fn intern_header_line(name: &str, value: &str) -> &'static str {
    static LINES: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();
    let line = format!("{name}: {value}");
    let mut lines = LINES
        .get_or_init(|| Mutex::new(HashSet::new()))
        .lock()
        .unwrap();
    match lines.get(line.as_str()) {
        Some(interned) => interned,
        None => {
            let interned: &'static str = Box::leak(line.into_boxed_str());
            lines.insert(interned);
            interned
        }
    }
}
