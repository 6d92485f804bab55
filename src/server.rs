//! HTTP and CGI front ends.
//!
//! Both serve a single endpoint, `/`, and hand the query string to
//! [`render_menu`]. Requests are handled one at a time.

use crate::delivery::{render_menu, MenuResponse, ServiceConfig};
use crate::{Error, Renderer, Result};
use log::{debug, info, warn};
use std::io::Write;
use std::net::SocketAddr;
use tiny_http::{Header, Method, Request, Response, Server};

/// A blocking HTTP server for the menu
pub struct MenuServer {
    server: Server,
    config: ServiceConfig,
}

impl MenuServer {
    /// Bind to `addr` (port 0 picks a free port)
    pub fn bind(addr: &str, config: ServiceConfig) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| Error::InitializationError(format!("Failed to bind {}: {}", addr, e)))?;
        Ok(Self { server, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.server
            .server_addr()
            .to_ip()
            .ok_or_else(|| Error::Other("server is not listening on an IP address".into()))
    }

    /// Serve requests until the listener fails
    pub fn run<R: Renderer>(self) -> Result<()> {
        info!("listening on http://{}", self.local_addr()?);
        for request in self.server.incoming_requests() {
            handle::<R>(request, &self.config);
        }
        Ok(())
    }

    /// Serve exactly one request; used by tests and one-shot deployments
    pub fn run_once<R: Renderer>(&self) -> Result<()> {
        let request = self.server.recv()?;
        handle::<R>(request, &self.config);
        Ok(())
    }
}

fn handle<R: Renderer>(request: Request, config: &ServiceConfig) {
    let (path, query) = split_url(request.url());
    debug!("{} {}", request.method(), request.url());

    let response = match (request.method(), path) {
        (Method::Get | Method::Head, "/") => render_menu::<R>(query, config),
        (_, "/") => MenuResponse::text(405, "Method Not Allowed\n").with_header("Allow", "GET, HEAD"),
        _ => MenuResponse::text(404, "Not Found\n"),
    };

    info!("{} {} -> {}", request.method(), path, response.status);
    if let Err(e) = request.respond(to_http(response)) {
        warn!("Failed to write response: {}", e);
    }
}

/// Split a request target into path and raw query
pub fn split_url(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

fn to_http(resp: MenuResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut out = Response::from_data(resp.body).with_status_code(resp.status);
    for (name, value) in &resp.headers {
        // tiny_http computes the length itself
        if name.eq_ignore_ascii_case("Content-Length") {
            continue;
        }
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(h) => out.add_header(h),
            Err(()) => warn!("Dropping invalid header {}", name),
        }
    }
    out
}

/// Write `resp` as CGI/1.1 output: a `Status` line, headers, blank line, body.
pub fn write_cgi<W: Write>(resp: &MenuResponse, mut out: W) -> std::io::Result<()> {
    write!(out, "Status: {} {}\r\n", resp.status, reason_phrase(resp.status))?;
    for (name, value) in &resp.headers {
        write!(out, "{}: {}\r\n", name, value)?;
    }
    out.write_all(b"\r\n")?;
    out.write_all(&resp.body)?;
    out.flush()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "",
    }
}
