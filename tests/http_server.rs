//! Integration tests for the HTTP front end (no browser needed)

use menu_pdf::server::MenuServer;
use menu_pdf::{Error, PageGeometry, Renderer, RendererConfig, Result, ServiceConfig, REMEDIATION};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;

/// Stands in for the browser: returns the markup length as a fake PDF body
struct FakePdf;

impl Renderer for FakePdf {
    fn new(_config: RendererConfig) -> Result<Self> {
        Ok(FakePdf)
    }

    fn render_pdf(&mut self, html: &str, _page: &PageGeometry) -> Result<Vec<u8>> {
        Ok(format!("%PDF-fake {}", html.len()).into_bytes())
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

struct NoBrowser;

impl Renderer for NoBrowser {
    fn new(_config: RendererConfig) -> Result<Self> {
        Err(Error::MissingDependency {
            dependency: "chromium".into(),
            detail: "not installed".into(),
        })
    }

    fn render_pdf(&mut self, _html: &str, _page: &PageGeometry) -> Result<Vec<u8>> {
        panic!("rendering attempted without a browser");
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

struct Reply {
    status: u16,
    head: String,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.head
            .lines()
            .find(|l| l.to_ascii_lowercase().starts_with(&prefix))
            .map(|l| l[prefix.len()..].trim().to_string())
    }
}

/// Serve exactly one request with renderer `R` and return the raw reply
fn exchange<R: Renderer + 'static>(request_line: &str) -> Reply {
    let server = MenuServer::bind("127.0.0.1:0", ServiceConfig::default()).expect("bind");
    let addr: SocketAddr = server.local_addr().expect("addr");
    let handle = thread::spawn(move || server.run_once::<R>().expect("serve"));

    let mut stream = TcpStream::connect(addr).expect("connect");
    write!(
        stream,
        "{}\r\nHost: {}\r\nConnection: close\r\n\r\n",
        request_line, addr
    )
    .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).unwrap();
    handle.join().unwrap();

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header terminator");
    let head = String::from_utf8(raw[..split].to_vec()).unwrap();
    let body = raw[split + 4..].to_vec();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status code");
    Reply { status, head, body }
}

#[test]
fn inline_by_default() {
    let reply = exchange::<FakePdf>("GET / HTTP/1.1");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Content-Type").as_deref(), Some("application/pdf"));
    assert_eq!(
        reply.header("Content-Disposition").as_deref(),
        Some("inline; filename=\"our-menu-food-drinks.pdf\"")
    );
    assert!(reply.body.starts_with(b"%PDF-fake "));
}

#[test]
fn download_flag_forces_attachment() {
    let reply = exchange::<FakePdf>("GET /?download=1 HTTP/1.1");
    assert_eq!(reply.status, 200);
    assert_eq!(
        reply.header("Content-Disposition").as_deref(),
        Some("attachment; filename=\"our-menu-food-drinks.pdf\"")
    );
}

#[test]
fn other_download_values_stay_inline() {
    for query in ["download=yes", "download=", "download=01", "dl=1"] {
        let reply = exchange::<FakePdf>(&format!("GET /?{} HTTP/1.1", query));
        assert_eq!(
            reply.header("Content-Disposition").as_deref(),
            Some("inline; filename=\"our-menu-food-drinks.pdf\""),
            "query {query}"
        );
    }
}

#[test]
fn missing_browser_returns_remediation() {
    let reply = exchange::<NoBrowser>("GET / HTTP/1.1");
    assert_eq!(reply.status, 500);
    assert_eq!(
        reply.header("Content-Type").as_deref(),
        Some("text/plain; charset=UTF-8")
    );
    assert_eq!(reply.body, REMEDIATION.as_bytes());
}

#[test]
fn unknown_path_is_not_found() {
    let reply = exchange::<NoBrowser>("GET /admin HTTP/1.1");
    assert_eq!(reply.status, 404);
}

#[test]
fn post_is_rejected() {
    let reply = exchange::<NoBrowser>("POST / HTTP/1.1");
    assert_eq!(reply.status, 405);
    assert_eq!(reply.header("Allow").as_deref(), Some("GET, HEAD"));
}
