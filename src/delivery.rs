//! Render-and-deliver: turns one request into one [`MenuResponse`].
//!
//! The pipeline is linear. Derive the delivery mode, create the renderer,
//! render the menu, close the renderer, wrap the bytes. The renderer is
//! closed on every path once it exists.

use crate::{document, Error, PageGeometry, Renderer, RendererConfig, REMEDIATION};
use log::{error, info};

/// Filename announced in `Content-Disposition`
pub const FILENAME: &str = "our-menu-food-drinks.pdf";

const PDF_CONTENT_TYPE: &str = "application/pdf";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";

/// How the client should treat the PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Display in the client's viewer
    #[default]
    Inline,
    /// Save as a file
    Download,
}

impl DeliveryMode {
    /// Derive the mode from a raw query string (without the leading `?`).
    ///
    /// Only `download=1` selects [`DeliveryMode::Download`]; when the key is
    /// repeated the last value wins.
    pub fn from_query(query: Option<&str>) -> Self {
        let flag = query.and_then(|q| {
            url::form_urlencoded::parse(q.trim_start_matches('?').as_bytes())
                .filter(|(k, _)| k == "download")
                .map(|(_, v)| v.into_owned())
                .last()
        });
        match flag.as_deref() {
            Some("1") => DeliveryMode::Download,
            _ => DeliveryMode::Inline,
        }
    }

    /// Value of the `Content-Disposition` header
    pub fn content_disposition(self) -> String {
        let kind = match self {
            DeliveryMode::Inline => "inline",
            DeliveryMode::Download => "attachment",
        };
        format!("{}; filename=\"{}\"", kind, FILENAME)
    }
}

/// Settings shared by every request
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub renderer: RendererConfig,
    pub page: PageGeometry,
}

/// Transport-neutral response for one request
#[derive(Debug, Clone)]
pub struct MenuResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl MenuResponse {
    /// 200 with the PDF
    pub fn pdf(bytes: Vec<u8>, mode: DeliveryMode) -> Self {
        Self {
            status: 200,
            headers: vec![
                ("Content-Type".into(), PDF_CONTENT_TYPE.into()),
                ("Content-Disposition".into(), mode.content_disposition()),
                ("Cache-Control".into(), "private".into()),
                ("Content-Length".into(), bytes.len().to_string()),
            ],
            body: bytes,
        }
    }

    /// Plain-text response with the given status
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let body = body.into().into_bytes();
        Self {
            status,
            headers: vec![
                ("Content-Type".into(), TEXT_CONTENT_TYPE.into()),
                ("Content-Length".into(), body.len().to_string()),
            ],
            body,
        }
    }

    /// 500 for a failed request: setup instructions when the engine is
    /// missing, the error text otherwise.
    pub fn failure(err: &Error) -> Self {
        if err.is_missing_dependency() {
            Self::text(500, REMEDIATION)
        } else {
            Self::text(500, format!("{}\n", err))
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header with this name, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Render the menu for one request.
///
/// `query` is the raw query string of the request, if any.
pub fn render_menu<R: Renderer>(query: Option<&str>, config: &ServiceConfig) -> MenuResponse {
    let mode = DeliveryMode::from_query(query);

    match render_with::<R>(document::menu_html(), config) {
        Ok(bytes) => {
            info!("serving {} ({} bytes, {:?})", FILENAME, bytes.len(), mode);
            MenuResponse::pdf(bytes, mode)
        }
        Err(e) => {
            error!("menu rendering failed: {}", e);
            MenuResponse::failure(&e)
        }
    }
}

/// Create a renderer, render `html` once and close the renderer.
pub fn render_with<R: Renderer>(html: &str, config: &ServiceConfig) -> crate::Result<Vec<u8>> {
    let mut renderer = R::new(config.renderer.clone())?;
    let rendered = renderer.render_pdf(html, &config.page);
    let closed = renderer.close();
    let bytes = rendered?;
    closed?;
    Ok(bytes)
}
