//! Chrome DevTools Protocol renderer (uses the `headless_chrome` crate)

use crate::markup::{self, is_local_scheme};
use crate::{Error, PageGeometry, Renderer, RendererConfig, Result};
use base64::Engine as Base64Engine;
use headless_chrome::browser::tab::{RequestInterceptor, RequestPausedDecision, Tab};
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Fetch::FailRequest;
use headless_chrome::protocol::cdp::Network::ErrorReason;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Name reported in [`Error::MissingDependency`]
pub const DEPENDENCY_NAME: &str = "chromium";

// Chrome accepts print scales in [0.1, 2.0]; the menu is only ever shrunk.
const MIN_PRINT_SCALE: f64 = 0.1;
// Leaves room for print-media reflow that the screen measurement misses.
const FIT_SLACK: f64 = 0.97;

/// Headless Chrome renderer
///
/// Launches one browser process with a single tab. The browser process is
/// terminated when the renderer is closed or dropped.
pub struct CdpRenderer {
    browser: Browser,
    tab: Arc<Tab>,
    config: RendererConfig,
    blocked: Arc<AtomicUsize>,
}

impl CdpRenderer {
    /// Number of network requests refused so far because remote resources
    /// are disabled
    pub fn blocked_requests(&self) -> usize {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Route every request through an interceptor that fails anything not
    /// served from a local scheme.
    fn block_remote_requests(&self) -> Result<()> {
        let blocked = self.blocked.clone();
        let interceptor: Arc<dyn RequestInterceptor + Send + Sync> = Arc::new(
            move |_transport, _session_id, event: RequestPausedEvent| {
                let url = &event.params.request.url;
                if is_local_request(url) {
                    return RequestPausedDecision::Continue(None);
                }
                blocked.fetch_add(1, Ordering::SeqCst);
                warn!("blocked remote request to {}", url);
                RequestPausedDecision::Fail(FailRequest {
                    request_id: event.params.request_id.clone(),
                    error_reason: ErrorReason::BlockedByClient,
                })
            },
        );

        self.tab
            .enable_fetch(None, Some(false))
            .map_err(|e| Error::InitializationError(format!("Failed to enable fetch domain: {}", e)))?;
        self.tab
            .enable_request_interception(interceptor)
            .map_err(|e| Error::InitializationError(format!("Failed to enable request interception: {}", e)))?;
        Ok(())
    }

    fn load_markup(&self, html: &str) -> Result<()> {
        let url = data_url(html);
        self.tab
            .navigate_to(&url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        // Web fonts finish after the load event
        if let Err(e) = self
            .tab
            .evaluate("document.fonts.ready.then(function () { return true; })", true)
        {
            warn!("Waiting for fonts failed, printing anyway: {}", e);
        }
        Ok(())
    }

    /// Height of the laid-out document in CSS pixels when constrained to
    /// `width_px`.
    fn content_height(&self, width_px: f64) -> Result<f64> {
        let script = format!(
            r#"(function (w) {{
                var el = document.documentElement;
                var prev = el.style.width;
                el.style.width = w + 'px';
                var h = Math.max(el.scrollHeight, document.body ? document.body.scrollHeight : 0);
                el.style.width = prev;
                return h;
            }})({})"#,
            width_px
        );
        let eval = self
            .tab
            .evaluate(&script, false)
            .map_err(|e| Error::RenderError(format!("Measuring content failed: {}", e)))?;
        eval.value
            .as_ref()
            .and_then(|v| v.as_f64())
            .ok_or_else(|| Error::RenderError("No height returned from measurement".into()))
    }

    fn print_scale(&self, page: &PageGeometry) -> Result<f64> {
        if !self.config.fit_to_page {
            return Ok(1.0);
        }
        let (width_px, height_px) = page.size_css_px();
        let content = self.content_height(width_px)?;
        let scale = fit_scale(content, height_px);
        debug!(
            "content height {:.0}px on a {:.0}px page, print scale {:.3}",
            content, height_px, scale
        );
        Ok(scale)
    }
}

impl Renderer for CdpRenderer {
    fn new(config: RendererConfig) -> Result<Self>
    where
        Self: Sized,
    {
        let executable = locate_chrome(config.chrome_path.as_deref())?;
        info!("using browser at {}", executable.display());

        let timeout = Duration::from_millis(config.timeout_ms);
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(config.sandbox)
            .path(Some(executable))
            .idle_browser_timeout(timeout.max(Duration::from_secs(30)))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(timeout);

        let renderer = Self {
            browser,
            tab,
            config,
            blocked: Arc::new(AtomicUsize::new(0)),
        };

        if !renderer.config.options.allow_remote_resources {
            renderer.block_remote_requests()?;
        }

        Ok(renderer)
    }

    fn render_pdf(&mut self, html: &str, page: &PageGeometry) -> Result<Vec<u8>> {
        let prepared = markup::prepare(html, &self.config.options);
        self.load_markup(&prepared.html)?;

        let scale = self.print_scale(page)?;
        let bytes = self
            .tab
            .print_to_pdf(Some(print_options(page, scale)))
            .map_err(|e| Error::RenderError(format!("Print to PDF failed: {}", e)))?;

        info!(
            "rendered {} bytes ({} blocked request(s))",
            bytes.len(),
            self.blocked_requests()
        );
        Ok(bytes)
    }

    fn close(self) -> Result<()> {
        // Drop explicitly so the child process is terminated promptly
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}

/// Find the browser executable without launching it.
pub fn locate_chrome(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => Err(Error::MissingDependency {
            dependency: DEPENDENCY_NAME.to_string(),
            detail: format!("no browser executable at {}", path.display()),
        }),
        None => headless_chrome::browser::default_executable().map_err(|detail| {
            Error::MissingDependency {
                dependency: DEPENDENCY_NAME.to_string(),
                detail,
            }
        }),
    }
}

/// A `data:` URL carrying `html` with its encoding declared as UTF-8
pub fn data_url(html: &str) -> String {
    format!(
        "data:text/html;charset=utf-8;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(html.as_bytes())
    )
}

fn is_local_request(url: &str) -> bool {
    Url::parse(url)
        .map(|u| is_local_scheme(u.scheme()))
        .unwrap_or(false)
}

/// Print scale that fits `content_px` of height onto a `page_px` high page.
fn fit_scale(content_px: f64, page_px: f64) -> f64 {
    if content_px <= page_px || content_px <= 0.0 {
        return 1.0;
    }
    (page_px / content_px * FIT_SLACK).max(MIN_PRINT_SCALE)
}

/// Chrome takes the portrait paper size and rotates it for landscape.
fn print_options(page: &PageGeometry, scale: f64) -> PrintToPdfOptions {
    let (w, h) = page.size_inches();
    let (paper_width, paper_height) = if page.is_landscape() { (h, w) } else { (w, h) };
    PrintToPdfOptions {
        landscape: Some(page.is_landscape()),
        display_header_footer: Some(false),
        print_background: Some(true),
        scale: Some(scale),
        paper_width: Some(paper_width),
        paper_height: Some(paper_height),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}
