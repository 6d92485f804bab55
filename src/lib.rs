//! Menu PDF
//!
//! Renders the house menu (a fixed HTML/CSS document) into a PDF using a
//! headless Chrome instance and hands the bytes to an HTTP, CGI or CLI
//! front end.
//!
//! # Features
//!
//! - **CDP Backend** (default): Uses Chrome DevTools Protocol via headless Chrome
//! - **Safe Defaults**: Remote resource loading is blocked unless explicitly enabled
//! - **Swappable renderers**: the pipeline is generic over the [`Renderer`] trait
//!
//! # Example
//!
//! ```no_run
//! use menu_pdf::{document, PageGeometry, Renderer, RendererConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut renderer = menu_pdf::new_renderer(RendererConfig::default())?;
//! let pdf = renderer.render_pdf(document::menu_html(), &PageGeometry::a4_landscape())?;
//! std::fs::write("menu.pdf", pdf)?;
//! renderer.close()?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result, REMEDIATION};

#[cfg(feature = "cdp")]
pub mod cdp;

pub mod delivery;
pub mod document;
pub mod markup;
pub mod server;

// Async-friendly facade (worker-thread backed)
pub mod async_api;

pub use async_api::PdfService;
pub use delivery::{render_menu, DeliveryMode, MenuResponse, ServiceConfig};

/// Options understood by the rendering engine
///
/// The defaults are the ones the menu is always rendered with:
/// - `allow_remote_resources` is off, so markup cannot reach the network
/// - `default_font` is used where the markup names no available font
/// - `html5_parser` normalises the markup through an HTML5 parser first
///
/// # Examples
///
/// ```
/// let opts = menu_pdf::RenderOptions::default();
/// assert!(!opts.allow_remote_resources);
/// assert_eq!(opts.default_font, "DejaVu Sans");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether the engine may fetch resources over the network
    pub allow_remote_resources: bool,
    /// Fallback font family
    pub default_font: String,
    /// Whether to run the markup through the HTML5 parser before loading it
    pub html5_parser: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            allow_remote_resources: false,
            default_font: "DejaVu Sans".to_string(),
            html5_parser: true,
        }
    }
}

/// Configuration for creating a [`Renderer`]
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub options: RenderOptions,
    /// Explicit browser executable; `None` searches the usual locations
    pub chrome_path: Option<PathBuf>,
    /// Run the browser inside its sandbox (disable in unprivileged containers)
    pub sandbox: bool,
    /// Timeout for loading and printing in milliseconds
    pub timeout_ms: u64,
    /// Scale the print down so the whole document fits on one page
    pub fit_to_page: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            options: RenderOptions::default(),
            chrome_path: None,
            sandbox: true,
            timeout_ms: 30000,
            fit_to_page: true,
        }
    }
}

/// Named paper sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl PaperSize {
    /// Portrait (width, height) in millimetres
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Target page geometry: a paper size laid out in an orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub paper: PaperSize,
    pub orientation: Orientation,
}

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;
const CSS_PX_PER_INCH: f64 = 96.0;

impl PageGeometry {
    pub fn new(paper: PaperSize, orientation: Orientation) -> Self {
        Self { paper, orientation }
    }

    /// The menu's geometry: A4, landscape.
    pub fn a4_landscape() -> Self {
        Self::new(PaperSize::A4, Orientation::Landscape)
    }

    pub fn is_landscape(&self) -> bool {
        self.orientation == Orientation::Landscape
    }

    /// Laid-out (width, height) in inches, orientation applied
    pub fn size_inches(&self) -> (f64, f64) {
        let (w, h) = self.paper.dimensions_mm();
        let (w, h) = (w / MM_PER_INCH, h / MM_PER_INCH);
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Laid-out (width, height) in PDF points
    pub fn size_points(&self) -> (f64, f64) {
        let (w, h) = self.size_inches();
        (w * POINTS_PER_INCH, h * POINTS_PER_INCH)
    }

    /// Laid-out (width, height) in CSS pixels
    pub fn size_css_px(&self) -> (f64, f64) {
        let (w, h) = self.size_inches();
        (w * CSS_PX_PER_INCH, h * CSS_PX_PER_INCH)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4_landscape()
    }
}

/// Core trait for HTML-to-PDF engines
pub trait Renderer {
    /// Create a renderer. Fails with [`Error::MissingDependency`] when the
    /// underlying engine is not available, before anything is launched.
    fn new(config: RendererConfig) -> Result<Self>
    where
        Self: Sized;

    /// Lay out `html` on pages of the given geometry and return PDF bytes
    fn render_pdf(&mut self, html: &str, page: &PageGeometry) -> Result<Vec<u8>>;

    /// Close the renderer and release the engine
    fn close(self) -> Result<()>;
}

/// Create a renderer with the default backend
#[cfg(feature = "cdp")]
pub fn new_renderer(config: RendererConfig) -> Result<impl Renderer> {
    cdp::CdpRenderer::new(config)
}
