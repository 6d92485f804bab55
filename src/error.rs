//! Error types for the menu renderer

use thiserror::Error;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Text returned to clients (and printed by the CLI) when the rendering
/// engine cannot be found on this machine.
pub const REMEDIATION: &str = "Missing dependencies.

To set up, run:
  1) Install Chromium: https://www.chromium.org/getting-involved/download-chromium/
  2) On Debian/Ubuntu, run:
     sudo apt-get install chromium
  3) If the browser lives outside the standard locations, start with:
     menu-pdf --chrome /path/to/chromium serve
";

/// Errors that can occur while building, rendering or delivering the menu
#[derive(Error, Debug)]
pub enum Error {
    /// The rendering engine is not installed or could not be located
    #[error("Missing dependency '{dependency}': {detail}")]
    MissingDependency { dependency: String, detail: String },

    /// Failed to initialize the engine
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load the markup into the engine
    #[error("Failed to load markup: {0}")]
    LoadError(String),

    /// Failed to lay out or print the document
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error means the engine is absent, as opposed to a fault
    /// raised while it was running.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Error::MissingDependency { .. })
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_display_names_the_dependency() {
        let err = Error::MissingDependency {
            dependency: "chromium".into(),
            detail: "not on PATH".into(),
        };
        assert_eq!(err.to_string(), "Missing dependency 'chromium': not on PATH");
        assert!(err.is_missing_dependency());
        assert!(!Error::RenderError("boom".into()).is_missing_dependency());
    }

    #[test]
    fn remediation_names_package_and_install_command() {
        assert!(REMEDIATION.starts_with("Missing dependencies.\n"));
        assert!(REMEDIATION.contains("apt-get install chromium"));
    }
}
