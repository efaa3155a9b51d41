//! Page templates and static files served by the front door.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::AssetsConfig;

/// Content type used when a static file's name gives no hint.
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain";

/// The fixed HTML pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Landing page.
    Index,
    /// Page with the submission form.
    Message,
    /// Not-found page.
    Error,
}

impl Page {
    /// File name of the page under the templates directory.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Index => "index.html",
            Self::Message => "message.html",
            Self::Error => "error.html",
        }
    }
}

/// Locations of pages and static files.
#[derive(Debug, Clone)]
pub struct Assets {
    templates_dir: PathBuf,
    static_dir: PathBuf,
}

impl Assets {
    /// Create an asset set from explicit directories.
    #[must_use]
    pub fn new(templates_dir: impl Into<PathBuf>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            static_dir: static_dir.into(),
        }
    }

    /// Create an asset set from configuration.
    #[must_use]
    pub fn from_config(config: &AssetsConfig) -> Self {
        Self::new(&config.templates_dir, &config.static_dir)
    }

    /// Read a page's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the template file cannot be read.
    pub async fn page(&self, page: Page) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.templates_dir.join(page.file_name())).await
    }

    /// Map a request path to a regular file under the static root.
    ///
    /// Returns `None` if no such file exists or the path tries to leave
    /// the root.
    pub async fn resolve_static(&self, request_path: &str) -> Option<PathBuf> {
        let relative = Path::new(request_path.trim_start_matches('/'));
        let mut components = relative.components().peekable();
        if components.peek().is_none()
            || !components.all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }

        let path = self.static_dir.join(relative);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }
}

/// Guess a content type from a file name.
#[must_use]
pub fn content_type(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}
