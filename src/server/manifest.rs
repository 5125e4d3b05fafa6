//! Per-application bundle manifest (`/who/<app>`).
//!
//! Entries are fixed in kind and order; only the URLs depend on the
//! application name and the host the page reached the server through.

use std::net::SocketAddr;

use serde::Serialize;
use url::Url;

use crate::compiler::{script_output_path, stylesheet_output_path, template_output_path};

/// Route prefix of the manifest endpoint.
pub const WHO_PREFIX: &str = "/who/";

/// One resource a preview page must load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// HTML element used to load it: `link` or `script`
    pub tag: &'static str,
    /// Logical resource name
    pub resource: &'static str,
    /// Absolute URL, or `null` when the host platform provides it
    pub url: Option<String>,
}

impl ManifestEntry {
    fn new(tag: &'static str, resource: &'static str, url: Option<String>) -> Self {
        Self { tag, resource, url }
    }
}

/// Manifest of `app` with URLs rooted at `base` (e.g. `http://localhost:7777`).
pub fn manifest(app: &str, base: &str) -> Vec<ManifestEntry> {
    let base = base.trim_end_matches('/');
    vec![
        ManifestEntry::new(
            "link",
            "css",
            Some(format!("{base}/{}", stylesheet_output_path(app))),
        ),
        ManifestEntry::new(
            "script",
            "requirejs",
            Some(format!("{base}/javascript/require.js")),
        ),
        ManifestEntry::new(
            "script",
            "define_patch",
            Some(format!("{base}{}", super::patch::DEFINE_PATCH_PATH)),
        ),
        ManifestEntry::new("script", "javascript_libs", Some("javascript-libs.js".into())),
        ManifestEntry::new(
            "script",
            "templates",
            Some(format!("{base}/{}", template_output_path(app))),
        ),
        ManifestEntry::new("script", "js_core", None),
        ManifestEntry::new(
            "script",
            "js_extensions",
            Some(format!("{base}/{}", script_output_path(app))),
        ),
    ]
}

/// Application named by a decoded `/who/<app>` path, if it is one.
pub fn requested_app(path: &str) -> Option<&str> {
    let app = path.strip_prefix(WHO_PREFIX)?.trim_matches('/');
    (!app.is_empty() && !app.contains('/')).then_some(app)
}

/// Origin manifest URLs are rooted at.
///
/// Prefers the `Host` the client used so the URLs work behind port
/// forwarding; falls back to the bound address.
pub fn base_url(host: Option<&str>, bound: SocketAddr) -> String {
    host.and_then(|host| Url::parse(&format!("http://{host}")).ok())
        .filter(|url| url.host().is_some())
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_else(|| {
            if bound.ip().is_unspecified() {
                format!("http://localhost:{}", bound.port())
            } else {
                format!("http://{bound}")
            }
        })
}
