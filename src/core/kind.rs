//! Resource kind definitions.

use std::fmt;
use std::path::Path;

/// Kind of resource, determines which compiler owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Sass/CSS stylesheets - compiled per application with grass
    Stylesheet,
    /// `.tpl` templates - wrapped as modules and bundled per application
    Template,
    /// JavaScript modules - concatenated per application
    Script,
    /// Everything else - copied verbatim
    Asset,
}

impl ResourceKind {
    /// All kinds, in the order the orchestrator launches them.
    pub const ALL: [Self; 4] = [Self::Stylesheet, Self::Template, Self::Script, Self::Asset];

    /// Detect resource kind from a file extension.
    ///
    /// Unknown extensions are assets.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "tpl" => Self::Template,
            "js" => Self::Script,
            "scss" | "css" => Self::Stylesheet,
            _ => Self::Asset,
        }
    }

    /// Detect resource kind from a file path.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Asset, Self::from_extension)
    }

    /// Display name for this resource kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stylesheet => "sass",
            Self::Template => "templates",
            Self::Script => "javascript",
            Self::Asset => "assets",
        }
    }

    /// Whether a change can be narrowed to individual resources.
    ///
    /// Stylesheets and scripts are pre-aggregated per application entrypoint,
    /// so any change to them recompiles the whole kind.
    pub fn is_incremental(self) -> bool {
        matches!(self, Self::Template | Self::Asset)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
