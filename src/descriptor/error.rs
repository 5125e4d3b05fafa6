//! Descriptor and selection error types.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// DescriptorError
// ============================================================================

/// Malformed or incomplete project/unit descriptors. Always fatal for the run.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("manifest for {unit} not found at `{}`", path.display())]
    Missing { unit: String, path: PathBuf },

    #[error("IO error when reading `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in `{}`: {message}", path.display())]
    Xml { path: PathBuf, message: String },

    #[error("{unit}: manifest `{}` has no <{tag}> root element", path.display())]
    MissingRoot {
        unit: String,
        tag: &'static str,
        path: PathBuf,
    },

    #[error("{unit}: manifest `{}` is missing required field `{field}`", path.display())]
    MissingField {
        unit: String,
        field: &'static str,
        path: PathBuf,
    },
}

// ============================================================================
// SelectionError
// ============================================================================

/// Requested theme/extension is not among the discovered units.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("no themes found in `{}`", objects.display())]
    NoThemes { objects: PathBuf },

    #[error("theme `{id}` not found in `{}`", objects.display())]
    ThemeNotFound { id: String, objects: PathBuf },

    #[error("extension `{id}` not found in `{}`", objects.display())]
    ExtensionNotFound { id: String, objects: PathBuf },
}
