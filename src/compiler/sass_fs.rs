//! Override-aware file system for the Sass engine.
//!
//! grass looks up candidate paths (`name.scss`, `_name.scss`, ...) through
//! [`grass::Fs`]. Every candidate under the source root is reduced to its
//! logical import name and looked up in the context's stylesheet overrides; a
//! hit reports the file as present and serves the override's contents instead.
//!
//! grass resolves the relative imports of an override against the path it
//! asked for, not the override's real folder. Candidates missing from the
//! source root therefore fall back to the folder holding the override, so an
//! override can import its own siblings.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::context::CompilationContext;
use crate::utils::path::{clean_logical, to_slash};

pub struct OverrideFs {
    ctx: Arc<CompilationContext>,
    /// (logical folder of the replaced stylesheet, folder of the override)
    sibling_dirs: Vec<(String, PathBuf)>,
}

impl OverrideFs {
    pub fn new(ctx: Arc<CompilationContext>) -> Self {
        let mut sibling_dirs: Vec<(String, PathBuf)> = Vec::new();
        for (dst, resolved) in ctx.stylesheet_overrides() {
            let logical = clean_logical(dst);
            let nominal = logical.rsplit_once('/').map_or("", |(dir, _)| dir);
            let Some(real) = resolved.source.parent() else {
                continue;
            };
            let pair = (nominal.to_string(), real.to_path_buf());
            if !sibling_dirs.contains(&pair) {
                sibling_dirs.push(pair);
            }
        }
        Self { ctx, sibling_dirs }
    }

    fn logical(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(self.ctx.source_root()).ok()?;
        Some(clean_logical(&to_slash(rel)))
    }

    /// Override file for a requested path, if any.
    pub fn redirect(&self, path: &Path) -> Option<&Path> {
        let logical = self.logical(path)?;
        self.ctx.stylesheet_override(&logical)
    }

    /// Sibling of an override standing in for a missing file.
    pub fn sibling(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return None;
        }
        let logical = self.logical(path)?;
        self.sibling_dirs.iter().find_map(|(nominal, real)| {
            let rest = if nominal.is_empty() {
                logical.as_str()
            } else {
                logical.strip_prefix(nominal.as_str())?.strip_prefix('/')?
            };
            let candidate = real.join(rest);
            candidate.is_file().then_some(candidate)
        })
    }
}

impl fmt::Debug for OverrideFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideFs")
            .field("source_root", &self.ctx.source_root())
            .field("overrides", &self.ctx.stylesheet_overrides().len())
            .field("sibling_dirs", &self.sibling_dirs.len())
            .finish()
    }
}

impl grass::Fs for OverrideFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.redirect(path).is_some() || path.is_file() || self.sibling(path).is_some()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if let Some(target) = self.redirect(path) {
            crate::debug!("sass"; "{} -> {}", path.display(), target.display());
            return std::fs::read(target);
        }
        match self.sibling(path) {
            Some(target) => {
                crate::debug!("sass"; "{} -> {}", path.display(), target.display());
                std::fs::read(target)
            }
            None => std::fs::read(path),
        }
    }
}
