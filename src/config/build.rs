//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! output = "LocalServer"      # Output root, relative to the project folder
//! minify = false              # Minify script and stylesheet bundles
//! ```

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

/// Compilation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output root, relative to the project folder.
    pub output: PathBuf,

    /// Minify script and stylesheet bundles.
    pub minify: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("LocalServer"),
            minify: false,
        }
    }
}

impl BuildConfig {
    /// The output root is wiped on every compile, so it must stay inside
    /// the project folder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let output = self.output.as_path();
        if output.as_os_str().is_empty() || output == Path::new(".") {
            return Err(ConfigError::Validation(
                "[build] output must name a directory".into(),
            ));
        }
        let escapes = output.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(ConfigError::Validation(format!(
                "[build] output `{}` must be a relative path inside the project",
                output.display()
            )));
        }
        Ok(())
    }
}
