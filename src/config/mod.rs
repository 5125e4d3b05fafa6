//! Preview configuration from the optional `vitrine.toml`.
//!
//! # Sections
//!
//! | Section   | Purpose                                   |
//! |-----------|-------------------------------------------|
//! | `[serve]` | Local server (interface, port, watch)     |
//! | `[build]` | Output root and minification              |
//!
//! Every key is optional. Command-line flags override the file.

mod build;
mod error;
mod serve;

pub use build::BuildConfig;
pub use error::ConfigError;
pub use serve::ServeConfig;

use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::log;

/// Name of the configuration file in the project folder.
pub const CONFIG_FILE: &str = "vitrine.toml";

/// Root configuration structure representing `vitrine.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Local server settings
    pub serve: ServeConfig,

    /// Compilation settings
    pub build: BuildConfig,
}

impl PreviewConfig {
    /// Load `vitrine.toml` from the project folder; defaults when absent.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(CONFIG_FILE);
        if !path.is_file() {
            crate::debug!("config"; "no {}, using defaults", CONFIG_FILE);
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String]) {
        log!("warning"; "unknown fields in {}, ignoring:", CONFIG_FILE);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build.validate()
    }

    /// Absolute output root.
    pub fn output_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.build.output)
    }

    /// Apply `serve` command flags.
    pub fn apply_serve_options(
        &mut self,
        interface: Option<IpAddr>,
        port: Option<u16>,
        watch: Option<bool>,
    ) {
        Self::update_option(&mut self.serve.interface, interface.as_ref());
        Self::update_option(&mut self.serve.port, port.as_ref());
        Self::update_option(&mut self.serve.watch, watch.as_ref());
    }

    pub fn apply_minify(&mut self, minify: Option<bool>) {
        Self::update_option(&mut self.build.minify, minify.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }
}

/// Parse a config snippet, failing on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PreviewConfig {
    let (parsed, ignored) = PreviewConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = PreviewConfig::load(dir.path()).unwrap();
        assert_eq!(config, PreviewConfig::default());
        assert_eq!(
            config.output_root(dir.path()),
            dir.path().join("LocalServer")
        );
    }

    #[test]
    fn test_unknown_fields_are_collected() {
        let (config, ignored) =
            PreviewConfig::parse_with_ignored("[serve]\nport = 9000\nlivereload = true\n[deploy]\n")
                .unwrap();
        assert_eq!(config.serve.port, 9000);
        assert_eq!(ignored, vec!["serve.livereload", "deploy"]);
    }

    #[test]
    fn test_load_reports_bad_toml_and_invalid_output() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[serve\nport = 1").unwrap();
        let err = PreviewConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(..)));

        std::fs::write(dir.path().join(CONFIG_FILE), "[build]\noutput = \"../x\"").unwrap();
        let err = PreviewConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_cli_flags_override_file() {
        let mut config = test_parse_config("[serve]\nport = 8000\nwatch = false");
        config.apply_serve_options(Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)), None, Some(true));
        config.apply_minify(Some(true));

        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.serve.port, 8000);
        assert!(config.serve.watch);
        assert!(config.build.minify);
    }
}
