//! Themes and extensions.
//!
//! A [`Unit`] is one parsed manifest: identity plus typed resource maps with
//! every path reduced to its logical form. Themes additionally carry override
//! tables. Units never change after [`Unit::load`].

mod parse;
mod resource;

use std::collections::BTreeMap;
use std::fmt;

pub use resource::Resource;

use crate::descriptor::{DescriptorError, EXTENSION_TAG, Manifest, THEME_TAG, load_manifest};

/// Theme or regular extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Theme,
    Extension,
}

impl UnitKind {
    /// Root tag of manifests of this kind.
    pub const fn root_tag(self) -> &'static str {
        match self {
            Self::Theme => THEME_TAG,
            Self::Extension => EXTENSION_TAG,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Theme => "theme",
            Self::Extension => "extension",
        })
    }
}

/// Theme-declared substitution of a destination's backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRule {
    /// File pattern searched under the project folder
    pub pattern: String,
    /// Normalized destination being replaced
    pub dst: String,
}

/// Stylesheet files plus one entrypoint per application.
#[derive(Debug, Clone, Default)]
pub struct Stylesheets {
    pub files: BTreeMap<String, Resource>,
    /// application -> logical entrypoint path
    pub entrypoints: BTreeMap<String, String>,
}

/// Script modules and entrypoint per application.
#[derive(Debug, Clone, Default)]
pub struct Scripts {
    /// application -> logical module paths, in declaration order
    pub modules: BTreeMap<String, Vec<String>>,
    /// application -> logical entrypoint path
    pub entrypoints: BTreeMap<String, String>,
}

/// One parsed theme or extension manifest.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Manifest identifier (file stem)
    pub id: String,
    pub kind: UnitKind,
    pub vendor: String,
    pub name: String,
    pub version: String,
    /// Root of this unit's files inside the source root
    pub base_path: String,
    pub templates: BTreeMap<String, Resource>,
    pub stylesheets: Stylesheets,
    pub scripts: Scripts,
    pub assets: BTreeMap<String, Resource>,
    /// Theme only: template destination -> rule
    pub template_overrides: BTreeMap<String, OverrideRule>,
    /// Theme only: stylesheet destination -> rule
    pub stylesheet_overrides: BTreeMap<String, OverrideRule>,
}

impl Unit {
    /// Read and parse a unit manifest.
    pub fn load(manifest: &Manifest, kind: UnitKind) -> Result<Self, DescriptorError> {
        let root = load_manifest(manifest, kind.root_tag())?;
        parse::parse_unit(manifest, kind, &root)
    }

    /// `vendor - name - version`
    pub fn full_name(&self) -> String {
        format!("{} - {} - {}", self.vendor, self.name, self.version)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.vendor, self.name, self.version)
    }
}
