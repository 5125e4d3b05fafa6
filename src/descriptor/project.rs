//! Project folder discovery.
//!
//! A project folder holds a `deploy.xml` naming the shared source root and
//! the objects folder; every XML file in the objects folder whose root tag is
//! `commercetheme` or `commerceextension` is a selectable unit.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::{Reader, events::Event};

use super::xml::{self, XmlNode};
use super::{DescriptorError, SelectionError};

/// Deployment descriptor file name.
pub const DEPLOY_FILE: &str = "deploy.xml";
/// Root tag of theme manifests.
pub const THEME_TAG: &str = "commercetheme";
/// Root tag of extension manifests.
pub const EXTENSION_TAG: &str = "commerceextension";

const DEFAULT_SOURCE_DIR: &str = "FileCabinet";
const DEFAULT_OBJECTS_DIR: &str = "Objects";

/// A unit manifest on disk, identified by its file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub id: String,
    pub path: PathBuf,
}

/// The theme and ordered extensions chosen for one run.
#[derive(Debug, Clone)]
pub struct Selection {
    pub theme: Manifest,
    pub extensions: Vec<Manifest>,
}

/// A discovered project folder.
#[derive(Debug, Clone)]
pub struct Project {
    /// Project folder (contains `deploy.xml`)
    pub root: PathBuf,
    /// Shared source root every manifest path is relative to
    pub source_root: PathBuf,
    /// Folder holding unit manifests
    pub objects_dir: PathBuf,
    themes: BTreeMap<String, PathBuf>,
    extensions: BTreeMap<String, PathBuf>,
}

impl Project {
    /// Read `deploy.xml` and classify every manifest in the objects folder.
    pub fn discover(root: &Path) -> Result<Self, DescriptorError> {
        let deploy_path = root.join(DEPLOY_FILE);
        if !deploy_path.is_file() {
            return Err(DescriptorError::Missing {
                unit: "project".to_string(),
                path: deploy_path,
            });
        }
        let deploy = xml::parse_file(&deploy_path)?;

        let source_root = root.join(deploy_dir(&deploy, "files", DEFAULT_SOURCE_DIR));
        let objects_dir = root.join(deploy_dir(&deploy, "objects", DEFAULT_OBJECTS_DIR));

        let mut themes = BTreeMap::new();
        let mut extensions = BTreeMap::new();

        let entries = match fs::read_dir(&objects_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                crate::debug!("project"; "no objects folder at {}", objects_dir.display());
                return Ok(Self {
                    root: root.to_path_buf(),
                    source_root,
                    objects_dir,
                    themes,
                    extensions,
                });
            }
            Err(source) => {
                return Err(DescriptorError::Io {
                    path: objects_dir,
                    source,
                });
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_xml = path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
            if !is_xml || !path.is_file() {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            match root_tag(&path).as_deref() {
                Some(THEME_TAG) => {
                    themes.insert(id, path);
                }
                Some(EXTENSION_TAG) => {
                    extensions.insert(id, path);
                }
                _ => crate::debug!("project"; "skipping {}", path.display()),
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            source_root,
            objects_dir,
            themes,
            extensions,
        })
    }

    /// Discovered themes, ordered by identifier.
    pub fn themes(&self) -> impl Iterator<Item = Manifest> + '_ {
        self.themes.iter().map(to_manifest)
    }

    /// Discovered extensions, ordered by identifier.
    pub fn extensions(&self) -> impl Iterator<Item = Manifest> + '_ {
        self.extensions.iter().map(to_manifest)
    }

    /// Validate a theme and extension selection against discovered units.
    ///
    /// Extensions keep the requested order; repeated identifiers are dropped.
    pub fn select(&self, theme: &str, extensions: &[String]) -> Result<Selection, SelectionError> {
        if self.themes.is_empty() {
            return Err(SelectionError::NoThemes {
                objects: self.objects_dir.clone(),
            });
        }

        let theme = self
            .themes
            .get_key_value(theme)
            .map(to_manifest)
            .ok_or_else(|| SelectionError::ThemeNotFound {
                id: theme.to_string(),
                objects: self.objects_dir.clone(),
            })?;

        let mut selected: Vec<Manifest> = Vec::with_capacity(extensions.len());
        for id in extensions {
            if selected.iter().any(|m| &m.id == id) {
                continue;
            }
            let manifest = self
                .extensions
                .get_key_value(id.as_str())
                .map(to_manifest)
                .ok_or_else(|| SelectionError::ExtensionNotFound {
                    id: id.clone(),
                    objects: self.objects_dir.clone(),
                })?;
            selected.push(manifest);
        }

        Ok(Selection {
            theme,
            extensions: selected,
        })
    }
}

fn to_manifest((id, path): (&String, &PathBuf)) -> Manifest {
    Manifest {
        id: id.clone(),
        path: path.clone(),
    }
}

/// Folder named by `<deploy><section><path>~/Folder/*</path></section>`.
fn deploy_dir(deploy: &XmlNode, section: &str, default: &str) -> String {
    deploy
        .child(section)
        .and_then(|s| s.child("path"))
        .map(|p| strip_deploy_pattern(p.text()))
        .filter(|dir| !dir.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// `~/FileCabinet/*` -> `FileCabinet`.
fn strip_deploy_pattern(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('~').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('*').unwrap_or(trimmed);
    trimmed.trim_matches('/').to_string()
}

/// Name of the first element in an XML file, without reading the rest.
fn root_tag(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let mut reader = Reader::from_str(&content);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Read a unit manifest and check its root tag.
pub fn load_manifest(
    manifest: &Manifest,
    tag: &'static str,
) -> Result<XmlNode, DescriptorError> {
    if !manifest.path.is_file() {
        return Err(DescriptorError::Missing {
            unit: manifest.id.clone(),
            path: manifest.path.clone(),
        });
    }
    let root = xml::parse_file(&manifest.path)?;
    if root.name != tag {
        return Err(DescriptorError::MissingRoot {
            unit: manifest.id.clone(),
            tag,
            path: manifest.path.clone(),
        });
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "deploy.xml",
            "<deploy><files><path>~/FileCabinet/*</path></files>\
             <objects><path>~/Objects/*</path></objects></deploy>",
        );
        write(dir.path(), "Objects/base_theme.xml", r#"<commercetheme vendor="Acme"/>"#);
        write(dir.path(), "Objects/cart_ext.xml", r#"<commerceextension vendor="Acme"/>"#);
        write(dir.path(), "Objects/promo_ext.xml", r#"<commerceextension vendor="Acme"/>"#);
        write(dir.path(), "Objects/customrecord.xml", "<customrecordtype/>");
        write(dir.path(), "Objects/notes.txt", "ignored");
        dir
    }

    #[test]
    fn test_discover_classifies_manifests() {
        let dir = fixture();
        let project = Project::discover(dir.path()).unwrap();

        assert_eq!(project.source_root, dir.path().join("FileCabinet"));
        assert_eq!(project.objects_dir, dir.path().join("Objects"));

        let themes: Vec<_> = project.themes().map(|m| m.id).collect();
        let extensions: Vec<_> = project.extensions().map(|m| m.id).collect();
        assert_eq!(themes, vec!["base_theme"]);
        assert_eq!(extensions, vec!["cart_ext", "promo_ext"]);
    }

    #[test]
    fn test_discover_defaults_sections() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "deploy.xml", "<deploy/>");
        let project = Project::discover(dir.path()).unwrap();
        assert_eq!(project.source_root, dir.path().join("FileCabinet"));
        assert_eq!(project.themes().count(), 0);
    }

    #[test]
    fn test_discover_requires_deploy_file() {
        let dir = TempDir::new().unwrap();
        let err = Project::discover(dir.path()).unwrap_err();
        assert!(matches!(err, DescriptorError::Missing { .. }));
    }

    #[test]
    fn test_select_keeps_extension_order() {
        let dir = fixture();
        let project = Project::discover(dir.path()).unwrap();
        let selection = project
            .select(
                "base_theme",
                &["promo_ext".into(), "cart_ext".into(), "promo_ext".into()],
            )
            .unwrap();
        assert_eq!(selection.theme.id, "base_theme");
        let ids: Vec<_> = selection.extensions.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["promo_ext", "cart_ext"]);
    }

    #[test]
    fn test_select_unknown_identifiers() {
        let dir = fixture();
        let project = Project::discover(dir.path()).unwrap();

        let err = project.select("nope", &[]).unwrap_err();
        assert!(matches!(err, SelectionError::ThemeNotFound { ref id, .. } if id == "nope"));

        let err = project.select("base_theme", &["cart".into()]).unwrap_err();
        assert!(matches!(err, SelectionError::ExtensionNotFound { ref id, .. } if id == "cart"));

        // An extension is not a theme
        let err = project.select("cart_ext", &[]).unwrap_err();
        assert!(matches!(err, SelectionError::ThemeNotFound { .. }));
    }

    #[test]
    fn test_select_without_themes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "deploy.xml", "<deploy/>");
        write(dir.path(), "Objects/cart_ext.xml", "<commerceextension/>");
        let project = Project::discover(dir.path()).unwrap();
        let err = project.select("base", &[]).unwrap_err();
        assert!(matches!(err, SelectionError::NoThemes { .. }));
    }

    #[test]
    fn test_load_manifest_checks_root_tag() {
        let dir = fixture();
        let manifest = Manifest {
            id: "cart_ext".into(),
            path: dir.path().join("Objects/cart_ext.xml"),
        };
        assert!(load_manifest(&manifest, EXTENSION_TAG).is_ok());
        let err = load_manifest(&manifest, THEME_TAG).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingRoot { tag: THEME_TAG, .. }));

        let missing = Manifest {
            id: "gone".into(),
            path: dir.path().join("Objects/gone.xml"),
        };
        assert!(matches!(
            load_manifest(&missing, THEME_TAG).unwrap_err(),
            DescriptorError::Missing { .. }
        ));
    }

    #[test]
    fn test_strip_deploy_pattern() {
        assert_eq!(strip_deploy_pattern("~/FileCabinet/*"), "FileCabinet");
        assert_eq!(strip_deploy_pattern("~/Objects/"), "Objects");
        assert_eq!(strip_deploy_pattern("Src"), "Src");
    }
}
