//! Manifest tree -> [`Unit`].

use std::collections::BTreeMap;

use crate::descriptor::{DescriptorError, Manifest, XmlNode};
use crate::utils::path::{clean_logical, strip_base, unpartial};

use super::{OverrideRule, Resource, Scripts, Stylesheets, Unit, UnitKind};

/// Folder name stripped from the front of asset destinations.
const ASSETS_DIR: &str = "assets";

pub(super) fn parse_unit(
    manifest: &Manifest,
    kind: UnitKind,
    root: &XmlNode,
) -> Result<Unit, DescriptorError> {
    let required = |field: &'static str| {
        root.field(field)
            .map(str::to_string)
            .ok_or_else(|| DescriptorError::MissingField {
                unit: manifest.id.clone(),
                field,
                path: manifest.path.clone(),
            })
    };

    let vendor = required("vendor")?;
    let name = required("name")?;
    let version = required("version")?;
    let base_path = root.field("basepath").map(clean_logical).unwrap_or_default();

    let mut unit = Unit {
        id: manifest.id.clone(),
        kind,
        vendor,
        name,
        version,
        templates: parse_templates(root),
        stylesheets: parse_stylesheets(root),
        scripts: parse_scripts(root),
        assets: parse_assets(root, &base_path),
        base_path,
        template_overrides: BTreeMap::new(),
        stylesheet_overrides: BTreeMap::new(),
    };

    if let Some(overrides) = root.child("overrides") {
        if kind == UnitKind::Theme {
            parse_overrides(overrides, &mut unit);
        } else {
            crate::debug!("unit"; "{}: ignoring overrides declared by an extension", unit);
        }
    }

    crate::debug!(
        "unit";
        "{} {}: {} templates, {} stylesheets, {} assets",
        unit.kind,
        unit,
        unit.templates.len(),
        unit.stylesheets.files.len(),
        unit.assets.len()
    );
    Ok(unit)
}

/// Logical paths of `<files><file>..</file></files>` under `node`.
fn file_list(node: &XmlNode) -> Vec<String> {
    node.child("files")
        .into_iter()
        .flat_map(|files| files.children_named("file"))
        .map(|file| clean_logical(file.text()))
        .filter(|path| !path.is_empty())
        .collect()
}

/// Per-application children of `node`, as `(application, element)`.
fn applications(node: Option<&XmlNode>) -> impl Iterator<Item = (&str, &XmlNode)> {
    node.into_iter()
        .flat_map(|n| n.children.iter())
        .map(|app| (app.name.as_str(), app))
}

/// `<entrypoints><app>path</app></entrypoints>`
fn entrypoints(section: Option<&XmlNode>) -> BTreeMap<String, String> {
    applications(section.and_then(|s| s.child("entrypoints")))
        .map(|(app, node)| (app.to_string(), clean_logical(node.text())))
        .filter(|(_, path)| !path.is_empty())
        .collect()
}

fn parse_templates(root: &XmlNode) -> BTreeMap<String, Resource> {
    let mut templates: BTreeMap<String, Resource> = BTreeMap::new();
    let section = root.child("templates").and_then(|t| t.child("application"));
    for (app, node) in applications(section) {
        for src in file_list(node) {
            templates
                .entry(src.clone())
                .or_insert_with(|| Resource::new(src.clone(), src))
                .add_application(app);
        }
    }
    templates
}

fn parse_stylesheets(root: &XmlNode) -> Stylesheets {
    let section = root.child("sass");
    let files = section
        .map(file_list)
        .unwrap_or_default()
        .into_iter()
        .map(|src| (src.clone(), Resource::new(src.clone(), src)))
        .collect();
    Stylesheets {
        files,
        entrypoints: entrypoints(section),
    }
}

fn parse_scripts(root: &XmlNode) -> Scripts {
    let section = root.child("javascript");
    let modules = applications(section.and_then(|s| s.child("application")))
        .map(|(app, node)| (app.to_string(), file_list(node)))
        .filter(|(_, files)| !files.is_empty())
        .collect();
    Scripts {
        modules,
        entrypoints: entrypoints(section),
    }
}

fn parse_assets(root: &XmlNode, base_path: &str) -> BTreeMap<String, Resource> {
    let mut assets = BTreeMap::new();
    for (_, group) in applications(root.child("assets")) {
        for src in file_list(group) {
            let Some(dst) = asset_destination(&src, base_path) else {
                continue;
            };
            assets.insert(dst.clone(), Resource::new(src, dst));
        }
    }
    assets
}

/// `Acme/Base/assets/img/logo.png` with base `Acme/Base` -> `assets/img/logo.png`.
fn asset_destination(src: &str, base_path: &str) -> Option<String> {
    let rel = strip_base(src, base_path);
    let rel = rel
        .strip_prefix(ASSETS_DIR)
        .and_then(|r| r.strip_prefix('/'))
        .unwrap_or(rel);
    (!rel.is_empty()).then(|| format!("{ASSETS_DIR}/{rel}"))
}

fn parse_overrides(overrides: &XmlNode, unit: &mut Unit) {
    for node in overrides.children_named("override") {
        let pattern = node.child("src").map(|s| clean_logical(s.text()));
        let dst = node.child("dst").map(|d| unpartial(&clean_logical(d.text())));
        let (Some(pattern), Some(dst)) = (pattern, dst) else {
            crate::debug!("unit"; "{}: skipping incomplete override", unit);
            continue;
        };
        if pattern.is_empty() || dst.is_empty() {
            continue;
        }

        let ext = pattern
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let table = match ext.as_str() {
            "tpl" => &mut unit.template_overrides,
            "scss" | "css" => &mut unit.stylesheet_overrides,
            _ => {
                crate::debug!("unit"; "{}: unsupported override `{}`", unit, pattern);
                continue;
            }
        };
        table.insert(dst.clone(), OverrideRule { pattern, dst });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::xml::parse_str;
    use std::path::PathBuf;

    fn manifest() -> Manifest {
        Manifest {
            id: "base_theme".into(),
            path: PathBuf::from("Objects/base_theme.xml"),
        }
    }

    const THEME: &str = r#"
        <commercetheme>
            <vendor>Acme</vendor>
            <name>Base</name>
            <version>1.0.0</version>
            <basepath>[/Acme/Base]</basepath>
            <templates><application>
                <shopping><files>
                    <file>[/Acme/Base/Templates/header.tpl]</file>
                    <file>[/Acme/Base/Templates/footer.tpl]</file>
                </files></shopping>
                <checkout><files>
                    <file>[/Acme/Base/Templates/header.tpl]</file>
                </files></checkout>
            </application></templates>
            <sass>
                <entrypoints><shopping>[/Acme/Base/Sass/shopping.scss]</shopping></entrypoints>
                <files>
                    <file>[/Acme/Base/Sass/shopping.scss]</file>
                    <file>[/Acme/Base/Sass/_variables.scss]</file>
                </files>
            </sass>
            <javascript>
                <entrypoints><shopping>[/Acme/Base/JavaScript/Theme.js]</shopping></entrypoints>
                <application><shopping><files>
                    <file>[/Acme/Base/JavaScript/Theme.js]</file>
                </files></shopping></application>
            </javascript>
            <assets>
                <img><files><file>[/Acme/Base/assets/img/logo.png]</file></files></img>
                <font><files><file>[/Acme/Base/fonts/icons.woff]</file></files></font>
            </assets>
            <overrides>
                <override>
                    <src>Acme/Base/Overrides/summary.tpl</src>
                    <dst>Acme/Cart/Templates/summary.tpl</dst>
                </override>
                <override>
                    <src>[/Acme/Base/Overrides/_cart.scss]</src>
                    <dst>[/Acme/Cart/Sass/_cart.scss]</dst>
                </override>
                <override>
                    <src>Acme/Base/Overrides/logo.png</src>
                    <dst>Acme/Cart/img/logo.png</dst>
                </override>
            </overrides>
        </commercetheme>"#;

    fn theme() -> Unit {
        let root = parse_str(THEME).unwrap();
        parse_unit(&manifest(), UnitKind::Theme, &root).unwrap()
    }

    #[test]
    fn test_identity() {
        let unit = theme();
        assert_eq!(unit.full_name(), "Acme - Base - 1.0.0");
        assert_eq!(unit.base_path, "Acme/Base");
        assert_eq!(unit.kind, UnitKind::Theme);
    }

    #[test]
    fn test_templates_accumulate_applications() {
        let unit = theme();
        let header = &unit.templates["Acme/Base/Templates/header.tpl"];
        assert_eq!(header.applications, vec!["shopping", "checkout"]);
        assert_eq!(unit.templates.len(), 2);
    }

    #[test]
    fn test_stylesheets_and_scripts() {
        let unit = theme();
        assert_eq!(
            unit.stylesheets.entrypoints["shopping"],
            "Acme/Base/Sass/shopping.scss"
        );
        assert_eq!(unit.stylesheets.files.len(), 2);
        assert_eq!(
            unit.scripts.modules["shopping"],
            vec!["Acme/Base/JavaScript/Theme.js"]
        );
        assert_eq!(
            unit.scripts.entrypoints["shopping"],
            "Acme/Base/JavaScript/Theme.js"
        );
    }

    #[test]
    fn test_asset_destinations() {
        let unit = theme();
        let dsts: Vec<_> = unit.assets.keys().cloned().collect();
        assert_eq!(dsts, vec!["assets/fonts/icons.woff", "assets/img/logo.png"]);
        assert_eq!(
            unit.assets["assets/img/logo.png"].src,
            "Acme/Base/assets/img/logo.png"
        );
    }

    #[test]
    fn test_overrides_split_by_type() {
        let unit = theme();
        let tpl = &unit.template_overrides["Acme/Cart/Templates/summary.tpl"];
        assert_eq!(tpl.pattern, "Acme/Base/Overrides/summary.tpl");

        // Partial destinations are keyed by their import name
        let scss = &unit.stylesheet_overrides["Acme/Cart/Sass/cart.scss"];
        assert_eq!(scss.pattern, "Acme/Base/Overrides/_cart.scss");

        assert_eq!(unit.template_overrides.len(), 1);
        assert_eq!(unit.stylesheet_overrides.len(), 1);
    }

    #[test]
    fn test_extension_overrides_ignored() {
        let root = parse_str(THEME).unwrap();
        let unit = parse_unit(&manifest(), UnitKind::Extension, &root).unwrap();
        assert!(unit.template_overrides.is_empty());
        assert!(unit.stylesheet_overrides.is_empty());
    }

    #[test]
    fn test_missing_identity_field() {
        let root = parse_str(r#"<commercetheme vendor="Acme" name="Base"/>"#).unwrap();
        let err = parse_unit(&manifest(), UnitKind::Theme, &root).unwrap_err();
        match err {
            DescriptorError::MissingField { unit, field, .. } => {
                assert_eq!(unit, "base_theme");
                assert_eq!(field, "version");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_asset_destination() {
        assert_eq!(
            asset_destination("Acme/Base/assets/img/a.png", "Acme/Base").as_deref(),
            Some("assets/img/a.png")
        );
        assert_eq!(
            asset_destination("Acme/Base/logo.png", "Acme/Base").as_deref(),
            Some("assets/logo.png")
        );
        assert_eq!(
            asset_destination("Other/logo.png", "Acme/Base").as_deref(),
            Some("assets/Other/logo.png")
        );
        assert_eq!(asset_destination("Acme/Base", "Acme/Base"), None);
    }
}
