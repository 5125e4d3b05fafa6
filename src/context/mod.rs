//! Compilation context.
//!
//! Owns the selected theme and extensions for one run and derives, once, the
//! combined resource maps every compiler reads:
//!
//! 1. extension maps folded in declaration order (later wins per destination,
//!    applications are unioned),
//! 2. the theme folded on top,
//! 3. theme overrides applied to the folded maps,
//! 4. a reverse index from backing file to destinations for the watcher.
//!
//! Nothing here is cached on units; a new selection means a new context.

mod index;
mod overrides;

use std::collections::{BTreeMap, BTreeSet};
use std::iter;
use std::path::{Path, PathBuf};

pub use index::ReverseIndex;
pub use overrides::ResolvedOverride;

use overrides::resolve_table;

use crate::core::ResourceKind;
use crate::descriptor::{DescriptorError, Project, Selection};
use crate::unit::{Resource, Unit, UnitKind};
use crate::utils::path::{clean_logical, unpartial};

/// One unit's stylesheet entrypoint for an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetEntry {
    /// `vendor - name - version` of the declaring unit
    pub unit: String,
    /// Logical entrypoint path
    pub entry: String,
}

/// Per-application stylesheet entrypoint chain.
#[derive(Debug, Clone, Default)]
pub struct CombinedStylesheets {
    /// application -> entrypoints, theme first then extensions
    pub entrypoints: BTreeMap<String, Vec<StylesheetEntry>>,
}

/// Script modules and entrypoints of one application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptBundle {
    /// Logical module paths, concatenated in this order
    pub modules: Vec<String>,
    /// Logical entrypoint paths, required in this order
    pub entrypoints: Vec<String>,
}

/// Everything the compilers need for one run.
#[derive(Debug)]
pub struct CompilationContext {
    project_root: PathBuf,
    source_root: PathBuf,
    output_root: PathBuf,
    theme: Unit,
    extensions: Vec<Unit>,
    templates: BTreeMap<String, Resource>,
    stylesheets: CombinedStylesheets,
    scripts: BTreeMap<String, ScriptBundle>,
    assets: BTreeMap<String, Resource>,
    template_overrides: BTreeMap<String, ResolvedOverride>,
    stylesheet_overrides: BTreeMap<String, ResolvedOverride>,
    index: ReverseIndex,
}

impl CompilationContext {
    /// Parse the selected manifests and derive the combined maps.
    pub fn load(
        project: &Project,
        selection: &Selection,
        output_root: PathBuf,
    ) -> Result<Self, DescriptorError> {
        let theme = Unit::load(&selection.theme, UnitKind::Theme)?;
        let extensions = selection
            .extensions
            .iter()
            .map(|m| Unit::load(m, UnitKind::Extension))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            &project.root,
            &project.source_root,
            output_root,
            theme,
            extensions,
        ))
    }

    /// Derive the combined maps from already parsed units.
    pub fn new(
        project_root: &Path,
        source_root: &Path,
        output_root: PathBuf,
        theme: Unit,
        extensions: Vec<Unit>,
    ) -> Self {
        let fold_order: Vec<&Unit> = extensions.iter().chain(iter::once(&theme)).collect();

        let mut templates = BTreeMap::new();
        let mut assets = BTreeMap::new();
        for unit in &fold_order {
            fold(&mut templates, unit.templates.values());
            for (dst, previous) in fold(&mut assets, unit.assets.values()) {
                crate::log!(
                    "assets";
                    "{} of {} replaces {}",
                    dst,
                    unit.full_name(),
                    previous
                );
            }
        }

        let mut entrypoints: BTreeMap<String, Vec<StylesheetEntry>> = BTreeMap::new();
        for unit in iter::once(&theme).chain(extensions.iter()) {
            for (app, entry) in &unit.stylesheets.entrypoints {
                entrypoints.entry(app.clone()).or_default().push(StylesheetEntry {
                    unit: unit.full_name(),
                    entry: entry.clone(),
                });
            }
        }

        let scripts = combine_scripts(&fold_order);

        let template_overrides =
            resolve_table(project_root, &output_root, &theme.template_overrides);
        let stylesheet_overrides =
            resolve_table(project_root, &output_root, &theme.stylesheet_overrides);

        apply_overrides(&mut templates, &template_overrides);
        for (dst, resolved) in &stylesheet_overrides {
            crate::log!("override"; "{} -> {}", dst, resolved.source.display());
        }

        let mut index = ReverseIndex::new();
        for res in templates.values() {
            index.insert(&res.physical_source(source_root), ResourceKind::Template, &res.dst);
        }
        for res in assets.values() {
            index.insert(&res.physical_source(source_root), ResourceKind::Asset, &res.dst);
        }

        crate::debug!(
            "context";
            "{} templates, {} stylesheet applications, {} script applications, {} assets, {} watched files",
            templates.len(),
            entrypoints.len(),
            scripts.len(),
            assets.len(),
            index.len()
        );

        Self {
            project_root: project_root.to_path_buf(),
            source_root: source_root.to_path_buf(),
            output_root,
            theme,
            extensions,
            templates,
            stylesheets: CombinedStylesheets { entrypoints },
            scripts,
            assets,
            template_overrides,
            stylesheet_overrides,
            index,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn theme(&self) -> &Unit {
        &self.theme
    }

    pub fn extensions(&self) -> &[Unit] {
        &self.extensions
    }

    pub fn templates(&self) -> &BTreeMap<String, Resource> {
        &self.templates
    }

    pub fn stylesheets(&self) -> &CombinedStylesheets {
        &self.stylesheets
    }

    pub fn scripts(&self) -> &BTreeMap<String, ScriptBundle> {
        &self.scripts
    }

    pub fn assets(&self) -> &BTreeMap<String, Resource> {
        &self.assets
    }

    pub fn template_overrides(&self) -> &BTreeMap<String, ResolvedOverride> {
        &self.template_overrides
    }

    pub fn stylesheet_overrides(&self) -> &BTreeMap<String, ResolvedOverride> {
        &self.stylesheet_overrides
    }

    /// Override file replacing a stylesheet, keyed by logical import path.
    pub fn stylesheet_override(&self, logical: &str) -> Option<&Path> {
        self.stylesheet_overrides
            .get(&unpartial(&clean_logical(logical)))
            .map(|o| o.source.as_path())
    }

    pub fn index(&self) -> &ReverseIndex {
        &self.index
    }

    /// Every application any selected unit contributes to.
    pub fn applications(&self) -> BTreeSet<String> {
        let mut apps: BTreeSet<String> = BTreeSet::new();
        apps.extend(self.stylesheets.entrypoints.keys().cloned());
        apps.extend(self.scripts.keys().cloned());
        for res in self.templates.values() {
            apps.extend(res.applications.iter().cloned());
        }
        apps
    }

    /// Applications whose template bundle includes any of `dsts`.
    pub fn template_applications<'a>(
        &self,
        dsts: impl IntoIterator<Item = &'a String>,
    ) -> BTreeSet<String> {
        dsts.into_iter()
            .filter_map(|dst| self.templates.get(dst))
            .flat_map(|res| res.applications.iter().cloned())
            .collect()
    }
}

/// Fold resources into `map`: later registration backs the destination.
///
/// Returns `(dst, previous src)` for every destination now backed by a
/// different file.
fn fold<'a>(
    map: &mut BTreeMap<String, Resource>,
    resources: impl IntoIterator<Item = &'a Resource>,
) -> Vec<(String, String)> {
    let mut replaced = Vec::new();
    for res in resources {
        match map.get_mut(&res.dst) {
            Some(existing) => {
                if existing.src != res.src {
                    replaced.push((res.dst.clone(), existing.src.clone()));
                }
                existing.merge(res);
            }
            None => {
                map.insert(res.dst.clone(), res.clone());
            }
        }
    }
    replaced
}

/// Union script modules and entrypoints per application, in unit order.
fn combine_scripts(units: &[&Unit]) -> BTreeMap<String, ScriptBundle> {
    let mut bundles: BTreeMap<String, ScriptBundle> = BTreeMap::new();
    for unit in units {
        for (app, modules) in &unit.scripts.modules {
            let bundle = bundles.entry(app.clone()).or_default();
            for module in modules {
                push_unique(&mut bundle.modules, module);
            }
        }
        for (app, entry) in &unit.scripts.entrypoints {
            let bundle = bundles.entry(app.clone()).or_default();
            push_unique(&mut bundle.modules, entry);
            push_unique(&mut bundle.entrypoints, entry);
        }
    }
    bundles
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|i| i == item) {
        list.push(item.to_string());
    }
}

/// Point every overridden destination at its override file.
fn apply_overrides(
    map: &mut BTreeMap<String, Resource>,
    overrides: &BTreeMap<String, ResolvedOverride>,
) {
    for res in map.values_mut() {
        let Some(resolved) = overrides.get(&res.dst) else {
            continue;
        };
        crate::log!("override"; "{} -> {}", res.dst, resolved.source.display());
        res.override_source = Some(resolved.source.clone());
        res.override_label = Some(resolved.rule.pattern.clone());
    }
}
