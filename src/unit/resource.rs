//! Logical resource descriptors.

use std::path::{Path, PathBuf};

/// One logical resource: where it comes from and where it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Logical source path, relative to the shared source root.
    pub src: String,
    /// Destination key, unique within one resource map.
    pub dst: String,
    /// Applications referencing this resource, in registration order.
    pub applications: Vec<String>,
    /// Absolute path of the override file, once an override resolved.
    pub override_source: Option<PathBuf>,
    /// Pattern of the override rule that replaced the source.
    pub override_label: Option<String>,
}

impl Resource {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            applications: Vec::new(),
            override_source: None,
            override_label: None,
        }
    }

    /// Add an application if not present yet.
    pub fn add_application(&mut self, app: impl Into<String>) {
        let app = app.into();
        if !self.applications.contains(&app) {
            self.applications.push(app);
        }
    }

    /// Whether the resource belongs to `app`.
    pub fn serves(&self, app: &str) -> bool {
        self.applications.iter().any(|a| a == app)
    }

    /// File that actually backs this resource.
    pub fn physical_source(&self, source_root: &Path) -> PathBuf {
        match &self.override_source {
            Some(path) => path.clone(),
            None => source_root.join(&self.src),
        }
    }

    /// Basename of the logical source.
    pub fn basename(&self) -> &str {
        self.src.rsplit('/').next().unwrap_or(&self.src)
    }

    /// Register `other` on top of this resource.
    ///
    /// The later registration backs the destination; applications are unioned.
    pub fn merge(&mut self, other: &Resource) {
        let mut applications = std::mem::take(&mut self.applications);
        for app in &other.applications {
            if !applications.contains(app) {
                applications.push(app.clone());
            }
        }
        *self = other.clone();
        self.applications = applications;
    }
}
