//! Project and unit manifest reading.

mod error;
mod project;
pub mod xml;

pub use error::{DescriptorError, SelectionError};
pub use project::{
    EXTENSION_TAG, Manifest, Project, Selection, THEME_TAG, load_manifest,
};
pub use xml::XmlNode;
