//! Path utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `to_slash`)
//! - [`logical`]: Manifest path cleaning (`clean_logical`, `strip_base`, `unpartial`)

pub mod fs;
pub mod logical;

pub use fs::{normalize_path, to_slash};
pub use logical::{clean_logical, strip_base, unpartial};
