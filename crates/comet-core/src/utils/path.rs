//! Path utilities for safe filesystem operations.
//!
//! Source paths handed to the bundler are always relative to the package
//! root; a scanned file that resolves outside its root is an internal error,
//! never silently dropped.

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::{CometError, CometResult};

/// Fixed name of the package descriptor inside a package directory
pub const DESCRIPTOR_FILE: &str = "package.toml";

/// A directory is a package directory when it carries a descriptor
pub fn is_package_dir(dir: &Utf8Path) -> bool {
    dir.join(DESCRIPTOR_FILE).is_file()
}

/// Make `abs` relative to `root`, failing if it points outside of it
/// (e.g. via a symlink escape)
pub fn relative_to_root(root: &Utf8Path, abs: &Utf8Path) -> CometResult<Utf8PathBuf> {
    match abs.strip_prefix(root) {
        Ok(rel) if !rel.as_str().is_empty() && !starts_with_parent(rel) => Ok(rel.to_owned()),
        _ => Err(CometError::SourceOutsideRoot {
            path: abs.to_string(),
        }),
    }
}

fn starts_with_parent(path: &Utf8Path) -> bool {
    path.components()
        .any(|c| matches!(c, camino::Utf8Component::ParentDir))
}

/// True when `path` contains `segment` as a whole path component
pub fn has_segment(path: &Utf8Path, segment: &str) -> bool {
    path.components().any(|c| c.as_str() == segment)
}
