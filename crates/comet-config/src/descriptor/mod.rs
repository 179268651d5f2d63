//! `package.toml` descriptor parsing and validation.
//!
//! A descriptor is the declarative program a package author writes. It is
//! parsed here into a typed model; evaluating it against the package and
//! vendor facades is the loader's job.

use std::collections::BTreeMap;

use comet_core::error::CometError;
use comet_core::types::Environment;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::ConfigResult;

/// Facade operations that no longer exist; naming them in a descriptor is a
/// descriptive fatal error rather than a silent no-op
const REMOVED_OPERATIONS: [&str; 2] = ["error", "registered-extensions"];

/// Complete `package.toml` descriptor
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorToml {
    /// Package metadata, merged via `describe`
    #[serde(default)]
    pub package: Option<MetadataSection>,

    /// Same-directory descriptor fragments, loaded in order
    #[serde(default)]
    pub include: Vec<String>,

    /// The `use`-role declaration
    #[serde(default, rename = "use")]
    pub use_section: Option<RoleSection>,

    /// The `test`-role declaration
    #[serde(default)]
    pub test: Option<RoleSection>,

    /// Source-file handlers this package registers, extension (no leading
    /// dot) to handler name
    #[serde(default)]
    pub extensions: IndexMap<String, String>,

    /// Pinned third-party dependencies
    #[serde(default)]
    pub vendor: Option<VendorSection>,
}

/// `[package]` metadata section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetadataSection {
    /// One-line description for `comet list`
    pub summary: Option<String>,

    /// Hide from listings
    #[serde(default)]
    pub internal: bool,

    /// Environments the package may be depended on in
    pub environments: Option<Vec<Environment>>,
}

/// A `[use]` or `[test]` role section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoleSection {
    /// Packages used by this role
    #[serde(default)]
    pub packages: Vec<PackageEntry>,

    /// Source files added by this role
    #[serde(default)]
    pub files: Vec<FileEntry>,

    /// Symbols exported by this role
    #[serde(default)]
    pub exports: Vec<ExportEntry>,
}

/// Package entry (simple name or detailed table)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PackageEntry {
    /// Bare package name, ordered, both environments
    Simple(String),

    /// Detailed entry
    Detailed {
        name: String,

        /// Defaults to both environments
        environments: Option<Vec<Environment>>,

        /// Don't require this package to load before us; also don't bring
        /// its imports into our namespace. Escape hatch for dependency
        /// cycles.
        #[serde(default)]
        unordered: bool,
    },
}

/// Source file entry (simple path or detailed table)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FileEntry {
    Simple(String),
    Detailed {
        path: String,
        environments: Option<Vec<Environment>>,
    },
}

/// Exported symbol entry (simple symbol or detailed table)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExportEntry {
    Simple(String),
    Detailed {
        symbol: String,
        environments: Option<Vec<Environment>>,
    },
}

/// `[vendor]` section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VendorSection {
    /// Exact-pinned dependency versions, name to version
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl PackageEntry {
    pub fn name(&self) -> &str {
        match self {
            PackageEntry::Simple(name) => name,
            PackageEntry::Detailed { name, .. } => name,
        }
    }
}

/// Parse a descriptor string into the typed model
pub fn parse_descriptor(content: &str) -> ConfigResult<DescriptorToml> {
    // First parse with toml_edit for better error reporting and so removed
    // operations can be spotted wherever they appear
    let document = content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| CometError::DescriptorParse {
            message: format!("TOML syntax error: {}", e),
        })?;

    reject_removed_operations(document.as_table())?;

    // Then parse with serde for type safety
    let descriptor: DescriptorToml =
        toml::from_str(content).map_err(|e| CometError::DescriptorParse {
            message: format!("TOML parsing error: {}", e),
        })?;

    validate_descriptor(&descriptor)?;

    Ok(descriptor)
}

/// Reject descriptors that still name removed facade operations, at the top
/// level or inside a role section
fn reject_removed_operations(table: &toml_edit::Table) -> ConfigResult<()> {
    for op in REMOVED_OPERATIONS {
        if table.contains_key(op) {
            return Err(CometError::UnsupportedApi {
                operation: op.to_string(),
            });
        }
        for role in ["use", "test"] {
            if let Some(section) = table.get(role).and_then(|item| item.as_table()) {
                if section.contains_key(op) {
                    return Err(CometError::UnsupportedApi {
                        operation: op.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Validate descriptor field contents
fn validate_descriptor(descriptor: &DescriptorToml) -> ConfigResult<()> {
    for extension in descriptor.extensions.keys() {
        if extension.is_empty() || extension.starts_with('.') {
            return Err(CometError::DescriptorParse {
                message: format!(
                    "extension '{}' must be a bare extension without a leading dot",
                    extension
                ),
            });
        }
    }

    for include in &descriptor.include {
        if include.is_empty() {
            return Err(CometError::DescriptorParse {
                message: "include entries must be non-empty relative paths".to_string(),
            });
        }
    }

    Ok(())
}
