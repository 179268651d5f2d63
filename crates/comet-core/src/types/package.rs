//! The Package entity and its typed role-handler records.
//!
//! Under the hood, packages in a library directory and user applications are
//! both `Package`s, just represented differently on disk. A package is
//! created empty, populated synchronously during one descriptor evaluation
//! (or one directory scan for apps), and is immutable afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use camino::Utf8PathBuf;
use indexmap::IndexMap;

use super::role::{Environment, Role};
use super::table::RoleTable;
use crate::error::{CometError, CometResult};

/// The foundational package every other package implicitly depends on
pub const FOUNDATION: &str = "comet";

static NEXT_PACKAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Descriptor-declared package attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    /// One-line description for `comet list`
    pub summary: Option<String>,
    /// Hidden from listings when true
    pub internal: bool,
    /// Environments the package may be depended on in; `None` means the
    /// package does not care where it is loaded
    pub environments: Option<Vec<Environment>>,
}

impl PackageMetadata {
    /// Merge another metadata block into this one; set fields win
    pub fn merge(&mut self, other: PackageMetadata) {
        if other.summary.is_some() {
            self.summary = other.summary;
        }
        if other.internal {
            self.internal = true;
        }
        if other.environments.is_some() {
            self.environments = other.environments;
        }
    }
}

/// Reference to the compiler handler that owns a source-file extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandler {
    /// Extension without the leading dot
    pub extension: String,
    /// Name of the handler within the owning package
    pub handler: String,
    /// Package that registered the handler
    pub package: String,
}

/// A single `use` entry in a role declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseDecl {
    pub name: String,
    /// `None` means both environments (the "no environment filter" default)
    pub environments: Option<Vec<Environment>>,
    /// Exempt from load-before ordering and symbol import; the escape hatch
    /// for dependency cycles
    pub unordered: bool,
}

/// A source file added by a role declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDecl {
    pub path: Utf8PathBuf,
    pub environments: Vec<Environment>,
}

/// A symbol exported by a role declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDecl {
    pub symbol: String,
    pub environments: Vec<Environment>,
}

/// The structured result of a role handler.
///
/// Where the legacy system invoked a callback that mutated ambient state
/// through `use`/`add_files`/`export_symbol` calls, a `RoleDecl` is the same
/// information as a plain record, applied to the package in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDecl {
    pub uses: Vec<UseDecl>,
    pub files: Vec<FileDecl>,
    pub exports: Vec<ExportDecl>,
}

impl UseDecl {
    /// Ordered dependency on both environments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environments: None,
            unordered: false,
        }
    }

    pub fn environments(mut self, envs: Vec<Environment>) -> Self {
        self.environments = Some(envs);
        self
    }

    pub fn unordered(mut self) -> Self {
        self.unordered = true;
        self
    }
}

impl FileDecl {
    pub fn new(path: impl Into<Utf8PathBuf>, environments: Vec<Environment>) -> Self {
        Self {
            path: path.into(),
            environments,
        }
    }
}

impl ExportDecl {
    pub fn new(symbol: impl Into<String>, environments: Vec<Environment>) -> Self {
        Self {
            symbol: symbol.into(),
            environments,
        }
    }
}

/// A resolved package record, ready for a downstream compiler/bundler
#[derive(Debug)]
pub struct Package {
    /// Unique id, guaranteed not to be reused in this process. If the
    /// package is reloaded after a flush it gets a different id.
    pub id: u64,

    /// Package name, or `None` for an app pseudo-package
    pub name: Option<String>,

    /// Base directory for resolving source files
    pub source_root: Option<Utf8PathBuf>,

    /// Served-path prefix (`/packages/<name>` for library packages)
    pub serve_root: Option<Utf8PathBuf>,

    /// Attributes from `describe()`
    pub metadata: PackageMetadata,

    /// At most one role declaration per role
    pub role_handlers: RoleTableDecls,

    /// Packages used, per (role, environment). The ordering is significant
    /// only for symbol-import priority; it does not affect load order. A
    /// given name occurs at most once per list.
    pub uses: RoleTable<Vec<String>>,

    /// Dependencies we are unordered against (we don't mind if they load
    /// after us, as long as they load)
    pub unordered: BTreeSet<String>,

    /// Source files, per (role, environment), relative to `source_root`
    pub sources: RoleTable<Vec<Utf8PathBuf>>,

    /// Symbols explicitly exported from this package. Expansion with
    /// in-source export annotations is the bundler's job, not ours.
    pub exports: RoleTable<Vec<String>>,

    /// Other files to watch for changes in development mode, such as the
    /// descriptor itself. Relative paths.
    pub extra_dependencies: Vec<Utf8PathBuf>,

    /// Registered source-file handlers, extension (no leading dot) first
    pub extensions: IndexMap<String, SourceHandler>,

    /// Exact-pinned third-party dependencies; `None` means no declaration
    pub vendor_dependencies: Option<BTreeMap<String, String>>,
}

/// Role-handler slots; at most one declaration per role
#[derive(Debug, Clone, Default)]
pub struct RoleTableDecls {
    pub use_role: Option<RoleDecl>,
    pub test: Option<RoleDecl>,
}

impl RoleTableDecls {
    pub fn get(&self, role: Role) -> Option<&RoleDecl> {
        match role {
            Role::Use => self.use_role.as_ref(),
            Role::Test => self.test.as_ref(),
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<RoleDecl> {
        match role {
            Role::Use => &mut self.use_role,
            Role::Test => &mut self.test,
        }
    }
}

impl Package {
    /// Create an empty package with a fresh process-unique id
    pub fn new() -> Self {
        Self {
            id: NEXT_PACKAGE_ID.fetch_add(1, Ordering::Relaxed),
            name: None,
            source_root: None,
            serve_root: None,
            metadata: PackageMetadata::default(),
            role_handlers: RoleTableDecls::default(),
            uses: RoleTable::default(),
            unordered: BTreeSet::new(),
            sources: RoleTable::default(),
            exports: RoleTable::default(),
            extra_dependencies: Vec::new(),
            extensions: IndexMap::new(),
            vendor_dependencies: None,
        }
    }

    /// Name for error messages; the app pseudo-package has none
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(app)")
    }

    /// Merge descriptor metadata into the package
    pub fn describe(&mut self, metadata: PackageMetadata) {
        self.metadata.merge(metadata);
    }

    /// Register the role declaration for `role`; a second registration for
    /// the same role is a configuration error
    pub fn set_role_handler(&mut self, role: Role, decl: RoleDecl) -> CometResult<()> {
        let slot = self.role_handlers.slot(role);
        if slot.is_some() {
            return Err(CometError::DuplicateRoleHandler {
                package: self.display_name().to_string(),
                role: role.to_string(),
            });
        }
        *slot = Some(decl);
        Ok(())
    }

    /// Register a source-file handler for an extension (no leading dot)
    pub fn register_extension(&mut self, extension: &str, handler: &str) -> CometResult<()> {
        if self.extensions.contains_key(extension) {
            return Err(CometError::DuplicateExtension {
                package: self.display_name().to_string(),
                extension: extension.to_string(),
            });
        }
        self.extensions.insert(
            extension.to_string(),
            SourceHandler {
                extension: extension.to_string(),
                handler: handler.to_string(),
                package: self.display_name().to_string(),
            },
        );
        Ok(())
    }

    /// Store the exact-pinned vendor dependency map; may be set at most once
    pub fn declare_vendor_dependencies(
        &mut self,
        deps: BTreeMap<String, String>,
    ) -> CometResult<()> {
        if self.vendor_dependencies.is_some() {
            return Err(CometError::DuplicateVendorDecl {
                package: self.display_name().to_string(),
            });
        }
        self.vendor_dependencies = Some(deps);
        Ok(())
    }

    /// Directory vendor dependencies are installed into
    pub fn vendor_dir(&self) -> Option<Utf8PathBuf> {
        self.source_root.as_ref().map(|root| root.join(".vendor"))
    }

    /// Apply a role declaration to the package tables.
    ///
    /// This is the single "no environment filter" handler invocation: `use`
    /// entries without an environment list land in both environments, and
    /// the declaration's client output becomes the package's client variant.
    pub fn apply_role_decl(&mut self, role: Role, decl: &RoleDecl) {
        for use_decl in &decl.uses {
            let envs = use_decl
                .environments
                .as_deref()
                .unwrap_or(&Environment::ALL);
            for env in envs {
                self.uses
                    .get_mut(role, *env)
                    .push(use_decl.name.clone());
            }
            // The flag is not tracked per-environment or per-role; the last
            // declaration for a name wins.
            if use_decl.unordered {
                self.unordered.insert(use_decl.name.clone());
            } else {
                self.unordered.remove(&use_decl.name);
            }
        }

        for file in &decl.files {
            for env in &file.environments {
                self.sources.get_mut(role, *env).push(file.path.clone());
            }
        }

        for export in &decl.exports {
            for env in &export.environments {
                self.exports
                    .get_mut(role, *env)
                    .push(export.symbol.clone());
            }
        }
    }

    /// Prepend the foundational package to every uses list. Everything
    /// depends on it, except the foundational package itself in its `use`
    /// role.
    pub fn add_foundation_dependency(&mut self) {
        let name = self.name.clone();
        self.uses.for_each_mut(|role, _env, list| {
            if !(name.as_deref() == Some(FOUNDATION) && role == Role::Use) {
                list.insert(0, FOUNDATION.to_string());
            }
        });
    }

    /// If a package appears twice in a uses list, keep only the rightmost
    /// instance (a right-to-left scan, so the last declaration wins)
    pub fn uniquify_uses(&mut self) {
        self.uses.for_each_mut(|_role, _env, list| {
            let mut seen = BTreeSet::new();
            let mut output = Vec::with_capacity(list.len());
            for name in list.drain(..).rev() {
                if seen.insert(name.clone()) {
                    output.push(name);
                }
            }
            output.reverse();
            *list = output;
        });
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // Uses-list dedup: the rightmost occurrence survives, relative order of
    // survivors is preserved, and no name appears twice.
    proptest! {
        #[test]
        fn uniquify_keeps_last_occurrence(names in prop::collection::vec(0u8..6, 0..24)) {
            let input: Vec<String> = names.iter().map(|n| format!("pkg{}", n)).collect();

            let mut pkg = Package::new();
            *pkg.uses.get_mut(Role::Use, Environment::Client) = input.clone();
            pkg.uniquify_uses();
            let output = pkg.uses.get(Role::Use, Environment::Client).clone();

            // No duplicates
            let unique: std::collections::BTreeSet<_> = output.iter().collect();
            prop_assert_eq!(unique.len(), output.len());

            // Every distinct input name survives exactly once
            let distinct: std::collections::BTreeSet<_> = input.iter().collect();
            prop_assert_eq!(distinct.len(), output.len());

            // Survivors sit at the position of their last occurrence:
            // sorting output by last-occurrence index reproduces output
            let mut expected: Vec<String> = distinct.into_iter().cloned().collect();
            expected.sort_by_key(|name| input.iter().rposition(|n| n == name).unwrap());
            prop_assert_eq!(output, expected);
        }
    }
}
