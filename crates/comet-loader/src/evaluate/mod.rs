//! Descriptor evaluation.
//!
//! A descriptor is evaluated in isolation: the only capabilities it reaches
//! are the `PackageFacade` and the `VendorFacade`, plus a same-directory
//! include loader. After evaluation, each registered role declaration is
//! applied once with no environment filter: the declaration's client output
//! becomes the package's client variant and its server output the server
//! variant.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use comet_core::error::CometError;
use comet_core::types::{
    Environment, ExportDecl, FileDecl, Package, PackageMetadata, Role, RoleDecl, UseDecl,
};
use comet_core::utils::DESCRIPTOR_FILE;
use comet_config::{
    parse_descriptor, DescriptorToml, ExportEntry, FileEntry, MetadataSection, PackageEntry,
    RoleSection,
};
use tracing::debug;

use crate::vendor::ensure_only_exact_versions;
use crate::LoaderResult;

/// The descriptor-facing surface of a package under construction
pub struct PackageFacade<'a> {
    pkg: &'a mut Package,
}

impl<'a> PackageFacade<'a> {
    pub fn new(pkg: &'a mut Package) -> Self {
        Self { pkg }
    }

    /// Merge metadata into the package
    pub fn describe(&mut self, metadata: PackageMetadata) {
        self.pkg.describe(metadata);
    }

    /// Register the `use`-role declaration; a package may have only one
    pub fn on_use(&mut self, decl: RoleDecl) -> LoaderResult<()> {
        self.pkg.set_role_handler(Role::Use, decl)
    }

    /// Register the `test`-role declaration; a package may have only one
    pub fn on_test(&mut self, decl: RoleDecl) -> LoaderResult<()> {
        self.pkg.set_role_handler(Role::Test, decl)
    }

    /// Register a source-file handler for an extension (no leading dot)
    pub fn register_extension(&mut self, extension: &str, handler: &str) -> LoaderResult<()> {
        self.pkg.register_extension(extension, handler)
    }
}

/// The external-dependency surface of a package under construction
pub struct VendorFacade<'a> {
    pkg: &'a mut Package,
}

impl<'a> VendorFacade<'a> {
    pub fn new(pkg: &'a mut Package) -> Self {
        Self { pkg }
    }

    /// Declare the pinned third-party dependencies; callable at most once.
    /// Fuzzy versions are rejected so that deployments are fully
    /// reproducible.
    pub fn depends(
        &mut self,
        deps: std::collections::BTreeMap<String, String>,
    ) -> LoaderResult<()> {
        ensure_only_exact_versions(self.pkg.display_name(), &deps)?;
        self.pkg.declare_vendor_dependencies(deps)
    }
}

/// Load a package from its directory: parse the descriptor (and includes),
/// drive the facades, apply role declarations, insert the foundation edge
/// and deduplicate the uses tables.
pub fn evaluate_package_dir(name: &str, dir: &Utf8Path) -> LoaderResult<Package> {
    let descriptor_path = dir.join(DESCRIPTOR_FILE);
    if !descriptor_path.is_file() {
        return Err(CometError::PackageNotFound {
            name: name.to_string(),
        });
    }

    let mut pkg = Package::new();
    pkg.name = Some(name.to_string());
    pkg.source_root = Some(dir.to_owned());
    pkg.serve_root = Some(Utf8PathBuf::from("/packages").join(name));

    debug!(package = name, dir = %dir, "evaluating descriptor");

    // The descriptor plus its include fragments, in load order
    let mut fragments = Vec::new();
    load_fragment(dir, Utf8Path::new(DESCRIPTOR_FILE), &mut fragments)?;

    for (rel_path, descriptor) in &fragments {
        apply_descriptor(&mut pkg, descriptor)?;
        pkg.extra_dependencies.push(rel_path.clone());
    }

    // Invoke each role declaration once, with no environment filter
    let decls: Vec<(Role, RoleDecl)> = Role::ALL
        .into_iter()
        .filter_map(|role| pkg.role_handlers.get(role).cloned().map(|d| (role, d)))
        .collect();
    for (role, decl) in &decls {
        pkg.apply_role_decl(*role, decl);
    }

    pkg.add_foundation_dependency();
    pkg.uniquify_uses();

    Ok(pkg)
}

/// Read and parse one descriptor file, then its includes, depth-first.
/// Includes are sandboxed to the package directory.
fn load_fragment(
    dir: &Utf8Path,
    rel_path: &Utf8Path,
    out: &mut Vec<(Utf8PathBuf, DescriptorToml)>,
) -> LoaderResult<()> {
    if out.iter().any(|(seen, _)| seen == rel_path) {
        // Include cycles terminate; the first load wins
        return Ok(());
    }

    let content = std::fs::read_to_string(dir.join(rel_path))
        .map_err(|e| CometError::io(format!("Failed to read {}", dir.join(rel_path)), e))?;
    let descriptor = parse_descriptor(&content)?;
    let includes = descriptor.include.clone();
    out.push((rel_path.to_owned(), descriptor));

    for include in includes {
        let include = Utf8PathBuf::from(include);
        check_include_sandbox(&include)?;
        load_fragment(dir, &include, out)?;
    }
    Ok(())
}

/// Includes may only name files inside the package directory
fn check_include_sandbox(path: &Utf8Path) -> LoaderResult<()> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Utf8Component::ParentDir));
    if escapes {
        return Err(CometError::IncludeOutsideRoot {
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Drive the two facades with one parsed descriptor
fn apply_descriptor(pkg: &mut Package, descriptor: &DescriptorToml) -> LoaderResult<()> {
    let mut facade = PackageFacade::new(pkg);

    if let Some(section) = &descriptor.package {
        facade.describe(metadata_from_section(section));
    }
    if let Some(section) = &descriptor.use_section {
        facade.on_use(role_decl_from_section(section))?;
    }
    if let Some(section) = &descriptor.test {
        facade.on_test(role_decl_from_section(section))?;
    }
    for (extension, handler) in &descriptor.extensions {
        facade.register_extension(extension, handler)?;
    }

    if let Some(vendor) = &descriptor.vendor {
        let mut vendor_facade = VendorFacade::new(pkg);
        vendor_facade.depends(vendor.dependencies.clone())?;
    }

    Ok(())
}

fn metadata_from_section(section: &MetadataSection) -> PackageMetadata {
    PackageMetadata {
        summary: section.summary.clone(),
        internal: section.internal,
        environments: section.environments.clone(),
    }
}

/// Turn a parsed role section into the typed role declaration. Files and
/// exports without an environment list go to both environments.
fn role_decl_from_section(section: &RoleSection) -> RoleDecl {
    let uses = section
        .packages
        .iter()
        .map(|entry| match entry {
            PackageEntry::Simple(name) => UseDecl::new(name.clone()),
            PackageEntry::Detailed {
                name,
                environments,
                unordered,
            } => UseDecl {
                name: name.clone(),
                environments: environments.clone(),
                unordered: *unordered,
            },
        })
        .collect();

    let files = section
        .files
        .iter()
        .map(|entry| match entry {
            FileEntry::Simple(path) => FileDecl::new(path.as_str(), Environment::ALL.to_vec()),
            FileEntry::Detailed { path, environments } => FileDecl::new(
                path.as_str(),
                environments.clone().unwrap_or_else(|| Environment::ALL.to_vec()),
            ),
        })
        .collect();

    let exports = section
        .exports
        .iter()
        .map(|entry| match entry {
            ExportEntry::Simple(symbol) => {
                ExportDecl::new(symbol.clone(), Environment::ALL.to_vec())
            }
            ExportEntry::Detailed {
                symbol,
                environments,
            } => ExportDecl::new(
                symbol.clone(),
                environments.clone().unwrap_or_else(|| Environment::ALL.to_vec()),
            ),
        })
        .collect();

    RoleDecl {
        uses,
        files,
        exports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comet_core::types::FOUNDATION;

    fn package_dir(toml: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(root.join(DESCRIPTOR_FILE), toml).unwrap();
        (dir, root)
    }

    #[test]
    fn test_missing_descriptor_means_package_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let err = evaluate_package_dir("ghost", &root).unwrap_err();
        assert!(matches!(err, CometError::PackageNotFound { .. }));
    }

    #[test]
    fn test_evaluation_populates_tables() {
        let (_dir, root) = package_dir(
            r#"
[package]
summary = "Templating"

[use]
packages = ["reactive", { name = "htmljs", environments = ["client"] }]
files = [{ path = "lib.js", environments = ["client"] }]
exports = [{ symbol = "Template", environments = ["client"] }]

[extensions]
html = "compile_templates"
"#,
        );
        let pkg = evaluate_package_dir("templating", &root).unwrap();

        assert_eq!(pkg.name.as_deref(), Some("templating"));
        assert_eq!(
            pkg.serve_root.as_deref(),
            Some(Utf8Path::new("/packages/templating"))
        );
        assert_eq!(pkg.metadata.summary.as_deref(), Some("Templating"));
        assert_eq!(
            pkg.uses.get(Role::Use, Environment::Client),
            &vec![
                FOUNDATION.to_string(),
                "reactive".to_string(),
                "htmljs".to_string(),
            ]
        );
        assert_eq!(
            pkg.uses.get(Role::Use, Environment::Server),
            &vec![FOUNDATION.to_string(), "reactive".to_string()]
        );
        assert_eq!(
            pkg.sources.get(Role::Use, Environment::Client),
            &vec![Utf8PathBuf::from("lib.js")]
        );
        assert_eq!(
            pkg.exports.get(Role::Use, Environment::Client),
            &vec!["Template".to_string()]
        );
        assert_eq!(pkg.extensions.get("html").unwrap().handler, "compile_templates");
        assert_eq!(
            pkg.extra_dependencies,
            vec![Utf8PathBuf::from(DESCRIPTOR_FILE)]
        );
    }

    #[test]
    fn test_repeated_use_keeps_last_occurrence() {
        let (_dir, root) = package_dir(
            r#"
[use]
packages = [
  { name = "handlebars", unordered = true },
  "reactive",
  "handlebars",
]
"#,
        );
        let pkg = evaluate_package_dir("spark", &root).unwrap();
        assert_eq!(
            pkg.uses.get(Role::Use, Environment::Client),
            &vec![
                FOUNDATION.to_string(),
                "reactive".to_string(),
                "handlebars".to_string(),
            ]
        );
        // The last declaration was ordered, so the flag is gone too
        assert!(!pkg.unordered.contains("handlebars"));
    }

    #[test]
    fn test_foundation_package_skips_itself_for_use_role() {
        let (_dir, root) = package_dir(
            r#"
[use]
packages = ["underscore"]
"#,
        );
        let pkg = evaluate_package_dir(FOUNDATION, &root).unwrap();
        assert_eq!(
            pkg.uses.get(Role::Use, Environment::Client),
            &vec!["underscore".to_string()]
        );
        assert_eq!(
            pkg.uses.get(Role::Test, Environment::Client),
            &vec![FOUNDATION.to_string()]
        );
    }

    #[test]
    fn test_inexact_vendor_version_is_fatal() {
        let (_dir, root) = package_dir(
            r#"
[vendor.dependencies]
tar = "1.2.x"
"#,
        );
        let err = evaluate_package_dir("archiver", &root).unwrap_err();
        assert!(matches!(err, CometError::InexactVersion { .. }));
    }

    #[test]
    fn test_exact_vendor_version_is_stored() {
        let (_dir, root) = package_dir(
            r#"
[vendor.dependencies]
tar = "1.2.3"
"#,
        );
        let pkg = evaluate_package_dir("archiver", &root).unwrap();
        let deps = pkg.vendor_dependencies.unwrap();
        assert_eq!(deps.get("tar").map(String::as_str), Some("1.2.3"));
    }

    #[test]
    fn test_includes_merge_and_are_watched() {
        let (_dir, root) = package_dir(
            r#"
include = ["extras.toml"]

[use]
packages = ["reactive"]
"#,
        );
        std::fs::write(
            root.join("extras.toml"),
            r#"
[extensions]
html = "compile_templates"
"#,
        )
        .unwrap();

        let pkg = evaluate_package_dir("templating", &root).unwrap();
        assert!(pkg.extensions.contains_key("html"));
        assert_eq!(
            pkg.extra_dependencies,
            vec![
                Utf8PathBuf::from(DESCRIPTOR_FILE),
                Utf8PathBuf::from("extras.toml"),
            ]
        );
    }

    #[test]
    fn test_include_escaping_package_dir_is_fatal() {
        let (_dir, root) = package_dir(r#"include = ["../outside.toml"]"#);
        let err = evaluate_package_dir("spark", &root).unwrap_err();
        assert!(matches!(err, CometError::IncludeOutsideRoot { .. }));
    }

    #[test]
    fn test_duplicate_role_section_across_fragments_is_fatal() {
        let (_dir, root) = package_dir(
            r#"
include = ["extras.toml"]

[use]
packages = ["reactive"]
"#,
        );
        std::fs::write(root.join("extras.toml"), "[use]\npackages = [\"spark\"]\n").unwrap();
        let err = evaluate_package_dir("templating", &root).unwrap_err();
        assert!(matches!(err, CometError::DuplicateRoleHandler { .. }));
    }

    #[test]
    fn test_facade_rejects_second_use_handler() {
        let mut pkg = Package::new();
        let mut facade = PackageFacade::new(&mut pkg);
        facade.on_use(RoleDecl::default()).unwrap();
        assert!(matches!(
            facade.on_use(RoleDecl::default()).unwrap_err(),
            CometError::DuplicateRoleHandler { .. }
        ));
    }
}
