//! Compiler-handler dispatch by file extension.
//!
//! A source file found in a package is handled by a handler defined in the
//! package itself or in one of its immediate dependencies. Extension
//! ownership across that candidate set must be unique: two claimants for the
//! same extension is a fatal conflict, scoped to the dependent package.

use comet_core::error::CometError;
use comet_core::types::{Environment, Package, Role, SourceHandler};
use indexmap::IndexSet;

use crate::registry::{PackageRegistry, ResolveOptions};
use crate::LoaderResult;

/// All extensions that indicate source files inside `pkg`, with leading
/// dots: the package's own plus those registered by every package in
/// `uses[role][env]`, each queried one level through the registry (not
/// recursively). Computed from `uses`, so only valid once that is set.
pub fn registered_extensions(
    pkg: &Package,
    role: Role,
    env: Environment,
    registry: &PackageRegistry,
    options: &ResolveOptions,
) -> LoaderResult<Vec<String>> {
    let mut extensions: IndexSet<String> = pkg.extensions.keys().cloned().collect();

    for dep in pkg.uses.get(role, env) {
        let dep_pkg = registry.resolve(dep, options)?;
        extensions.extend(dep_pkg.extensions.keys().cloned());
    }

    Ok(extensions
        .into_iter()
        .map(|ext| format!(".{}", ext))
        .collect())
}

/// The handler responsible for `extension` (no leading dot) among this
/// package and its direct dependencies. `None` means the file is inert.
/// Handlers from the package itself only count for the `use` role.
pub fn source_handler(
    pkg: &Package,
    role: Role,
    env: Environment,
    extension: &str,
    registry: &PackageRegistry,
    options: &ResolveOptions,
) -> LoaderResult<Option<SourceHandler>> {
    let mut candidates = Vec::new();

    if role == Role::Use {
        if let Some(handler) = pkg.extensions.get(extension) {
            candidates.push(handler.clone());
        }
    }

    for dep in pkg.uses.get(role, env) {
        let dep_pkg = registry.resolve(dep, options)?;
        if let Some(handler) = dep_pkg.extensions.get(extension) {
            candidates.push(handler.clone());
        }
    }

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(Some(candidates.remove(0))),
        _ => Err(CometError::ExtensionConflict {
            package: pkg.display_name().to_string(),
            extension: extension.to_string(),
            claimants: candidates.into_iter().map(|c| c.package).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistrySettings;
    use camino::Utf8PathBuf;
    use comet_core::utils::DESCRIPTOR_FILE;

    fn fixture(packages: &[(&str, &str)]) -> (tempfile::TempDir, PackageRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        for (name, toml) in packages {
            let pkg_dir = root.join("packages").join(name);
            std::fs::create_dir_all(&pkg_dir).unwrap();
            std::fs::write(pkg_dir.join(DESCRIPTOR_FILE), toml).unwrap();
        }
        let registry = PackageRegistry::new(RegistrySettings {
            package_dirs: vec![root.join("packages")],
            checkout_packages_dir: None,
            warehouse_dir: None,
        });
        (dir, registry)
    }

    #[test]
    fn test_union_of_own_and_direct_dependency_extensions() {
        let (_dir, registry) = fixture(&[
            ("comet", "[extensions]\njs = \"bundle\"\n"),
            (
                "templating",
                "[use]\npackages = [\"htmljs\"]\n\n[extensions]\nhtml = \"compile_templates\"\n",
            ),
            ("htmljs", "[extensions]\nfrag = \"parse_fragments\"\n"),
        ]);
        let pkg = registry
            .resolve("templating", &ResolveOptions::default())
            .unwrap();

        let exts = registered_extensions(
            &pkg,
            Role::Use,
            Environment::Client,
            &registry,
            &ResolveOptions::default(),
        )
        .unwrap();
        assert_eq!(exts, vec![".html", ".js", ".frag"]);
    }

    #[test]
    fn test_single_registrant_is_returned() {
        let (_dir, registry) = fixture(&[
            ("comet", "[extensions]\njs = \"bundle\"\n"),
            ("spark", "[use]\npackages = []\n"),
        ]);
        let pkg = registry.resolve("spark", &ResolveOptions::default()).unwrap();

        let handler = source_handler(
            &pkg,
            Role::Use,
            Environment::Client,
            "js",
            &registry,
            &ResolveOptions::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(handler.handler, "bundle");
        assert_eq!(handler.package, "comet");
    }

    #[test]
    fn test_unclaimed_extension_is_inert() {
        let (_dir, registry) = fixture(&[("comet", ""), ("spark", "")]);
        let pkg = registry.resolve("spark", &ResolveOptions::default()).unwrap();

        let handler = source_handler(
            &pkg,
            Role::Use,
            Environment::Client,
            "css",
            &registry,
            &ResolveOptions::default(),
        )
        .unwrap();
        assert!(handler.is_none());
    }

    #[test]
    fn test_two_claimants_conflict() {
        let (_dir, registry) = fixture(&[
            ("comet", ""),
            (
                "app-pkg",
                "[use]\npackages = [\"left\", \"right\"]\n",
            ),
            ("left", "[extensions]\nfoo = \"left_handler\"\n"),
            ("right", "[extensions]\nfoo = \"right_handler\"\n"),
        ]);
        let pkg = registry.resolve("app-pkg", &ResolveOptions::default()).unwrap();

        let err = source_handler(
            &pkg,
            Role::Use,
            Environment::Client,
            "foo",
            &registry,
            &ResolveOptions::default(),
        )
        .unwrap_err();
        match err {
            CometError::ExtensionConflict {
                extension,
                claimants,
                ..
            } => {
                assert_eq!(extension, "foo");
                assert_eq!(claimants, vec!["left".to_string(), "right".to_string()]);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_own_extensions_only_count_for_use_role() {
        let (_dir, registry) = fixture(&[
            ("comet", ""),
            ("templating", "[extensions]\nhtml = \"compile_templates\"\n"),
        ]);
        let pkg = registry
            .resolve("templating", &ResolveOptions::default())
            .unwrap();

        let for_use = source_handler(
            &pkg,
            Role::Use,
            Environment::Client,
            "html",
            &registry,
            &ResolveOptions::default(),
        )
        .unwrap();
        assert!(for_use.is_some());

        let for_test = source_handler(
            &pkg,
            Role::Test,
            Environment::Client,
            "html",
            &registry,
            &ResolveOptions::default(),
        )
        .unwrap();
        assert!(for_test.is_none());

        // But the union still reports it for both roles
        let exts = registered_extensions(
            &pkg,
            Role::Test,
            Environment::Client,
            &registry,
            &ResolveOptions::default(),
        )
        .unwrap();
        assert!(exts.contains(&".html".to_string()));
    }
}
