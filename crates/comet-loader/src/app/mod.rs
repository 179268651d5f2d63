//! Application pseudo-packages.
//!
//! An application directory is loaded as an anonymous `Package`: its uses
//! lists are a fixed baseline set unioned with project-declared extras, and
//! its source lists come from scanning the app tree rather than explicit
//! declarations.

use camino::{Utf8Path, Utf8PathBuf};
use comet_core::types::{Environment, FileDecl, Package, Role, RoleDecl, UseDecl};
use comet_core::utils::has_segment;
use regex::Regex;

use crate::extensions::registered_extensions;
use crate::registry::{PackageRegistry, ResolveOptions};
use crate::scan::SourceScanner;
use crate::LoaderResult;

/// Standard packages every application gets (for now) for the classic
/// comet stack
pub const BASELINE: [&str; 8] = [
    "comet",
    "reactive",
    "session",
    "livedata",
    "records",
    "spark",
    "templating",
    "startup",
];

/// Top-level directory whose contents belong to app-local packages, not to
/// the app itself
const PACKAGES_DIR: &str = "packages";

/// Path segment that puts a file into the test partitions
const TESTS_SEGMENT: &str = "tests";

/// Build a package that represents an app. `ignore` patterns are matched
/// against absolute paths while scanning for source files.
pub fn from_app_dir(
    app_dir: &Utf8Path,
    ignore: &[Regex],
    registry: &PackageRegistry,
    options: &ResolveOptions,
) -> LoaderResult<Package> {
    let mut pkg = Package::new();
    pkg.name = None;
    pkg.source_root = Some(app_dir.to_owned());
    pkg.serve_root = Some(Utf8PathBuf::from("/"));

    let mut baseline: Vec<String> = BASELINE.iter().map(|name| name.to_string()).collect();
    baseline.extend(comet_config::declared_packages(app_dir)?);

    for role in Role::ALL {
        for env in Environment::ALL {
            *pkg.uses.get_mut(role, env) = baseline.clone();
        }
    }
    pkg.uniquify_uses();

    let use_client =
        sources_except(&pkg, app_dir, Role::Use, Environment::Client, ignore, registry, options, false)?;
    let use_server =
        sources_except(&pkg, app_dir, Role::Use, Environment::Server, ignore, registry, options, false)?;
    let test_client =
        sources_except(&pkg, app_dir, Role::Test, Environment::Client, ignore, registry, options, true)?;
    let test_server =
        sources_except(&pkg, app_dir, Role::Test, Environment::Server, ignore, registry, options, true)?;

    *pkg.sources.get_mut(Role::Use, Environment::Client) = use_client.clone();
    *pkg.sources.get_mut(Role::Use, Environment::Server) = use_server.clone();
    *pkg.sources.get_mut(Role::Test, Environment::Client) = test_client.clone();
    *pkg.sources.get_mut(Role::Test, Environment::Server) = test_server.clone();

    // Install synthetic role declarations replaying the baseline and the
    // computed partitions, so the app package looks exactly like a
    // descriptor-driven one to downstream consumers
    let base_uses: Vec<UseDecl> = baseline.iter().map(UseDecl::new).collect();
    pkg.set_role_handler(
        Role::Use,
        RoleDecl {
            uses: base_uses.clone(),
            files: partition_decls(use_client, use_server),
            exports: Vec::new(),
        },
    )?;
    pkg.set_role_handler(
        Role::Test,
        RoleDecl {
            uses: base_uses,
            files: partition_decls(test_client, test_server),
            exports: Vec::new(),
        },
    )?;

    Ok(pkg)
}

fn partition_decls(client: Vec<Utf8PathBuf>, server: Vec<Utf8PathBuf>) -> Vec<FileDecl> {
    client
        .into_iter()
        .map(|path| FileDecl::new(path, vec![Environment::Client]))
        .chain(
            server
                .into_iter()
                .map(|path| FileDecl::new(path, vec![Environment::Server])),
        )
        .collect()
}

/// Scan the app tree for sources of one (role, environment), excluding
/// app-local packages, the opposite environment's exclusive directories and
/// the wrong half of the test split
fn sources_except(
    pkg: &Package,
    root: &Utf8Path,
    role: Role,
    env: Environment,
    ignore: &[Regex],
    registry: &PackageRegistry,
    options: &ResolveOptions,
    tests: bool,
) -> LoaderResult<Vec<Utf8PathBuf>> {
    let extensions = registered_extensions(pkg, role, env, registry, options)?;
    let scanner = SourceScanner::new(root, extensions, ignore.to_vec());
    let except = env.opposite();

    Ok(scanner
        .scan()?
        .into_iter()
        // Files in app packages are compiled as those packages, not as the
        // app. Directories named "packages" lower in the tree are fine.
        .filter(|path| !path.starts_with(PACKAGES_DIR))
        .filter(|path| !has_segment(path, except.as_str()))
        .filter(|path| has_segment(path, TESTS_SEGMENT) == tests)
        .collect())
}
