//! Package registry: name resolution, process-wide caching and eager
//! transitive loading.
//!
//! Search order for a name:
//! - `<app_dir>/packages` (if an app context is given)
//! - `COMET_PACKAGE_DIRS` (colon-separated)
//! - the checkout-local packages directory (if running from a checkout)
//! - the warehouse (if a release manifest is supplied)
//!
//! The registry is an explicit object rather than a bare global so that
//! tests can run isolated instances side by side.

use std::collections::BTreeMap;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use comet_core::error::CometError;
use comet_core::types::Package;
use comet_core::utils::is_package_dir;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::debug;

use crate::evaluate::evaluate_package_dir;
use crate::LoaderResult;

/// Environment variable holding extra package search directories
pub const PACKAGE_DIRS_ENV: &str = "COMET_PACKAGE_DIRS";

/// Listing output is clamped to this width
const LIST_WIDTH: usize = 80;

/// Pinned package versions of one release
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseManifest {
    /// Package name to exact version
    pub packages: BTreeMap<String, String>,
}

/// Per-resolution options
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// App directory whose `packages/` subdirectory overrides everything
    pub app_dir: Option<Utf8PathBuf>,
    /// Release manifest enabling warehouse resolution
    pub release_manifest: Option<ReleaseManifest>,
}

/// Where a registry looks for packages
#[derive(Debug, Clone, Default)]
pub struct RegistrySettings {
    /// Ordered search directories, highest precedence first
    pub package_dirs: Vec<Utf8PathBuf>,
    /// `packages/` directory of a source checkout, consulted after
    /// `package_dirs`
    pub checkout_packages_dir: Option<Utf8PathBuf>,
    /// Root of the pinned-version distribution store; a package lives at
    /// `<warehouse>/packages/<name>/<version>`
    pub warehouse_dir: Option<Utf8PathBuf>,
}

impl RegistrySettings {
    /// Settings from the process environment
    pub fn from_env() -> Self {
        let package_dirs = std::env::var(PACKAGE_DIRS_ENV)
            .map(|dirs| {
                dirs.split(':')
                    .filter(|dir| !dir.is_empty())
                    .map(Utf8PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();
        let checkout_packages_dir = std::env::var("COMET_CHECKOUT_DIR")
            .ok()
            .map(|dir| Utf8PathBuf::from(dir).join("packages"));
        let warehouse_dir = std::env::var("COMET_WAREHOUSE_DIR")
            .ok()
            .map(Utf8PathBuf::from);
        Self {
            package_dirs,
            checkout_packages_dir,
            warehouse_dir,
        }
    }

    /// Local package directories in precedence order
    fn local_package_dirs(&self) -> impl Iterator<Item = &Utf8Path> {
        self.package_dirs
            .iter()
            .map(Utf8PathBuf::as_path)
            .chain(self.checkout_packages_dir.as_deref())
    }
}

/// Resolves package names to cached `Package` instances
pub struct PackageRegistry {
    settings: RegistrySettings,
    loaded: DashMap<String, Arc<Package>>,
}

impl PackageRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            settings,
            loaded: DashMap::new(),
        }
    }

    /// Get a package by name, loading and caching it on first access.
    ///
    /// After a first load, every name in the package's `uses` table is
    /// force-resolved with the same options, so that nested descriptor side
    /// effects are complete before this call returns. The package is cached
    /// before the recursion, which makes revisits (including dependency
    /// cycles) a no-op.
    pub fn resolve(&self, name: &str, options: &ResolveOptions) -> LoaderResult<Arc<Package>> {
        if let Some(cached) = self.loaded.get(name) {
            return Ok(cached.clone());
        }

        let dir = self.locate(name, options)?;
        debug!(package = name, dir = %dir, "loading package");
        let pkg = Arc::new(evaluate_package_dir(name, &dir)?);
        self.loaded.insert(name.to_string(), pkg.clone());

        // Force dependents to evaluate their descriptors too
        for (_role, _env, list) in pkg.uses.iter() {
            for dep in list {
                self.resolve(dep, options)?;
            }
        }

        Ok(pkg)
    }

    /// Whether a name is already in the cache
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    /// Load a package directly from a directory, without caching
    pub fn load_from_dir(&self, name: &str, dir: &Utf8Path) -> LoaderResult<Package> {
        evaluate_package_dir(name, dir)
    }

    /// Force reload of all packages: clears the cache, so the next
    /// resolution of any name produces a fresh instance with a new id
    pub fn flush(&self) {
        self.loaded.clear();
    }

    /// All packages discoverable across the search locations (without any
    /// app override). Earlier directories take precedence per name.
    pub fn list(
        &self,
        manifest: Option<&ReleaseManifest>,
    ) -> LoaderResult<BTreeMap<String, Arc<Package>>> {
        let mut found = BTreeMap::new();

        for dir in self.settings.local_package_dirs() {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries {
                let entry =
                    entry.map_err(|e| CometError::io(format!("Failed to read {}", dir), e))?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if found.contains_key(&name) {
                    continue;
                }
                if is_package_dir(&dir.join(&name)) {
                    let pkg = self.resolve(&name, &ResolveOptions::default())?;
                    found.insert(name, pkg);
                }
            }
        }

        if let Some(manifest) = manifest {
            let options = ResolveOptions {
                app_dir: None,
                release_manifest: Some(manifest.clone()),
            };
            for name in manifest.packages.keys() {
                if !found.contains_key(name) {
                    let pkg = self.resolve(name, &options)?;
                    found.insert(name.clone(), pkg);
                }
            }
        }

        Ok(found)
    }

    /// For a package that exists in the local package directories, the
    /// directory in which it lives
    pub fn directory_for_local_package(&self, name: &str) -> Option<Utf8PathBuf> {
        self.settings
            .local_package_dirs()
            .map(|dir| dir.join(name))
            .find(|dir| is_package_dir(dir))
    }

    /// Ordered search across all sources; first match wins
    fn locate(&self, name: &str, options: &ResolveOptions) -> LoaderResult<Utf8PathBuf> {
        if let Some(app_dir) = &options.app_dir {
            let dir = app_dir.join("packages").join(name);
            if is_package_dir(&dir) {
                return Ok(dir);
            }
        }

        if let Some(dir) = self.directory_for_local_package(name) {
            return Ok(dir);
        }

        if let (Some(manifest), Some(warehouse)) =
            (&options.release_manifest, &self.settings.warehouse_dir)
        {
            if let Some(version) = manifest.packages.get(name) {
                let dir = warehouse.join("packages").join(name).join(version);
                if is_package_dir(&dir) {
                    return Ok(dir);
                }
            }
        }

        Err(CometError::PackageNotFound {
            name: name.to_string(),
        })
    }
}

/// Human-readable package table: name-padded, clamped to 80 columns,
/// internal packages skipped
pub fn format_list<'a>(packages: impl IntoIterator<Item = &'a Package>) -> String {
    let packages: Vec<&Package> = packages.into_iter().collect();
    let pad = packages
        .iter()
        .map(|pkg| pkg.display_name().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for pkg in packages {
        if pkg.metadata.internal {
            continue;
        }
        let summary = pkg.metadata.summary.as_deref().unwrap_or("No description");
        let summary: String = summary
            .chars()
            .take(LIST_WIDTH.saturating_sub(2 + pad))
            .collect();
        out.push_str(&format!("{:<pad$}  {}\n", pkg.display_name(), summary));
    }
    out
}
