//! `comet show` command implementation.
//!
//! Resolves one package by name and prints its record: dependency edges per
//! (role, environment), source files, exports and vendor pins.

use camino::Utf8PathBuf;
use comet_loader::{PackageRegistry, RegistrySettings, ResolveOptions};

use super::CommandContext;

/// Execute the `comet show` command
pub fn execute(
    name: String,
    app_dir: Option<Utf8PathBuf>,
    _ctx: &CommandContext,
) -> anyhow::Result<()> {
    let registry = PackageRegistry::new(RegistrySettings::from_env());
    let options = ResolveOptions {
        app_dir,
        release_manifest: None,
    };
    let pkg = registry.resolve(&name, &options)?;

    println!("{} (id {})", pkg.display_name(), pkg.id);
    if let Some(summary) = &pkg.metadata.summary {
        println!("  {}", summary);
    }
    if let Some(root) = &pkg.source_root {
        println!("  source root: {}", root);
    }

    for (role, env, uses) in pkg.uses.iter() {
        if !uses.is_empty() {
            println!("  uses [{}/{}]: {}", role, env, uses.join(", "));
        }
    }
    for (role, env, sources) in pkg.sources.iter() {
        for source in sources {
            println!("  source [{}/{}]: {}", role, env, source);
        }
    }
    for (role, env, exports) in pkg.exports.iter() {
        if !exports.is_empty() {
            println!("  exports [{}/{}]: {}", role, env, exports.join(", "));
        }
    }
    if !pkg.extensions.is_empty() {
        let extensions: Vec<&str> = pkg.extensions.keys().map(String::as_str).collect();
        println!("  extensions: .{}", extensions.join(", ."));
    }
    if let Some(deps) = &pkg.vendor_dependencies {
        for (dep, version) in deps {
            println!("  vendor: {}@{}", dep, version);
        }
    }

    Ok(())
}
