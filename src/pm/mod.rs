//! Package manager capability.
//!
//! One contract over the distro package tools phpup understands. Variants
//! differ only in package naming, detection, and whether PHP extensions can
//! be installed separately; everything else is provided behavior.
//!
//! ## Adding a New Variant
//!
//! 1. Create a new file in this directory (e.g., `zypper.rs`)
//! 2. Implement the `PackageManager` trait
//! 3. Add the variant to the probe order in [`detect`]

mod apt;
mod dnf;
mod eopkg;
mod pacman;

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{PhpupError, PhpupResult};
use crate::executor::CommandRunner;

pub use apt::Apt;
pub use dnf::Dnf;
pub use eopkg::Eopkg;
pub use pacman::Pacman;

/// A distro package manager.
///
/// Implementors supply the distro-specific commands and naming; `packages`,
/// `installed`, `ensure_installed`, and `is_available` are provided on top of
/// them with identical behavior across variants.
pub trait PackageManager: Send + Sync {
    /// Variant identifier (e.g., "apt").
    fn name(&self) -> &'static str;

    /// The binary probed for by `is_available` (e.g., "apt-get").
    fn tool_binary(&self) -> &'static str;

    /// Shell command printing one installed package name per line.
    fn list_command(&self) -> &'static str;

    /// Shell command installing `package` non-interactively.
    fn install_command(&self, package: &str) -> String;

    /// The command runner this variant issues its commands through.
    fn runner(&self) -> &dyn CommandRunner;

    /// Map a canonical package name (e.g., "redis") to this distro's name.
    fn package_name(&self, canonical: &str) -> String;

    /// Supported PHP version tags, newest first.
    fn supported_php_versions(&self) -> &'static [&'static str];

    /// FPM service name template. Debian-family templates carry a
    /// `{VERSION}` placeholder; distros with a single version-less unit
    /// use a fixed name and substitution is a no-op.
    fn php_service_pattern(&self) -> &'static str;

    /// The FPM package for `version` on this distro.
    fn php_fpm_package(&self, version: &str) -> String;

    /// Packages for the common extension set, or `None` if this distro
    /// bundles extensions with the core package and declines separate
    /// installation. Callers must treat `None` as a skip, not an error.
    fn php_extension_packages(&self, version: &str) -> Option<Vec<String>>;

    /// Whether this package manager is present on the system.
    ///
    /// Never errors; probe failures report as `false`.
    fn is_available(&self) -> bool {
        which::which(self.tool_binary()).is_ok()
    }

    /// Installed package names containing `filter`, in list order.
    fn packages(&self, filter: &str) -> PhpupResult<Vec<String>> {
        let output = self.runner().run(self.list_command())?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.contains(filter))
            .map(str::to_string)
            .collect())
    }

    /// Whether `name` is installed.
    fn installed(&self, name: &str) -> PhpupResult<bool> {
        Ok(self.packages(name)?.iter().any(|p| p == name))
    }

    /// Install `name` unless it already is installed.
    fn ensure_installed(&self, name: &str) -> PhpupResult<()> {
        if self.installed(name)? {
            debug!(package = %name, "Package already installed");
            return Ok(());
        }

        info!(package = %name, manager = %self.name(), "Installing package");
        let command = self.install_command(name);
        self.runner().run_with(&command, &|_, stderr| PhpupError::Install {
            package: name.to_string(),
            stderr: stderr.to_string(),
        })?;
        Ok(())
    }
}

/// Probe order for [`detect`].
fn variants(runner: &Arc<dyn CommandRunner>) -> Vec<Arc<dyn PackageManager>> {
    vec![
        Arc::new(Apt::new(Arc::clone(runner))),
        Arc::new(Dnf::new(Arc::clone(runner))),
        Arc::new(Pacman::new(Arc::clone(runner))),
        Arc::new(Eopkg::new(Arc::clone(runner))),
    ]
}

/// Select the package manager for this system.
///
/// Variants are probed sequentially; the first available one wins.
pub fn detect(runner: Arc<dyn CommandRunner>) -> PhpupResult<Arc<dyn PackageManager>> {
    for candidate in variants(&runner) {
        if candidate.is_available() {
            info!(manager = %candidate.name(), "Package manager detected");
            return Ok(candidate);
        }
        debug!(manager = %candidate.name(), "Package manager not available");
    }
    Err(PhpupError::NoPackageManager)
}

/// Canonical names of the common PHP extension set.
pub const COMMON_EXTENSIONS: &[&str] = &[
    "cli", "mbstring", "xml", "curl", "zip", "sqlite3", "mysql", "gd", "intl",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::ScriptedRunner;

    #[test]
    fn test_probe_order_starts_with_apt() {
        let runner: Arc<dyn CommandRunner> = Arc::new(ScriptedRunner::new());
        let order: Vec<&str> = variants(&runner).iter().map(|v| v.name()).collect();
        assert_eq!(order, vec!["apt", "dnf", "pacman", "eopkg"]);
    }

    #[test]
    fn test_common_extension_set_is_nonempty() {
        assert!(COMMON_EXTENSIONS.contains(&"mbstring"));
        assert!(COMMON_EXTENSIONS.contains(&"curl"));
    }
}
