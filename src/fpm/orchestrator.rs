//! The PHP-FPM orchestrator.
//!
//! Owns the current-version state and performs multi-step version switches
//! with rollback on a failed install. The orchestrator is the only caller of
//! the package and service managers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{PhpupError, PhpupResult};
use crate::executor::CommandRunner;
use crate::filesystem::Filesystem;
use crate::pm::PackageManager;
use crate::sm::ServiceManager;
use crate::templates::{render_pool_config, POOL_CONFIG_NAME};

/// Pool-config directory candidates, most specific first. The `{VERSION}`
/// placeholder is substituted with the current version before probing.
const POOL_DIR_CANDIDATES: &[&str] = &[
    "/etc/php/{VERSION}/fpm/pool.d", // Debian, Ubuntu
    "/etc/php-fpm.d",                // Fedora, RHEL
    "/etc/php/php-fpm.d",            // Arch
    "/etc/php/fpm.d",                // Solus
];

/// Outcome of a version switch.
///
/// A switch that hit a recoverable install failure still completes its
/// bookkeeping; the retained error is carried here and the caller decides
/// whether to propagate it.
#[derive(Debug)]
pub struct VersionSwitch {
    /// The version active before the switch.
    pub old_version: String,
    /// The version active after the switch (the old one if rolled back).
    pub version: String,
    /// The install failure recovered during the switch, if any.
    pub error: Option<PhpupError>,
}

/// PHP-FPM orchestrator.
pub struct PhpFpm {
    pm: Arc<dyn PackageManager>,
    sm: Arc<dyn ServiceManager>,
    fs: Arc<dyn Filesystem>,
    runner: Arc<dyn CommandRunner>,
    settings: Settings,
    current_version: String,
}

impl PhpFpm {
    /// Create a new orchestrator, resolving the starting version from the
    /// marker file or, absent one, the system default.
    pub fn new(
        pm: Arc<dyn PackageManager>,
        sm: Arc<dyn ServiceManager>,
        fs: Arc<dyn Filesystem>,
        runner: Arc<dyn CommandRunner>,
        settings: Settings,
    ) -> PhpupResult<Self> {
        let mut orchestrator = Self {
            pm,
            sm,
            fs,
            runner,
            settings,
            current_version: String::new(),
        };
        orchestrator.current_version = orchestrator.get_version(false)?;
        debug!(version = %orchestrator.current_version, "Orchestrator initialized");
        Ok(orchestrator)
    }

    /// The version the orchestrator currently manages.
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// The active package manager's name.
    pub fn package_manager_name(&self) -> &'static str {
        self.pm.name()
    }

    /// The active service manager's name.
    pub fn service_manager_name(&self) -> &'static str {
        self.sm.name()
    }

    /// PHP versions the active package manager ships, newest first.
    pub fn supported_php_versions(&self) -> &'static [&'static str] {
        self.pm.supported_php_versions()
    }

    /// Check that `version` is a candidate the active package manager ships.
    pub fn validate_version(&self, version: &str) -> PhpupResult<()> {
        if self.pm.supported_php_versions().contains(&version) {
            return Ok(());
        }
        Err(PhpupError::Config {
            message: format!(
                "PHP version '{}' is not available via {} (supported: {})",
                version,
                self.pm.name(),
                self.pm.supported_php_versions().join(", ")
            ),
        })
    }

    /// Install PHP-FPM for the current version and bring the service up.
    ///
    /// Installs the package and common extension set only when the FPM
    /// package is missing; unconditionally refreshes the managed pool
    /// config and restarts the service.
    pub fn install(&self) -> PhpupResult<()> {
        let fpm_package = self.pm.php_fpm_package(&self.current_version);
        if !self.pm.installed(&fpm_package)? {
            self.pm.ensure_installed(&fpm_package)?;
            self.install_extensions()?;
            self.sm.enable(&self.service_name_for(&self.current_version))?;
        }

        self.fs
            .ensure_dir_exists(&self.settings.log_dir(), &self.settings.user.name)?;

        let pool_dir = self.fpm_config_path()?;
        let content = render_pool_config(
            &self.settings.user.name,
            &self.settings.user.group,
            &self.settings.paths.home,
        )?;
        self.fs.put_as_user(
            &pool_dir.join(POOL_CONFIG_NAME),
            &content,
            &self.settings.user.name,
        )?;

        self.sm.restart(&self.service_name_for(&self.current_version))
    }

    /// Remove the managed pool config and stop the service.
    ///
    /// No-op when the pool config was never written.
    pub fn uninstall(&self) -> PhpupResult<()> {
        let pool_config = self.fpm_config_path()?.join(POOL_CONFIG_NAME);
        if !self.fs.exists(&pool_config) {
            debug!("No managed pool config present, nothing to uninstall");
            return Ok(());
        }
        self.fs.unlink(&pool_config)?;
        self.sm.stop(&self.service_name_for(&self.current_version))
    }

    /// Restart the FPM service for the current version.
    pub fn restart(&self) -> PhpupResult<()> {
        self.sm.restart(&self.service_name_for(&self.current_version))
    }

    /// Switch the managed PHP version.
    ///
    /// `target` of `None` or `"default"` resolves to the system default,
    /// bypassing any marker. An install failure reverts the version and is
    /// retained in the result; every later bookkeeping step still runs.
    ///
    /// The CLI-alias and extension steps run against whatever version is
    /// current when they execute — after a rollback that is the *old*
    /// version, not the requested one. Long-standing behavior, kept as-is.
    pub fn change_version(
        &mut self,
        target: Option<&str>,
        update_cli_alias: bool,
        install_extensions: bool,
    ) -> PhpupResult<VersionSwitch> {
        let old_version = self.current_version.clone();
        let old_service = self.service_name_for(&old_version);

        self.sm.stop(&old_service)?;
        self.sm.disable(&old_service)?;

        let target_version = match target {
            None | Some("default") => self.get_version(true)?,
            Some(version) => version.to_string(),
        };
        info!(from = %old_version, to = %target_version, "Switching PHP version");
        self.current_version = target_version;

        let mut recovered = None;
        if let Err(e) = self.install() {
            if e.is_install_error() {
                warn!(error = %e, "Install failed, reverting to previous version");
                self.current_version = old_version.clone();
                recovered = Some(e);
            } else {
                return Err(e);
            }
        }

        let service = self.service_name_for(&self.current_version);
        if self.sm.disabled(&service)? {
            self.sm.enable(&service)?;
        }

        let real_default = self.get_version(true)?;
        let marker = self.settings.version_marker_path();
        if self.current_version != real_default {
            self.fs
                .put_as_user(&marker, &self.current_version, &self.settings.user.name)?;
        } else if self.fs.exists(&marker) {
            self.fs.unlink(&marker)?;
        }

        if update_cli_alias {
            self.update_cli_alias()?;
        }
        if install_extensions {
            self.install_extensions()?;
        }

        Ok(VersionSwitch {
            old_version,
            version: self.current_version.clone(),
            error: recovered,
        })
    }

    /// Resolve the PHP version.
    ///
    /// With `real` false, a present marker wins; otherwise the version is
    /// read from the default `php` binary's symlink target.
    pub fn get_version(&self, real: bool) -> PhpupResult<String> {
        let marker = self.settings.version_marker_path();
        if !real && self.fs.exists(&marker) {
            return Ok(self.fs.get(&marker)?.trim().to_string());
        }

        let target = self.fs.read_link(&self.settings.paths.php_binary)?;
        version_from_binary_target(&target).ok_or_else(|| PhpupError::Config {
            message: format!(
                "Could not determine default PHP version from '{}'",
                target.display()
            ),
        })
    }

    /// Resolve the FPM service name for the current version and verify the
    /// init system knows it.
    pub fn fpm_service_name(&self) -> PhpupResult<String> {
        let candidate = self.service_name_for(&self.current_version);
        let status = self.sm.status(&candidate)?;
        if is_not_found_status(&status) {
            return Err(PhpupError::ServiceNameResolution {
                service: candidate,
                status: status.lines().next().unwrap_or_default().to_string(),
            });
        }
        Ok(candidate)
    }

    /// The first pool-config directory that exists, in fixed distro order.
    pub fn fpm_config_path(&self) -> PhpupResult<PathBuf> {
        let candidates: Vec<PathBuf> = POOL_DIR_CANDIDATES
            .iter()
            .map(|c| PathBuf::from(c.replace("{VERSION}", &self.current_version)))
            .collect();

        for candidate in &candidates {
            if self.fs.exists(candidate) {
                return Ok(candidate.clone());
            }
        }

        Err(PhpupError::ConfigPathNotFound {
            checked: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Print the FPM service status for the current version.
    pub fn print_status(&self) -> PhpupResult<()> {
        self.sm.print_status(&self.service_name_for(&self.current_version))
    }

    fn service_name_for(&self, version: &str) -> String {
        self.pm.php_service_pattern().replace("{VERSION}", version)
    }

    /// Install the common extension set; skipped with a warning on distros
    /// that decline separate extension installation.
    fn install_extensions(&self) -> PhpupResult<()> {
        match self.pm.php_extension_packages(&self.current_version) {
            None => {
                warn!(
                    manager = %self.pm.name(),
                    "Package manager bundles PHP extensions; skipping extension installation"
                );
                Ok(())
            }
            Some(packages) => {
                for package in packages {
                    self.pm.ensure_installed(&package)?;
                }
                Ok(())
            }
        }
    }

    /// Point the system default `php` alias at the current version.
    fn update_cli_alias(&self) -> PhpupResult<()> {
        let binary = format!(
            "{}{}",
            self.settings.paths.php_binary.display(),
            self.current_version
        );
        info!(binary = %binary, "Updating php CLI alias");
        self.runner
            .run_checked(&format!("update-alternatives --set php {}", binary))?;
        Ok(())
    }
}

/// Extract a version tag from a `php` binary symlink target, e.g.
/// `/usr/bin/php8.1` yields `8.1`.
fn version_from_binary_target(target: &Path) -> Option<String> {
    let name = target.file_name()?.to_str()?;
    let version = name.strip_prefix("php")?;
    if version.is_empty() || !version.chars().next()?.is_ascii_digit() {
        return None;
    }
    Some(version.to_string())
}

/// Whether status text reports a service unknown to the init system.
fn is_not_found_status(status: &str) -> bool {
    let lower = status.to_lowercase();
    lower.contains("could not be found")
        || lower.contains("not found")
        || lower.contains("not-found")
}
