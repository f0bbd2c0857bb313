//! Pacman package manager (Arch).

use std::collections::HashMap;
use std::sync::Arc;

use crate::executor::CommandRunner;

use super::PackageManager;

/// Pacman variant.
pub struct Pacman {
    runner: Arc<dyn CommandRunner>,
    package_map: HashMap<&'static str, &'static str>,
}

impl Pacman {
    /// Create a new pacman variant.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let package_map = HashMap::from([
            ("redis", "redis"),
            ("nginx", "nginx"),
            ("dnsmasq", "dnsmasq"),
        ]);
        Self { runner, package_map }
    }
}

impl PackageManager for Pacman {
    fn name(&self) -> &'static str {
        "pacman"
    }

    fn tool_binary(&self) -> &'static str {
        "pacman"
    }

    fn list_command(&self) -> &'static str {
        "pacman -Qq"
    }

    fn install_command(&self, package: &str) -> String {
        format!("pacman -S --noconfirm --needed {}", package)
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    fn package_name(&self, canonical: &str) -> String {
        self.package_map
            .get(canonical)
            .copied()
            .unwrap_or(canonical)
            .to_string()
    }

    fn supported_php_versions(&self) -> &'static [&'static str] {
        // Arch is rolling; only the current PHP is packaged.
        &["8.4"]
    }

    fn php_service_pattern(&self) -> &'static str {
        "php-fpm"
    }

    fn php_fpm_package(&self, _version: &str) -> String {
        "php-fpm".to_string()
    }

    fn php_extension_packages(&self, _version: &str) -> Option<Vec<String>> {
        // Extensions ship with the core php package; separate installation
        // is declined and callers skip the step.
        None
    }
}
