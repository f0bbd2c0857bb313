//! Dnf package manager (Fedora, RHEL).

use std::collections::HashMap;
use std::sync::Arc;

use crate::executor::CommandRunner;

use super::{PackageManager, COMMON_EXTENSIONS};

/// Dnf variant.
pub struct Dnf {
    runner: Arc<dyn CommandRunner>,
    package_map: HashMap<&'static str, &'static str>,
}

impl Dnf {
    /// Create a new dnf variant.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let package_map = HashMap::from([
            ("redis", "redis"),
            ("nginx", "nginx"),
            ("dnsmasq", "dnsmasq"),
        ]);
        Self { runner, package_map }
    }
}

impl PackageManager for Dnf {
    fn name(&self) -> &'static str {
        "dnf"
    }

    fn tool_binary(&self) -> &'static str {
        "dnf"
    }

    fn list_command(&self) -> &'static str {
        "rpm -qa --queryformat '%{NAME}\\n'"
    }

    fn install_command(&self, package: &str) -> String {
        format!("dnf install -y {}", package)
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
        // Fedora ships one PHP stream at a time.
        &["8.3", "8.2", "8.1"]
    }

    fn php_service_pattern(&self) -> &'static str {
        "php-fpm"
    }

    fn php_fpm_package(&self, _version: &str) -> String {
        "php-fpm".to_string()
    }

    fn php_extension_packages(&self, _version: &str) -> Option<Vec<String>> {
        Some(
            COMMON_EXTENSIONS
                .iter()
                .map(|ext| format!("php-{}", ext))
                .collect(),
        )
    }
}
