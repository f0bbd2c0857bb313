//! Eopkg package manager (Solus).

use std::collections::HashMap;
use std::sync::Arc;

use crate::executor::CommandRunner;

use super::PackageManager;

/// Eopkg variant.
pub struct Eopkg {
    runner: Arc<dyn CommandRunner>,
    package_map: HashMap<&'static str, &'static str>,
}

impl Eopkg {
    /// Create a new eopkg variant.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let package_map = HashMap::from([
            ("redis", "redis"),
            ("nginx", "nginx"),
            ("dnsmasq", "dnsmasq"),
        ]);
        Self { runner, package_map }
    }
}

impl PackageManager for Eopkg {
    fn name(&self) -> &'static str {
        "eopkg"
    }

    fn tool_binary(&self) -> &'static str {
        "eopkg"
    }

    fn list_command(&self) -> &'static str {
        "eopkg list-installed | cut -d' ' -f1"
    }

    fn install_command(&self, package: &str) -> String {
        format!("eopkg install -y {}", package)
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
        &["8.2"]
    }

    fn php_service_pattern(&self) -> &'static str {
        "php-fpm"
    }

    fn php_fpm_package(&self, _version: &str) -> String {
        "php".to_string()
    }

    fn php_extension_packages(&self, _version: &str) -> Option<Vec<String>> {
        Some(vec![
            "php-curl".to_string(),
            "php-gd".to_string(),
            "php-mysqlnd".to_string(),
        ])
    }
}
