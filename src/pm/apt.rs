//! Apt package manager (Debian, Ubuntu).

use std::collections::HashMap;
use std::sync::Arc;

use crate::executor::CommandRunner;

use super::{PackageManager, COMMON_EXTENSIONS};

/// Apt variant.
pub struct Apt {
    runner: Arc<dyn CommandRunner>,
    package_map: HashMap<&'static str, &'static str>,
}

impl Apt {
    /// Create a new apt variant.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        let package_map = HashMap::from([
            ("redis", "redis-server"),
            ("nginx", "nginx"),
            ("dnsmasq", "dnsmasq"),
        ]);
        Self { runner, package_map }
    }
}

impl PackageManager for Apt {
    fn name(&self) -> &'static str {
        "apt"
    }

    fn tool_binary(&self) -> &'static str {
        "apt-get"
    }

    fn list_command(&self) -> &'static str {
        "dpkg-query -W -f='${Package}\\n'"
    }

    fn install_command(&self, package: &str) -> String {
        format!(
            "DEBIAN_FRONTEND=noninteractive apt-get install -y --no-install-recommends {}",
            package
        )
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
        &["8.4", "8.3", "8.2", "8.1", "8.0", "7.4"]
    }

    fn php_service_pattern(&self) -> &'static str {
        "php{VERSION}-fpm"
    }

    fn php_fpm_package(&self, version: &str) -> String {
        format!("php{}-fpm", version)
    }

    fn php_extension_packages(&self, version: &str) -> Option<Vec<String>> {
        Some(
            COMMON_EXTENSIONS
                .iter()
                .map(|ext| format!("php{}-{}", version, ext))
                .collect(),
        )
    }
}
