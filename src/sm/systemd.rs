//! Systemd service manager.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::PhpupResult;
use crate::executor::CommandRunner;

use super::ServiceManager;

/// Systemd variant, driving services through `systemctl`.
pub struct Systemd {
    runner: Arc<dyn CommandRunner>,
}

impl Systemd {
    /// Create a new systemd service manager.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn systemctl(&self, verb: &str, service: &str) -> PhpupResult<()> {
        debug!(service = %service, verb = %verb, "systemctl");
        self.runner
            .run_checked(&format!("systemctl {} {}", verb, service))?;
        Ok(())
    }
}

impl ServiceManager for Systemd {
    fn name(&self) -> &'static str {
        "systemd"
    }

    fn is_available(&self) -> bool {
        which::which("systemctl").is_ok()
    }

    fn enable(&self, service: &str) -> PhpupResult<()> {
        self.systemctl("enable", service)
    }

    fn disable(&self, service: &str) -> PhpupResult<()> {
        self.systemctl("disable", service)
    }

    fn restart(&self, service: &str) -> PhpupResult<()> {
        info!(service = %service, "Restarting service");
        self.systemctl("restart", service)
    }

    fn stop(&self, service: &str) -> PhpupResult<()> {
        info!(service = %service, "Stopping service");
        self.systemctl("stop", service)
    }

    fn status(&self, service: &str) -> PhpupResult<String> {
        // `systemctl status` exits non-zero for stopped (3) and unknown (4)
        // units, and prints the not-found diagnostic to stderr with empty
        // stdout. Callers interpret the text, so both streams are returned.
        let output = self
            .runner
            .execute(&format!("systemctl status {} --no-pager", service))?;
        let mut text = output.stdout.trim().to_string();
        let stderr = output.stderr.trim();
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(stderr);
        }
        Ok(text)
    }

    fn disabled(&self, service: &str) -> PhpupResult<bool> {
        let state = self
            .runner
            .run(&format!("systemctl is-enabled {}", service))?;
        Ok(state != "enabled")
    }

    fn print_status(&self, service: &str) -> PhpupResult<()> {
        let status = self.status(service)?;
        println!("{}", status);
        Ok(())
    }
}
