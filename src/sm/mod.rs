//! Service manager capability.
//!
//! One contract over init systems. The orchestrator only ever talks to the
//! trait; `Systemd` is the stock implementation.

mod systemd;

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{PhpupError, PhpupResult};
use crate::executor::CommandRunner;

pub use systemd::Systemd;

/// An init system managing named services.
///
/// `enable`, `disable`, `restart`, and `stop` are idempotent: driving a
/// service into a state it already holds is not an error. `restart` of a
/// service unknown to the init system must fail (with the init system's
/// not-found diagnostic in the error), distinguishably from restarting a
/// known-but-stopped service; service-name resolution relies on this.
pub trait ServiceManager: Send + Sync {
    /// Variant identifier (e.g., "systemd").
    fn name(&self) -> &'static str;

    /// Whether this init system is present. Never errors.
    fn is_available(&self) -> bool;

    /// Enable `service` to start at boot.
    fn enable(&self, service: &str) -> PhpupResult<()>;

    /// Disable `service` from starting at boot.
    fn disable(&self, service: &str) -> PhpupResult<()>;

    /// Restart `service`.
    fn restart(&self, service: &str) -> PhpupResult<()>;

    /// Stop `service`.
    fn stop(&self, service: &str) -> PhpupResult<()>;

    /// Raw status text for `service`.
    fn status(&self, service: &str) -> PhpupResult<String>;

    /// Whether `service` is disabled, derived from status output.
    fn disabled(&self, service: &str) -> PhpupResult<bool>;

    /// Write a human-readable status report for `service`.
    fn print_status(&self, service: &str) -> PhpupResult<()>;
}

/// Select the service manager for this system.
pub fn detect(runner: Arc<dyn CommandRunner>) -> PhpupResult<Arc<dyn ServiceManager>> {
    let candidates: Vec<Arc<dyn ServiceManager>> = vec![Arc::new(Systemd::new(runner))];
    for candidate in candidates {
        if candidate.is_available() {
            info!(manager = %candidate.name(), "Service manager detected");
            return Ok(candidate);
        }
        debug!(manager = %candidate.name(), "Service manager not available");
    }
    Err(PhpupError::NoServiceManager)
}
