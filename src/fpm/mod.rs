//! PHP-FPM orchestration.
//!
//! Composes the package manager, service manager, and filesystem into the
//! install/uninstall/version-switch operations.

mod orchestrator;

pub use orchestrator::{PhpFpm, VersionSwitch};
