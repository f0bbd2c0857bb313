//! phpup library
//!
//! Provisions and manages a local PHP-FPM development environment on Linux:
//! installs PHP-FPM, switches between PHP versions, and keeps service state
//! consistent across distributions by normalizing package and service
//! tooling behind one contract.

pub mod config;
pub mod error;
pub mod executor;
pub mod filesystem;
pub mod fpm;
pub mod pm;
pub mod sm;
pub mod templates;
