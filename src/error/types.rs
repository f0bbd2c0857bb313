//! Error types for phpup.

use thiserror::Error;

/// Main error type for phpup operations.
#[derive(Error, Debug)]
pub enum PhpupError {
    /// No supported package manager was found during probing.
    #[error("No compatible package manager found (probed apt, dnf, pacman, eopkg)")]
    NoPackageManager,

    /// No supported service manager was found during probing.
    #[error("No compatible service manager found")]
    NoServiceManager,

    /// A package installation command exited non-zero.
    #[error("Failed to install package '{package}': {stderr}")]
    Install { package: String, stderr: String },

    /// The derived FPM service name is unknown to the init system.
    #[error("Service '{service}' is not known to the init system: {status}")]
    ServiceNameResolution { service: String, status: String },

    /// No recognized PHP-FPM pool directory exists on this system.
    #[error("No PHP-FPM pool configuration directory found (checked: {checked})")]
    ConfigPathNotFound { checked: String },

    /// Subprocess plumbing errors.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Template rendering errors.
    #[error("Template error: {message}")]
    Template { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    #[error("Failed to spawn '{program}': {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Command exited with code {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },
}

/// Result type alias for phpup operations.
pub type PhpupResult<T> = Result<T, PhpupError>;

impl PhpupError {
    /// Whether this error is a recoverable package-install failure.
    ///
    /// The version-switch state machine rolls back on these and only these.
    pub fn is_install_error(&self) -> bool {
        matches!(self, Self::Install { .. })
    }
}
