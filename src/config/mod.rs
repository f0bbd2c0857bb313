//! Configuration module.

mod settings;

pub use settings::{LoggingConfig, PathsConfig, Settings, UserConfig};
