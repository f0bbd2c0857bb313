//! Error types and result alias.

mod types;

pub use types::{CommandErrorKind, PhpupError, PhpupResult};
