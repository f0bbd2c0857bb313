//! Subprocess execution.
//!
//! Blocking subprocess spawning and the command-runner contract the rest of
//! the crate is written against.

mod runner;
mod subprocess;
#[cfg(test)]
pub(crate) mod testing;

pub use runner::{CommandRunner, SystemRunner};
pub use subprocess::{ExecOutput, SubprocessBuilder};
