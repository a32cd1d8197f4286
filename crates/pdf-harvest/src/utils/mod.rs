//! Shared helpers.

pub mod subprocess;

pub use subprocess::{CommandError, run_command};
