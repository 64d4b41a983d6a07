//! Drawbot Application
//!
//! The command-line shell: reads drawing documents and action scripts,
//! drives a [`drawbot_core::Session`], and writes PNG output.

mod error;
mod replay;
mod shell;

pub use error::AppError;
pub use replay::{ReplayAction, ReplayReport, parse_script, replay};
pub use shell::Shell;
