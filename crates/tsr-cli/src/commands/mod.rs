//! CLI subcommand implementations.

pub mod report;
pub mod tasks;
pub mod timeline;
pub mod util;
