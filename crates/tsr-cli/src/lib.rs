//! Timesheet reconstruction CLI library.
//!
//! This crate provides the `tsr` command-line interface on top of `tsr-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, InputArgs, OutputFormat};
pub use config::Config;
