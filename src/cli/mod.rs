//! CLI module for whiteflag
//!
//! Provides command-line interface for:
//! - phone: Parse one free-text phone field
//! - fields: List external field names by section
//! - validate: Check assembled documents against the formal schema
//! - export: Run the record pipeline and write export files

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{export, fields, phone, run, run_command, validate};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_input, write_error, write_response};
